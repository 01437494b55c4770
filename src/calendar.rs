use crate::error::ScheduleError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Id of the calendar every activity falls back to when none is named.
pub const DEFAULT_CALENDAR_ID: &str = "standard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::with_year_range(2026, 2026)
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Five-day week with US federal holidays loaded for the given years.
    pub fn with_year_range(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        };

        calendar.add_us_holidays_range(start, end);
        calendar
    }

    /// Seven-day week with no holidays. Useful for continuous-pour work and
    /// for reasoning about schedules in plain day offsets.
    pub fn continuous() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::new(),
        }
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays);
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, ScheduleError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(ScheduleError::InvalidCalendar {
                calendar_id: "<unnamed>".to_string(),
            });
        }
        let mut non_working_days = HashSet::new();
        for day in Self::ALL_WEEKDAYS {
            if !working_set.contains(&day) {
                non_working_days.insert(day);
            }
        }

        let holidays = config.holidays.iter().copied().collect();
        Ok(Self {
            holidays,
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn has_working_weekday(&self) -> bool {
        self.non_working_days.len() < Self::ALL_WEEKDAYS.len()
    }

    /// Add standard US federal holidays for a given year
    fn add_us_holidays(&mut self, year: i32) {
        // New Year's Day
        self.holidays
            .insert(NaiveDate::from_ymd_opt(year, 1, 1).unwrap());

        // Martin Luther King Jr. Day (3rd Monday in January)
        self.holidays
            .insert(Self::nth_weekday(year, 1, Weekday::Mon, 3));

        // Presidents' Day (3rd Monday in February)
        self.holidays
            .insert(Self::nth_weekday(year, 2, Weekday::Mon, 3));

        // Memorial Day (last Monday in May)
        self.holidays
            .insert(Self::last_weekday(year, 5, Weekday::Mon));

        // Independence Day
        self.holidays
            .insert(NaiveDate::from_ymd_opt(year, 7, 4).unwrap());

        // Labor Day (1st Monday in September)
        self.holidays
            .insert(Self::nth_weekday(year, 9, Weekday::Mon, 1));

        // Columbus Day (2nd Monday in October)
        self.holidays
            .insert(Self::nth_weekday(year, 10, Weekday::Mon, 2));

        // Veterans Day
        self.holidays
            .insert(NaiveDate::from_ymd_opt(year, 11, 11).unwrap());

        // Thanksgiving (4th Thursday in November)
        self.holidays
            .insert(Self::nth_weekday(year, 11, Weekday::Thu, 4));

        // Christmas
        self.holidays
            .insert(NaiveDate::from_ymd_opt(year, 12, 25).unwrap());
    }

    /// Add US federal holidays for a range of years (inclusive)
    fn add_us_holidays_range(&mut self, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            self.add_us_holidays(year);
        }
    }

    /// Helper: Find the nth occurrence of a weekday in a month
    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
        let mut date = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let mut count = 0;

        while date.month() == month {
            if date.weekday() == weekday {
                count += 1;
                if count == n {
                    return date;
                }
            }
            date = date + Duration::days(1);
        }
        unreachable!("every month holds at least four of each weekday")
    }

    /// Helper: Find the last occurrence of a weekday in a month
    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
        let mut date = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
        };
        date = date - Duration::days(1); // Last day of the month

        while date.weekday() != weekday {
            date = date - Duration::days(1);
        }
        date
    }

    /// Add a single holiday
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// Add multiple holidays at once
    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Check if a date is a working day under this calendar
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Snap a date forward to the first working day on or after it.
    pub fn roll_forward(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from;
        while !self.is_working_day(current) {
            current = current + Duration::days(1);
        }
        current
    }

    /// Advance a start boundary by a number of working days.
    ///
    /// Boundaries sit on working-day mornings: a 1-day activity starting
    /// Monday finishes on Tuesday's boundary, which is where an FS successor
    /// may begin. A zero duration returns the start unchanged, so milestones
    /// resolve start == finish.
    pub fn add_duration(&self, start: NaiveDate, working_days: i64) -> NaiveDate {
        if working_days <= 0 {
            return start;
        }
        let mut current = self.roll_forward(start);
        for _ in 0..working_days {
            current = self.roll_forward(current + Duration::days(1));
        }
        current
    }

    /// Walk a finish boundary back by a number of working days.
    /// Inverse of `add_duration` for boundaries already on working days.
    pub fn subtract_duration(&self, finish: NaiveDate, working_days: i64) -> NaiveDate {
        if working_days <= 0 {
            return finish;
        }
        let mut current = finish;
        for _ in 0..working_days {
            current = current - Duration::days(1);
            while !self.is_working_day(current) {
                current = current - Duration::days(1);
            }
        }
        current
    }

    /// Apply a signed lag: positive lags advance, negative lags (leads) walk
    /// backward, both counted in this calendar's working days.
    pub fn offset(&self, from: NaiveDate, lag_days: i64) -> NaiveDate {
        if lag_days >= 0 {
            self.add_duration(from, lag_days)
        } else {
            self.subtract_duration(from, -lag_days)
        }
    }

    /// Signed count of working days in the half-open range `[from, to)`.
    pub fn working_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if to >= from {
            self.count_working_days(from, to)
        } else {
            -self.count_working_days(to, from)
        }
    }

    fn count_working_days(&self, start: NaiveDate, end_exclusive: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;
        while current < end_exclusive {
            if self.is_working_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// All working days in the half-open window `[start, end)`.
    pub fn working_days_in_window(
        &self,
        start: NaiveDate,
        end_exclusive: NaiveDate,
    ) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current < end_exclusive {
            if self.is_working_day(current) {
                days.push(current);
            }
            current = current + Duration::days(1);
        }
        days
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let mut working = Vec::new();
        for day in WorkCalendar::ALL_WEEKDAYS {
            if !calendar.non_working_days.contains(&day) {
                working.push(day);
            }
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days: working,
            holidays,
        }
    }
}

/// Named work calendars shared by every activity in a project.
///
/// Activities carry a calendar id; the set resolves it to concrete working
/// days. Unknown ids and calendars without a single working weekday both
/// surface as `InvalidCalendar` instead of silently degrading dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSet {
    calendars: BTreeMap<String, WorkCalendar>,
}

impl CalendarSet {
    /// One five-day "standard" calendar spanning the given years.
    pub fn standard(start_year: i32, end_year: i32) -> Self {
        let mut calendars = BTreeMap::new();
        calendars.insert(
            DEFAULT_CALENDAR_ID.to_string(),
            WorkCalendar::with_year_range(start_year, end_year),
        );
        Self { calendars }
    }

    pub fn insert(
        &mut self,
        calendar_id: impl Into<String>,
        calendar: WorkCalendar,
    ) -> Result<(), ScheduleError> {
        let calendar_id = calendar_id.into();
        if !calendar.has_working_weekday() {
            return Err(ScheduleError::InvalidCalendar { calendar_id });
        }
        self.calendars.insert(calendar_id, calendar);
        Ok(())
    }

    pub fn resolve(&self, calendar_id: &str) -> Result<&WorkCalendar, ScheduleError> {
        self.calendars
            .get(calendar_id)
            .filter(|calendar| calendar.has_working_weekday())
            .ok_or_else(|| ScheduleError::InvalidCalendar {
                calendar_id: calendar_id.to_string(),
            })
    }

    pub fn contains(&self, calendar_id: &str) -> bool {
        self.calendars.contains_key(calendar_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WorkCalendar)> {
        self.calendars.iter()
    }
}

impl Default for CalendarSet {
    fn default() -> Self {
        Self::standard(2026, 2026)
    }
}
