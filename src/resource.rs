use crate::calendar::WorkCalendar;
use crate::error::ScheduleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A capacity-bearing pool: a trade crew, an equipment class, a material
/// delivery stream. Shared read-only input to a solve; activities reference
/// definitions by id and never own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub id: String,
    pub name: String,
    /// Maximum units deployable on any single working day.
    pub availability_per_day: f64,
    /// Currency per unit per working day.
    pub cost_rate: f64,
}

impl ResourceDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, availability_per_day: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            availability_per_day,
            cost_rate: 0.0,
        }
    }

    pub fn with_cost_rate(mut self, cost_rate: f64) -> Self {
        self.cost_rate = cost_rate;
        self
    }
}

/// Catalog of resource definitions keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCatalog {
    resources: BTreeMap<String, ResourceDefinition>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: ResourceDefinition) {
        self.resources.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, resource_id: &str) -> Option<&ResourceDefinition> {
        self.resources.get(resource_id)
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.resources.contains_key(resource_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Shape of an assignment's daily demand across the activity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandProfile {
    /// Full quantity on every working day of the window.
    #[default]
    Flat,
    /// Quantity decays geometrically day over day; the decay factor comes
    /// from `LevelingConfig`, never from a hidden constant.
    FrontLoaded,
}

/// Links an activity to a resource definition with a crew-size quantity.
/// Owned by the activity; the definition stays in the shared catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub resource_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub profile: DemandProfile,
}

impl ResourceAssignment {
    pub fn new(resource_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            quantity,
            profile: DemandProfile::Flat,
        }
    }

    pub fn with_profile(mut self, profile: DemandProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn validate(&self, activity_id: i32, catalog: &ResourceCatalog) -> Result<(), ScheduleError> {
        if !catalog.contains(&self.resource_id) {
            return Err(ScheduleError::UnknownResource {
                activity_id,
                resource_id: self.resource_id.clone(),
            });
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ScheduleError::NonPositiveQuantity {
                activity_id,
                resource_id: self.resource_id.clone(),
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Time-phased demand one assignment places on one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCurve {
    pub activity_id: i32,
    pub resource_id: String,
    /// (working day, units demanded), ascending by date.
    pub daily: Vec<(NaiveDate, f64)>,
}

impl DemandCurve {
    /// Phase an assignment across the working days of `[start, finish)`.
    ///
    /// `front_load_decay` applies only to front-loaded profiles: day `i`
    /// demands `quantity * decay^i`.
    pub fn build(
        activity_id: i32,
        assignment: &ResourceAssignment,
        calendar: &WorkCalendar,
        start: NaiveDate,
        finish: NaiveDate,
        front_load_decay: f64,
    ) -> Self {
        let days = calendar.working_days_in_window(start, finish);
        let daily = days
            .into_iter()
            .enumerate()
            .map(|(i, day)| {
                let units = match assignment.profile {
                    DemandProfile::Flat => assignment.quantity,
                    DemandProfile::FrontLoaded => {
                        assignment.quantity * front_load_decay.powi(i as i32)
                    }
                };
                (day, units)
            })
            .collect();

        Self {
            activity_id,
            resource_id: assignment.resource_id.clone(),
            daily,
        }
    }
}
