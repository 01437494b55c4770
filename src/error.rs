use std::fmt;

/// Error taxonomy for the scheduling engine.
///
/// Structural and input-validation variants abort a solve before any output
/// is produced. Soft conditions (residual over-allocation, undefined
/// performance ratios) are returned as data, never through this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The relationship graph contains at least one cycle. Carries the ids
    /// of every activity still locked in a cycle after Kahn's algorithm ran.
    CycleDetected { activity_ids: Vec<i32> },
    DuplicateActivity { id: i32 },
    /// A relationship references an activity id that does not exist.
    DanglingRelationship { from: i32, to: i32 },
    /// The graph has activities but no sink to anchor the backward pass.
    NoTerminalActivity,
    NegativeDuration { id: i32, duration_days: i64 },
    UnknownResource { activity_id: i32, resource_id: String },
    /// Unknown calendar id, or a calendar with no working weekday at all.
    InvalidCalendar { calendar_id: String },
    NonPositiveQuantity {
        activity_id: i32,
        resource_id: String,
        quantity: f64,
    },
    /// Input field failed validation (percent-complete range, malformed
    /// dependency payload, horizon ordering).
    Validation(String),
    /// Wrapped failure from the underlying frame store.
    Computation(String),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::CycleDetected { activity_ids } => {
                let ids = activity_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "dependency cycle detected among activities [{ids}]")
            }
            ScheduleError::DuplicateActivity { id } => {
                write!(f, "duplicate activity id {id}")
            }
            ScheduleError::DanglingRelationship { from, to } => {
                write!(
                    f,
                    "relationship {from} -> {to} references an unknown activity"
                )
            }
            ScheduleError::NoTerminalActivity => {
                write!(f, "activity network has no terminal activity")
            }
            ScheduleError::NegativeDuration { id, duration_days } => {
                write!(f, "activity {id} has negative duration {duration_days}")
            }
            ScheduleError::UnknownResource {
                activity_id,
                resource_id,
            } => write!(
                f,
                "activity {activity_id} references unknown resource '{resource_id}'"
            ),
            ScheduleError::InvalidCalendar { calendar_id } => {
                write!(f, "calendar '{calendar_id}' is unknown or has no working days")
            }
            ScheduleError::NonPositiveQuantity {
                activity_id,
                resource_id,
                quantity,
            } => write!(
                f,
                "activity {activity_id} assigns non-positive quantity {quantity} of '{resource_id}'"
            ),
            ScheduleError::Validation(message) => write!(f, "{message}"),
            ScheduleError::Computation(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<polars::prelude::PolarsError> for ScheduleError {
    fn from(value: polars::prelude::PolarsError) -> Self {
        ScheduleError::Computation(value.to_string())
    }
}
