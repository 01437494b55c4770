use crate::activity::Activity;
use crate::error::ScheduleError;
use std::collections::HashSet;

const EPSILON: f64 = 1e-6;

pub fn validate_activity(activity: &Activity) -> Result<(), ScheduleError> {
    if activity.duration_days < 0 {
        return Err(ScheduleError::NegativeDuration {
            id: activity.id,
            duration_days: activity.duration_days,
        });
    }

    let pct = activity.percent_complete;
    if !pct.is_finite() || pct < -EPSILON || pct > 100.0 + EPSILON {
        return Err(ScheduleError::Validation(format!(
            "activity {} has invalid percent_complete {} (must be between 0 and 100)",
            activity.id, pct
        )));
    }

    if !activity.actual_cost.is_finite() || activity.actual_cost < -EPSILON {
        return Err(ScheduleError::Validation(format!(
            "activity {} has invalid actual_cost {}",
            activity.id, activity.actual_cost
        )));
    }

    if !activity.budgeted_cost.is_finite() || activity.budgeted_cost < -EPSILON {
        return Err(ScheduleError::Validation(format!(
            "activity {} has invalid budgeted_cost {}",
            activity.id, activity.budgeted_cost
        )));
    }

    for link in &activity.predecessors {
        if link.predecessor_id == activity.id {
            return Err(ScheduleError::Validation(format!(
                "activity {} depends on itself",
                activity.id
            )));
        }
    }

    for assignment in &activity.resource_assignments {
        if assignment.resource_id.trim().is_empty() {
            return Err(ScheduleError::Validation(format!(
                "activity {} has a resource assignment with an empty resource_id",
                activity.id
            )));
        }
        if !assignment.quantity.is_finite() || assignment.quantity <= 0.0 {
            return Err(ScheduleError::NonPositiveQuantity {
                activity_id: activity.id,
                resource_id: assignment.resource_id.clone(),
                quantity: assignment.quantity,
            });
        }
    }

    Ok(())
}

pub fn validate_activity_collection(activities: &[Activity]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(activities.len());
    for activity in activities {
        if !seen_ids.insert(activity.id) {
            return Err(ScheduleError::DuplicateActivity { id: activity.id });
        }
        validate_activity(activity)?;
    }
    Ok(())
}
