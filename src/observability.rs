use crate::engine::ScheduleError;
use crate::model::Appointment;

/// Counter: submit attempts. Labels: outcome.
pub const SUBMISSIONS_TOTAL: &str = "schedcore_submissions_total";

/// Histogram: number of conflicting appointments per rejected submit.
pub const CONFLICTS_FOUND: &str = "schedcore_conflicts_found";

/// Histogram: appointments inside the lookahead window at login.
pub const UPCOMING_FOUND: &str = "schedcore_upcoming_found";

/// Counter: appointments written or removed through the store. Labels: op.
pub const STORE_WRITES_TOTAL: &str = "schedcore_store_writes_total";

/// Map a submit result to a short label for metrics.
pub fn outcome_label(result: &Result<Appointment, ScheduleError>) -> &'static str {
    match result {
        Ok(_) => "accepted",
        Err(ScheduleError::Configuration(_)) => "configuration_error",
        Err(ScheduleError::OutOfBusinessHours { .. }) => "out_of_business_hours",
        Err(ScheduleError::SchedulingConflict(_)) => "scheduling_conflict",
        Err(ScheduleError::EndNotAfterStart) => "end_not_after_start",
        Err(ScheduleError::StartInPast) => "start_in_past",
        Err(ScheduleError::ValidationIncomplete) => "validation_incomplete",
        Err(ScheduleError::InvalidInput { .. }) => "invalid_input",
        Err(ScheduleError::SessionClosed) => "session_closed",
        Err(ScheduleError::Persistence(_)) => "persistence_error",
    }
}
