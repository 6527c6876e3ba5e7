use chrono::NaiveTime;

use crate::model::{Appointment, AppointmentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Missing or invalid timezone or rules configuration.
    Configuration(String),
    OutOfBusinessHours {
        open: NaiveTime,
        close: NaiveTime,
        zone: String,
    },
    SchedulingConflict(Vec<Appointment>),
    EndNotAfterStart,
    StartInPast,
    /// Submit was attempted while the form still had empty or over-limit slots.
    ValidationIncomplete,
    InvalidInput {
        slot: String,
        value: String,
    },
    /// Submit on a session that already accepted an appointment.
    SessionClosed,
    Persistence(PersistenceError),
}

impl ScheduleError {
    /// Rejections the user can fix by changing the form and resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScheduleError::OutOfBusinessHours { .. }
                | ScheduleError::SchedulingConflict(_)
                | ScheduleError::EndNotAfterStart
                | ScheduleError::StartInPast
                | ScheduleError::ValidationIncomplete
                | ScheduleError::InvalidInput { .. }
        )
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            ScheduleError::OutOfBusinessHours { open, close, zone } => write!(
                f,
                "appointment must start and end between {} and {} {zone}",
                open.format("%H:%M"),
                close.format("%H:%M"),
            ),
            ScheduleError::SchedulingConflict(conflicts) => {
                writeln!(f, "the appointment time conflicts with the following:")?;
                for a in conflicts {
                    writeln!(
                        f,
                        "Appointment ID: {}\n\tDate: {} - Time: {} - {}",
                        a.id,
                        a.date().format("%Y-%m-%d"),
                        a.start.format("%H:%M"),
                        a.end.format("%H:%M"),
                    )?;
                }
                write!(f, "please select a different time slot")
            }
            ScheduleError::EndNotAfterStart => {
                write!(f, "end time is before or on start time")
            }
            ScheduleError::StartInPast => write!(f, "start is before the current date and time"),
            ScheduleError::ValidationIncomplete => {
                write!(f, "form has empty or over-limit fields")
            }
            ScheduleError::InvalidInput { slot, value } => {
                write!(f, "invalid value for {slot}: {value:?}")
            }
            ScheduleError::SessionClosed => write!(f, "edit session already accepted an appointment"),
            ScheduleError::Persistence(e) => write!(f, "persistence error: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for ScheduleError {
    fn from(e: PersistenceError) -> Self {
        ScheduleError::Persistence(e)
    }
}

/// Raised by the persistence collaborator. Opaque to the rules; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    NotFound(AppointmentId),
    Storage(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::NotFound(id) => write!(f, "appointment not found: {id}"),
            PersistenceError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for PersistenceError {}
