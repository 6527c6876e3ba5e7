use chrono::{Duration, NaiveDateTime};

use crate::model::*;

/// Appointments starting strictly after `now` and strictly before
/// `now + horizon_minutes`. A horizon past chrono's range has no upper bound.
pub fn find_within(snapshot: &AppointmentSnapshot, horizon_minutes: i64, now: NaiveDateTime) -> Vec<Appointment> {
    let horizon = Duration::try_minutes(horizon_minutes).and_then(|d| now.checked_add_signed(d));
    snapshot
        .iter()
        .filter(|a| a.start > now && horizon.is_none_or(|h| a.start < h))
        .cloned()
        .collect()
}

/// Text of the login notice for the result of [`find_within`].
pub fn upcoming_notice(upcoming: &[Appointment], horizon_minutes: i64) -> String {
    if upcoming.is_empty() {
        return format!("There are no upcoming appointments within {horizon_minutes} minutes of the current time.");
    }
    let details: Vec<String> = upcoming
        .iter()
        .map(|a| {
            format!(
                "Appointment ID: {}\n\tDate: {} - Time: {} - {}",
                a.id,
                a.date().format("%Y-%m-%d"),
                a.start.format("%H:%M"),
                a.end.format("%H:%M"),
            )
        })
        .collect();
    format!(
        "The following appointments are scheduled within {horizon_minutes} minutes:\n\n{}",
        details.join("\n\n")
    )
}
