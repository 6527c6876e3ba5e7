use serde::{Deserialize, Serialize};

use crate::model::*;

/// Dimension that must not be double-booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictScope {
    /// Same contact (the staff member running the appointment).
    Contact,
    /// Same customer.
    #[default]
    Customer,
    /// Every appointment, regardless of who it is for.
    All,
}

impl ConflictScope {
    /// Build the grouping key a candidate is checked under.
    pub fn key_for(self, candidate: &Appointment) -> GroupKey {
        match self {
            ConflictScope::Contact => GroupKey::Contact(candidate.contact.clone()),
            ConflictScope::Customer => GroupKey::Customer(candidate.customer_id),
            ConflictScope::All => GroupKey::All,
        }
    }
}

impl std::str::FromStr for ConflictScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" => Ok(ConflictScope::Contact),
            "customer" => Ok(ConflictScope::Customer),
            "all" => Ok(ConflictScope::All),
            other => Err(format!("unknown conflict scope {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Contact(String),
    Customer(CustomerId),
    All,
}

impl GroupKey {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        match self {
            GroupKey::Contact(contact) => appointment.contact == *contact,
            GroupKey::Customer(id) => appointment.customer_id == *id,
            GroupKey::All => true,
        }
    }
}

/// Existing appointments in the same group whose interval overlaps `candidate`.
///
/// Touching endpoints are not a conflict. `exclude` drops the appointment being
/// edited so an update never collides with its own prior version. Results keep
/// snapshot order.
pub fn find_conflicts(
    snapshot: &AppointmentSnapshot,
    key: &GroupKey,
    candidate: &Span,
    exclude: Option<AppointmentId>,
) -> Vec<Appointment> {
    conflicting(snapshot, key, candidate, exclude)
        .cloned()
        .collect()
}

pub fn has_conflict(
    snapshot: &AppointmentSnapshot,
    key: &GroupKey,
    candidate: &Span,
    exclude: Option<AppointmentId>,
) -> bool {
    conflicting(snapshot, key, candidate, exclude)
        .next()
        .is_some()
}

fn conflicting<'a>(
    snapshot: &'a AppointmentSnapshot,
    key: &'a GroupKey,
    candidate: &'a Span,
    exclude: Option<AppointmentId>,
) -> impl Iterator<Item = &'a Appointment> {
    snapshot
        .iter()
        .filter(move |a| exclude != Some(a.id))
        .filter(move |a| key.matches(a))
        .filter(move |a| a.span().overlaps(candidate))
}
