use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::limits::UNSAVED_ID;

pub type AppointmentId = i64;
pub type CustomerId = i64;
pub type UserId = i64;

/// Half-open interval `[start, end)` on the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    /// Ordering is not asserted here; `start < end` is a submit rule.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A scheduled appointment. Never mutated in place: updates produce a new value
/// that replaces the stored row by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: AppointmentId,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub contact: String,
    pub customer_id: CustomerId,
    pub user_id: UserId,
}

impl Appointment {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Calendar date the appointment starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_ID
    }

    pub fn with_id(&self, id: AppointmentId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub address: String,
    pub country: String,
    pub division: String,
    pub postal_code: String,
    pub phone: String,
}

/// Read-only view of every appointment, as last loaded from the store.
/// The store hands out a fresh snapshot after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentSnapshot {
    appointments: Vec<Appointment>,
}

impl AppointmentSnapshot {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self { appointments }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Appointment> {
        self.appointments.iter()
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn as_slice(&self) -> &[Appointment] {
        &self.appointments
    }
}

impl From<Vec<Appointment>> for AppointmentSnapshot {
    fn from(appointments: Vec<Appointment>) -> Self {
        Self::new(appointments)
    }
}

impl FromIterator<Appointment> for AppointmentSnapshot {
    fn from_iter<I: IntoIterator<Item = Appointment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AppointmentSnapshot {
    type Item = &'a Appointment;
    type IntoIter = std::slice::Iter<'a, Appointment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appointment(id: AppointmentId, start: &str, end: &str) -> Appointment {
        Appointment {
            id,
            title: "Checkup".into(),
            description: "Yearly".into(),
            location: "Room 1".into(),
            kind: "Planning".into(),
            start: at(start),
            end: at(end),
            contact: "Anika Costa".into(),
            customer_id: 1,
            user_id: 1,
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(at("2024-01-10 09:00"), at("2024-01-10 10:00"));
        assert_eq!(s.duration(), Duration::minutes(60));
        assert!(s.is_well_formed());
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(at("2024-01-10 10:00"), at("2024-01-10 11:00"));
        let b = Span::new(at("2024-01-10 10:59"), at("2024-01-10 12:00"));
        let c = Span::new(at("2024-01-10 11:00"), at("2024-01-10 12:00"));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn reversed_span_is_not_well_formed() {
        let s = Span::new(at("2024-01-10 11:00"), at("2024-01-10 10:00"));
        assert!(!s.is_well_formed());
        let empty = Span::new(at("2024-01-10 11:00"), at("2024-01-10 11:00"));
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn with_id_leaves_original_untouched() {
        let draft = appointment(UNSAVED_ID, "2024-01-10 09:00", "2024-01-10 10:00");
        let saved = draft.with_id(7);
        assert!(!draft.is_saved());
        assert!(saved.is_saved());
        assert_eq!(saved.id, 7);
        assert_eq!(saved.title, draft.title);
    }

    #[test]
    fn snapshot_lookup_by_id() {
        let snapshot: AppointmentSnapshot = vec![
            appointment(1, "2024-01-10 09:00", "2024-01-10 10:00"),
            appointment(2, "2024-01-10 14:00", "2024-01-10 15:00"),
        ]
        .into();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(2).map(|a| a.start), Some(at("2024-01-10 14:00")));
        assert!(snapshot.get(3).is_none());
    }

    #[test]
    fn appointment_json_uses_type_key() {
        let a = appointment(3, "2024-01-10 09:00", "2024-01-10 10:00");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "Planning");
        assert_eq!(json["start"], "2024-01-10T09:00:00");
        let back: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }
}
