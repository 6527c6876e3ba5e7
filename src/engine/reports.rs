use std::collections::BTreeMap;

use chrono::{Datelike, Month, NaiveDate};

use crate::model::*;

// ── Schedule views ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    /// Appointments in the same calendar month as `today`.
    Month,
    /// Appointments in the same ISO week as `today`.
    Week,
}

pub fn filter_view(snapshot: &AppointmentSnapshot, filter: ViewFilter, today: NaiveDate) -> Vec<Appointment> {
    snapshot
        .iter()
        .filter(|a| {
            let date = a.date();
            match filter {
                ViewFilter::All => true,
                ViewFilter::Month => date.year() == today.year() && date.month() == today.month(),
                ViewFilter::Week => date.iso_week() == today.iso_week(),
            }
        })
        .cloned()
        .collect()
}

/// Appointments to remove before the customer row itself can be deleted.
pub fn appointments_for_customer(snapshot: &AppointmentSnapshot, customer_id: CustomerId) -> Vec<Appointment> {
    snapshot
        .iter()
        .filter(|a| a.customer_id == customer_id)
        .cloned()
        .collect()
}

// ── Reports ──────────────────────────────────────────────────────

/// type → month number (1–12) → count.
pub fn count_by_type_then_month(snapshot: &AppointmentSnapshot) -> BTreeMap<String, BTreeMap<u32, usize>> {
    let mut counts: BTreeMap<String, BTreeMap<u32, usize>> = BTreeMap::new();
    for a in snapshot {
        *counts
            .entry(a.kind.clone())
            .or_default()
            .entry(a.date().month())
            .or_default() += 1;
    }
    counts
}

pub fn count_by_date(snapshot: &AppointmentSnapshot) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for a in snapshot {
        *counts.entry(a.date()).or_default() += 1;
    }
    counts
}

/// Contact name → that contact's appointments, in snapshot order.
pub fn group_by_contact(snapshot: &AppointmentSnapshot) -> BTreeMap<String, Vec<Appointment>> {
    let mut groups: BTreeMap<String, Vec<Appointment>> = BTreeMap::new();
    for a in snapshot {
        groups.entry(a.contact.clone()).or_default().push(a.clone());
    }
    groups
}

pub fn render_type_then_month(counts: &BTreeMap<String, BTreeMap<u32, usize>>) -> String {
    counts
        .iter()
        .map(|(kind, months)| {
            let lines: Vec<String> = months
                .iter()
                .map(|(month, n)| format!("\t{}: {n}", month_name(*month)))
                .collect();
            format!("{kind}:\n{}", lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_by_date(counts: &BTreeMap<NaiveDate, usize>) -> String {
    counts
        .iter()
        .map(|(date, n)| format!("{}: {n}", date.format("%Y-%m-%d")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_by_contact(groups: &BTreeMap<String, Vec<Appointment>>) -> String {
    groups
        .iter()
        .map(|(contact, appointments)| {
            let lines: Vec<String> = appointments
                .iter()
                .map(|a| {
                    format!(
                        "Appointment ID: {}\n\tTitle: {}, Type: {}, Description: {}, Start: {}, End: {}, Customer ID: {}",
                        a.id,
                        a.title,
                        a.kind,
                        a.description,
                        a.start.format("%Y-%m-%d %H:%M"),
                        a.end.format("%Y-%m-%d %H:%M"),
                        a.customer_id,
                    )
                })
                .collect();
            format!("{contact}:\n{}", lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or_else(|| month.to_string(), |m| m.name().to_string())
}
