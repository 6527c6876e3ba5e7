//! Reactive form validation.
//!
//! A form is a fixed set of named slots (limited text, single selection,
//! optional date) plus pluggable date rules. Every slot update re-evaluates the
//! whole form into a fresh [`FormState`]; nothing is diffed or cached across
//! updates. Rendering is left to whoever subscribes with
//! [`FormValidationEngine::on_change`].

use chrono::NaiveDate;

use crate::config::RulesConfig;
use crate::limits::{ADDRESS_FIELD_LIMIT, SHORT_FIELD_LIMIT};

/// Slot names used by the appointment and customer forms.
pub mod slots {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const LOCATION: &str = "location";
    pub const TYPE: &str = "type";
    pub const CONTACT: &str = "contact";
    pub const CUSTOMER: &str = "customer";
    pub const USER: &str = "user";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const START_HOUR: &str = "start_hour";
    pub const START_MINUTE: &str = "start_minute";
    pub const END_HOUR: &str = "end_hour";
    pub const END_MINUTE: &str = "end_minute";

    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const POSTAL_CODE: &str = "postal_code";
    pub const PHONE: &str = "phone";
    pub const COUNTRY: &str = "country";
    pub const DIVISION: &str = "division";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Ok,
    /// Text longer than its limit; the UI shows the "exceeds limit" hint.
    OverLimit,
    Empty,
}

/// New value for a slot, as delivered by a UI change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotInput {
    Text(String),
    Selection(Option<String>),
    Date(Option<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Text { limit: usize, value: String },
    Selection(Option<String>),
    Date(Option<NaiveDate>),
}

impl Slot {
    fn status(&self) -> FieldStatus {
        match self {
            Slot::Text { value, .. } if value.trim().is_empty() => FieldStatus::Empty,
            Slot::Text { limit, value } if value.chars().count() > *limit => FieldStatus::OverLimit,
            Slot::Text { .. } => FieldStatus::Ok,
            Slot::Selection(None) | Slot::Date(None) => FieldStatus::Empty,
            Slot::Selection(Some(_)) | Slot::Date(Some(_)) => FieldStatus::Ok,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Slot::Text { .. } => "text",
            Slot::Selection(_) => "selection",
            Slot::Date(_) => "date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownSlot(String),
    KindMismatch { slot: String, expected: &'static str },
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::UnknownSlot(name) => write!(f, "unknown form slot: {name}"),
            FormError::KindMismatch { slot, expected } => {
                write!(f, "slot {slot} expects a {expected} value")
            }
        }
    }
}

impl std::error::Error for FormError {}

// ── Date rules ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRuleViolation {
    BeforeToday { slot: String },
    EndBeforeStart { start: String, end: String },
    Custom(String),
}

impl std::fmt::Display for DateRuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRuleViolation::BeforeToday { slot } => write!(f, "{slot} is before the current date"),
            DateRuleViolation::EndBeforeStart { start, end } => write!(f, "{end} is before {start}"),
            DateRuleViolation::Custom(msg) => f.write_str(msg),
        }
    }
}

/// Chosen dates, by slot name, as seen by date rules.
pub struct DateValues<'a> {
    slots: &'a [(String, Slot)],
}

impl DateValues<'_> {
    pub fn get(&self, name: &str) -> Option<NaiveDate> {
        self.slots.iter().find_map(|(n, slot)| match slot {
            Slot::Date(date) if n == name => *date,
            _ => None,
        })
    }
}

/// Cross-slot date predicate. Rules only see dates that are chosen; an empty
/// date slot is already reported as `Empty`.
pub trait DateRule {
    fn check(&self, dates: &DateValues<'_>) -> Option<DateRuleViolation>;
}

impl<F> DateRule for F
where
    F: Fn(&DateValues<'_>) -> Option<DateRuleViolation>,
{
    fn check(&self, dates: &DateValues<'_>) -> Option<DateRuleViolation> {
        self(dates)
    }
}

/// A chosen date strictly before `today` is rejected.
#[derive(Debug, Clone)]
pub struct NotBeforeToday {
    pub slot: String,
    pub today: NaiveDate,
}

impl DateRule for NotBeforeToday {
    fn check(&self, dates: &DateValues<'_>) -> Option<DateRuleViolation> {
        let date = dates.get(&self.slot)?;
        (date < self.today).then(|| DateRuleViolation::BeforeToday {
            slot: self.slot.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EndNotBeforeStart {
    pub start: String,
    pub end: String,
}

impl DateRule for EndNotBeforeStart {
    fn check(&self, dates: &DateValues<'_>) -> Option<DateRuleViolation> {
        let start = dates.get(&self.start)?;
        let end = dates.get(&self.end)?;
        (end < start).then(|| DateRuleViolation::EndBeforeStart {
            start: self.start.clone(),
            end: self.end.clone(),
        })
    }
}

// ── Engine ───────────────────────────────────────────────────────

/// Result of one full evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub statuses: Vec<(String, FieldStatus)>,
    pub date_violations: Vec<DateRuleViolation>,
    pub submit_enabled: bool,
}

impl FormState {
    pub fn status(&self, name: &str) -> Option<FieldStatus> {
        self.statuses
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, status)| *status)
    }

    /// Slots to render with the "exceeds limit" hint.
    pub fn limit_hints(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == FieldStatus::OverLimit)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

type Listener = Box<dyn FnMut(&FormState)>;

#[derive(Default)]
pub struct FormBuilder {
    slots: Vec<(String, Slot)>,
    rules: Vec<Box<dyn DateRule>>,
}

impl FormBuilder {
    pub fn text(self, name: &str, limit: usize) -> Self {
        self.slot(name, Slot::Text {
            limit,
            value: String::new(),
        })
    }

    pub fn selection(self, name: &str) -> Self {
        self.slot(name, Slot::Selection(None))
    }

    pub fn date(self, name: &str) -> Self {
        self.slot(name, Slot::Date(None))
    }

    pub fn date_rule(mut self, rule: impl DateRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Closure form of [`FormBuilder::date_rule`].
    pub fn date_check<F>(self, check: F) -> Self
    where
        F: Fn(&DateValues<'_>) -> Option<DateRuleViolation> + 'static,
    {
        self.date_rule(check)
    }

    pub fn build(self) -> FormValidationEngine {
        let mut engine = FormValidationEngine {
            slots: self.slots,
            rules: self.rules,
            listeners: Vec::new(),
            state: FormState::default(),
        };
        engine.recompute();
        engine
    }

    fn slot(mut self, name: &str, slot: Slot) -> Self {
        match self.slots.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = slot,
            None => self.slots.push((name.to_string(), slot)),
        }
        self
    }
}

pub struct FormValidationEngine {
    slots: Vec<(String, Slot)>,
    rules: Vec<Box<dyn DateRule>>,
    listeners: Vec<Listener>,
    state: FormState,
}

impl std::fmt::Debug for FormValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidationEngine")
            .field("slots", &self.slots)
            .field("rules", &self.rules.len())
            .field("listeners", &self.listeners.len())
            .field("state", &self.state)
            .finish()
    }
}

impl FormValidationEngine {
    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    /// Title, description, location and type at the short limit; contact,
    /// customer, user and the four hour/minute pickers as selections; start and
    /// end dates. Date ordering rules are added when `rules.date_ordering`.
    pub fn appointment_form(rules: &RulesConfig, today: NaiveDate) -> Self {
        use slots::*;
        let mut builder = Self::builder()
            .text(TITLE, SHORT_FIELD_LIMIT)
            .text(DESCRIPTION, SHORT_FIELD_LIMIT)
            .text(LOCATION, SHORT_FIELD_LIMIT)
            .text(TYPE, SHORT_FIELD_LIMIT)
            .selection(CONTACT)
            .selection(CUSTOMER)
            .selection(USER)
            .selection(START_HOUR)
            .selection(START_MINUTE)
            .selection(END_HOUR)
            .selection(END_MINUTE)
            .date(START_DATE)
            .date(END_DATE);
        if rules.date_ordering {
            builder = builder
                .date_rule(NotBeforeToday {
                    slot: START_DATE.into(),
                    today,
                })
                .date_rule(EndNotBeforeStart {
                    start: START_DATE.into(),
                    end: END_DATE.into(),
                });
        }
        builder.build()
    }

    pub fn customer_form() -> Self {
        use slots::*;
        Self::builder()
            .text(NAME, SHORT_FIELD_LIMIT)
            .text(ADDRESS, ADDRESS_FIELD_LIMIT)
            .text(POSTAL_CODE, SHORT_FIELD_LIMIT)
            .text(PHONE, SHORT_FIELD_LIMIT)
            .selection(COUNTRY)
            .selection(DIVISION)
            .build()
    }

    /// Apply one change event and re-evaluate every slot.
    pub fn update_slot(&mut self, name: &str, input: SlotInput) -> Result<&FormState, FormError> {
        let (_, slot) = self
            .slots
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| FormError::UnknownSlot(name.to_string()))?;
        match (slot, input) {
            (Slot::Text { value, .. }, SlotInput::Text(text)) => *value = text,
            (Slot::Selection(chosen), SlotInput::Selection(option)) => *chosen = option,
            (Slot::Date(chosen), SlotInput::Date(date)) => *chosen = date,
            (slot, _) => {
                return Err(FormError::KindMismatch {
                    slot: name.to_string(),
                    expected: slot.kind(),
                });
            }
        }
        self.recompute();
        Ok(&self.state)
    }

    pub fn set_text(&mut self, name: &str, text: impl Into<String>) -> Result<&FormState, FormError> {
        self.update_slot(name, SlotInput::Text(text.into()))
    }

    pub fn select(&mut self, name: &str, option: Option<impl Into<String>>) -> Result<&FormState, FormError> {
        self.update_slot(name, SlotInput::Selection(option.map(Into::into)))
    }

    pub fn set_date(&mut self, name: &str, date: Option<NaiveDate>) -> Result<&FormState, FormError> {
        self.update_slot(name, SlotInput::Date(date))
    }

    /// Called with the fresh state after every evaluation.
    pub fn on_change(&mut self, listener: impl FnMut(&FormState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.state.submit_enabled
    }

    pub fn field_status(&self, name: &str) -> Option<FieldStatus> {
        self.state.status(name)
    }

    pub fn limit_hints(&self) -> Vec<&str> {
        self.state.limit_hints()
    }

    pub fn date_violations(&self) -> &[DateRuleViolation] {
        &self.state.date_violations
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.slots.iter().find_map(|(n, slot)| match slot {
            Slot::Text { value, .. } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn selection(&self, name: &str) -> Option<&str> {
        self.slots.iter().find_map(|(n, slot)| match slot {
            Slot::Selection(chosen) if n == name => chosen.as_deref(),
            _ => None,
        })
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        DateValues { slots: &self.slots }.get(name)
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|(n, _)| n == name)
    }

    fn recompute(&mut self) {
        let statuses: Vec<(String, FieldStatus)> = self
            .slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.status()))
            .collect();
        let dates = DateValues { slots: &self.slots };
        let date_violations: Vec<DateRuleViolation> =
            self.rules.iter().filter_map(|rule| rule.check(&dates)).collect();
        let submit_enabled =
            statuses.iter().all(|(_, status)| *status == FieldStatus::Ok) && date_violations.is_empty();

        self.state = FormState {
            statuses,
            date_violations,
            submit_enabled,
        };
        for listener in &mut self.listeners {
            listener(&self.state);
        }
    }
}
