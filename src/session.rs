use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::config::{RulesConfig, SchedulerConfig};
use crate::engine::{BusinessHours, ScheduleError, find_conflicts};
use crate::form::{FormError, FormValidationEngine, slots};
use crate::limits::UNSAVED_ID;
use crate::model::*;
use crate::observability::{CONFLICTS_FOUND, SUBMISSIONS_TOTAL, outcome_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Update(AppointmentId),
}

impl EditMode {
    /// Id to leave out of the overlap check.
    pub fn exclude_id(self) -> Option<AppointmentId> {
        match self {
            EditMode::Create => None,
            EditMode::Update(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Adding a new appointment.
    New,
    /// Updating a loaded appointment.
    Editing,
    ReadyToSubmit,
    /// Last submit was refused; cleared by `acknowledge` or the next `sync`.
    Rejected(ScheduleError),
    Accepted(Appointment),
}

/// One add/update form lifecycle.
#[derive(Debug, Clone)]
pub struct AppointmentEditSession {
    mode: EditMode,
    original: Option<Appointment>,
    rules: RulesConfig,
    hours: BusinessHours,
    local_zone: Tz,
    state: SessionState,
}

impl AppointmentEditSession {
    pub fn create(config: &SchedulerConfig) -> Self {
        Self::start(config, EditMode::Create, None)
    }

    pub fn edit(config: &SchedulerConfig, appointment: Appointment) -> Self {
        Self::start(config, EditMode::Update(appointment.id), Some(appointment))
    }

    fn start(config: &SchedulerConfig, mode: EditMode, original: Option<Appointment>) -> Self {
        debug!("edit session opened: {mode:?}");
        let mut session = Self {
            mode,
            original,
            rules: config.rules,
            hours: config.business_hours,
            local_zone: config.local_zone,
            state: SessionState::New,
        };
        session.state = session.base_state();
        session
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn original(&self) -> Option<&Appointment> {
        self.original.as_ref()
    }

    fn base_state(&self) -> SessionState {
        match self.mode {
            EditMode::Create => SessionState::New,
            EditMode::Update(_) => SessionState::Editing,
        }
    }

    /// Fill every appointment slot from the loaded appointment.
    pub fn populate(&self, form: &mut FormValidationEngine) -> Result<(), FormError> {
        let Some(a) = &self.original else {
            return Ok(());
        };
        form.set_text(slots::TITLE, a.title.as_str())?;
        form.set_text(slots::DESCRIPTION, a.description.as_str())?;
        form.set_text(slots::LOCATION, a.location.as_str())?;
        form.set_text(slots::TYPE, a.kind.as_str())?;
        form.select(slots::CONTACT, Some(a.contact.as_str()))?;
        form.select(slots::CUSTOMER, Some(a.customer_id.to_string()))?;
        form.select(slots::USER, Some(a.user_id.to_string()))?;
        form.set_date(slots::START_DATE, Some(a.start.date()))?;
        form.select(slots::START_HOUR, Some(a.start.hour().to_string()))?;
        form.select(slots::START_MINUTE, Some(a.start.minute().to_string()))?;
        if form.has_slot(slots::END_DATE) {
            form.set_date(slots::END_DATE, Some(a.end.date()))?;
        }
        form.select(slots::END_HOUR, Some(a.end.hour().to_string()))?;
        form.select(slots::END_MINUTE, Some(a.end.minute().to_string()))?;
        Ok(())
    }

    /// Follow the form's submit flag: `New`/`Editing` ⇄ `ReadyToSubmit`.
    /// A pending rejection is dropped first. `Accepted` is final.
    pub fn sync(&mut self, form: &FormValidationEngine) -> &SessionState {
        if matches!(self.state, SessionState::Accepted(_)) {
            return &self.state;
        }
        self.state = if form.is_submit_enabled() {
            SessionState::ReadyToSubmit
        } else {
            self.base_state()
        };
        &self.state
    }

    /// The user dismissed the rejection alert.
    pub fn acknowledge(&mut self) {
        if matches!(self.state, SessionState::Rejected(_)) {
            self.state = self.base_state();
        }
    }

    /// Validate the form's candidate against business hours and the snapshot.
    ///
    /// Checks run in order: end after start, start not in the past, business
    /// hours, overlap. The first failure is returned. On success the session is
    /// `Accepted` and the candidate is handed back for the caller to persist.
    pub fn submit(
        &mut self,
        form: &FormValidationEngine,
        snapshot: &AppointmentSnapshot,
        now: NaiveDateTime,
    ) -> Result<Appointment, ScheduleError> {
        if matches!(self.state, SessionState::Accepted(_)) {
            return Err(ScheduleError::SessionClosed);
        }
        if *self.sync(form) != SessionState::ReadyToSubmit {
            debug!("submit ignored: form incomplete");
            return Err(ScheduleError::ValidationIncomplete);
        }

        let result = self
            .candidate(form)
            .and_then(|candidate| self.check(&candidate, snapshot, now).map(|()| candidate));
        metrics::counter!(SUBMISSIONS_TOTAL, "outcome" => outcome_label(&result)).increment(1);

        match &result {
            Ok(candidate) => {
                info!(
                    "appointment accepted: {:?} {} - {} ({} min)",
                    self.mode,
                    candidate.start,
                    candidate.end,
                    candidate.span().duration().num_minutes()
                );
                self.state = SessionState::Accepted(candidate.clone());
            }
            Err(e) if e.is_recoverable() => {
                warn!("appointment rejected: {e}");
                self.state = SessionState::Rejected(e.clone());
            }
            Err(e) => {
                warn!("submit failed: {e}");
                self.state = self.base_state();
            }
        }
        result
    }

    /// Undo an acceptance whose appointment could not be persisted.
    pub(crate) fn revert(&mut self) {
        if matches!(self.state, SessionState::Accepted(_)) {
            self.state = self.base_state();
        }
    }

    pub fn cancel(self) {
        info!("edit session cancelled: {:?}", self.mode);
    }

    fn check(
        &self,
        candidate: &Appointment,
        snapshot: &AppointmentSnapshot,
        now: NaiveDateTime,
    ) -> Result<(), ScheduleError> {
        let span = candidate.span();
        if self.rules.require_end_after_start && !span.is_well_formed() {
            return Err(ScheduleError::EndNotAfterStart);
        }
        if self.rules.reject_past_start && candidate.start < now {
            return Err(ScheduleError::StartInPast);
        }
        if self.rules.enforce_business_hours
            && !self
                .hours
                .is_within_business_hours(self.local_zone, candidate.start, candidate.end)?
        {
            return Err(self.hours.rejection());
        }

        let key = self.rules.conflict_scope.key_for(candidate);
        let conflicts = find_conflicts(snapshot, &key, &span, self.mode.exclude_id());
        if !conflicts.is_empty() {
            metrics::histogram!(CONFLICTS_FOUND).record(conflicts.len() as f64);
            return Err(ScheduleError::SchedulingConflict(conflicts));
        }
        Ok(())
    }

    fn candidate(&self, form: &FormValidationEngine) -> Result<Appointment, ScheduleError> {
        let start_date = required_date(form, slots::START_DATE)?;
        let end_date = form.date(slots::END_DATE).unwrap_or(start_date);
        Ok(Appointment {
            id: self.mode.exclude_id().unwrap_or(UNSAVED_ID),
            title: required_text(form, slots::TITLE)?,
            description: required_text(form, slots::DESCRIPTION)?,
            location: required_text(form, slots::LOCATION)?,
            kind: required_text(form, slots::TYPE)?,
            start: start_date.and_time(time_of_day(form, slots::START_HOUR, slots::START_MINUTE)?),
            end: end_date.and_time(time_of_day(form, slots::END_HOUR, slots::END_MINUTE)?),
            contact: required_selection(form, slots::CONTACT)?.to_string(),
            customer_id: parse_selection(form, slots::CUSTOMER)?,
            user_id: parse_selection(form, slots::USER)?,
        })
    }
}

fn missing(slot: &str) -> ScheduleError {
    ScheduleError::InvalidInput {
        slot: slot.to_string(),
        value: String::new(),
    }
}

fn required_text(form: &FormValidationEngine, slot: &str) -> Result<String, ScheduleError> {
    form.text(slot)
        .map(|t| t.trim().to_string())
        .ok_or_else(|| missing(slot))
}

fn required_selection<'a>(form: &'a FormValidationEngine, slot: &str) -> Result<&'a str, ScheduleError> {
    form.selection(slot).ok_or_else(|| missing(slot))
}

fn required_date(form: &FormValidationEngine, slot: &str) -> Result<NaiveDate, ScheduleError> {
    form.date(slot).ok_or_else(|| missing(slot))
}

fn parse_selection<T: std::str::FromStr>(form: &FormValidationEngine, slot: &str) -> Result<T, ScheduleError> {
    let raw = required_selection(form, slot)?;
    raw.trim().parse().map_err(|_| ScheduleError::InvalidInput {
        slot: slot.to_string(),
        value: raw.to_string(),
    })
}

fn time_of_day(form: &FormValidationEngine, hour_slot: &str, minute_slot: &str) -> Result<NaiveTime, ScheduleError> {
    let hour: u32 = parse_selection(form, hour_slot)?;
    let minute: u32 = parse_selection(form, minute_slot)?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ScheduleError::InvalidInput {
        slot: hour_slot.to_string(),
        value: format!("{hour}:{minute:02}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig::with_local_zone(New_York)
    }

    fn existing(id: AppointmentId, customer_id: CustomerId, start: &str, end: &str) -> Appointment {
        Appointment {
            id,
            title: "Review".into(),
            description: "Quarterly".into(),
            location: "Phoenix".into(),
            kind: "Planning".into(),
            start: at(start),
            end: at(end),
            contact: "Anika Costa".into(),
            customer_id,
            user_id: 1,
        }
    }

    fn form_for(config: &SchedulerConfig, start: &str, end: &str, customer: CustomerId) -> FormValidationEngine {
        let start = at(start);
        let end = at(end);
        let mut form = FormValidationEngine::appointment_form(&config.rules, start.date());
        form.set_text(slots::TITLE, "Consult").unwrap();
        form.set_text(slots::DESCRIPTION, "Follow-up").unwrap();
        form.set_text(slots::LOCATION, "White Plains").unwrap();
        form.set_text(slots::TYPE, "Check-in").unwrap();
        form.select(slots::CONTACT, Some("Li Lee")).unwrap();
        form.select(slots::CUSTOMER, Some(customer.to_string())).unwrap();
        form.select(slots::USER, Some("2")).unwrap();
        form.set_date(slots::START_DATE, Some(start.date())).unwrap();
        form.select(slots::START_HOUR, Some(start.hour().to_string())).unwrap();
        form.select(slots::START_MINUTE, Some(start.minute().to_string())).unwrap();
        form.set_date(slots::END_DATE, Some(end.date())).unwrap();
        form.select(slots::END_HOUR, Some(end.hour().to_string())).unwrap();
        form.select(slots::END_MINUTE, Some(end.minute().to_string())).unwrap();
        form
    }

    #[test]
    fn initial_state_follows_mode() {
        let config = config();
        assert_eq!(AppointmentEditSession::create(&config).state(), &SessionState::New);
        let edit = AppointmentEditSession::edit(&config, existing(4, 1, "2024-01-10 09:00", "2024-01-10 10:00"));
        assert_eq!(edit.state(), &SessionState::Editing);
        assert_eq!(edit.mode(), EditMode::Update(4));
    }

    #[test]
    fn sync_tracks_form_validity() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let mut form = form_for(&config, "2024-01-10 10:00", "2024-01-10 10:30", 1);
        assert_eq!(session.sync(&form), &SessionState::ReadyToSubmit);
        form.set_text(slots::TITLE, "").unwrap();
        assert_eq!(session.sync(&form), &SessionState::New);
    }

    #[test]
    fn incomplete_form_cannot_submit() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let form = FormValidationEngine::appointment_form(&config.rules, at("2024-01-10 00:00").date());
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap_err();
        assert_eq!(err, ScheduleError::ValidationIncomplete);
        assert_eq!(session.state(), &SessionState::New);
    }

    #[test]
    fn accepted_candidate_carries_form_values() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let form = form_for(&config, "2024-01-10 10:00", "2024-01-10 10:30", 3);
        let accepted = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap();
        assert_eq!(accepted.id, UNSAVED_ID);
        assert_eq!(accepted.customer_id, 3);
        assert_eq!(accepted.user_id, 2);
        assert_eq!(accepted.contact, "Li Lee");
        assert_eq!(accepted.start, at("2024-01-10 10:00"));
        assert_eq!(accepted.end, at("2024-01-10 10:30"));
        assert_eq!(session.state(), &SessionState::Accepted(accepted.clone()));

        let again = session.submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"));
        assert_eq!(again, Err(ScheduleError::SessionClosed));
    }

    #[test]
    fn out_of_hours_rejected_then_recoverable() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let mut form = form_for(&config, "2024-01-10 07:00", "2024-01-10 07:30", 1);
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfBusinessHours { .. }));
        assert_eq!(session.state(), &SessionState::Rejected(err));

        session.acknowledge();
        assert_eq!(session.state(), &SessionState::New);

        form.select(slots::START_HOUR, Some("8")).unwrap();
        form.select(slots::END_HOUR, Some("8")).unwrap();
        assert!(session.submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00")).is_ok());
    }

    #[test]
    fn business_hours_can_be_disabled() {
        let mut config = config();
        config.rules.enforce_business_hours = false;
        let mut session = AppointmentEditSession::create(&config);
        let form = form_for(&config, "2024-01-10 06:00", "2024-01-10 06:30", 1);
        assert!(session.submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00")).is_ok());
    }

    #[test]
    fn end_before_start_is_its_own_rule() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let form = form_for(&config, "2024-01-10 11:00", "2024-01-10 10:00", 1);
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap_err();
        assert_eq!(err, ScheduleError::EndNotAfterStart);

        let mut lax = config.clone();
        lax.rules.require_end_after_start = false;
        let mut session = AppointmentEditSession::create(&lax);
        assert!(session.submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00")).is_ok());
    }

    #[test]
    fn past_start_rejected_when_enabled() {
        let mut config = config();
        config.rules.reject_past_start = true;
        let mut session = AppointmentEditSession::create(&config);
        let form = form_for(&config, "2024-01-10 10:00", "2024-01-10 10:30", 1);
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-10 10:01"))
            .unwrap_err();
        assert_eq!(err, ScheduleError::StartInPast);
    }

    #[test]
    fn editing_excludes_own_prior_version() {
        let config = config();
        let original = existing(7, 1, "2024-01-10 09:00", "2024-01-10 10:00");
        let snapshot = AppointmentSnapshot::new(vec![original.clone()]);
        let mut session = AppointmentEditSession::edit(&config, original);
        let form = form_for(&config, "2024-01-10 09:30", "2024-01-10 10:30", 1);
        let updated = session.submit(&form, &snapshot, at("2024-01-09 12:00")).unwrap();
        assert_eq!(updated.id, 7);

        let mut fresh = AppointmentEditSession::create(&config);
        let err = fresh.submit(&form, &snapshot, at("2024-01-09 12:00")).unwrap_err();
        assert!(matches!(err, ScheduleError::SchedulingConflict(ref c) if c.len() == 1 && c[0].id == 7));
    }

    #[test]
    fn unparseable_selection_is_invalid_input() {
        let config = config();
        let mut session = AppointmentEditSession::create(&config);
        let mut form = form_for(&config, "2024-01-10 10:00", "2024-01-10 10:30", 1);
        form.select(slots::END_HOUR, Some("24")).unwrap();
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInput { ref slot, .. } if slot == slots::END_HOUR));

        form.select(slots::END_HOUR, Some("10")).unwrap();
        form.select(slots::CUSTOMER, Some("abc")).unwrap();
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2024-01-09 12:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInput { ref slot, .. } if slot == slots::CUSTOMER));
    }

    #[test]
    fn populate_round_trips_loaded_appointment() {
        let config = config();
        let original = existing(9, 5, "2024-01-10 13:15", "2024-01-10 14:45");
        let session = AppointmentEditSession::edit(&config, original.clone());
        let mut form = FormValidationEngine::appointment_form(&config.rules, original.date());
        session.populate(&mut form).unwrap();
        assert!(form.is_submit_enabled());

        let mut session = session;
        let resubmitted = session
            .submit(&form, &AppointmentSnapshot::new(vec![original.clone()]), at("2024-01-09 12:00"))
            .unwrap();
        assert_eq!(resubmitted, original);
    }

    #[test]
    fn configuration_error_returns_to_prior_state() {
        let mut config = config();
        // Apia skipped 2011-12-30 entirely.
        config.local_zone = chrono_tz::Pacific::Apia;
        let mut session = AppointmentEditSession::create(&config);
        let form = form_for(&config, "2011-12-30 10:00", "2011-12-30 10:30", 1);
        let err = session
            .submit(&form, &AppointmentSnapshot::default(), at("2011-12-01 12:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
        assert_eq!(session.state(), &SessionState::New);
    }
}
