mod conflict;
mod error;
mod hours;
mod reports;
mod store;
mod upcoming;

pub use conflict::{ConflictScope, GroupKey, find_conflicts, has_conflict};
pub use error::{PersistenceError, ScheduleError};
pub use hours::{BusinessHours, parse_zone};
pub use reports::{
    ViewFilter, appointments_for_customer, count_by_date, count_by_type_then_month, filter_view,
    group_by_contact, render_by_contact, render_by_date, render_type_then_month,
};
pub use store::{AppointmentStore, InMemoryStore, StoreSeed};
pub use upcoming::{find_within, upcoming_notice};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::form::FormValidationEngine;
use crate::model::*;
use crate::observability::{STORE_WRITES_TOTAL, UPCOMING_FOUND};
use crate::session::AppointmentEditSession;

/// Owns the collaborators and the current snapshot. Every write goes through
/// the store and is followed by a wholesale snapshot reload.
pub struct Scheduler<S, C> {
    store: S,
    clock: C,
    config: SchedulerConfig,
    snapshot: AppointmentSnapshot,
}

impl<S: AppointmentStore, C: Clock> Scheduler<S, C> {
    pub fn new(store: S, clock: C, config: SchedulerConfig) -> Result<Self, ScheduleError> {
        let snapshot = store.load_appointments()?;
        info!("scheduler loaded {} appointments", snapshot.len());
        Ok(Self {
            store,
            clock,
            config,
            snapshot,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &AppointmentSnapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn customers(&self) -> Result<Vec<Customer>, ScheduleError> {
        Ok(self.store.load_customers()?)
    }

    pub fn refresh(&mut self) -> Result<(), ScheduleError> {
        self.snapshot = self.store.load_appointments()?;
        debug!("snapshot refreshed: {} appointments", self.snapshot.len());
        Ok(())
    }

    /// Appointments starting inside the configured lookahead window.
    pub fn upcoming(&self) -> Vec<Appointment> {
        let found = find_within(&self.snapshot, self.config.upcoming_horizon_minutes, self.clock.now());
        metrics::histogram!(UPCOMING_FOUND).record(found.len() as f64);
        found
    }

    pub fn login_notice(&self) -> String {
        upcoming_notice(&self.upcoming(), self.config.upcoming_horizon_minutes)
    }

    /// Empty appointment form; date rules use the clock's current date as today.
    pub fn new_form(&self) -> FormValidationEngine {
        FormValidationEngine::appointment_form(&self.config.rules, self.clock.now().date())
    }

    pub fn create_session(&self) -> AppointmentEditSession {
        AppointmentEditSession::create(&self.config)
    }

    pub fn edit_session(&self, id: AppointmentId) -> Result<AppointmentEditSession, ScheduleError> {
        let appointment = self
            .snapshot
            .get(id)
            .cloned()
            .ok_or(PersistenceError::NotFound(id))?;
        Ok(AppointmentEditSession::edit(&self.config, appointment))
    }

    /// Decide, persist the accepted appointment, reload the snapshot.
    pub fn submit(
        &mut self,
        session: &mut AppointmentEditSession,
        form: &FormValidationEngine,
    ) -> Result<Appointment, ScheduleError> {
        let accepted = session.submit(form, &self.snapshot, self.clock.now())?;
        let saved = match self.store.save(accepted) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("save failed, session reopened: {e}");
                session.revert();
                return Err(e.into());
            }
        };
        metrics::counter!(STORE_WRITES_TOTAL, "op" => "save").increment(1);
        self.refresh()?;
        Ok(saved)
    }

    pub fn delete(&mut self, id: AppointmentId) -> Result<(), ScheduleError> {
        self.store.delete(id)?;
        metrics::counter!(STORE_WRITES_TOTAL, "op" => "delete").increment(1);
        info!("appointment {id} deleted");
        self.refresh()
    }

    /// Remove every appointment of a customer so the customer row can be
    /// deleted. Returns how many were removed. Stops at the first failed
    /// delete; the snapshot is reloaded either way.
    pub fn delete_customer_appointments(&mut self, customer_id: CustomerId) -> Result<usize, ScheduleError> {
        let owned = appointments_for_customer(&self.snapshot, customer_id);
        let mut removed = 0;
        let mut failure = None;
        for a in &owned {
            if let Err(e) = self.store.delete(a.id) {
                warn!("delete of appointment {} failed: {e}", a.id);
                failure = Some(e);
                break;
            }
            removed += 1;
            metrics::counter!(STORE_WRITES_TOTAL, "op" => "delete").increment(1);
        }
        info!("removed {removed} of {} appointments of customer {customer_id}", owned.len());
        self.refresh()?;
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(removed),
        }
    }
}
