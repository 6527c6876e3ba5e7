use serde::{Deserialize, Serialize};

use crate::limits::UNSAVED_ID;
use crate::model::*;

use super::PersistenceError;

/// Persistence collaborator. The rules never call it; the caller loads a
/// snapshot, asks for a decision, and persists the accepted appointment.
pub trait AppointmentStore {
    fn load_appointments(&self) -> Result<AppointmentSnapshot, PersistenceError>;
    fn load_customers(&self) -> Result<Vec<Customer>, PersistenceError>;
    /// Insert when `appointment.id` is unsaved, otherwise replace the row by id.
    fn save(&mut self, appointment: Appointment) -> Result<Appointment, PersistenceError>;
    fn delete(&mut self, id: AppointmentId) -> Result<(), PersistenceError>;
}

/// On-disk seed format: `{"customers": [...], "appointments": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    appointments: Vec<Appointment>,
    customers: Vec<Customer>,
    next_id: AppointmentId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let next_id = seed.appointments.iter().map(|a| a.id).max().unwrap_or(0);
        Self {
            appointments: seed.appointments,
            customers: seed.customers,
            next_id,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let seed: StoreSeed =
            serde_json::from_str(json).map_err(|e| PersistenceError::Storage(format!("invalid seed: {e}")))?;
        Ok(Self::from_seed(seed))
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let seed = StoreSeed {
            customers: self.customers.clone(),
            appointments: self.appointments.clone(),
        };
        serde_json::to_string_pretty(&seed).map_err(|e| PersistenceError::Storage(e.to_string()))
    }

    pub fn add_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }
}

impl AppointmentStore for InMemoryStore {
    fn load_appointments(&self) -> Result<AppointmentSnapshot, PersistenceError> {
        Ok(AppointmentSnapshot::new(self.appointments.clone()))
    }

    fn load_customers(&self) -> Result<Vec<Customer>, PersistenceError> {
        Ok(self.customers.clone())
    }

    fn save(&mut self, appointment: Appointment) -> Result<Appointment, PersistenceError> {
        if appointment.id == UNSAVED_ID {
            self.next_id += 1;
            let saved = appointment.with_id(self.next_id);
            self.appointments.push(saved.clone());
            return Ok(saved);
        }
        let slot = self
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or(PersistenceError::NotFound(appointment.id))?;
        *slot = appointment.clone();
        Ok(appointment)
    }

    fn delete(&mut self, id: AppointmentId) -> Result<(), PersistenceError> {
        let pos = self
            .appointments
            .iter()
            .position(|a| a.id == id)
            .ok_or(PersistenceError::NotFound(id))?;
        self.appointments.remove(pos);
        Ok(())
    }
}
