// libs/appointment-cell/src/services/workflow.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, warn};

use availability_cell::services::calendar::SlotView;
use availability_cell::{Availability, AvailabilitySnapshot};

use crate::models::{BookingReceipt, WorkflowError};
use shared_models::notification::Notification;

use crate::services::committer::{
    BookingCommitter, BookingSelection, BookingServices, SLOT_UNAVAILABLE_MESSAGE,
};

/// What the patient has picked so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub professional_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub slot: Option<Availability>,
}

#[derive(Default)]
struct SessionState {
    selection: Selection,
    snapshot: Option<Arc<AvailabilitySnapshot>>,
}

#[derive(Debug)]
pub enum AvailabilityLoad {
    Loaded(Arc<AvailabilitySnapshot>),
    /// The active professional changed while the fetch was in flight.
    Superseded,
}

/// One patient's walk from professional to date to slot to booking.
pub struct BookingWorkflow {
    patient_id: String,
    services: BookingServices,
    committer: BookingCommitter,
    state: Mutex<SessionState>,
}

impl BookingWorkflow {
    pub fn new(patient_id: impl Into<String>, services: BookingServices) -> Self {
        Self {
            patient_id: patient_id.into(),
            committer: BookingCommitter::new(services.clone()),
            services,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selection(&self) -> Selection {
        self.lock().selection.clone()
    }

    pub fn committer(&self) -> &BookingCommitter {
        &self.committer
    }

    fn reject_unavailable(&self, err: WorkflowError) -> WorkflowError {
        warn!("Patient {} picked an unavailable slot: {}", self.patient_id, err);
        self.services.notifier.notify(Notification::error(SLOT_UNAVAILABLE_MESSAGE));
        err
    }

    /// Makes `professional_id` the active availability key.
    pub fn select_professional(&self, professional_id: &str) {
        let mut state = self.lock();
        state.selection = Selection {
            professional_id: Some(professional_id.to_string()),
            date: None,
            slot: None,
        };
        state.snapshot = None;
    }

    pub async fn load_availability(&self, auth_token: &str) -> Result<AvailabilityLoad, WorkflowError> {
        let professional_id = self.lock()
            .selection
            .professional_id
            .clone()
            .ok_or(WorkflowError::NoProfessional)?;

        let snapshot = self.services.availability.load(&professional_id, auth_token).await;

        let mut state = self.lock();
        if state.selection.professional_id.as_deref() != Some(professional_id.as_str()) {
            debug!("Dropping availability for {}: no longer selected", professional_id);
            return Ok(AvailabilityLoad::Superseded);
        }
        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(AvailabilityLoad::Loaded(snapshot))
    }

    pub fn select_date(&self, date: NaiveDate, today: NaiveDate) -> Result<Vec<SlotView>, WorkflowError> {
        let mut state = self.lock();
        let snapshot = state.snapshot.clone().ok_or(WorkflowError::NotLoaded)?;
        let gate = snapshot.gate(today);

        if !gate.is_selectable(date) {
            return Err(self.reject_unavailable(WorkflowError::DateNotSelectable(date)));
        }

        state.selection.date = Some(date);
        state.selection.slot = None;
        Ok(gate.slots_on(date))
    }

    pub fn select_slot(&self, availability_id: &str) -> Result<Availability, WorkflowError> {
        let mut state = self.lock();
        let snapshot = state.snapshot.clone().ok_or(WorkflowError::NotLoaded)?;
        let date = state.selection.date.ok_or(WorkflowError::NoDate)?;

        let slot = snapshot
            .normalized
            .slots_on(date)
            .iter()
            .find(|slot| slot.id == availability_id)
            .cloned()
            .ok_or_else(|| WorkflowError::SlotNotFound(availability_id.to_string()))?;

        if slot.is_booked {
            return Err(self.reject_unavailable(WorkflowError::SlotNotSelectable(slot.id)));
        }

        state.selection.slot = Some(slot.clone());
        Ok(slot)
    }

    /// Submits the current selection. The selection is cleared on success
    /// and kept on failure.
    pub async fn book(&self, auth_token: &str, today: NaiveDate) -> Result<BookingReceipt, WorkflowError> {
        let (selection, snapshot) = {
            let state = self.lock();
            let professional_id = state.selection.professional_id.clone().ok_or(WorkflowError::NoProfessional)?;
            state.selection.date.ok_or(WorkflowError::NoDate)?;
            let slot = state.selection.slot.clone().ok_or(WorkflowError::NoSlot)?;
            let snapshot = state.snapshot.clone().ok_or(WorkflowError::NotLoaded)?;
            (
                BookingSelection {
                    patient_id: self.patient_id.clone(),
                    professional_id,
                    slot,
                },
                snapshot,
            )
        };

        let gate = snapshot.gate(today);
        let receipt = self.committer.submit(&selection, &gate, auth_token).await?;

        let mut state = self.lock();
        if state.selection.slot.as_ref().map(|slot| &slot.id) == Some(&selection.slot.id) {
            state.selection.date = None;
            state.selection.slot = None;
            state.snapshot = None;
        }
        Ok(receipt)
    }
}

struct SessionEntry {
    workflow: Arc<BookingWorkflow>,
    last_used: Instant,
}

/// Booking workflows keyed by patient id. A workflow nobody else holds is
/// dropped once released or after `idle_after` without use.
pub struct BookingSessions {
    services: BookingServices,
    idle_after: Duration,
    workflows: Mutex<HashMap<String, SessionEntry>>,
}

impl BookingSessions {
    pub fn new(services: BookingServices, idle_after: Duration) -> Self {
        Self {
            services,
            idle_after,
            workflows: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.workflows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn workflow_for(&self, patient_id: &str) -> Arc<BookingWorkflow> {
        let mut workflows = self.lock();
        let now = Instant::now();

        workflows.retain(|id, entry| {
            id == patient_id
                || Arc::strong_count(&entry.workflow) > 1
                || now.duration_since(entry.last_used) < self.idle_after
        });

        let entry = workflows
            .entry(patient_id.to_string())
            .or_insert_with(|| SessionEntry {
                workflow: Arc::new(BookingWorkflow::new(patient_id, self.services.clone())),
                last_used: now,
            });
        entry.last_used = now;
        Arc::clone(&entry.workflow)
    }

    /// Drops the patient's workflow unless another request still holds it.
    pub fn release(&self, patient_id: &str) -> bool {
        let mut workflows = self.lock();
        let idle = workflows
            .get(patient_id)
            .is_some_and(|entry| Arc::strong_count(&entry.workflow) == 1);
        if idle {
            workflows.remove(patient_id);
            debug!("Released booking session for {}", patient_id);
        }
        idle
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
