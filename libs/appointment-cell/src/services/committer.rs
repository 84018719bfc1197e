// libs/appointment-cell/src/services/committer.rs
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

use availability_cell::models::UpdateAvailabilityRequest;
use availability_cell::{Availability, AvailabilityCache, AvailabilityRepository, CalendarGate};
use shared_models::notification::{Notification, Notifier};

use crate::models::{
    AppointmentStatus, BookingError, BookingReceipt, CreateAppointmentRequest, APPOINTMENTS_ROUTE,
};
use crate::services::appointments::AppointmentRepository;
use crate::services::store::AppointmentsStore;

pub const BOOKING_FAILED_MESSAGE: &str = "Failed to book appointment";
pub const SLOT_UNAVAILABLE_MESSAGE: &str = "The selected time slot is no longer available";
pub const SLOT_RESERVE_FAILED_MESSAGE: &str = "Appointment booked, but the time slot could not be marked as taken";

/// Collaborators shared by every booking session.
#[derive(Clone)]
pub struct BookingServices {
    pub repository: Arc<dyn AppointmentRepository>,
    pub appointments: Arc<AppointmentsStore>,
    pub slots: Arc<dyn AvailabilityRepository>,
    pub availability: Arc<AvailabilityCache>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    Submitting,
    Settled,
    Failed,
}

/// The slot a patient is about to book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSelection {
    pub patient_id: String,
    pub professional_id: String,
    pub slot: Availability,
}

/// Turns one selection into an appointment. At most one submission is in
/// flight per committer.
pub struct BookingCommitter {
    services: BookingServices,
    state: Mutex<CommitState>,
}

/// Resets the committer to `Idle` if the submission is dropped before it
/// settles.
#[derive(Debug)]
struct InFlight<'a> {
    state: &'a Mutex<CommitState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: CommitState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = CommitState::Idle;
        }
    }
}

impl BookingCommitter {
    pub fn new(services: BookingServices) -> Self {
        Self {
            services,
            state: Mutex::new(CommitState::Idle),
        }
    }

    pub fn state(&self) -> CommitState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_submitting(&self) -> bool {
        self.state() == CommitState::Submitting
    }

    pub async fn submit(
        &self,
        selection: &BookingSelection,
        gate: &CalendarGate<'_>,
        auth_token: &str,
    ) -> Result<BookingReceipt, BookingError> {
        let in_flight = self.begin(selection, gate)?;

        let request = CreateAppointmentRequest {
            patient_id: selection.patient_id.clone(),
            professional_id: selection.professional_id.clone(),
            availability_id: selection.slot.id.clone(),
            appointment_date: selection.slot.start_time,
            status: AppointmentStatus::Scheduled,
        };

        let appointment = match self.services.repository.create(request, auth_token).await {
            Ok(appointment) => appointment,
            Err(e) => {
                error!("Booking slot {} failed: {}", selection.slot.id, e);
                self.services.notifier.notify(Notification::error(BOOKING_FAILED_MESSAGE));
                in_flight.settle(CommitState::Failed);
                return Err(e.into());
            }
        };

        // The appointment exists from here on; a failed flip is reported but
        // does not undo the booking.
        let reserved = self.services.slots
            .update(&selection.slot.id, mark_booked(), auth_token)
            .await;

        self.services.appointments.invalidate(&selection.patient_id).await;
        self.services.availability.invalidate(&selection.professional_id).await;

        match reserved {
            Ok(_) => {
                info!(
                    "Patient {} booked slot {} as appointment {}",
                    selection.patient_id, selection.slot.id, appointment.id
                );
                self.services.notifier.notify(Notification::success(
                    "Appointment booked",
                    "Your appointment has been scheduled successfully",
                ));
            }
            Err(e) => {
                error!(
                    "Appointment {} created but slot {} was not marked as booked: {}",
                    appointment.id, selection.slot.id, e
                );
                self.services.notifier.notify(Notification::error(SLOT_RESERVE_FAILED_MESSAGE));
            }
        }
        in_flight.settle(CommitState::Settled);

        Ok(BookingReceipt {
            appointment,
            redirect_to: APPOINTMENTS_ROUTE.to_string(),
        })
    }

    fn begin(&self, selection: &BookingSelection, gate: &CalendarGate<'_>) -> Result<InFlight<'_>, BookingError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if *state == CommitState::Submitting {
            warn!("Ignoring booking submit for {} while one is in flight", selection.patient_id);
            return Err(BookingError::AlreadySubmitting);
        }

        if !gate.can_book(&selection.slot) {
            drop(state);
            warn!("Slot {} is not bookable", selection.slot.id);
            self.services.notifier.notify(Notification::error(SLOT_UNAVAILABLE_MESSAGE));
            return Err(BookingError::SlotUnavailable(selection.slot.id.clone()));
        }

        *state = CommitState::Submitting;
        Ok(InFlight {
            state: &self.state,
            settled: false,
        })
    }
}

fn mark_booked() -> UpdateAvailabilityRequest {
    UpdateAvailabilityRequest {
        is_booked: Some(true),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared_backend::BackendError;
    use shared_models::notification::NotificationLevel;
    use shared_utils::test_utils::RecordingNotifier;

    use availability_cell::NormalizedSlots;
    use crate::models::{Appointment, AppointmentError};
    use crate::services::appointments::MockAppointmentRepository;

    /// Records slot flips; fails them when `reject_flip` is set.
    #[derive(Default)]
    struct SlotStub {
        reject_flip: bool,
        flipped: Mutex<Vec<(String, UpdateAvailabilityRequest)>>,
    }

    impl SlotStub {
        fn flipped(&self) -> Vec<(String, UpdateAvailabilityRequest)> {
            self.flipped.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl AvailabilityRepository for SlotStub {
        async fn list_for_professional(&self, _: &str, _: &str) -> Result<Vec<Availability>, availability_cell::AvailabilityError> {
            Ok(Vec::new())
        }
        async fn get(&self, id: &str, _: &str) -> Result<Availability, availability_cell::AvailabilityError> {
            Err(availability_cell::AvailabilityError::NotFound(id.to_string()))
        }
        async fn create(
            &self,
            _: availability_cell::models::CreateAvailabilityRequest,
            _: &str,
        ) -> Result<Availability, availability_cell::AvailabilityError> {
            Err(availability_cell::AvailabilityError::InvalidTimeRange)
        }
        async fn update(
            &self,
            id: &str,
            request: UpdateAvailabilityRequest,
            _: &str,
        ) -> Result<Availability, availability_cell::AvailabilityError> {
            self.flipped.lock().unwrap().push((id.to_string(), request));
            if self.reject_flip {
                return Err(availability_cell::AvailabilityError::Backend(BackendError::Status {
                    status: 500,
                    message: "update failed".to_string(),
                }));
            }
            Ok(slot(id, true))
        }
        async fn delete(&self, id: &str, _: &str) -> Result<(), availability_cell::AvailabilityError> {
            Err(availability_cell::AvailabilityError::NotFound(id.to_string()))
        }
    }

    fn slot(id: &str, is_booked: bool) -> Availability {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        Availability {
            id: id.to_string(),
            professional_id: "p-1".to_string(),
            available_date: start.date_naive(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            is_booked,
            created_at: None,
            updated_at: None,
        }
    }

    fn selection(slot: Availability) -> BookingSelection {
        BookingSelection {
            patient_id: "patient-1".to_string(),
            professional_id: "p-1".to_string(),
            slot,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn committer(repository: MockAppointmentRepository, notifier: &RecordingNotifier) -> BookingCommitter {
        committer_with_slots(repository, Arc::new(SlotStub::default()), notifier)
    }

    fn committer_with_slots(
        repository: MockAppointmentRepository,
        slots: Arc<SlotStub>,
        notifier: &RecordingNotifier,
    ) -> BookingCommitter {
        let repository: Arc<dyn AppointmentRepository> = Arc::new(repository);
        BookingCommitter::new(BookingServices {
            repository: repository.clone(),
            appointments: Arc::new(AppointmentsStore::new(repository, Duration::from_secs(300))),
            slots: slots.clone(),
            availability: Arc::new(AvailabilityCache::new(
                slots,
                Arc::new(notifier.clone()),
                Duration::from_secs(300),
            )),
            notifier: Arc::new(notifier.clone()),
        })
    }

    fn created(request: &CreateAppointmentRequest) -> Appointment {
        Appointment {
            id: "a-1".to_string(),
            patient_id: request.patient_id.clone(),
            professional_id: request.professional_id.clone(),
            availability_id: Some(request.availability_id.clone()),
            appointment_date: request.appointment_date,
            status: request.status,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn successful_submit_settles_with_redirect() {
        let mut repository = MockAppointmentRepository::new();
        repository
            .expect_create()
            .withf(|request, _| {
                request.availability_id == "s-1"
                    && request.status == AppointmentStatus::Scheduled
                    && request.appointment_date == Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
            })
            .times(1)
            .returning(|request, _| Ok(created(&request)));
        let notifier = RecordingNotifier::new();
        let committer = committer(repository, &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());

        let receipt = committer.submit(&selection(slot("s-1", false)), &gate, "token").await.unwrap();

        assert_eq!(receipt.redirect_to, APPOINTMENTS_ROUTE);
        assert_eq!(receipt.appointment.availability_id.as_deref(), Some("s-1"));
        assert_eq!(committer.state(), CommitState::Settled);
        assert_eq!(notifier.count(NotificationLevel::Success), 1);
        assert_eq!(notifier.count(NotificationLevel::Error), 0);
    }

    #[tokio::test]
    async fn failed_submit_notifies_once_and_allows_retry() {
        let mut repository = MockAppointmentRepository::new();
        repository.expect_create().times(2).returning(|_, _| {
            Err(AppointmentError::Backend(BackendError::Status {
                status: 500,
                message: "boom".to_string(),
            }))
        });
        let notifier = RecordingNotifier::new();
        let committer = committer(repository, &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());
        let chosen = selection(slot("s-1", false));

        assert_matches!(committer.submit(&chosen, &gate, "token").await, Err(BookingError::Failed(_)));
        assert_eq!(committer.state(), CommitState::Failed);
        assert_eq!(notifier.all().len(), 1);
        assert_eq!(notifier.all()[0].description, BOOKING_FAILED_MESSAGE);

        assert!(committer.submit(&chosen, &gate, "token").await.is_err());
        assert_eq!(notifier.count(NotificationLevel::Error), 2);
    }

    #[tokio::test]
    async fn booked_slot_is_rejected_without_a_request() {
        let mut repository = MockAppointmentRepository::new();
        repository.expect_create().never();
        let notifier = RecordingNotifier::new();
        let committer = committer(repository, &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", true)]);
        let gate = CalendarGate::new(&normalized, today());

        assert_matches!(
            committer.submit(&selection(slot("s-1", true)), &gate, "token").await,
            Err(BookingError::SlotUnavailable(_))
        );
        assert_eq!(committer.state(), CommitState::Idle);
        assert_eq!(notifier.count(NotificationLevel::Error), 1);
    }

    #[tokio::test]
    async fn dropped_submission_returns_to_idle() {
        let mut repository = MockAppointmentRepository::new();
        repository.expect_create().never();
        let notifier = RecordingNotifier::new();
        let committer = committer(repository, &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());
        let chosen = selection(slot("s-1", false));

        let in_flight = committer.begin(&chosen, &gate).unwrap();
        assert!(committer.is_submitting());
        assert_matches!(committer.begin(&chosen, &gate), Err(BookingError::AlreadySubmitting));
        assert!(notifier.all().is_empty());

        drop(in_flight);
        assert_eq!(committer.state(), CommitState::Idle);
    }

    #[tokio::test]
    async fn successful_submit_marks_the_slot_as_booked() {
        let mut repository = MockAppointmentRepository::new();
        repository
            .expect_create()
            .times(1)
            .returning(|request, _| Ok(created(&request)));
        let notifier = RecordingNotifier::new();
        let slots = Arc::new(SlotStub::default());
        let committer = committer_with_slots(repository, slots.clone(), &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());
        committer.submit(&selection(slot("s-1", false)), &gate, "token").await.unwrap();

        let flipped = slots.flipped();
        assert_eq!(flipped.len(), 1);
        assert_eq!(flipped[0].0, "s-1");
        assert_eq!(flipped[0].1.is_booked, Some(true));
        assert_eq!(flipped[0].1.start_time, None);
    }

    #[tokio::test]
    async fn failed_flip_keeps_the_appointment_and_notifies_once() {
        let mut repository = MockAppointmentRepository::new();
        repository
            .expect_create()
            .times(1)
            .returning(|request, _| Ok(created(&request)));
        let notifier = RecordingNotifier::new();
        let slots = Arc::new(SlotStub {
            reject_flip: true,
            ..Default::default()
        });
        let committer = committer_with_slots(repository, slots.clone(), &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());
        let receipt = committer.submit(&selection(slot("s-1", false)), &gate, "token").await.unwrap();

        assert_eq!(receipt.appointment.id, "a-1");
        assert_eq!(committer.state(), CommitState::Settled);
        assert_eq!(notifier.all().len(), 1);
        assert_eq!(notifier.all()[0].description, SLOT_RESERVE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn failed_create_never_flips_the_slot() {
        let mut repository = MockAppointmentRepository::new();
        repository.expect_create().times(1).returning(|_, _| {
            Err(AppointmentError::Backend(BackendError::Rejected("taken".to_string())))
        });
        let notifier = RecordingNotifier::new();
        let slots = Arc::new(SlotStub::default());
        let committer = committer_with_slots(repository, slots.clone(), &notifier);

        let normalized = NormalizedSlots::from_slots(&[slot("s-1", false)]);
        let gate = CalendarGate::new(&normalized, today());
        assert!(committer.submit(&selection(slot("s-1", false)), &gate, "token").await.is_err());

        assert!(slots.flipped().is_empty());
    }
}
