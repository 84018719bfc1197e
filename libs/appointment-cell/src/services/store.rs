// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{Appointment, AppointmentError, AppointmentStats, AppointmentStatus};
use crate::services::appointments::AppointmentRepository;
use crate::services::lifecycle::AppointmentLifecycleService;

struct CachedAppointments {
    appointments: Arc<Vec<Appointment>>,
    fetched_at: Instant,
}

/// Per-patient appointment lists with explicit invalidation.
pub struct AppointmentsStore {
    repository: Arc<dyn AppointmentRepository>,
    stale_after: Duration,
    entries: RwLock<HashMap<String, CachedAppointments>>,
}

impl AppointmentsStore {
    pub fn new(repository: Arc<dyn AppointmentRepository>, stale_after: Duration) -> Self {
        Self {
            repository,
            stale_after,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn load(&self, patient_id: &str, auth_token: &str) -> Result<Arc<Vec<Appointment>>, AppointmentError> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(patient_id) {
                if cached.fetched_at.elapsed() < self.stale_after {
                    debug!("Appointments cache hit for {}", patient_id);
                    return Ok(Arc::clone(&cached.appointments));
                }
            }
        }

        let appointments = Arc::new(self.repository.list_for_patient(patient_id, auth_token).await?);

        self.entries.write().await.insert(
            patient_id.to_string(),
            CachedAppointments {
                appointments: Arc::clone(&appointments),
                fetched_at: Instant::now(),
            },
        );

        Ok(appointments)
    }

    pub async fn invalidate(&self, patient_id: &str) {
        self.entries.write().await.remove(patient_id);
        info!("Invalidated appointments for {}", patient_id);
    }

    pub async fn statistics(
        &self,
        patient_id: &str,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<AppointmentStats, AppointmentError> {
        let appointments = self.load(patient_id, auth_token).await?;
        Ok(AppointmentStats::from_appointments(&appointments, today))
    }

    /// Pending appointments, soonest first.
    pub async fn upcoming(
        &self,
        patient_id: &str,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.load(patient_id, auth_token).await?;
        Ok(upcoming_from(&appointments, today))
    }

    /// One of the patient's own appointments.
    pub async fn get_for_patient(
        &self,
        patient_id: &str,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.repository.get(appointment_id, auth_token).await?;
        if appointment.patient_id != patient_id {
            return Err(AppointmentError::NotOwner(appointment_id.to_string()));
        }
        Ok(appointment)
    }

    /// Cancels and returns the refreshed list.
    pub async fn cancel(
        &self,
        patient_id: &str,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Arc<Vec<Appointment>>, AppointmentError> {
        let appointment = self.get_for_patient(patient_id, appointment_id, auth_token).await?;
        AppointmentLifecycleService::validate_status_transition(
            appointment.status,
            AppointmentStatus::Cancelled,
        )?;

        self.repository.cancel(appointment_id, auth_token).await?;
        info!("Appointment {} cancelled by patient {}", appointment_id, patient_id);

        self.invalidate(patient_id).await;
        self.load(patient_id, auth_token).await
    }

    pub async fn complete(
        &self,
        professional_id: &str,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let appointment = self.repository.get(appointment_id, auth_token).await?;
        if appointment.professional_id != professional_id {
            return Err(AppointmentError::NotOwner(appointment_id.to_string()));
        }
        AppointmentLifecycleService::validate_status_transition(
            appointment.status,
            AppointmentStatus::Completed,
        )?;

        self.repository.complete(appointment_id, auth_token).await?;
        info!("Appointment {} completed by professional {}", appointment_id, professional_id);

        self.invalidate(&appointment.patient_id).await;
        Ok(())
    }

    /// A professional's own appointments, soonest first. Not cached.
    pub async fn for_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.repository
            .list_for_professional(professional_id, auth_token)
            .await?;
        appointments.sort_by(|a, b| a.appointment_date.cmp(&b.appointment_date));
        Ok(appointments)
    }
}

pub fn upcoming_from(appointments: &[Appointment], today: NaiveDate) -> Vec<Appointment> {
    let mut upcoming: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.is_pending(today))
        .cloned()
        .collect();
    upcoming.sort_by(|a, b| a.appointment_date.cmp(&b.appointment_date));
    upcoming
}
