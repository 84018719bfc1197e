// libs/appointment-cell/src/services/appointments.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_backend::client::with_query;
use shared_backend::{BackendClient, BackendError};
use shared_config::AppConfig;

use crate::models::{Appointment, AppointmentError, CreateAppointmentRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn list_for_patient(&self, patient_id: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_for_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get(&self, appointment_id: &str, auth_token: &str) -> Result<Appointment, AppointmentError>;

    async fn create(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;

    async fn cancel(&self, appointment_id: &str, auth_token: &str) -> Result<(), AppointmentError>;

    async fn complete(&self, appointment_id: &str, auth_token: &str) -> Result<(), AppointmentError>;
}

/// [`AppointmentRepository`] backed by the scheduling REST API.
pub struct AppointmentService {
    backend: BackendClient,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    fn appointment_path(appointment_id: &str) -> String {
        format!("/api/appointments/{}", urlencoding::encode(appointment_id))
    }

    fn not_found_as(appointment_id: &str) -> impl FnOnce(BackendError) -> AppointmentError + '_ {
        move |e| {
            if e.is_not_found() {
                AppointmentError::NotFound(appointment_id.to_string())
            } else {
                e.into()
            }
        }
    }
}

#[async_trait]
impl AppointmentRepository for AppointmentService {
    async fn list_for_patient(&self, patient_id: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for patient: {}", patient_id);

        let path = with_query("/api/appointments", "patientId", patient_id);
        let appointments: Vec<Appointment> = self.backend.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(appointments)
    }

    async fn list_for_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for professional: {}", professional_id);

        let path = with_query("/api/appointments", "professionalId", professional_id);
        let appointments: Vec<Appointment> = self.backend.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(appointments)
    }

    async fn get(&self, appointment_id: &str, auth_token: &str) -> Result<Appointment, AppointmentError> {
        self.backend.request(
            Method::GET,
            &Self::appointment_path(appointment_id),
            Some(auth_token),
            None,
        ).await.map_err(Self::not_found_as(appointment_id))
    }

    async fn create(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Creating appointment for patient {} on slot {}",
            request.patient_id, request.availability_id
        );

        let body = serde_json::to_value(&request).map_err(BackendError::from)?;
        let appointment: Appointment = self.backend.request(
            Method::POST,
            "/api/appointments",
            Some(auth_token),
            Some(body),
        ).await?;

        debug!("Appointment created with ID: {}", appointment.id);
        Ok(appointment)
    }

    async fn cancel(&self, appointment_id: &str, auth_token: &str) -> Result<(), AppointmentError> {
        self.backend.request_empty(
            Method::PATCH,
            &format!("{}/cancel", Self::appointment_path(appointment_id)),
            Some(auth_token),
            None,
        ).await.map_err(Self::not_found_as(appointment_id))
    }

    async fn complete(&self, appointment_id: &str, auth_token: &str) -> Result<(), AppointmentError> {
        self.backend.request_empty(
            Method::PATCH,
            &format!("{}/complete", Self::appointment_path(appointment_id)),
            Some(auth_token),
            None,
        ).await.map_err(Self::not_found_as(appointment_id))
    }
}
