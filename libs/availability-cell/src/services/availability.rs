// libs/availability-cell/src/services/availability.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_backend::client::with_query;
use shared_backend::BackendClient;
use shared_config::AppConfig;

use crate::models::{
    Availability, AvailabilityError, CreateAvailabilityRequest, UpdateAvailabilityRequest,
};

/// Read/write access to published slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Every slot of one professional, booked and open.
    async fn list_for_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Availability>, AvailabilityError>;

    async fn get(&self, availability_id: &str, auth_token: &str) -> Result<Availability, AvailabilityError>;

    async fn create(
        &self,
        request: CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Availability, AvailabilityError>;

    async fn update(
        &self,
        availability_id: &str,
        request: UpdateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Availability, AvailabilityError>;

    async fn delete(&self, availability_id: &str, auth_token: &str) -> Result<(), AvailabilityError>;
}

/// [`AvailabilityRepository`] backed by the scheduling REST API.
pub struct AvailabilityService {
    backend: BackendClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    fn slot_path(availability_id: &str) -> String {
        format!("/api/availability/{}", urlencoding::encode(availability_id))
    }
}

#[async_trait]
impl AvailabilityRepository for AvailabilityService {
    async fn list_for_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Availability>, AvailabilityError> {
        debug!("Fetching availability for professional: {}", professional_id);

        let path = with_query("/api/availability", "professionalId", professional_id);
        let slots: Vec<Availability> = self.backend.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        debug!("Professional {} has {} slots", professional_id, slots.len());
        Ok(slots)
    }

    async fn get(&self, availability_id: &str, auth_token: &str) -> Result<Availability, AvailabilityError> {
        self.backend.request(
            Method::GET,
            &Self::slot_path(availability_id),
            Some(auth_token),
            None,
        ).await.map_err(|e| {
            if e.is_not_found() {
                AvailabilityError::NotFound(availability_id.to_string())
            } else {
                e.into()
            }
        })
    }

    async fn create(
        &self,
        request: CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Availability, AvailabilityError> {
        debug!("Creating availability for professional: {}", request.professional_id);

        request.validate()?;

        let body = serde_json::to_value(&request).map_err(shared_backend::BackendError::from)?;
        let availability: Availability = self.backend.request(
            Method::POST,
            "/api/availability",
            Some(auth_token),
            Some(body),
        ).await?;

        debug!("Availability created with ID: {}", availability.id);
        Ok(availability)
    }

    async fn update(
        &self,
        availability_id: &str,
        request: UpdateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Availability, AvailabilityError> {
        debug!("Updating availability: {}", availability_id);

        let body = serde_json::to_value(&request).map_err(shared_backend::BackendError::from)?;
        let availability: Availability = self.backend.request(
            Method::PUT,
            &Self::slot_path(availability_id),
            Some(auth_token),
            Some(body),
        ).await?;

        Ok(availability)
    }

    async fn delete(&self, availability_id: &str, auth_token: &str) -> Result<(), AvailabilityError> {
        debug!("Deleting availability: {}", availability_id);

        self.backend.request_empty(
            Method::DELETE,
            &Self::slot_path(availability_id),
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }
}
