// libs/availability-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_backend::BackendError;
use shared_models::error::AppError;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A professional-published time window. Owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: String,
    pub professional_id: String,
    pub available_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Availability {
    pub fn is_open(&self) -> bool {
        !self.is_booked
    }

    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityRequest {
    pub professional_id: String,
    pub available_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_booked: bool,
}

impl CreateAvailabilityRequest {
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        if self.start_time >= self.end_time {
            return Err(AvailabilityError::InvalidTimeRange);
        }
        Ok(())
    }
}

/// Body a professional sends to publish a slot; the owner comes from the
/// caller's profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAvailability {
    pub available_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewAvailability {
    pub fn for_professional(self, professional_id: &str) -> CreateAvailabilityRequest {
        CreateAvailabilityRequest {
            professional_id: professional_id.to_string(),
            available_date: self.available_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_booked: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_booked: Option<bool>,
}

impl UpdateAvailabilityRequest {
    pub fn validate_against(&self, current: &Availability) -> Result<(), AvailabilityError> {
        let start = self.start_time.unwrap_or(current.start_time);
        let end = self.end_time.unwrap_or(current.end_time);
        if start >= end {
            return Err(AvailabilityError::InvalidTimeRange);
        }
        Ok(())
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Start time must be before end time")]
    InvalidTimeRange,

    #[error("Availability slot {0} not found")]
    NotFound(String),

    #[error("Availability slot {0} belongs to another professional")]
    NotOwner(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::InvalidTimeRange => AppError::ValidationError(err.to_string()),
            AvailabilityError::NotFound(_) => AppError::NotFound(err.to_string()),
            AvailabilityError::NotOwner(_) => AppError::Forbidden(err.to_string()),
            AvailabilityError::Backend(backend) => backend.into(),
        }
    }
}
