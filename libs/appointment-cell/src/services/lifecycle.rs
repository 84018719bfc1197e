// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !Self::valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn valid_transitions(current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Scheduled => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn scheduled_can_complete_or_cancel() {
        assert!(AppointmentLifecycleService::validate_status_transition(
            AppointmentStatus::Scheduled,
            AppointmentStatus::Cancelled,
        ).is_ok());
        assert!(AppointmentLifecycleService::validate_status_transition(
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
        ).is_ok());
    }

    #[test]
    fn terminal_states_reject_transitions() {
        assert_matches!(
            AppointmentLifecycleService::validate_status_transition(
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ),
            Err(AppointmentError::InvalidStatusTransition {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Completed,
            })
        );
    }
}
