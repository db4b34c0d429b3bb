// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// What an edit request wants to touch, collapsed to the categories the
/// state machine cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditIntent {
    /// `appointment_date`, `duration_minutes` or `doctor_id`.
    pub moves_schedule: bool,
    pub edits_amount: bool,
    pub edits_text: bool,
}

impl EditIntent {
    pub fn is_empty(&self) -> bool {
        !self.moves_schedule && !self.edits_amount && !self.edits_text
    }
}

/// Status lifecycle: pending -> confirmed -> completed, with cancellation
/// reachable from either non-terminal state. Completed and cancelled are
/// terminal; a completed visit keeps only its amount editable, a cancelled
/// one freezes entirely.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, new);

        if !self.valid_transitions(current).contains(new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(AppointmentError::InvalidTransition {
                from: *current,
                to: *new,
            });
        }
        Ok(())
    }

    /// Cancellation always carries a reason; a blank one is as good as none.
    pub fn validate_cancellation_reason(
        &self,
        reason: Option<&str>,
    ) -> Result<String, AppointmentError> {
        match reason.map(str::trim) {
            Some(reason) if !reason.is_empty() => Ok(reason.to_string()),
            _ => Err(AppointmentError::Validation(
                "A cancellation reason is required".to_string(),
            )),
        }
    }

    /// Gate field edits by the appointment's current state.
    pub fn validate_edit(
        &self,
        status: &AppointmentStatus,
        intent: &EditIntent,
    ) -> Result<(), AppointmentError> {
        if intent.is_empty() {
            return Ok(());
        }
        match status {
            AppointmentStatus::Cancelled => Err(AppointmentError::ImmutableState(*status)),
            AppointmentStatus::Completed => {
                if intent.moves_schedule || intent.edits_text {
                    Err(AppointmentError::ImmutableState(*status))
                } else {
                    Ok(())
                }
            }
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => Ok(()),
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
