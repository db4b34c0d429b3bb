// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use doctor_cell::models::{BusyInterval, DoctorError};
use shared_models::error::AppError;
use shared_utils::time;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    /// Derived from the doctor; the clinic owns the appointment through them.
    pub clinic_id: Uuid,
    /// Canonical visit start, stored as a UTC instant.
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    /// Billed value, meaningful once the visit is completed.
    pub amount: Option<f64>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub suggested_new_date: Option<DateTime<Utc>>,
    /// Submission instant with the offset the client observed, kept verbatim
    /// so the audit trail reads in the zone it was written in.
    pub registered_at: DateTime<FixedOffset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.appointment_date + Duration::minutes(self.duration_minutes as i64)
    }

    /// Cancelled visits release their slot; every other status keeps it.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn busy_interval(&self) -> BusyInterval {
        BusyInterval {
            start: self.appointment_date,
            end: self.end_time(),
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.busy_interval().overlaps(start, end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Who submitted the booking. Staff bookings skip the pending step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BookedBy {
    Patient,
    Staff,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    /// Wall-clock pick in the clinic's zone.
    pub date: NaiveDate,
    #[serde(with = "shared_utils::time::hhmm")]
    pub time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub booked_by: BookedBy,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Client-observed submission time, offset and all. Defaults to the
    /// server's receipt time in the clinic zone.
    pub registered_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    #[serde(with = "shared_utils::time::hhmm")]
    pub time: NaiveTime,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
    pub amount: Option<f64>,
    pub cancellation_reason: Option<String>,
    pub suggested_new_date: Option<DateTime<Utc>>,
}

/// Combined field-edit surface. A request may move the visit, edit text
/// fields, touch the amount, and change status at once; the state machine
/// decides what of that is allowed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<NaiveDate>,
    #[serde(default, with = "shared_utils::time::hhmm::option")]
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub doctor_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<AppointmentStatus>,
    pub cancellation_reason: Option<String>,
    pub suggested_new_date: Option<DateTime<Utc>>,
}

impl UpdateAppointmentRequest {
    pub fn moves_schedule(&self) -> bool {
        self.date.is_some()
            || self.time.is_some()
            || self.duration_minutes.is_some()
            || self.doctor_id.is_some()
    }

    pub fn edits_text(&self) -> bool {
        self.reason.is_some() || self.notes.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaySlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// An appointment plus its clinic-local wall-clock reading. The local fields
/// are extracted through the clinic zone, never from the UTC fields.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub local_date: NaiveDate,
    #[serde(with = "shared_utils::time::hhmm")]
    pub local_time: NaiveTime,
}

impl AppointmentView {
    pub fn new(appointment: Appointment, zone: FixedOffset) -> Self {
        let local = time::to_wall_clock(appointment.appointment_date, zone);
        Self {
            appointment,
            local_date: local.date(),
            local_time: local.time(),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment slot conflicts with an existing booking")]
    SlotConflict,

    #[error("Appointment date must be in the future")]
    PastDate,

    #[error("Status cannot change from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is {0} and cannot be edited")]
    ImmutableState(AppointmentStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Doctor(#[from] DoctorError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::SlotConflict => AppError::Conflict(
                "Appointment slot conflicts with an existing booking".to_string(),
            ),
            AppointmentError::PastDate => {
                AppError::BadRequest("Appointment date must be in the future".to_string())
            }
            AppointmentError::InvalidTransition { .. } | AppointmentError::ImmutableState(_) => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Doctor(inner) => inner.into(),
        }
    }
}
