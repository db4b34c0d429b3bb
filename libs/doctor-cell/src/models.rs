// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CLINIC AND STAFF MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    /// Minutes east of UTC. The clinic's wall clock is this offset applied to
    /// a stored instant; every wall-clock conversion goes through it.
    pub utc_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Doctor,
    Assistant,
    Receptionist,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Doctor => write!(f, "doctor"),
            StaffRole::Assistant => write!(f, "assistant"),
            StaffRole::Receptionist => write!(f, "receptionist"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub full_name: String,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDoctorRequest {
    pub clinic_id: Uuid,
    pub full_name: String,
    pub role: StaffRole,
}

// ==============================================================================
// WEEKLY SCHEDULE MODELS
// ==============================================================================

pub const DAYS_PER_WEEK: usize = 7;

/// One day-of-week window of a doctor's recurring schedule. Times are
/// clinic-local wall clock; a non-working day carries no window at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DayWindow {
    pub is_working: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl DayWindow {
    pub fn closed() -> Self {
        Self {
            is_working: false,
            start_time: None,
            end_time: None,
        }
    }
}

/// A doctor's full recurring week, replaced atomically on every submission.
/// Index 0 is Sunday, matching `Weekday::num_days_from_sunday`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub doctor_id: Uuid,
    pub days: [DayWindow; DAYS_PER_WEEK],
    pub updated_at: DateTime<Utc>,
}

impl WeekSchedule {
    pub fn day(&self, day_of_week: u8) -> Option<&DayWindow> {
        self.days.get(day_of_week as usize)
    }
}

/// Wire form of a single schedule entry, times as `HH:mm` strings.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorScheduleEntry {
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub is_working: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntryInput {
    pub day_of_week: u8,
    pub is_working: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A full week's schedule. Submissions carry all seven days and replace the
/// stored week as one unit.
#[derive(Debug, Clone, Deserialize)]
pub struct SetWeekScheduleRequest {
    pub entries: Vec<ScheduleEntryInput>,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// A half-open `[start, end)` range during which the doctor is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Half-open overlap: touching endpoints do not collide, so a slot that
    /// starts exactly when another booking ends is free.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// One candidate start time in a doctor's day, with its occupancy flags.
#[derive(Debug, Clone, Serialize)]
pub struct DaySlot {
    #[serde(with = "shared_utils::time::hhmm")]
    pub time: NaiveTime,
    pub is_busy: bool,
    pub is_past: bool,
    pub is_free: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Clinic not found")]
    ClinicNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Staff member is not a doctor")]
    NotADoctor,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::ClinicNotFound => AppError::NotFound("Clinic not found".to_string()),
            DoctorError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::NotADoctor => {
                AppError::BadRequest("Staff member is not a doctor".to_string())
            }
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
        }
    }
}
