// libs/doctor-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_utils::time;

use crate::models::{BusyInterval, DaySlot, DoctorError};
use crate::services::directory::DirectoryService;
use crate::services::schedule::ScheduleService;

/// The fixed candidate grid slots are generated on. The grid never moves
/// with the requested duration; only the busy test is duration-aware.
#[derive(Debug, Clone, Copy)]
pub struct SlotGrid {
    pub start_hour: u32,
    pub end_hour: u32,
    pub interval_minutes: u32,
}

impl SlotGrid {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            start_hour: config.slot_start_hour,
            end_hour: config.slot_end_hour,
            interval_minutes: config.slot_interval_minutes,
        }
    }

    fn earliest(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour.min(23), 0, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Upper bound of the grid, open. `None` means end of day.
    fn latest(&self) -> Option<NaiveTime> {
        if self.end_hour >= 24 {
            None
        } else {
            NaiveTime::from_hms_opt(self.end_hour, 0, 0)
        }
    }
}

/// Computes a doctor's day of candidate slots against the busy intervals the
/// caller collected. The calculator owns the grid walk and the overlap and
/// past tests; it never reads appointment state itself, which keeps the
/// check reusable inside the booking transaction.
pub struct AvailabilityService {
    directory: Arc<DirectoryService>,
    schedule: Arc<ScheduleService>,
    grid: SlotGrid,
    default_duration_minutes: i32,
}

impl AvailabilityService {
    pub fn new(
        directory: Arc<DirectoryService>,
        schedule: Arc<ScheduleService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            directory,
            schedule,
            grid: SlotGrid::from_config(config),
            default_duration_minutes: config.default_duration_minutes,
        }
    }

    pub fn default_duration_minutes(&self) -> i32 {
        self.default_duration_minutes
    }

    /// Generate the ordered slot list for one calendar day.
    ///
    /// An absent or non-working day yields no slots at all, even when stray
    /// bookings exist on it - those stay busy but no new start time is
    /// offered. `now` drives the past flag, which only applies when `date`
    /// is the clinic-local current day.
    pub async fn day_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration_minutes: Option<i32>,
        busy: &[BusyInterval],
        now: DateTime<Utc>,
    ) -> Result<Vec<DaySlot>, DoctorError> {
        let doctor = self.directory.require_doctor(doctor_id).await?;
        let zone = self.directory.zone_for(doctor.clinic_id).await?;

        let day_of_week = date.weekday().num_days_from_sunday() as u8;
        let window = match self.schedule.day_window(doctor_id, day_of_week).await {
            Some(window) => window,
            None => {
                debug!(
                    "Doctor {} has no working window on weekday {}",
                    doctor_id, day_of_week
                );
                return Ok(Vec::new());
            }
        };
        let (window_start, window_end) = match (window.start_time, window.end_time) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(Vec::new()),
        };

        let duration = duration_minutes.unwrap_or(self.default_duration_minutes);
        let duration = Duration::minutes(duration as i64);

        let grid_start = window_start.max(self.grid.earliest());
        let grid_end = match self.grid.latest() {
            Some(latest) => window_end.min(latest),
            None => window_end,
        };

        let today = time::local_date(now, zone) == date;

        let mut slots = Vec::new();
        let mut cursor = grid_start;
        while cursor < grid_end {
            let slot_start = time::to_instant(date, cursor, zone);
            let slot_end = slot_start + duration;

            let is_busy = busy.iter().any(|b| b.overlaps(slot_start, slot_end));
            let is_past = today && slot_start <= now;

            slots.push(DaySlot {
                time: cursor,
                is_busy,
                is_past,
                is_free: !is_busy && !is_past,
            });

            let (next, wrapped) = cursor.overflowing_add_signed(Duration::minutes(
                self.grid.interval_minutes as i64,
            ));
            if wrapped != 0 {
                break;
            }
            cursor = next;
        }

        debug!(
            "Computed {} slots for doctor {} on {}",
            slots.len(),
            doctor_id,
            date
        );
        Ok(slots)
    }
}
