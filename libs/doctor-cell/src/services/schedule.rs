// libs/doctor-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::Collection;
use shared_utils::time;

use crate::models::{
    DayWindow, DoctorError, DoctorScheduleEntry, ScheduleEntryInput, SetWeekScheduleRequest,
    WeekSchedule, DAYS_PER_WEEK,
};
use crate::services::directory::DirectoryService;

/// Recurring weekly schedule store. A submission always carries the full
/// week and replaces the stored week in a single write, so readers never see
/// a half-updated schedule.
pub struct ScheduleService {
    directory: Arc<DirectoryService>,
    schedules: Arc<Collection<WeekSchedule>>,
}

impl ScheduleService {
    pub fn new(
        directory: Arc<DirectoryService>,
        schedules: Arc<Collection<WeekSchedule>>,
    ) -> Self {
        Self {
            directory,
            schedules,
        }
    }

    /// The doctor's stored week as wire entries: seven once a week has been
    /// submitted, none before that.
    pub async fn week_for(&self, doctor_id: Uuid) -> Result<Vec<DoctorScheduleEntry>, DoctorError> {
        self.directory.require_doctor(doctor_id).await?;

        let entries = match self.schedules.get(&doctor_id).await {
            Some(week) => week
                .days
                .iter()
                .enumerate()
                .map(|(day, window)| to_entry(doctor_id, day as u8, window))
                .collect(),
            None => Vec::new(),
        };
        Ok(entries)
    }

    /// Validate and atomically replace the doctor's week. Any malformed
    /// entry rejects the whole submission and leaves the stored week intact.
    pub async fn replace_week(
        &self,
        doctor_id: Uuid,
        request: SetWeekScheduleRequest,
    ) -> Result<Vec<DoctorScheduleEntry>, DoctorError> {
        let doctor = self.directory.require_doctor(doctor_id).await?;

        let days = validate_week(&request.entries)?;
        let week = WeekSchedule {
            doctor_id: doctor.id,
            days,
            updated_at: Utc::now(),
        };
        self.schedules.insert(doctor_id, week.clone()).await;

        info!("Schedule replaced for doctor {}", doctor_id);
        Ok(week
            .days
            .iter()
            .enumerate()
            .map(|(day, window)| to_entry(doctor_id, day as u8, window))
            .collect())
    }

    /// The working window for one day of week, if the doctor works that day.
    pub async fn day_window(&self, doctor_id: Uuid, day_of_week: u8) -> Option<DayWindow> {
        let week = self.schedules.get(&doctor_id).await?;
        week.day(day_of_week).filter(|w| w.is_working).cloned()
    }

    /// Drop the stored week, used when the doctor leaves the directory.
    pub async fn remove_for_doctor(&self, doctor_id: Uuid) {
        if self.schedules.remove(&doctor_id).await.is_some() {
            debug!("Schedule removed for doctor {}", doctor_id);
        }
    }
}

fn to_entry(doctor_id: Uuid, day_of_week: u8, window: &DayWindow) -> DoctorScheduleEntry {
    DoctorScheduleEntry {
        doctor_id,
        day_of_week,
        is_working: window.is_working,
        start_time: window.start_time.map(time::format_hhmm),
        end_time: window.end_time.map(time::format_hhmm),
    }
}

/// Check a submitted week: exactly one entry per day 0-6, strict `HH:mm`
/// times, and `start < end` on every working day.
fn validate_week(entries: &[ScheduleEntryInput]) -> Result<[DayWindow; DAYS_PER_WEEK], DoctorError> {
    if entries.len() != DAYS_PER_WEEK {
        return Err(DoctorError::Validation(format!(
            "A schedule submission must cover all {} days, got {}",
            DAYS_PER_WEEK,
            entries.len()
        )));
    }

    let mut days: [Option<DayWindow>; DAYS_PER_WEEK] = Default::default();
    for entry in entries {
        let day = entry.day_of_week;
        if day as usize >= DAYS_PER_WEEK {
            return Err(DoctorError::Validation(format!(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday), got {}",
                day
            )));
        }
        if days[day as usize].is_some() {
            return Err(DoctorError::Validation(format!(
                "Duplicate entry for day {}",
                day
            )));
        }
        days[day as usize] = Some(validate_entry(entry)?);
    }

    // Length and uniqueness together guarantee every day is present.
    let mut week: [DayWindow; DAYS_PER_WEEK] = Default::default();
    for (day, window) in days.into_iter().enumerate() {
        week[day] = window.unwrap_or_else(DayWindow::closed);
    }
    Ok(week)
}

fn validate_entry(entry: &ScheduleEntryInput) -> Result<DayWindow, DoctorError> {
    if !entry.is_working {
        return Ok(DayWindow::closed());
    }

    let start = parse_entry_time(entry.day_of_week, "start_time", entry.start_time.as_deref())?;
    let end = parse_entry_time(entry.day_of_week, "end_time", entry.end_time.as_deref())?;
    if start >= end {
        return Err(DoctorError::Validation(format!(
            "Entry for day {}: start_time must be before end_time",
            entry.day_of_week
        )));
    }

    Ok(DayWindow {
        is_working: true,
        start_time: Some(start),
        end_time: Some(end),
    })
}

fn parse_entry_time(day: u8, field: &str, raw: Option<&str>) -> Result<NaiveTime, DoctorError> {
    let raw = raw.ok_or_else(|| {
        DoctorError::Validation(format!(
            "Entry for day {}: {} is required on a working day",
            day, field
        ))
    })?;
    time::parse_hhmm(raw).ok_or_else(|| {
        DoctorError::Validation(format!(
            "Entry for day {}: {} must be a HH:mm time, got {:?}",
            day, field, raw
        ))
    })
}
