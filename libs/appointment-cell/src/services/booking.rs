// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::{BusyInterval, DaySlot};
use doctor_cell::services::{AvailabilityService, DirectoryService};
use shared_database::{Collection, LockRegistry};
use shared_utils::time;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentView, BookAppointmentRequest,
    BookedBy, ChangeStatusRequest, RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::lifecycle::{AppointmentLifecycleService, EditIntent};

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 240;

/// The only entry point that creates or mutates appointments.
///
/// Every write that depends on the busy set runs under the owning doctor's
/// registry lock, so "read busy intervals, validate, write" is one isolated
/// unit per doctor. Doctors don't contend with each other, and a losing
/// writer fails fast with a conflict instead of queuing.
pub struct BookingService {
    directory: Arc<DirectoryService>,
    availability: Arc<AvailabilityService>,
    appointments: Arc<Collection<Appointment>>,
    doctor_locks: Arc<LockRegistry>,
    lifecycle: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(
        directory: Arc<DirectoryService>,
        availability: Arc<AvailabilityService>,
        appointments: Arc<Collection<Appointment>>,
        doctor_locks: Arc<LockRegistry>,
    ) -> Self {
        Self {
            directory,
            availability,
            appointments,
            doctor_locks,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a new visit. Patient bookings start pending, staff bookings are
    /// confirmed immediately.
    pub async fn create(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<AppointmentView, AppointmentError> {
        let duration = request
            .duration_minutes
            .unwrap_or_else(|| self.availability.default_duration_minutes());
        validate_duration(duration)?;

        let doctor = self.directory.require_doctor(request.doctor_id).await?;
        let zone = self.directory.zone_for(doctor.clinic_id).await?;

        let start = time::to_instant(request.date, request.time, zone);
        let now = Utc::now();
        if start <= now {
            return Err(AppointmentError::PastDate);
        }
        let end = start + Duration::minutes(duration as i64);

        // Conflict check and insert are one unit under the doctor's lock;
        // two overlapping requests for the same doctor cannot both pass.
        let _guard = self.doctor_locks.acquire(doctor.id).await;
        if self.has_overlap(doctor.id, start, end, None).await {
            warn!(
                "Booking conflict for doctor {} at {} ({} min)",
                doctor.id, start, duration
            );
            return Err(AppointmentError::SlotConflict);
        }

        let status = match request.booked_by {
            BookedBy::Staff => AppointmentStatus::Confirmed,
            BookedBy::Patient => AppointmentStatus::Pending,
        };
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: request.patient_id,
            clinic_id: doctor.clinic_id,
            appointment_date: start,
            duration_minutes: duration,
            status,
            amount: None,
            reason: request.reason,
            notes: request.notes,
            cancellation_reason: None,
            suggested_new_date: None,
            registered_at: request
                .registered_at
                .unwrap_or_else(|| now.with_timezone(&zone)),
            created_at: now,
            updated_at: now,
        };
        self.appointments
            .insert(appointment.id, appointment.clone())
            .await;

        info!(
            "Appointment {} booked with doctor {} at {} ({})",
            appointment.id, doctor.id, start, appointment.status
        );
        Ok(AppointmentView::new(appointment, zone))
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<AppointmentView, AppointmentError> {
        let appointment = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;
        let zone = self.zone_of(&appointment).await?;
        Ok(AppointmentView::new(appointment, zone))
    }

    /// Move a visit to a new wall-clock start, keeping its own interval out
    /// of the busy set it is checked against.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<AppointmentView, AppointmentError> {
        let snapshot = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;

        let _guard = self.doctor_locks.acquire(snapshot.doctor_id).await;
        let current = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;
        if current.doctor_id != snapshot.doctor_id {
            // Moved to another doctor between snapshot and lock; the caller
            // retries against fresh state.
            return Err(AppointmentError::SlotConflict);
        }
        if current.status.is_terminal() {
            return Err(AppointmentError::ImmutableState(current.status));
        }

        let duration = request.duration_minutes.unwrap_or(current.duration_minutes);
        validate_duration(duration)?;

        let zone = self.zone_of(&current).await?;
        let start = time::to_instant(request.date, request.time, zone);
        let now = Utc::now();
        if start <= now {
            return Err(AppointmentError::PastDate);
        }
        let end = start + Duration::minutes(duration as i64);

        if self
            .has_overlap(current.doctor_id, start, end, Some(appointment_id))
            .await
        {
            return Err(AppointmentError::SlotConflict);
        }

        let updated = self
            .appointments
            .update(&appointment_id, |appointment| {
                appointment.appointment_date = start;
                appointment.duration_minutes = duration;
                appointment.updated_at = now;
            })
            .await
            .ok_or(AppointmentError::NotFound)?;

        info!("Appointment {} rescheduled to {}", appointment_id, start);
        Ok(AppointmentView::new(updated, zone))
    }

    /// Apply a status transition. Cancellation demands a reason; completion
    /// may carry the billed amount.
    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<AppointmentView, AppointmentError> {
        let snapshot = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;

        let _guard = self.doctor_locks.acquire(snapshot.doctor_id).await;
        let current = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle
            .validate_transition(&current.status, &request.status)?;

        let mut candidate = current.clone();
        match request.status {
            AppointmentStatus::Cancelled => {
                let reason = self
                    .lifecycle
                    .validate_cancellation_reason(request.cancellation_reason.as_deref())?;
                candidate.cancellation_reason = Some(reason);
                candidate.suggested_new_date = request.suggested_new_date;
            }
            AppointmentStatus::Completed => {
                if let Some(amount) = request.amount {
                    candidate.amount = Some(amount);
                }
            }
            _ => {}
        }
        candidate.status = request.status;
        candidate.updated_at = Utc::now();
        self.appointments
            .insert(appointment_id, candidate.clone())
            .await;

        info!(
            "Appointment {} moved from {} to {}",
            appointment_id, current.status, candidate.status
        );
        let zone = self.zone_of(&candidate).await?;
        Ok(AppointmentView::new(candidate, zone))
    }

    /// Combined edit surface: optional status change plus field edits in one
    /// request, applied all-or-nothing.
    ///
    /// Completion takes priority: when the request both completes the visit
    /// and moves its schedule or doctor, the move is dropped and only the
    /// amount is reconciled. Everything else is validated against the state
    /// the transition leaves behind.
    pub async fn update(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<AppointmentView, AppointmentError> {
        let snapshot = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;
        let target_doctor_id = request.doctor_id.unwrap_or(snapshot.doctor_id);

        let _guards = self.lock_pair(snapshot.doctor_id, target_doctor_id).await;
        let current = self
            .appointments
            .get(&appointment_id)
            .await
            .ok_or(AppointmentError::NotFound)?;
        if current.doctor_id != snapshot.doctor_id {
            // The visit moved to another doctor between snapshot and lock;
            // the caller retries against fresh state.
            return Err(AppointmentError::SlotConflict);
        }

        let now = Utc::now();
        let mut candidate = current.clone();

        if let Some(new_status) = request.status {
            self.lifecycle
                .validate_transition(&current.status, &new_status)?;

            if new_status == AppointmentStatus::Completed {
                candidate.status = AppointmentStatus::Completed;
                if let Some(amount) = request.amount {
                    candidate.amount = Some(amount);
                }
                candidate.updated_at = now;
                self.appointments
                    .insert(appointment_id, candidate.clone())
                    .await;
                debug!(
                    "Appointment {} completed; schedule edits in the same request dropped",
                    appointment_id
                );
                let zone = self.zone_of(&candidate).await?;
                return Ok(AppointmentView::new(candidate, zone));
            }

            if new_status == AppointmentStatus::Cancelled {
                let reason = self
                    .lifecycle
                    .validate_cancellation_reason(request.cancellation_reason.as_deref())?;
                candidate.cancellation_reason = Some(reason);
                candidate.suggested_new_date = request.suggested_new_date;
            }
            candidate.status = new_status;
        } else if request.cancellation_reason.is_some() || request.suggested_new_date.is_some() {
            return Err(AppointmentError::Validation(
                "Cancellation fields are only valid when cancelling".to_string(),
            ));
        }

        let intent = EditIntent {
            moves_schedule: request.moves_schedule(),
            edits_amount: request.amount.is_some(),
            edits_text: request.edits_text(),
        };
        self.lifecycle.validate_edit(&candidate.status, &intent)?;

        if intent.moves_schedule {
            let doctor = self.directory.require_doctor(target_doctor_id).await?;
            let zone = self.directory.zone_for(doctor.clinic_id).await?;

            let duration = request.duration_minutes.unwrap_or(current.duration_minutes);
            validate_duration(duration)?;

            let current_local = time::to_wall_clock(current.appointment_date, zone);
            let date = request.date.unwrap_or_else(|| current_local.date());
            let time_of_day = request.time.unwrap_or_else(|| current_local.time());
            let start = time::to_instant(date, time_of_day, zone);
            if start <= now {
                return Err(AppointmentError::PastDate);
            }
            let end = start + Duration::minutes(duration as i64);

            if self
                .has_overlap(doctor.id, start, end, Some(appointment_id))
                .await
            {
                return Err(AppointmentError::SlotConflict);
            }

            candidate.doctor_id = doctor.id;
            candidate.clinic_id = doctor.clinic_id;
            candidate.appointment_date = start;
            candidate.duration_minutes = duration;
        }

        if let Some(amount) = request.amount {
            candidate.amount = Some(amount);
        }
        if let Some(reason) = request.reason {
            candidate.reason = Some(reason);
        }
        if let Some(notes) = request.notes {
            candidate.notes = Some(notes);
        }
        candidate.updated_at = now;
        self.appointments
            .insert(appointment_id, candidate.clone())
            .await;

        let zone = self.zone_of(&candidate).await?;
        Ok(AppointmentView::new(candidate, zone))
    }

    /// Advisory slot listing for pickers. The authoritative overlap check is
    /// the one `create`/`reschedule` run under the doctor lock.
    pub async fn busy_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration_minutes: Option<i32>,
    ) -> Result<Vec<DaySlot>, AppointmentError> {
        if let Some(duration) = duration_minutes {
            validate_duration(duration)?;
        }
        let doctor = self.directory.require_doctor(doctor_id).await?;
        let zone = self.directory.zone_for(doctor.clinic_id).await?;

        let busy = self.day_busy_intervals(doctor_id, date, zone).await;
        let slots = self
            .availability
            .day_slots(doctor_id, date, duration_minutes, &busy, Utc::now())
            .await?;
        Ok(slots)
    }

    /// All of a doctor's visits on one clinic-local day, cancelled included,
    /// ordered by start.
    pub async fn day_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        let doctor = self.directory.require_doctor(doctor_id).await?;
        let zone = self.directory.zone_for(doctor.clinic_id).await?;

        let (day_start, day_end) = day_bounds(date, zone);
        let mut appointments = self
            .appointments
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date < day_end
                    && a.end_time() > day_start
            })
            .await;
        appointments.sort_by_key(|a| a.appointment_date);

        Ok(appointments
            .into_iter()
            .map(|a| AppointmentView::new(a, zone))
            .collect())
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn has_overlap(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> bool {
        !self
            .appointments
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.occupies_slot()
                    && exclude != Some(a.id)
                    && a.overlaps(start, end)
            })
            .await
            .is_empty()
    }

    async fn day_busy_intervals(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        zone: FixedOffset,
    ) -> Vec<BusyInterval> {
        let (day_start, day_end) = day_bounds(date, zone);
        let mut busy: Vec<BusyInterval> = self
            .appointments
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.occupies_slot()
                    && a.appointment_date < day_end
                    && a.end_time() > day_start
            })
            .await
            .iter()
            .map(Appointment::busy_interval)
            .collect();
        busy.sort_by_key(|b| b.start);
        busy
    }

    async fn zone_of(&self, appointment: &Appointment) -> Result<FixedOffset, AppointmentError> {
        Ok(self.directory.zone_for(appointment.clinic_id).await?)
    }

    async fn lock_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.doctor_locks.acquire(a).await, None);
        }
        // Fixed acquisition order keeps opposite doctor moves deadlock-free.
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let g1 = self.doctor_locks.acquire(first).await;
        let g2 = self.doctor_locks.acquire(second).await;
        (g1, Some(g2))
    }
}

fn validate_duration(minutes: i32) -> Result<(), AppointmentError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(AppointmentError::Validation(format!(
            "Duration must be between {} and {} minutes, got {}",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, minutes
        )));
    }
    Ok(())
}

/// The clinic-local day `[00:00, next 00:00)` as instants.
fn day_bounds(date: NaiveDate, zone: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_start = time::to_instant(date, NaiveTime::MIN, zone);
    (day_start, day_start + Duration::days(1))
}
