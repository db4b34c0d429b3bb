// libs/appointment-cell/tests/common/mod.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use appointment_cell::models::{BookAppointmentRequest, BookedBy};
use appointment_cell::services::BookingService;
use doctor_cell::models::{
    Clinic, CreateClinicRequest, Doctor, RegisterDoctorRequest, ScheduleEntryInput,
    SetWeekScheduleRequest, StaffRole,
};
use doctor_cell::services::{AvailabilityService, DirectoryService, ScheduleService};
use shared_config::AppConfig;
use shared_database::{Collection, LockRegistry};
use shared_utils::time;
use uuid::Uuid;

pub struct TestClinic {
    pub directory: Arc<DirectoryService>,
    pub schedule: Arc<ScheduleService>,
    pub booking: Arc<BookingService>,
    pub clinic: Clinic,
    pub doctor: Doctor,
}

/// A clinic with one doctor working every day of the week, so tests can use
/// any upcoming date without caring which weekday it lands on.
pub async fn clinic_with_doctor(offset_minutes: i32) -> TestClinic {
    let config = AppConfig::default();
    let directory = Arc::new(DirectoryService::new(
        Arc::new(Collection::new()),
        Arc::new(Collection::new()),
        &config,
    ));
    let schedule = Arc::new(ScheduleService::new(
        Arc::clone(&directory),
        Arc::new(Collection::new()),
    ));
    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&directory),
        Arc::clone(&schedule),
        &config,
    ));
    let booking = Arc::new(BookingService::new(
        Arc::clone(&directory),
        availability,
        Arc::new(Collection::new()),
        Arc::new(LockRegistry::new()),
    ));

    let clinic = directory
        .create_clinic(CreateClinicRequest {
            name: "Brightside Dental".to_string(),
            utc_offset_minutes: Some(offset_minutes),
        })
        .await
        .unwrap();
    let doctor = directory
        .register_doctor(RegisterDoctorRequest {
            clinic_id: clinic.id,
            full_name: "Mara Lindqvist".to_string(),
            role: StaffRole::Doctor,
        })
        .await
        .unwrap();
    schedule
        .replace_week(doctor.id, full_week("08:00", "20:00"))
        .await
        .unwrap();

    TestClinic {
        directory,
        schedule,
        booking,
        clinic,
        doctor,
    }
}

pub fn full_week(start: &str, end: &str) -> SetWeekScheduleRequest {
    SetWeekScheduleRequest {
        entries: (0u8..7)
            .map(|day| ScheduleEntryInput {
                day_of_week: day,
                is_working: true,
                start_time: Some(start.to_string()),
                end_time: Some(end.to_string()),
            })
            .collect(),
    }
}

pub fn at(hhmm: &str) -> NaiveTime {
    time::parse_hhmm(hhmm).unwrap()
}

/// A date a week out; with an all-working schedule the weekday is irrelevant.
pub fn upcoming_date() -> NaiveDate {
    (Utc::now() + Duration::days(7)).date_naive()
}

pub fn book_at(setup: &TestClinic, date: NaiveDate, hhmm: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: setup.doctor.id,
        patient_id: Uuid::new_v4(),
        date,
        time: at(hhmm),
        duration_minutes: None,
        booked_by: BookedBy::Patient,
        reason: Some("Check-up".to_string()),
        notes: None,
        registered_at: None,
    }
}
