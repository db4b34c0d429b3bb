// libs/doctor-cell/tests/schedule_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;

use doctor_cell::models::{
    Clinic, CreateClinicRequest, Doctor, DoctorError, RegisterDoctorRequest, ScheduleEntryInput,
    SetWeekScheduleRequest, StaffRole,
};
use doctor_cell::services::{DirectoryService, ScheduleService};
use shared_config::AppConfig;
use shared_database::Collection;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    directory: Arc<DirectoryService>,
    schedule: Arc<ScheduleService>,
    clinic: Clinic,
}

impl TestSetup {
    async fn new() -> Self {
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
        let clinic = directory
            .create_clinic(CreateClinicRequest {
                name: "Brightside Dental".to_string(),
                utc_offset_minutes: Some(60),
            })
            .await
            .unwrap();

        Self {
            directory,
            schedule,
            clinic,
        }
    }

    async fn staff(&self, role: StaffRole) -> Doctor {
        self.directory
            .register_doctor(RegisterDoctorRequest {
                clinic_id: self.clinic.id,
                full_name: "Mara Lindqvist".to_string(),
                role,
            })
            .await
            .unwrap()
    }
}

fn full_week(start: &str, end: &str) -> SetWeekScheduleRequest {
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

// ==============================================================================
// WEEKLY SCHEDULE TESTS
// ==============================================================================

#[tokio::test]
async fn replaced_week_reads_back_as_seven_entries() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let entries = setup
        .schedule
        .replace_week(doctor.id, full_week("09:00", "17:30"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 7);

    let read_back = setup.schedule.week_for(doctor.id).await.unwrap();
    assert_eq!(read_back.len(), 7);
    for entry in &read_back {
        assert!(entry.is_working);
        assert_eq!(entry.start_time.as_deref(), Some("09:00"));
        assert_eq!(entry.end_time.as_deref(), Some("17:30"));
    }
}

#[tokio::test]
async fn unset_schedule_reads_back_empty() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let entries = setup.schedule.week_for(doctor.id).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn non_working_days_need_no_times() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let mut request = full_week("09:00", "17:00");
    request.entries[1] = ScheduleEntryInput {
        day_of_week: 1,
        is_working: false,
        start_time: None,
        end_time: None,
    };
    let entries = setup.schedule.replace_week(doctor.id, request).await.unwrap();

    let monday = entries.iter().find(|e| e.day_of_week == 1).unwrap();
    assert!(!monday.is_working);
    assert_eq!(monday.start_time, None);
    assert_eq!(monday.end_time, None);
}

#[tokio::test]
async fn malformed_entry_rejects_whole_submission() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    setup
        .schedule
        .replace_week(doctor.id, full_week("09:00", "17:00"))
        .await
        .unwrap();

    // One bad time in an otherwise valid week.
    let mut request = full_week("08:00", "16:00");
    request.entries[4].start_time = Some("9am".to_string());
    let result = setup.schedule.replace_week(doctor.id, request).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));

    // The stored week is the old one, untouched.
    let read_back = setup.schedule.week_for(doctor.id).await.unwrap();
    assert_eq!(read_back[0].start_time.as_deref(), Some("09:00"));
    assert_eq!(read_back[0].end_time.as_deref(), Some("17:00"));
}

#[tokio::test]
async fn submission_must_cover_the_whole_week() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let mut request = full_week("09:00", "17:00");
    request.entries.pop();
    assert_matches!(
        setup.schedule.replace_week(doctor.id, request).await,
        Err(DoctorError::Validation(_))
    );
}

#[tokio::test]
async fn duplicate_and_out_of_range_days_are_rejected() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let mut duplicated = full_week("09:00", "17:00");
    duplicated.entries[6].day_of_week = 0;
    assert_matches!(
        setup.schedule.replace_week(doctor.id, duplicated).await,
        Err(DoctorError::Validation(_))
    );

    let mut out_of_range = full_week("09:00", "17:00");
    out_of_range.entries[6].day_of_week = 7;
    assert_matches!(
        setup.schedule.replace_week(doctor.id, out_of_range).await,
        Err(DoctorError::Validation(_))
    );
}

#[tokio::test]
async fn working_day_requires_an_ordered_window() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    let mut inverted = full_week("17:00", "09:00");
    assert_matches!(
        setup.schedule.replace_week(doctor.id, inverted.clone()).await,
        Err(DoctorError::Validation(_))
    );

    inverted = full_week("09:00", "09:00");
    assert_matches!(
        setup.schedule.replace_week(doctor.id, inverted).await,
        Err(DoctorError::Validation(_))
    );

    let mut missing_end = full_week("09:00", "17:00");
    missing_end.entries[2].end_time = None;
    assert_matches!(
        setup.schedule.replace_week(doctor.id, missing_end).await,
        Err(DoctorError::Validation(_))
    );
}

#[tokio::test]
async fn schedule_operations_require_the_doctor_role() {
    let setup = TestSetup::new().await;
    let assistant = setup.staff(StaffRole::Assistant).await;

    assert_matches!(
        setup.schedule.week_for(assistant.id).await,
        Err(DoctorError::NotADoctor)
    );
    assert_matches!(
        setup
            .schedule
            .replace_week(assistant.id, full_week("09:00", "17:00"))
            .await,
        Err(DoctorError::NotADoctor)
    );
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let setup = TestSetup::new().await;

    assert_matches!(
        setup.schedule.week_for(uuid::Uuid::new_v4()).await,
        Err(DoctorError::DoctorNotFound)
    );
}

#[tokio::test]
async fn removing_a_doctor_drops_their_week() {
    let setup = TestSetup::new().await;
    let doctor = setup.staff(StaffRole::Doctor).await;

    setup
        .schedule
        .replace_week(doctor.id, full_week("09:00", "17:00"))
        .await
        .unwrap();
    setup.directory.remove_doctor(doctor.id).await.unwrap();
    setup.schedule.remove_for_doctor(doctor.id).await;

    assert_matches!(
        setup.schedule.week_for(doctor.id).await,
        Err(DoctorError::DoctorNotFound)
    );
}
