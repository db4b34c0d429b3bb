// libs/appointment-cell/tests/lifecycle_test.rs
mod common;

use assert_matches::assert_matches;
use tokio_test::assert_ok;

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, ChangeStatusRequest, UpdateAppointmentRequest,
};
use appointment_cell::services::AppointmentLifecycleService;

use common::{at, book_at, clinic_with_doctor, upcoming_date};

fn cancel_with(reason: Option<&str>) -> ChangeStatusRequest {
    ChangeStatusRequest {
        status: AppointmentStatus::Cancelled,
        amount: None,
        cancellation_reason: reason.map(str::to_string),
        suggested_new_date: None,
    }
}

fn complete_with(amount: Option<f64>) -> ChangeStatusRequest {
    ChangeStatusRequest {
        status: AppointmentStatus::Completed,
        amount,
        cancellation_reason: None,
        suggested_new_date: None,
    }
}

// ==============================================================================
// TRANSITION TABLE TESTS
// ==============================================================================

#[test]
fn pending_can_confirm_complete_or_cancel() {
    let lifecycle = AppointmentLifecycleService::new();

    let from_pending = lifecycle.valid_transitions(&AppointmentStatus::Pending);
    assert!(from_pending.contains(&AppointmentStatus::Confirmed));
    assert!(from_pending.contains(&AppointmentStatus::Completed));
    assert!(from_pending.contains(&AppointmentStatus::Cancelled));

    let from_confirmed = lifecycle.valid_transitions(&AppointmentStatus::Confirmed);
    assert!(!from_confirmed.contains(&AppointmentStatus::Pending));
    assert!(from_confirmed.contains(&AppointmentStatus::Completed));
    assert!(from_confirmed.contains(&AppointmentStatus::Cancelled));
}

#[test]
fn terminal_states_allow_nothing() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .valid_transitions(&AppointmentStatus::Completed)
        .is_empty());
    assert!(lifecycle
        .valid_transitions(&AppointmentStatus::Cancelled)
        .is_empty());

    assert_matches!(
        lifecycle.validate_transition(&AppointmentStatus::Completed, &AppointmentStatus::Confirmed),
        Err(AppointmentError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_transition(&AppointmentStatus::Cancelled, &AppointmentStatus::Pending),
        Err(AppointmentError::InvalidTransition { .. })
    );
}

// ==============================================================================
// STATUS CHANGE TESTS
// ==============================================================================

#[tokio::test]
async fn confirming_a_pending_booking_needs_no_payload() {
    let setup = clinic_with_doctor(0).await;
    let booked = setup
        .booking
        .create(book_at(&setup, upcoming_date(), "09:00"))
        .await
        .unwrap();

    let confirmed = setup
        .booking
        .change_status(
            booked.appointment.id,
            ChangeStatusRequest {
                status: AppointmentStatus::Confirmed,
                amount: None,
                cancellation_reason: None,
                suggested_new_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.appointment.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn cancellation_requires_a_reason() {
    let setup = clinic_with_doctor(0).await;
    let booked = setup
        .booking
        .create(book_at(&setup, upcoming_date(), "09:00"))
        .await
        .unwrap();
    let id = booked.appointment.id;

    assert_matches!(
        setup.booking.change_status(id, cancel_with(None)).await,
        Err(AppointmentError::Validation(_))
    );
    assert_matches!(
        setup.booking.change_status(id, cancel_with(Some("   "))).await,
        Err(AppointmentError::Validation(_))
    );

    let cancelled = setup
        .booking
        .change_status(id, cancel_with(Some("Patient moved away")))
        .await
        .unwrap();
    assert_eq!(cancelled.appointment.status, AppointmentStatus::Cancelled);
    assert_eq!(
        cancelled.appointment.cancellation_reason.as_deref(),
        Some("Patient moved away")
    );
}

#[tokio::test]
async fn cancelled_appointments_are_fully_immutable() {
    let setup = clinic_with_doctor(0).await;
    let date = upcoming_date();
    let booked = setup
        .booking
        .create(book_at(&setup, date, "09:00"))
        .await
        .unwrap();
    let id = booked.appointment.id;

    setup
        .booking
        .change_status(id, cancel_with(Some("Double entry")))
        .await
        .unwrap();

    let edit_notes = setup
        .booking
        .update(
            id,
            UpdateAppointmentRequest {
                notes: Some("late note".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(
        edit_notes,
        Err(AppointmentError::ImmutableState(AppointmentStatus::Cancelled))
    );

    let edit_amount = setup
        .booking
        .update(
            id,
            UpdateAppointmentRequest {
                amount: Some(80.0),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(
        edit_amount,
        Err(AppointmentError::ImmutableState(AppointmentStatus::Cancelled))
    );

    assert_matches!(
        setup
            .booking
            .reschedule(
                id,
                appointment_cell::models::RescheduleAppointmentRequest {
                    date,
                    time: at("11:00"),
                    duration_minutes: None,
                },
            )
            .await,
        Err(AppointmentError::ImmutableState(AppointmentStatus::Cancelled))
    );
}

#[tokio::test]
async fn completed_appointments_keep_only_the_amount_editable() {
    let setup = clinic_with_doctor(0).await;
    let date = upcoming_date();
    let booked = setup
        .booking
        .create(book_at(&setup, date, "09:00"))
        .await
        .unwrap();
    let id = booked.appointment.id;

    let completed = setup
        .booking
        .change_status(id, complete_with(Some(120.0)))
        .await
        .unwrap();
    assert_eq!(completed.appointment.status, AppointmentStatus::Completed);
    assert_eq!(completed.appointment.amount, Some(120.0));

    let move_date = setup
        .booking
        .update(
            id,
            UpdateAppointmentRequest {
                time: Some(at("14:00")),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(
        move_date,
        Err(AppointmentError::ImmutableState(AppointmentStatus::Completed))
    );

    assert_matches!(
        setup
            .booking
            .reschedule(
                id,
                appointment_cell::models::RescheduleAppointmentRequest {
                    date,
                    time: at("14:00"),
                    duration_minutes: None,
                },
            )
            .await,
        Err(AppointmentError::ImmutableState(AppointmentStatus::Completed))
    );

    // Billing corrections stay possible.
    let corrected = setup
        .booking
        .update(
            id,
            UpdateAppointmentRequest {
                amount: Some(95.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.appointment.amount, Some(95.0));
}

// ==============================================================================
// COMBINED UPDATE TESTS
// ==============================================================================

#[tokio::test]
async fn completing_wins_over_schedule_edits_in_the_same_request() {
    let setup = clinic_with_doctor(0).await;
    let date = upcoming_date();
    let booked = setup
        .booking
        .create(book_at(&setup, date, "09:00"))
        .await
        .unwrap();
    let id = booked.appointment.id;
    let original_start = booked.appointment.appointment_date;

    let updated = setup
        .booking
        .update(
            id,
            UpdateAppointmentRequest {
                status: Some(AppointmentStatus::Completed),
                time: Some(at("16:00")),
                duration_minutes: Some(60),
                amount: Some(150.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The transition applied; the move rode along and was dropped.
    assert_eq!(updated.appointment.status, AppointmentStatus::Completed);
    assert_eq!(updated.appointment.appointment_date, original_start);
    assert_eq!(updated.appointment.duration_minutes, 30);
    assert_eq!(updated.appointment.amount, Some(150.0));
}

#[tokio::test]
async fn updates_can_move_a_visit_to_another_doctor() {
    let setup = clinic_with_doctor(0).await;
    let date = upcoming_date();

    let other = setup
        .directory
        .register_doctor(doctor_cell::models::RegisterDoctorRequest {
            clinic_id: setup.clinic.id,
            full_name: "Elias Vogt".to_string(),
            role: doctor_cell::models::StaffRole::Doctor,
        })
        .await
        .unwrap();
    setup
        .schedule
        .replace_week(other.id, common::full_week("08:00", "20:00"))
        .await
        .unwrap();

    let booked = setup
        .booking
        .create(book_at(&setup, date, "10:00"))
        .await
        .unwrap();

    let moved = setup
        .booking
        .update(
            booked.appointment.id,
            UpdateAppointmentRequest {
                doctor_id: Some(other.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.appointment.doctor_id, other.id);

    // The original doctor's slot is free again.
    tokio_test::assert_ok!(setup.booking.create(book_at(&setup, date, "10:00")).await);
}

#[tokio::test]
async fn cancellation_fields_are_rejected_outside_a_cancellation() {
    let setup = clinic_with_doctor(0).await;
    let booked = setup
        .booking
        .create(book_at(&setup, upcoming_date(), "09:00"))
        .await
        .unwrap();

    let result = setup
        .booking
        .update(
            booked.appointment.id,
            UpdateAppointmentRequest {
                cancellation_reason: Some("not actually cancelling".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(AppointmentError::Validation(_)));
}
