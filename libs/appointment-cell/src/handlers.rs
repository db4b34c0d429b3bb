// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, ChangeStatusRequest, DayQuery, DaySlotsQuery,
    RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn create_appointment(
    State(service): State<Arc<BookingService>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.create(request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.reschedule(appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled"
    })))
}

#[axum::debug_handler]
pub async fn change_appointment_status(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.change_status(appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.update(appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// Slot picker data: the day's grid with busy/past flags. Advisory only -
/// booking re-checks under the doctor lock.
#[axum::debug_handler]
pub async fn get_busy_slots(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DaySlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = service
        .busy_slots(doctor_id, query.date, query.duration_minutes)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_day_appointments(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.day_appointments(doctor_id, query.date).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "appointments": appointments
    })))
}
