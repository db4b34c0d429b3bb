// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{CreateClinicRequest, RegisterDoctorRequest, SetWeekScheduleRequest};
use crate::services::{DirectoryService, ScheduleService};

/// Shared state for the directory and schedule routes.
pub struct DoctorState {
    pub directory: Arc<DirectoryService>,
    pub schedule: Arc<ScheduleService>,
}

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<Arc<DoctorState>>,
    Json(request): Json<CreateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    let clinic = state.directory.create_clinic(request).await?;

    Ok(Json(json!({
        "success": true,
        "clinic": clinic
    })))
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<DoctorState>>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.directory.register_doctor(request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.directory.get_doctor(doctor_id).await?;
    Ok(Json(json!(doctor)))
}

/// Removing a doctor also drops their recurring schedule; appointments are
/// history and stay untouched.
#[axum::debug_handler]
pub async fn remove_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.directory.remove_doctor(doctor_id).await?;
    state.schedule.remove_for_doctor(doctor_id).await;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor removed"
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entries = state.schedule.week_for(doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "entries": entries
    })))
}

#[axum::debug_handler]
pub async fn set_doctor_schedule(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetWeekScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let entries = state.schedule.replace_week(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "entries": entries,
        "message": "Schedule replaced"
    })))
}
