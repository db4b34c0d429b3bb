// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{self, DoctorState};

pub fn clinic_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_clinic))
        .with_state(state)
}

pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", post(handlers::register_doctor))
        .route(
            "/{doctor_id}",
            get(handlers::get_doctor).delete(handlers::remove_doctor),
        )
        .route("/{doctor_id}/schedule", get(handlers::get_doctor_schedule))
        .route("/{doctor_id}/schedule", put(handlers::set_doctor_schedule))
        .with_state(state)
}
