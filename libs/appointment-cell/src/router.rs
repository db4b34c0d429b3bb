// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::BookingService;

pub fn appointment_routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route(
            "/{appointment_id}/status",
            post(handlers::change_appointment_status),
        )
        .with_state(service)
}

/// Doctor-scoped read models: the slot picker and the day sheet. Mounted
/// under `/doctors` next to the directory routes.
pub fn doctor_view_routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/{doctor_id}/slots", get(handlers::get_busy_slots))
        .route(
            "/{doctor_id}/appointments",
            get(handlers::get_doctor_day_appointments),
        )
        .with_state(service)
}
