use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, doctor_view_routes};
use appointment_cell::services::BookingService;
use doctor_cell::handlers::DoctorState;
use doctor_cell::router::{clinic_routes, doctor_routes};
use doctor_cell::services::{AvailabilityService, DirectoryService, ScheduleService};
use shared_config::AppConfig;
use shared_database::{Collection, LockRegistry};

pub struct AppServices {
    pub doctor_state: Arc<DoctorState>,
    pub booking: Arc<BookingService>,
}

/// Build the engine: the shared collections and the service stack on top of
/// them. All cells see the same stores.
pub fn build_services(config: &AppConfig) -> AppServices {
    let clinics = Arc::new(Collection::new());
    let doctors = Arc::new(Collection::new());
    let schedules = Arc::new(Collection::new());
    let appointments = Arc::new(Collection::new());
    let doctor_locks = Arc::new(LockRegistry::new());

    let directory = Arc::new(DirectoryService::new(clinics, doctors, config));
    let schedule = Arc::new(ScheduleService::new(Arc::clone(&directory), schedules));
    let availability = Arc::new(AvailabilityService::new(
        Arc::clone(&directory),
        Arc::clone(&schedule),
        config,
    ));
    let booking = Arc::new(BookingService::new(
        Arc::clone(&directory),
        availability,
        appointments,
        doctor_locks,
    ));

    AppServices {
        doctor_state: Arc::new(DoctorState {
            directory,
            schedule,
        }),
        booking,
    }
}

pub fn create_router(services: AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Dentara Clinic API is running!" }))
        .nest("/clinics", clinic_routes(Arc::clone(&services.doctor_state)))
        .nest(
            "/doctors",
            doctor_routes(services.doctor_state).merge(doctor_view_routes(Arc::clone(
                &services.booking,
            ))),
        )
        .nest("/appointments", appointment_routes(services.booking))
}
