// libs/doctor-cell/src/services/directory.rs
use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_utils::time;

use crate::models::{
    Clinic, CreateClinicRequest, Doctor, DoctorError, RegisterDoctorRequest, StaffRole,
};

/// Clinic and staff directory. Clinics are the ownership root: a doctor
/// belongs to a clinic, and the clinic's stored offset defines the wall
/// clock every schedule and appointment in it is read against.
pub struct DirectoryService {
    clinics: Arc<Collection<Clinic>>,
    doctors: Arc<Collection<Doctor>>,
    default_offset_minutes: i32,
}

impl DirectoryService {
    pub fn new(
        clinics: Arc<Collection<Clinic>>,
        doctors: Arc<Collection<Doctor>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            clinics,
            doctors,
            default_offset_minutes: config.default_clinic_offset_minutes,
        }
    }

    pub async fn create_clinic(&self, request: CreateClinicRequest) -> Result<Clinic, DoctorError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DoctorError::Validation(
                "Clinic name must not be empty".to_string(),
            ));
        }

        let offset = request
            .utc_offset_minutes
            .unwrap_or(self.default_offset_minutes);
        if time::clinic_zone(offset).is_none() {
            return Err(DoctorError::Validation(format!(
                "UTC offset {} minutes is outside the valid range",
                offset
            )));
        }

        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            utc_offset_minutes: offset,
            created_at: Utc::now(),
        };
        self.clinics.insert(clinic.id, clinic.clone()).await;

        info!("Clinic {} registered ({})", clinic.id, clinic.name);
        Ok(clinic)
    }

    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(DoctorError::Validation(
                "Staff name must not be empty".to_string(),
            ));
        }
        if !self.clinics.contains(&request.clinic_id).await {
            return Err(DoctorError::ClinicNotFound);
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            clinic_id: request.clinic_id,
            full_name: full_name.to_string(),
            role: request.role,
            created_at: Utc::now(),
        };
        self.doctors.insert(doctor.id, doctor.clone()).await;

        info!(
            "Staff member {} registered at clinic {} as {}",
            doctor.id, doctor.clinic_id, doctor.role
        );
        Ok(doctor)
    }

    pub async fn clinic(&self, clinic_id: Uuid) -> Result<Clinic, DoctorError> {
        self.clinics
            .get(&clinic_id)
            .await
            .ok_or(DoctorError::ClinicNotFound)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.doctors
            .get(&doctor_id)
            .await
            .ok_or(DoctorError::DoctorNotFound)
    }

    /// Fetch a staff member and require the `doctor` role. Scheduling never
    /// operates on assistants or receptionists.
    pub async fn require_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;
        if doctor.role != StaffRole::Doctor {
            return Err(DoctorError::NotADoctor);
        }
        Ok(doctor)
    }

    /// The wall-clock zone of the clinic that owns `clinic_id`.
    pub async fn zone_for(&self, clinic_id: Uuid) -> Result<FixedOffset, DoctorError> {
        let clinic = self.clinic(clinic_id).await?;
        time::clinic_zone(clinic.utc_offset_minutes).ok_or_else(|| {
            DoctorError::Validation(format!(
                "Clinic {} has an invalid stored offset",
                clinic_id
            ))
        })
    }

    pub async fn remove_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let removed = self
            .doctors
            .remove(&doctor_id)
            .await
            .ok_or(DoctorError::DoctorNotFound)?;
        debug!("Doctor {} removed from directory", doctor_id);
        Ok(removed)
    }
}
