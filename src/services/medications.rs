//! Medication lookups.

use std::sync::Arc;

use crate::error::AppError;
use crate::model::LoadedMedication;
use crate::repository::DroneRepository;

pub struct MedicationService {
    repository: Arc<DroneRepository>,
}

impl MedicationService {
    pub fn new(repository: Arc<DroneRepository>) -> Self {
        Self { repository }
    }

    /// Medications currently loaded onto the drone with the given serial.
    /// An unknown serial yields an empty list rather than an error.
    pub async fn get_loaded_medications_for_drone(
        &self,
        serial_number: &str,
    ) -> Result<Vec<LoadedMedication>, AppError> {
        Ok(self.repository.loaded_medications(serial_number).await?)
    }
}
