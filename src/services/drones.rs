//! Drone lifecycle operations.
//!
//! [`DroneService`] combines the lifecycle rules from [`crate::validation`]
//! with [`DroneRepository`] writes. Registration forces new drones to IDLE,
//! state changes are audited, and battery updates are not.

use std::sync::Arc;

use crate::error::AppError;
use crate::model::{AuditLog, Drone, DroneState, NewDrone, NewMedication};
use crate::repository::DroneRepository;
use crate::validation::{
    validate_battery_change, validate_for_loading, validate_for_registration,
    validate_state_change, MIN_BATTERY_FOR_LOADING,
};

pub struct DroneService {
    repository: Arc<DroneRepository>,
}

impl DroneService {
    pub fn new(repository: Arc<DroneRepository>) -> Self {
        Self { repository }
    }

    /// Register a new drone. The requested state is validated but the drone
    /// always starts out IDLE.
    pub async fn register_drone(&self, drone: NewDrone) -> Result<Drone, AppError> {
        if self.repository.serial_exists(&drone.serial_number).await? {
            return Err(AppError::Validation(format!(
                "Drone with serial number {} is already registered",
                drone.serial_number
            )));
        }

        validate_for_registration(&drone)?;

        let mut drone = drone;
        drone.state = DroneState::Idle;

        let saved = self.repository.insert_drone(&drone).await?;
        tracing::info!("Registered drone {}", saved.serial_number);
        Ok(saved)
    }

    /// Load medications onto the drone with the given serial and move it to
    /// LOADED. The total weight is checked against the fixed 500 gram cap,
    /// not the drone's own weight limit.
    pub async fn load_drone_with_medications(
        &self,
        serial_number: &str,
        medications: Vec<NewMedication>,
    ) -> Result<Drone, AppError> {
        let drone = self
            .repository
            .find_by_serial(serial_number)
            .await?
            .ok_or_else(|| AppError::DroneNotFound(serial_number.to_string()))?;

        let total_weight: i64 = medications.iter().map(|medication| medication.weight).sum();
        validate_for_loading(&drone, total_weight)?;

        let loaded = self.repository.load_medications(&drone, &medications).await?;
        tracing::info!(
            "Loaded {} medication entries onto drone {}",
            medications.len(),
            loaded.serial_number
        );
        Ok(loaded)
    }

    /// Drones currently available for loading, meaning in the LOADING state.
    pub async fn get_available_drones_for_loading(&self) -> Result<Vec<Drone>, AppError> {
        Ok(self.repository.find_by_state(DroneState::Loading).await?)
    }

    pub async fn check_drone_battery_level(&self, serial_number: &str) -> Result<i64, AppError> {
        let drone = self
            .repository
            .find_by_serial(serial_number)
            .await?
            .ok_or_else(|| AppError::DroneNotFound(serial_number.to_string()))?;
        Ok(drone.battery_capacity)
    }

    /// Set a new state and append a "Changed state to {STATE}" audit entry.
    pub async fn change_drone_state(
        &self,
        serial_number: &str,
        new_state: DroneState,
    ) -> Result<Drone, AppError> {
        let drone = self
            .repository
            .find_by_serial(serial_number)
            .await?
            .ok_or_else(|| AppError::DroneNotFound(serial_number.to_string()))?;

        validate_state_change(&drone)?;

        let event = format!("Changed state to {}", new_state);
        let updated = self
            .repository
            .update_state_with_audit(&drone, new_state, &event)
            .await?;
        tracing::info!("Drone ID: {}, Event: {}", updated.id, event);
        Ok(updated)
    }

    /// Set a new battery percentage. Battery updates are not audited.
    pub async fn change_battery_capacity(
        &self,
        serial_number: &str,
        new_battery_capacity: i64,
    ) -> Result<Drone, AppError> {
        let drone = self
            .repository
            .find_by_serial(serial_number)
            .await?
            .ok_or_else(|| AppError::DroneNotFound(serial_number.to_string()))?;

        validate_battery_change(&drone, new_battery_capacity)?;

        let mut updated = drone;
        updated.battery_capacity = new_battery_capacity;
        self.repository.update_drone(&updated).await?;
        Ok(updated)
    }

    pub async fn get_audit_log_events(&self) -> Result<Vec<AuditLog>, AppError> {
        Ok(self.repository.list_audit_logs().await?)
    }

    /// Drones the battery sweep should flag: battery below the loading
    /// minimum and not currently LOADING.
    pub async fn find_low_battery_drones(&self) -> Result<Vec<Drone>, AppError> {
        Ok(self
            .repository
            .find_low_battery(MIN_BATTERY_FOR_LOADING, DroneState::Loading)
            .await?)
    }

    /// Append the "Low Battery" audit entry for a drone found by the sweep.
    pub async fn record_low_battery(&self, drone: &Drone) -> Result<(), AppError> {
        self.repository.record_low_battery(drone, "Low Battery").await?;
        tracing::info!("Drone ID: {}, Event: Low Battery", drone.id);
        Ok(())
    }
}
