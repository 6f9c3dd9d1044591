//! Lifecycle rules and boundary validation for incoming requests.
//!
//! Lifecycle rules are pure functions over domain records, returning the
//! first violated rule as an [`AppError`]. Check order within each rule is
//! part of the contract so error reporting stays deterministic.
//!
//! Boundary validation inspects the raw request shapes field by field and
//! collects every violation into [`FieldError`]s, which the API layer
//! aggregates into a single 400 message.

use crate::error::AppError;
use crate::model::{
    Drone, DroneModel, DroneState, MedicationSpec, NewDrone, NewMedication, RegisterDroneRequest,
};

/// Minimum battery percentage for loading and for explicit state changes.
pub const MIN_BATTERY_FOR_LOADING: i64 = 25;
/// Maximum battery percentage.
pub const MAX_BATTERY: i64 = 100;
/// Maximum total medication weight per load, in grams.
pub const MAX_MEDICATION_WEIGHT: i64 = 500;

pub const MAX_SERIAL_LENGTH: usize = 100;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_CODE_LENGTH: usize = 50;

// ---- Lifecycle rules ----

pub fn validate_for_registration(drone: &NewDrone) -> Result<(), AppError> {
    if drone.battery_capacity < MIN_BATTERY_FOR_LOADING && drone.state == DroneState::Loading {
        return Err(AppError::BatteryLow(
            "Drone battery is low during loading state".to_string(),
        ));
    }
    if drone.battery_capacity > MAX_BATTERY {
        return Err(AppError::BatteryHigh(
            "Cannot change battery capacity because it exceeds 100 percent".to_string(),
        ));
    }
    Ok(())
}

/// Checks run in a fixed order: battery, then weight, then state.
pub fn validate_for_loading(drone: &Drone, total_weight: i64) -> Result<(), AppError> {
    if drone.battery_capacity < MIN_BATTERY_FOR_LOADING {
        return Err(AppError::BatteryLow(
            "Battery capacity for drone is not in a valid state for loading medications"
                .to_string(),
        ));
    }
    if total_weight > MAX_MEDICATION_WEIGHT {
        return Err(AppError::WeightExceeded(
            "Weight for medication cannot exceed 500 grams for drone is not in a valid state for loading medications"
                .to_string(),
        ));
    }
    if drone.state != DroneState::Loading {
        return Err(AppError::DroneState(
            "Drone is not in a valid state for loading medications".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_state_change(drone: &Drone) -> Result<(), AppError> {
    if drone.battery_capacity < MIN_BATTERY_FOR_LOADING {
        return Err(AppError::BatteryLow(
            "Cannot change state drone when battery capacity is low".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_battery_change(drone: &Drone, new_value: i64) -> Result<(), AppError> {
    if new_value < 0 {
        return Err(AppError::IllegalArgument(
            "Battery capacity cannot be negative".to_string(),
        ));
    }
    if new_value > MAX_BATTERY {
        return Err(AppError::BatteryHigh(
            "Cannot change battery capacity because it exceeds 100 percent".to_string(),
        ));
    }
    if drone.battery_capacity == new_value {
        return Err(AppError::BatteryEqual(
            "The new battery capacity is the same as the current battery capacity".to_string(),
        ));
    }
    Ok(())
}

// ---- Boundary field validation ----

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub rejected_value: String,
    pub reason: String,
}

impl FieldError {
    fn new(
        field: impl Into<String>,
        rejected_value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rejected_value: rejected_value.into(),
            reason: reason.into(),
        }
    }
}

/// Collapse field errors into the single message surfaced as a 400.
pub fn aggregate_field_errors(errors: &[FieldError]) -> String {
    let mut message = String::from("Validation failed for: ");
    for error in errors {
        message.push_str(&format!(
            "'{}' with value '{}' (Reason: {}); ",
            error.field, error.rejected_value, error.reason
        ));
    }
    message
}

fn is_serial_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

pub fn validate_register_request(
    request: &RegisterDroneRequest,
) -> Result<NewDrone, Vec<FieldError>> {
    let mut errors = Vec::new();

    let serial_number = match request.serial_number.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new(
                "serialNumber",
                request.serial_number.clone().unwrap_or_default(),
                "Serial number is required",
            ));
            String::new()
        }
        Some(serial) => {
            if serial.len() > MAX_SERIAL_LENGTH {
                errors.push(FieldError::new(
                    "serialNumber",
                    serial,
                    "Serial number must be at most 100 characters",
                ));
            }
            if !serial.chars().all(is_serial_char) {
                errors.push(FieldError::new(
                    "serialNumber",
                    serial,
                    "Serial number must contain only upper case letters, numbers, and '_'",
                ));
            }
            serial.to_string()
        }
    };

    let model = match request.model.as_deref() {
        None => {
            errors.push(FieldError::new("model", "", "Drone model is mandatory field"));
            None
        }
        Some(raw) => match raw.parse::<DroneModel>() {
            Ok(model) => Some(model),
            Err(_) => {
                errors.push(FieldError::new("model", raw, "Unknown drone model"));
                None
            }
        },
    };

    let weight_limit = match request.weight_limit {
        None => {
            errors.push(FieldError::new("weightLimit", "", "Weight limit is required"));
            0
        }
        Some(weight) => {
            if weight < 0 {
                errors.push(FieldError::new(
                    "weightLimit",
                    weight.to_string(),
                    "Weight limit must be a positive or zero value",
                ));
            } else if weight > MAX_MEDICATION_WEIGHT {
                errors.push(FieldError::new(
                    "weightLimit",
                    weight.to_string(),
                    "Weight limit cannot exceed 500 grams",
                ));
            }
            weight
        }
    };

    let battery_capacity = match request.battery_capacity {
        None => {
            errors.push(FieldError::new(
                "batteryCapacity",
                "",
                "Battery capacity is required",
            ));
            0
        }
        Some(battery) => {
            if battery < 0 {
                errors.push(FieldError::new(
                    "batteryCapacity",
                    battery.to_string(),
                    "Battery capacity must be a positive or zero value",
                ));
            } else if battery > MAX_BATTERY {
                errors.push(FieldError::new(
                    "batteryCapacity",
                    battery.to_string(),
                    "Battery capacity cannot exceed 100 percent",
                ));
            }
            battery
        }
    };

    // Absent state means the drone starts out IDLE.
    let state = match request.state.as_deref() {
        None => DroneState::Idle,
        Some(raw) => match raw.parse::<DroneState>() {
            Ok(state) => state,
            Err(_) => {
                errors.push(FieldError::new("state", raw, "Unknown drone state"));
                DroneState::Idle
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewDrone {
        serial_number,
        model: model.unwrap_or(DroneModel::Lightweight),
        weight_limit,
        battery_capacity,
        state,
    })
}

pub fn validate_medication_specs(
    specs: &[MedicationSpec],
) -> Result<Vec<NewMedication>, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut medications = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let name = match spec.name.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new(
                    format!("medications[{}].name", index),
                    spec.name.clone().unwrap_or_default(),
                    "Name is mandatory",
                ));
                String::new()
            }
            Some(name) => {
                if name.len() > MAX_NAME_LENGTH {
                    errors.push(FieldError::new(
                        format!("medications[{}].name", index),
                        name,
                        "Name cannot exceed 255 characters",
                    ));
                }
                if !name.chars().all(is_name_char) {
                    errors.push(FieldError::new(
                        format!("medications[{}].name", index),
                        name,
                        "Name must contain only letters, numbers, '-', and '_'",
                    ));
                }
                name.to_string()
            }
        };

        let weight = match spec.weight {
            None => {
                errors.push(FieldError::new(
                    format!("medications[{}].weight", index),
                    "",
                    "Weight is required",
                ));
                0
            }
            Some(weight) => {
                if weight < 0 {
                    errors.push(FieldError::new(
                        format!("medications[{}].weight", index),
                        weight.to_string(),
                        "Weight must be a positive or zero value",
                    ));
                }
                weight
            }
        };

        let code = match spec.code.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new(
                    format!("medications[{}].code", index),
                    spec.code.clone().unwrap_or_default(),
                    "Code is mandatory",
                ));
                String::new()
            }
            Some(code) => {
                if code.len() > MAX_CODE_LENGTH {
                    errors.push(FieldError::new(
                        format!("medications[{}].code", index),
                        code,
                        "Code cannot exceed 50 characters",
                    ));
                }
                if !code.chars().all(is_serial_char) {
                    errors.push(FieldError::new(
                        format!("medications[{}].code", index),
                        code,
                        "Code must contain only upper case letters, numbers, and '_'",
                    ));
                }
                code.to_string()
            }
        };

        let image = match spec.image.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new(
                    format!("medications[{}].image", index),
                    spec.image.clone().unwrap_or_default(),
                    "Image URL is mandatory",
                ));
                String::new()
            }
            Some(image) => image.to_string(),
        };

        medications.push(NewMedication {
            name,
            weight,
            code,
            image,
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(medications)
}
