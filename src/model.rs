//! Domain records for drones, medications, and audit events.
//!
//! Enums are stored in SQLite as their upper-case TEXT names and serialised
//! the same way on the wire. Struct fields serialise as camelCase to match
//! the public API payloads.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DroneModel {
    Lightweight,
    Middleweight,
    Cruiserweight,
    Heavyweight,
}

impl DroneModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroneModel::Lightweight => "LIGHTWEIGHT",
            DroneModel::Middleweight => "MIDDLEWEIGHT",
            DroneModel::Cruiserweight => "CRUISERWEIGHT",
            DroneModel::Heavyweight => "HEAVYWEIGHT",
        }
    }
}

impl FromStr for DroneModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIGHTWEIGHT" => Ok(DroneModel::Lightweight),
            "MIDDLEWEIGHT" => Ok(DroneModel::Middleweight),
            "CRUISERWEIGHT" => Ok(DroneModel::Cruiserweight),
            "HEAVYWEIGHT" => Ok(DroneModel::Heavyweight),
            other => Err(format!("Unknown drone model: {}", other)),
        }
    }
}

impl fmt::Display for DroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DroneState {
    Idle,
    Loading,
    Loaded,
    Delivering,
    Delivered,
    Returning,
}

impl DroneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroneState::Idle => "IDLE",
            DroneState::Loading => "LOADING",
            DroneState::Loaded => "LOADED",
            DroneState::Delivering => "DELIVERING",
            DroneState::Delivered => "DELIVERED",
            DroneState::Returning => "RETURNING",
        }
    }
}

impl FromStr for DroneState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(DroneState::Idle),
            "LOADING" => Ok(DroneState::Loading),
            "LOADED" => Ok(DroneState::Loaded),
            "DELIVERING" => Ok(DroneState::Delivering),
            "DELIVERED" => Ok(DroneState::Delivered),
            "RETURNING" => Ok(DroneState::Returning),
            other => Err(format!("Unknown drone state: {}", other)),
        }
    }
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered drone. Drones are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: i64,
    pub serial_number: String,
    pub model: DroneModel,
    pub weight_limit: i64,
    pub battery_capacity: i64,
    pub state: DroneState,
}

/// Insert form of a drone, produced by boundary validation of a
/// [`RegisterDroneRequest`].
#[derive(Debug, Clone)]
pub struct NewDrone {
    pub serial_number: String,
    pub model: DroneModel,
    pub weight_limit: i64,
    pub battery_capacity: i64,
    pub state: DroneState,
}

/// A medication known to the system, identified by its unique `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub weight: i64,
    pub code: String,
    pub image: String,
}

/// Insert form of a medication, produced by boundary validation of a
/// [`MedicationSpec`].
#[derive(Debug, Clone)]
pub struct NewMedication {
    pub name: String,
    pub weight: i64,
    pub code: String,
    pub image: String,
}

/// A medication currently loaded onto a drone, with the cumulative number
/// of times it has been loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedMedication {
    pub id: i64,
    pub name: String,
    pub weight: i64,
    pub code: String,
    pub image: String,
    pub quantity: i64,
}

/// Append-only audit log entry for drone lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub drone_id: i64,
    pub drone_serial_number: String,
    pub event_description: String,
    pub event_timestamp: DateTime<Utc>,
}

// ---- Raw request shapes ----
//
// Deliberately loosely typed: every field is optional and enums arrive as
// strings, so a malformed request produces one aggregated 400 listing every
// offending field instead of a bare deserialisation rejection.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDroneRequest {
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub weight_limit: Option<i64>,
    pub battery_capacity: Option<i64>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSpec {
    pub name: Option<String>,
    pub weight: Option<i64>,
    pub code: Option<String>,
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_state_parses_all_upper_case_names() {
        for name in ["IDLE", "LOADING", "LOADED", "DELIVERING", "DELIVERED", "RETURNING"] {
            let state: DroneState = name.parse().unwrap();
            assert_eq!(state.as_str(), name);
        }
    }

    #[test]
    fn drone_state_rejects_unknown_name() {
        let err = "FLYING".parse::<DroneState>().unwrap_err();
        assert!(err.contains("FLYING"));
    }

    #[test]
    fn drone_model_parses_all_upper_case_names() {
        for name in ["LIGHTWEIGHT", "MIDDLEWEIGHT", "CRUISERWEIGHT", "HEAVYWEIGHT"] {
            let model: DroneModel = name.parse().unwrap();
            assert_eq!(model.as_str(), name);
        }
    }

    #[test]
    fn drone_serialises_with_camel_case_fields_and_upper_case_enums() {
        let drone = Drone {
            id: 1,
            serial_number: "DR_001".to_string(),
            model: DroneModel::Cruiserweight,
            weight_limit: 200,
            battery_capacity: 30,
            state: DroneState::Idle,
        };

        let json = serde_json::to_value(&drone).unwrap();
        assert_eq!(json["serialNumber"], "DR_001");
        assert_eq!(json["model"], "CRUISERWEIGHT");
        assert_eq!(json["weightLimit"], 200);
        assert_eq!(json["batteryCapacity"], 30);
        assert_eq!(json["state"], "IDLE");
    }

    #[test]
    fn register_request_tolerates_missing_fields() {
        let request: RegisterDroneRequest = serde_json::from_str("{}").unwrap();
        assert!(request.serial_number.is_none());
        assert!(request.model.is_none());
        assert!(request.state.is_none());
    }
}
