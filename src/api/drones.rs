//! Drone route handlers.
//!
//! Handlers validate the raw request shapes at the boundary, delegate to
//! [`DroneService`], and wrap results in the uniform envelope. Rule and
//! field violations surface through [`AppError`]'s `IntoResponse` mapping.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use crate::error::AppError;
use crate::model::{DroneState, MedicationSpec, RegisterDroneRequest};
use crate::validation::{
    aggregate_field_errors, validate_medication_specs, validate_register_request,
};

use super::response::success_response;
use super::AppState;

pub async fn register_drone(
    State(context): State<AppState>,
    Json(request): Json<RegisterDroneRequest>,
) -> Result<Response, AppError> {
    let new_drone = validate_register_request(&request)
        .map_err(|errors| AppError::Validation(aggregate_field_errors(&errors)))?;

    let drone = context.drones.register_drone(new_drone).await?;
    context.metrics.drones_registered_total.inc();
    Ok(success_response(StatusCode::CREATED, &drone))
}

pub async fn load_drone(
    State(context): State<AppState>,
    Path(serial_number): Path<String>,
    Json(specs): Json<Vec<MedicationSpec>>,
) -> Result<Response, AppError> {
    let medications = validate_medication_specs(&specs)
        .map_err(|errors| AppError::Validation(aggregate_field_errors(&errors)))?;

    let drone = context
        .drones
        .load_drone_with_medications(&serial_number, medications)
        .await?;
    context.metrics.medication_loads_total.inc();
    Ok(success_response(StatusCode::OK, &drone))
}

pub async fn available_drones(State(context): State<AppState>) -> Result<Response, AppError> {
    let drones = context.drones.get_available_drones_for_loading().await?;
    Ok(success_response(StatusCode::OK, &drones))
}

pub async fn battery_level(
    State(context): State<AppState>,
    Path(serial_number): Path<String>,
) -> Result<Response, AppError> {
    let level = context.drones.check_drone_battery_level(&serial_number).await?;
    Ok(success_response(StatusCode::OK, &level))
}

pub async fn audit_events(State(context): State<AppState>) -> Result<Response, AppError> {
    let events = context.drones.get_audit_log_events().await?;
    Ok(success_response(StatusCode::OK, &events))
}

pub async fn change_state(
    State(context): State<AppState>,
    Path((serial_number, new_state)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let new_state: DroneState = new_state.parse().map_err(AppError::IllegalArgument)?;

    let drone = context
        .drones
        .change_drone_state(&serial_number, new_state)
        .await?;
    Ok(success_response(StatusCode::OK, &drone))
}

pub async fn change_battery_capacity(
    State(context): State<AppState>,
    Path((serial_number, new_battery_capacity)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    let drone = context
        .drones
        .change_battery_capacity(&serial_number, new_battery_capacity)
        .await?;
    Ok(success_response(StatusCode::OK, &drone))
}
