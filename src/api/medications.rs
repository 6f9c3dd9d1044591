//! Medication route handlers.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppError;
use crate::model::LoadedMedication;

use super::AppState;

/// The loaded-medications listing returns a bare array, not the envelope.
pub async fn loaded_medications(
    State(context): State<AppState>,
    Path(serial_number): Path<String>,
) -> Result<Json<Vec<LoadedMedication>>, AppError> {
    let medications = context
        .medications
        .get_loaded_medications_for_drone(&serial_number)
        .await?;
    Ok(Json(medications))
}
