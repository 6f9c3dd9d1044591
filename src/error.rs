//! Unified application error.
//!
//! Every layer (validation, services, repository, config) fails through
//! [`AppError`], and the `IntoResponse` impl maps each variant to its HTTP
//! status and the uniform response envelope. Database and config failures
//! surface to clients as a generic 500; the real error is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::response::error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Drone not found with serial number: {0}")]
    DroneNotFound(String),

    #[error("{0}")]
    BatteryLow(String),

    #[error("{0}")]
    BatteryHigh(String),

    #[error("{0}")]
    BatteryEqual(String),

    #[error("{0}")]
    WeightExceeded(String),

    #[error("{0}")]
    DroneState(String),

    #[error("{0}")]
    IllegalArgument(String),

    #[error("{0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DroneNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BatteryLow(_)
            | AppError::BatteryHigh(_)
            | AppError::BatteryEqual(_)
            | AppError::WeightExceeded(_)
            | AppError::DroneState(_)
            | AppError::IllegalArgument(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        error_response(status, &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_not_found_formats_serial_into_message() {
        let err = AppError::DroneNotFound("DR_404".to_string());
        assert_eq!(err.to_string(), "Drone not found with serial number: DR_404");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rule_violations_map_to_400() {
        let errors = [
            AppError::BatteryLow("low".into()),
            AppError::BatteryHigh("high".into()),
            AppError::BatteryEqual("equal".into()),
            AppError::WeightExceeded("heavy".into()),
            AppError::DroneState("state".into()),
            AppError::IllegalArgument("negative".into()),
            AppError::Validation("fields".into()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn database_errors_map_to_500() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
