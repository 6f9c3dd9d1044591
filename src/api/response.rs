//! Uniform response envelope.
//!
//! Every drone endpoint wraps its payload as `{data, message, status}`.
//! Success envelopes always carry `message: "Success"` and `status: "OK"`,
//! even when the HTTP status is 201; clients key off the HTTP status for
//! that distinction. Error envelopes carry a null `data` and the upper
//! snake case reason of the HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
        .replace(' ', "_")
}

pub fn success_response<T: Serialize>(status: StatusCode, data: &T) -> Response {
    let body = json!({
        "data": data,
        "message": "Success",
        "status": "OK",
    });
    (status, Json(body)).into_response()
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "data": null,
        "message": message,
        "status": status_name(status),
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope_carries_ok_even_on_201() {
        let response = success_response(StatusCode::CREATED, &42);
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["data"], 42);
        assert_eq!(json["message"], "Success");
        assert_eq!(json["status"], "OK");
    }

    #[tokio::test]
    async fn error_envelope_uses_upper_snake_reason() {
        let response = error_response(StatusCode::BAD_REQUEST, "boom");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["message"], "boom");
        assert_eq!(json["status"], "BAD_REQUEST");
    }

    #[test]
    fn status_names_are_upper_snake() {
        assert_eq!(status_name(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(
            status_name(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
    }
}
