//! Rejection mapping for the stock axum extractors.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (and the `Query`/`Path`
//! equivalents) and unwrap them here, so malformed input answers with the
//! same `{"detail": ...}` body as every other error.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::AppError;

/// Body that parsed as JSON but does not fit the target type is 422,
/// anything else (syntax, missing content type) is 400.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(value)| value).map_err(|err| {
        let detail = err.body_text();
        match err {
            JsonRejection::JsonDataError(_) => AppError::Validation(detail),
            _ => AppError::BadRequest(detail),
        }
    })
}

pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(value)| value)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(value)| value)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequest;
    use axum::http::{header, Request, StatusCode};

    use crate::models::Item;

    async fn item_from(content_type: &str, body: &'static str) -> Result<Item, AppError> {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap();
        extract_json(Json::<Item>::from_request(request, &()).await)
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let err = item_from("application/json", r#"{"id":1,"name":"x","price":"cheap"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_broken_json_is_bad_request() {
        let err = item_from("application/json", "{not json").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = item_from("text/plain", "{}").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
