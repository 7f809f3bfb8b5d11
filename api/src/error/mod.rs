use crate::store::StoreError;
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("store error: `{0}`")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(String),
    #[error("invalid json body: {0}")]
    Json(#[from] JsonRejection),
    #[error("invalid query string: {0}")]
    Query(#[from] QueryRejection),
    #[error("invalid path parameter: {0}")]
    Path(#[from] PathRejection),
    #[error("invalid form body: {0}")]
    Form(#[from] FormRejection),
    #[error("car with given vin already exists: `{0}`")]
    VinConflict(String),
    #[error("car with given id not found: `{0}`")]
    CarNotFound(i32),
    #[error("car with given vin not found: `{0}`")]
    CarNotFoundVin(String),
    #[error("invalid admin credentials")]
    InvalidCredentials,
    #[error("admin session missing or expired")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::Json(_) | Self::Query(_) | Self::Path(_) | Self::Form(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Store(StoreError::Constraint(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::VinConflict(_) | Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::CarNotFound(_) | Self::CarNotFoundVin(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(api_error = ?self, "request failed");
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };

        (status, ApiJson(ErrorResponse { message })).into_response()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    message: String,
}

/// `axum::Json` whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("page".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::VinConflict("X".into()), StatusCode::CONFLICT),
            (
                ApiError::Store(StoreError::Conflict("dup".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Store(StoreError::Constraint("null".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::CarNotFound(3), StatusCode::NOT_FOUND),
            (ApiError::CarNotFoundVin("X".into()), StatusCode::NOT_FOUND),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::Store(StoreError::Diesel(diesel::result::Error::NotFound)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
