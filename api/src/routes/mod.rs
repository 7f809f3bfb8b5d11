pub mod admin;
pub mod cars;

use crate::Docs;
use crate::domain::Status;
use axum::Json;
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = Status)
    )
)]
pub async fn health() -> Json<Status> {
    Json(Status::ok())
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(Docs::openapi())
}
