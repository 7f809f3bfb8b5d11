use crate::AppState;
use crate::admin::AdminGateway;
use crate::domain::{AdminCarPage, Status};
use crate::error::{ApiError, ApiForm, ApiJson, ApiPath, ApiQuery};
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use chrono::Utc;
use common::persistence::models::{Car, CarChangeset, NewCar};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.admin.check_credentials(&form.username, &form.password) {
        warn!("admin login failed");
        return Err(ApiError::InvalidCredentials);
    }
    info!("admin logged in");
    let cookie = state.admin.session_cookie(Utc::now().timestamp());
    Ok(([(SET_COOKIE, cookie)], ApiJson(Status::ok())))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, AdminGateway::cleared_cookie())],
        ApiJson(Status::ok()),
    )
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> Result<ApiJson<AdminCarPage>, ApiError> {
    Ok(ApiJson(state.admin.list(&params).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new_car): ApiJson<NewCar>,
) -> Result<(StatusCode, ApiJson<Car>), ApiError> {
    Ok((StatusCode::CREATED, ApiJson(state.admin.create(new_car).await?)))
}

pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<ApiJson<Car>, ApiError> {
    Ok(ApiJson(state.admin.get(id).await?))
}

pub async fn edit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(changes): ApiJson<CarChangeset>,
) -> Result<ApiJson<Car>, ApiError> {
    Ok(ApiJson(state.admin.edit(id, changes).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    state.admin.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
