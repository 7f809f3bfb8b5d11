use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use common::config::Admin;
use hmac::digest::InvalidLength;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod admin;
pub mod domain;
pub mod error;
pub mod query;
pub mod routes;
pub mod service;
pub mod store;

use crate::admin::AdminGateway;
use crate::service::CarService;
use crate::store::CarStoreExt;

#[derive(OpenApi)]
#[openapi(
    info(title = "cars api"),
    paths(
        crate::routes::health,
        crate::routes::cars::create,
        crate::routes::cars::bulk,
        crate::routes::cars::by_id,
        crate::routes::cars::by_vin,
        crate::routes::cars::list
    )
)]
pub struct Docs;

#[derive(Clone)]
pub struct AppState {
    pub cars: CarService,
    pub admin: AdminGateway,
}

impl AppState {
    pub fn new(store: Arc<dyn CarStoreExt>, admin: Admin) -> Result<Self, InvalidLength> {
        Ok(Self {
            cars: CarService::new(store.clone()),
            admin: AdminGateway::new(admin, store)?,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/cars",
            get(routes::admin::list).post(routes::admin::create),
        )
        .route(
            "/cars/{id}",
            get(routes::admin::detail)
                .patch(routes::admin::edit)
                .delete(routes::admin::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.admin.clone(),
            admin::require_session,
        ))
        .route("/login", post(routes::admin::login))
        .route("/logout", get(routes::admin::logout).post(routes::admin::logout));

    Router::new()
        .route("/health", get(routes::health))
        .route("/openapi.json", get(routes::openapi))
        .route("/cars", get(routes::cars::list).post(routes::cars::create))
        .route("/cars/bulk", post(routes::cars::bulk))
        .route("/cars/by_vin/{vin}", get(routes::cars::by_vin))
        .route("/cars/{id}", get(routes::cars::by_id))
        .nest("/admin", admin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // any origin, method and header; tighten before exposing publicly
        .layer(CorsLayer::permissive())
}
