use crate::AppState;
use crate::domain::{BulkInsertResult, CarIn, CarOut, PaginatedCars};
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ErrorResponse};
use axum::extract::State;
use std::collections::HashMap;

#[utoipa::path(
    post,
    path = "/cars",
    tag = "cars",
    request_body = CarIn,
    responses(
        (status = 200, description = "Returns the stored car", body = CarOut),
        (status = 409, description = "A car with the same vin already exists", body = ErrorResponse),
        (status = 422, description = "Body is missing required fields or has out of range values", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(car): ApiJson<CarIn>,
) -> Result<ApiJson<CarOut>, ApiError> {
    Ok(ApiJson(state.cars.create(car).await?))
}

#[utoipa::path(
    post,
    path = "/cars/bulk",
    tag = "cars",
    request_body = [CarIn],
    responses(
        (status = 200, description = "Counts of inserted and skipped cars; items violating a constraint are skipped", body = BulkInsertResult),
        (status = 422, description = "Some item is invalid, nothing was inserted", body = ErrorResponse)
    )
)]
pub async fn bulk(
    State(state): State<AppState>,
    ApiJson(cars): ApiJson<Vec<CarIn>>,
) -> Result<ApiJson<BulkInsertResult>, ApiError> {
    Ok(ApiJson(state.cars.bulk_create(cars).await?))
}

#[utoipa::path(
    get,
    path = "/cars/{id}",
    tag = "cars",
    params(
        ("id" = i32, Path, description = "Internal id of the car")
    ),
    responses(
        (status = 200, description = "Returns the car", body = CarOut),
        (status = 404, description = "No car with that id", body = ErrorResponse)
    )
)]
pub async fn by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<ApiJson<CarOut>, ApiError> {
    Ok(ApiJson(state.cars.get_by_id(id).await?))
}

#[utoipa::path(
    get,
    path = "/cars/by_vin/{vin}",
    tag = "cars",
    params(
        ("vin" = String, Path, description = "Exact, case-sensitive vin")
    ),
    responses(
        (status = 200, description = "Returns the car", body = CarOut),
        (status = 404, description = "No car with that vin", body = ErrorResponse)
    )
)]
pub async fn by_vin(
    State(state): State<AppState>,
    ApiPath(vin): ApiPath<String>,
) -> Result<ApiJson<CarOut>, ApiError> {
    Ok(ApiJson(state.cars.get_by_vin(&vin).await?))
}

#[utoipa::path(
    get,
    path = "/cars",
    tag = "cars",
    params(
        ("page" = Option<i64>, Query, description = "1-based page, defaults to 1"),
        ("page_size" = Option<i64>, Query, description = "Between 1 and 100, defaults to 20"),
        ("search" = Option<String>, Query, description = "Substring of make, model, trim, city, state or title"),
        ("sort" = Option<String>, Query, description = "price_asc, price_desc, year_asc, year_desc, mileage_asc or mileage_desc"),
        ("make" = Option<String>, Query, description = "Case-insensitive substring; model, trim, city, state, seller_type, exterior_color, interior_color, transmission, drivetrain, fuel_type, body_type, engine, auction_status and title work the same"),
        ("year_from" = Option<String>, Query, description = "Lower year bound; year_to, price_min, price_max, mileage_min and mileage_max work the same. Unparsable values are ignored")
    ),
    responses(
        (status = 200, description = "One page of matching cars", body = PaginatedCars),
        (status = 422, description = "page or page_size out of range", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> Result<ApiJson<PaginatedCars>, ApiError> {
    Ok(ApiJson(state.cars.list(&params).await?))
}
