use crate::domain::{BulkInsertResult, CarIn, CarOut, PaginatedCars};
use crate::error::ApiError;
use crate::query::{CarQuery, LISTING_FILTERS, LISTING_SEARCH};
use crate::store::{CarStoreExt, PageRequest, StoreError};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Reads `page` / `page_size` from the query string. Out of range values are rejected,
/// never clamped.
pub fn page_request(params: &HashMap<String, String>) -> Result<PageRequest, ApiError> {
    let read = |name: &str, default: i64| match params.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::Validation(format!("{name} must be an integer"))),
    };

    let page = read("page", 1)?;
    if page < 1 {
        return Err(ApiError::Validation(
            "page must be greater than or equal to 1".into(),
        ));
    }
    let page_size = read("page_size", DEFAULT_PAGE_SIZE)?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(PageRequest { page, page_size })
}

fn validate(car: &CarIn) -> Result<(), ApiError> {
    if !car.price.is_finite() || car.price < 0.0 {
        return Err(ApiError::Validation(
            "price must be greater than or equal to 0".into(),
        ));
    }
    if car.mileage.is_some_and(|m| m < 0) {
        return Err(ApiError::Validation(
            "mileage must be greater than or equal to 0".into(),
        ));
    }
    Ok(())
}

/// Timestamp precision of the store column.
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Create and read operations over listings. Existing rows are only ever changed through
/// the admin gateway.
#[derive(Clone)]
pub struct CarService {
    store: Arc<dyn CarStoreExt>,
}

impl CarService {
    pub fn new(store: Arc<dyn CarStoreExt>) -> Self {
        Self { store }
    }

    #[instrument(skip_all)]
    pub async fn create(&self, car: CarIn) -> Result<CarOut, ApiError> {
        validate(&car)?;
        let vin = car.vin.clone();
        match self.store.insert(car.into_new_car(now())).await {
            Ok(car) => {
                debug!("created car `{}`", car.id);
                Ok(car.into())
            }
            Err(StoreError::Conflict(_)) => Err(ApiError::VinConflict(vin.unwrap_or_default())),
            Err(e) => Err(e.into()),
        }
    }

    /// Validates the whole batch up front, then inserts item by item. A constraint
    /// violation skips that item only; rows inserted before it stay.
    #[instrument(skip_all, fields(batch = cars.len()))]
    pub async fn bulk_create(&self, cars: Vec<CarIn>) -> Result<BulkInsertResult, ApiError> {
        for (idx, car) in cars.iter().enumerate() {
            validate(car).map_err(|e| ApiError::Validation(format!("item {idx}: {e}")))?;
        }

        let mut result = BulkInsertResult::default();
        for car in cars {
            match self.store.insert(car.into_new_car(now())).await {
                Ok(_) => result.inserted += 1,
                Err(e) if e.is_constraint_violation() => {
                    debug!(store_error = ?e, "skipping car");
                    result.skipped += 1;
                }
                Err(e) => {
                    warn!(
                        inserted = result.inserted,
                        "bulk insert aborted, earlier items stay committed"
                    );
                    return Err(e.into());
                }
            }
        }
        info!(
            "bulk insert done, inserted `{}` skipped `{}`",
            result.inserted, result.skipped
        );
        Ok(result)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<CarOut, ApiError> {
        self.store
            .find(id)
            .await?
            .map(CarOut::from)
            .ok_or(ApiError::CarNotFound(id))
    }

    pub async fn get_by_vin(&self, vin: &str) -> Result<CarOut, ApiError> {
        self.store
            .find_by_vin(vin)
            .await?
            .map(CarOut::from)
            .ok_or_else(|| ApiError::CarNotFoundVin(vin.to_owned()))
    }

    #[instrument(skip_all)]
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<PaginatedCars, ApiError> {
        let page = page_request(params)?;
        let query = CarQuery::from_params(&LISTING_FILTERS, LISTING_SEARCH, params);
        let result = self.store.search(&query, page).await?.map(CarOut::from);

        Ok(PaginatedCars {
            total: result.total,
            page: page.page,
            page_size: page.page_size,
            items: result.items,
        })
    }
}
