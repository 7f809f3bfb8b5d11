pub mod memory;
pub mod pg;

use crate::query::CarQuery;
use async_trait::async_trait;
use common::persistence::models::{Car, CarChangeset, NewCar};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;
use thiserror::Error;

pub use memory::MemoryCarStore;
pub use pg::PgCarStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("pg pool error: {0}")]
    PgPool(#[from] PoolError),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("diesel error: {0}")]
    Diesel(DieselError),
}

impl From<DieselError> for StoreError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.message().to_owned())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => Self::Constraint(info.message().to_owned()),
            other => Self::Diesel(other),
        }
    }
}

impl StoreError {
    /// Constraint failures that a batch insert skips instead of aborting on.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Constraint(_))
    }
}

/// Offset/limit slice of a query. Bounds are checked by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// One page of rows plus the number of rows matching the query overall.
#[derive(Debug, PartialEq)]
pub struct Page<T> {
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[async_trait]
pub trait CarStoreExt: Send + Sync {
    async fn insert(&self, new_car: NewCar) -> Result<Car, StoreError>;

    async fn find(&self, id: i32) -> Result<Option<Car>, StoreError>;

    /// Exact, case-sensitive match.
    async fn find_by_vin(&self, vin: &str) -> Result<Option<Car>, StoreError>;

    async fn search(&self, query: &CarQuery, page: PageRequest) -> Result<Page<Car>, StoreError>;

    /// `None` when no row has that id.
    async fn update(&self, id: i32, changes: CarChangeset) -> Result<Option<Car>, StoreError>;

    /// `false` when no row has that id.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}
