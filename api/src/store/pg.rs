use crate::query::CarQuery;
use crate::query::sql::{counted, filtered, ordered};
use crate::store::{CarStoreExt, Page, PageRequest, StoreError};
use async_trait::async_trait;
use common::persistence::PgPool;
use common::persistence::models::{Car, CarChangeset, NewCar};
use common::persistence::schema::cars;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use tracing::{debug, instrument};

/// Postgres backed store. Every call checks out its own pooled connection, which goes back
/// to the pool when the call returns, whatever the outcome.
#[derive(Clone)]
pub struct PgCarStore {
    pool: PgPool,
}

impl PgCarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarStoreExt for PgCarStore {
    #[instrument(skip_all)]
    async fn insert(&self, new_car: NewCar) -> Result<Car, StoreError> {
        let mut conn = self.pool.get().await?;
        let car = diesel::insert_into(cars::table)
            .values(&new_car)
            .returning(Car::as_returning())
            .get_result(&mut conn)
            .await?;
        debug!("inserted car `{}`", car.id);
        Ok(car)
    }

    #[instrument(skip(self))]
    async fn find(&self, id: i32) -> Result<Option<Car>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(cars::table
            .find(id)
            .select(Car::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    #[instrument(skip(self))]
    async fn find_by_vin(&self, vin: &str) -> Result<Option<Car>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(cars::table
            .filter(cars::vin.eq(vin))
            .select(Car::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &CarQuery, page: PageRequest) -> Result<Page<Car>, StoreError> {
        let mut conn = self.pool.get().await?;
        let total = counted(query).get_result::<i64>(&mut conn).await?;
        let items = ordered(filtered(query), query.sort)
            .offset(page.offset())
            .limit(page.limit())
            .select(Car::as_select())
            .load(&mut conn)
            .await?;
        debug!("matched `{total}` cars, returning `{}`", items.len());
        Ok(Page { total, items })
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: i32, changes: CarChangeset) -> Result<Option<Car>, StoreError> {
        if changes.is_empty() {
            return self.find(id).await;
        }
        let mut conn = self.pool.get().await?;
        Ok(diesel::update(cars::table.find(id))
            .set(&changes)
            .returning(Car::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let deleted = diesel::delete(cars::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}
