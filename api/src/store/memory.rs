use crate::query::CarQuery;
use crate::store::{CarStoreExt, Page, PageRequest, StoreError};
use async_trait::async_trait;
use common::persistence::models::{Car, CarChangeset, NewCar};
use tokio::sync::Mutex;

#[derive(Default)]
struct Table {
    last_id: i32,
    rows: Vec<Car>,
}

impl Table {
    fn vin_taken(&self, vin: Option<&str>, except_id: Option<i32>) -> bool {
        vin.is_some_and(|vin| {
            self.rows
                .iter()
                .any(|c| Some(c.id) != except_id && c.vin.as_deref() == Some(vin))
        })
    }
}

/// Process-local store with the same observable behaviour as the postgres one: serial ids,
/// unique VINs and identical filter/sort semantics. Backs the router tests.
#[derive(Default)]
pub struct MemoryCarStore {
    table: Mutex<Table>,
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn vin_conflict(vin: Option<&str>) -> StoreError {
    StoreError::Conflict(format!(
        "duplicate key value violates unique constraint \"cars_vin_key\": `{}`",
        vin.unwrap_or_default()
    ))
}

#[async_trait]
impl CarStoreExt for MemoryCarStore {
    async fn insert(&self, new_car: NewCar) -> Result<Car, StoreError> {
        let mut table = self.table.lock().await;
        // a serial is consumed even when the insert fails, as in postgres
        table.last_id += 1;
        if table.vin_taken(new_car.vin.as_deref(), None) {
            return Err(vin_conflict(new_car.vin.as_deref()));
        }
        let car = new_car.into_car(table.last_id);
        table.rows.push(car.clone());
        Ok(car)
    }

    async fn find(&self, id: i32) -> Result<Option<Car>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_vin(&self, vin: &str) -> Result<Option<Car>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|c| c.vin.as_deref() == Some(vin))
            .cloned())
    }

    async fn search(&self, query: &CarQuery, page: PageRequest) -> Result<Page<Car>, StoreError> {
        let table = self.table.lock().await;
        let mut matching = table
            .rows
            .iter()
            .filter(|c| query.matches(c))
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(0))
            .cloned()
            .collect();
        Ok(Page { total, items })
    }

    async fn update(&self, id: i32, changes: CarChangeset) -> Result<Option<Car>, StoreError> {
        let mut table = self.table.lock().await;
        let Some(idx) = table.rows.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let new_vin = changes.vin.as_ref().and_then(|vin| vin.as_deref());
        if table.vin_taken(new_vin, Some(id)) {
            return Err(vin_conflict(new_vin));
        }
        let car = &mut table.rows[idx];
        changes.apply(car);
        Ok(Some(car.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|c| c.id != id);
        Ok(table.rows.len() < before)
    }
}
