use api::query::{CarQuery, LISTING_FILTERS, LISTING_SEARCH};
use api::store::{CarStoreExt, PageRequest, PgCarStore, StoreError};
use common::config::Postgres;
use common::persistence::models::{CarChangeset, NewCar};
use common::persistence::{init_pg_pool, run_migrations};
use std::collections::HashMap;
use testcontainers_modules::postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;

fn new_car(make: &str, model: &str, price: f64, vin: Option<&str>) -> NewCar {
    NewCar {
        make: make.into(),
        model: model.into(),
        year: 2015,
        price,
        vin: vin.map(Into::into),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "needs a docker daemon"]
async fn test_pg_store() -> Result<(), Box<dyn std::error::Error>> {
    let container = postgres::Postgres::default().start().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let pool = init_pg_pool(&Postgres {
        host: "127.0.0.1".into(),
        port,
        db_name: "postgres".into(),
        ..Default::default()
    })?;
    run_migrations(&pool).await?;
    // second run finds nothing pending
    run_migrations(&pool).await?;
    let store = PgCarStore::new(pool);

    let civic = store
        .insert(new_car("Honda", "Civic", 15000.0, Some("VIN-1")))
        .await?;
    store.insert(new_car("Honda", "Accord", 22000.0, None)).await?;
    store.insert(new_car("Ford", "Focus_RS", 30000.0, None)).await?;

    assert!(matches!(
        store
            .insert(new_car("Honda", "Civic", 1.0, Some("VIN-1")))
            .await,
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(store.find(civic.id).await?, Some(civic.clone()));
    assert_eq!(store.find_by_vin("VIN-1").await?, Some(civic.clone()));
    assert_eq!(store.find_by_vin("vin-1").await?, None);

    let params: HashMap<String, String> = [("search", "HONDA"), ("sort", "price_desc")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    let query = CarQuery::from_params(&LISTING_FILTERS, LISTING_SEARCH, &params);
    let page = store
        .search(
            &query,
            PageRequest {
                page: 1,
                page_size: 1,
            },
        )
        .await?;
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].model, "Accord");

    // underscore is literal, not a single character wildcard
    let by_model = |needle: &str| {
        let params: HashMap<String, String> = [("model".to_owned(), needle.to_owned())].into();
        CarQuery::from_params(&LISTING_FILTERS, LISTING_SEARCH, &params)
    };
    let all = PageRequest {
        page: 1,
        page_size: 10,
    };
    assert_eq!(store.search(&by_model("o_u"), all).await?.total, 0);
    let page = store.search(&by_model("s_r"), all).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].model, "Focus_RS");
    assert_eq!(store.search(&by_model("100%"), all).await?.total, 0);

    let changes = CarChangeset {
        price: Some(-1.0),
        trim: Some(Some("EX".into())),
        ..Default::default()
    };
    let updated = store.update(civic.id, changes).await?.expect("row exists");
    assert_eq!(updated.price, -1.0);
    assert_eq!(updated.trim.as_deref(), Some("EX"));
    assert_eq!(store.update(9999, CarChangeset::default()).await?, None);

    assert!(store.delete(civic.id).await?);
    assert!(!store.delete(civic.id).await?);
    assert_eq!(store.find(civic.id).await?, None);
    Ok(())
}
