#![allow(clippy::unwrap_used)]

use db_storage::{DbStorage, Entity, Error, FilterValue, Filters, Limit, Related, Schema};
use db_storage_tests::{
    billing::{Account, Settings},
    shop::{Customer, Item, Order},
    storage,
};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
struct Stray {
    id: Option<i64>,
}

#[tokio::test]
async fn constraint_failures_roll_back_the_whole_write() {
    let storage = storage().await.unwrap();

    let mut customers = vec![
        Customer::new("Uno"),
        Customer::new("Dos"),
        Customer::new("Uno"),
    ];
    let result = storage.store(&mut customers, false).await;

    assert!(matches!(result, Err(Error::IntegrityViolation(_))));
    assert!(storage.pickup::<Customer>(&Filters::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unstored_targets_need_cascading() {
    let storage = storage().await.unwrap();

    let mut orders = vec![Order::new("R-1", Customer::new("Zed"))];
    let result = storage.store(&mut orders, false).await;

    assert!(matches!(
        result,
        Err(Error::RelatedObjectNotFound { matches: 0, .. })
    ));
    assert!(storage.pickup::<Customer>(&Filters::new()).await.unwrap().is_empty());
    assert!(storage.pickup::<Order>(&Filters::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn ambiguous_related_objects_are_rejected() {
    let storage = storage().await.unwrap();

    let plain = || Settings {
        theme: "plain".to_string(),
        ratio: 1.0,
        ..Settings::default()
    };
    let mut accounts = vec![
        Account {
            login: "first".to_string(),
            settings: Related::new(plain()),
            ..Account::default()
        },
        Account {
            login: "second".to_string(),
            settings: Related::new(plain()),
            ..Account::default()
        },
    ];
    storage.store(&mut accounts, true).await.unwrap();

    let result = storage
        .pickup::<Account>(&Filters::new().with("settings", FilterValue::object(plain())))
        .await;

    assert!(matches!(
        result,
        Err(Error::RelatedObjectNotFound { matches: 2, .. })
    ));
}

#[tokio::test]
async fn pickup_one_needs_exactly_one_match() {
    let storage = storage().await.unwrap();

    let mut customers = vec![Customer::new("Kay"), Customer::new("Lee")];
    storage.store(&mut customers, false).await.unwrap();

    assert!(matches!(
        storage.find::<Customer>().one().await,
        Err(Error::NotFound { found: 2, .. })
    ));
    assert!(matches!(
        storage.find::<Customer>().filter("name", "Moe").one().await,
        Err(Error::NotFound { found: 0, .. })
    ));
}

#[tokio::test]
async fn malformed_filters_fail_before_querying() {
    let storage = storage().await.unwrap();

    assert!(matches!(
        storage.find::<Item>().filter("quantity", "lots").query(),
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        storage.find::<Item>().filter("weight", 3).query(),
        Err(Error::UnknownAttribute { .. })
    ));
    assert!(matches!(
        storage.find::<Item>().filter("quantity", FilterValue::like("1*")).query(),
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        storage
            .find::<Order>()
            .filter("customer", Limit::max("name"))
            .query(),
        Err(Error::InvalidFilterValue { .. })
    ));
    assert!(matches!(
        storage.find::<Order>().order_by("items", db_storage::Direction::Asc).query(),
        Err(Error::InvalidFilterValue { .. })
    ));
}

#[tokio::test]
async fn unregistered_types_are_reported() {
    let storage = storage().await.unwrap();

    assert!(matches!(
        storage.pickup::<Stray>(&Filters::new()).await,
        Err(Error::UnregisteredType(_))
    ));
}

#[test]
fn relations_must_target_registered_types() {
    let result = Schema::builder().register::<Order>().build();

    assert!(matches!(result, Err(Error::UnregisteredType(_))));
}

#[tokio::test]
async fn config_errors_surface_on_connect() {
    let config = db_storage::StorageConfig::new("oracle://localhost");

    assert!(matches!(
        DbStorage::connect(&config, Schema::builder().build().unwrap()).await,
        Err(Error::Config(_))
    ));
}
