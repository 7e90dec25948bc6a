#![allow(clippy::unwrap_used)]

use db_storage::{Error, FilterValue, Filters, Lazy, Related};
use db_storage_tests::{
    billing::{Account, Settings},
    shop::{Customer, Item, Order},
    storage,
};

#[tokio::test]
async fn stored_instances_read_back_equal() {
    let storage = storage().await.unwrap();

    let mut customers = vec![
        Customer {
            email: Some("alice@example.com".to_string()),
            ..Customer::new("Alice")
        },
        Customer::new("Bob"),
    ];
    storage.store(&mut customers, false).await.unwrap();

    assert!(customers.iter().all(|e| e.id.is_some()));
    assert_ne!(customers[0].id, customers[1].id);

    let picked = storage
        .pickup::<Customer>(&Filters::new().with("name", "Alice"))
        .await
        .unwrap();

    assert_eq!(picked, vec![customers[0].clone()]);

    let bob = storage
        .pickup_one::<Customer>(&Filters::new().null("email"))
        .await
        .unwrap();

    assert_eq!(bob, customers[1]);
}

#[tokio::test]
async fn every_column_kind_survives_a_round_trip() {
    let storage = storage().await.unwrap();

    let mut accounts = vec![Account {
        login: "root".to_string(),
        settings: Related::new(Settings {
            theme: "solarized".to_string(),
            dark: true,
            ratio: 1.5,
            avatar: Some(vec![0xde, 0xad, 0xbe, 0xef]),
            ..Settings::default()
        }),
        ..Account::default()
    }];
    storage.store(&mut accounts, true).await.unwrap();

    let picked = storage
        .pickup_one::<Account>(&Filters::new().with("login", "root"))
        .await
        .unwrap();

    assert_eq!(picked, accounts[0]);
    assert!(picked.settings.get().is_some_and(|e| e.dark && e.ratio == 1.5));
}

#[tokio::test]
async fn updating_without_changes_is_idempotent() {
    let storage = storage().await.unwrap();

    let mut orders = vec![Order::new("A-1", Customer::new("Carol"))];
    storage.store(&mut orders, true).await.unwrap();

    let before = storage
        .pickup_one::<Order>(&Filters::new().with("reference", "A-1"))
        .await
        .unwrap();

    storage.update(&mut orders, true).await.unwrap();
    storage.update(&mut orders, true).await.unwrap();

    let after = storage.pickup::<Order>(&Filters::new()).await.unwrap();
    let customers = storage.pickup::<Customer>(&Filters::new()).await.unwrap();

    assert_eq!(after, vec![before]);
    assert_eq!(customers.len(), 1);
}

#[tokio::test]
async fn update_writes_changed_columns() {
    let storage = storage().await.unwrap();

    let mut customers = vec![Customer::new("Dave")];
    storage.store(&mut customers, false).await.unwrap();

    customers[0].email = Some("dave@example.com".to_string());
    storage.update(&mut customers, false).await.unwrap();

    let picked = storage
        .pickup_one::<Customer>(&Filters::new().with("name", "Dave"))
        .await
        .unwrap();

    assert_eq!(picked.email.as_deref(), Some("dave@example.com"));
    assert_eq!(picked.id, customers[0].id);
}

#[tokio::test]
async fn update_of_a_vanished_row_fails() {
    let storage = storage().await.unwrap();

    let mut customers = vec![Customer::new("Erin")];
    storage.store(&mut customers, false).await.unwrap();
    storage
        .drop::<Customer>(&Filters::new().with("name", "Erin"))
        .await
        .unwrap();

    let result = storage.update(&mut customers, false).await;

    assert!(matches!(result, Err(Error::NotFound { found: 0, .. })));
}

#[tokio::test]
async fn children_receive_the_parent_identity() {
    let storage = storage().await.unwrap();

    let mut order = Order::new("B-7", Customer::new("Frank"));
    order.items.push(Item::new("pen", 3));
    order.items.push(Item {
        note: Lazy::new(Some("gift wrap".to_string())),
        ..Item::new("ink", 1)
    });

    let mut orders = vec![order];
    storage.store(&mut orders, true).await.unwrap();

    let id = orders[0].id;
    let stored = orders[0].items.get().unwrap();

    assert!(stored.iter().all(|e| e.id.is_some() && e.order.key() == id));

    let items = storage
        .pickup::<Item>(&Filters::new().with("order", id))
        .await
        .unwrap();

    let mut products = items.iter().map(|e| e.product.as_str()).collect::<Vec<_>>();
    products.sort_unstable();

    assert_eq!(products, ["ink", "pen"]);
    assert!(items.iter().all(|e| e.order.key() == id));
}

#[tokio::test]
async fn unset_relations_are_left_untouched() {
    let storage = storage().await.unwrap();

    let mut orders = vec![Order::new("C-1", Customer::new("Gina"))];
    storage.store(&mut orders, true).await.unwrap();

    orders[0].customer = Related::Unset;
    orders[0].reference = "C-2".to_string();
    storage.update(&mut orders, false).await.unwrap();

    let picked = storage
        .pickup_one::<Order>(&Filters::new().with("reference", "C-2"))
        .await
        .unwrap();

    assert_eq!(picked.customer.get().map(|e| e.name.as_str()), Some("Gina"));

    orders[0].customer.clear();
    storage.update(&mut orders, false).await.unwrap();

    let picked = storage
        .pickup_one::<Order>(&Filters::new().null("customer"))
        .await
        .unwrap();

    assert_eq!(picked.customer, Related::Null);
}

#[tokio::test]
async fn related_object_filters_match_by_identity_or_columns() {
    let storage = storage().await.unwrap();

    let mut orders = vec![
        Order::new("D-1", Customer::new("Hank")),
        Order::new("D-2", Customer::new("Ivy")),
    ];
    storage.store(&mut orders, true).await.unwrap();

    let ivy = orders[1].customer.get().unwrap().clone();

    let by_identity = storage
        .pickup::<Order>(&Filters::new().with("customer", FilterValue::object(ivy)))
        .await
        .unwrap();

    assert_eq!(by_identity.len(), 1);
    assert_eq!(by_identity[0].reference, "D-2");

    let by_columns = storage
        .pickup::<Order>(&Filters::new().with("customer", FilterValue::object(Customer::new("Hank"))))
        .await
        .unwrap();

    assert_eq!(by_columns.len(), 1);
    assert_eq!(by_columns[0].reference, "D-1");

    let missing = storage
        .pickup::<Order>(&Filters::new().with("customer", FilterValue::object(Customer::new("Nobody"))))
        .await;

    assert!(matches!(
        missing,
        Err(Error::RelatedObjectNotFound { matches: 0, .. })
    ));
}

#[tokio::test]
async fn like_filters_use_wildcards() {
    let storage = storage().await.unwrap();

    let mut customers = vec![
        Customer::new("Jack"),
        Customer::new("Jill"),
        Customer::new("Kim"),
    ];
    storage.store(&mut customers, false).await.unwrap();

    let found = storage
        .find::<Customer>()
        .filter("name", FilterValue::like("J*"))
        .order_by("name", db_storage::Direction::Desc)
        .all()
        .await
        .unwrap();

    assert_eq!(
        found.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        ["Jill", "Jack"]
    );
}
