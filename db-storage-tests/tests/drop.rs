#![allow(clippy::unwrap_used)]

use db_storage::{Filters, Related};
use db_storage_tests::{
    billing::{Account, Invoice, InvoiceLine, Settings},
    shop::{Customer, Item, Order},
    storage,
};

#[tokio::test]
async fn cascading_to_many_removes_children() {
    let storage = storage().await.unwrap();

    let mut invoices = vec![
        Invoice {
            number: "INV-1".to_string(),
            lines: vec![InvoiceLine::new("design", 400), InvoiceLine::new("hosting", 20)].into(),
            ..Invoice::default()
        },
        Invoice {
            number: "INV-2".to_string(),
            lines: vec![InvoiceLine::new("support", 80)].into(),
            ..Invoice::default()
        },
    ];
    storage.store(&mut invoices, true).await.unwrap();

    let removed = storage
        .drop::<Invoice>(&Filters::new().with("number", "INV-1"))
        .await
        .unwrap();

    assert!(removed);

    let lines = storage.pickup::<InvoiceLine>(&Filters::new()).await.unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].label, "support");
}

#[tokio::test]
async fn non_cascading_to_many_leaves_children() {
    let storage = storage().await.unwrap();

    let mut order = Order::new("N-1", Customer::new("Ned"));
    order.items.push(Item::new("bolt", 12));
    let mut orders = vec![order];
    storage.store(&mut orders, true).await.unwrap();

    let removed = storage
        .drop::<Order>(&Filters::new().with("id", orders[0].id))
        .await
        .unwrap();

    assert!(removed);
    assert!(storage.pickup::<Order>(&Filters::new()).await.unwrap().is_empty());

    let items = storage.pickup::<Item>(&Filters::new()).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].order.key(), orders[0].id);

    // The customer is referenced, not owned.
    assert_eq!(storage.pickup::<Customer>(&Filters::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cascading_to_one_removes_the_target() {
    let storage = storage().await.unwrap();

    let mut accounts = vec![
        Account {
            login: "ops".to_string(),
            settings: Related::new(Settings {
                theme: "dark".to_string(),
                dark: true,
                ..Settings::default()
            }),
            ..Account::default()
        },
        Account {
            login: "dev".to_string(),
            settings: Related::new(Settings {
                theme: "light".to_string(),
                ..Settings::default()
            }),
            ..Account::default()
        },
    ];
    storage.store(&mut accounts, true).await.unwrap();

    let removed = storage
        .drop::<Account>(&Filters::new().with("login", "ops"))
        .await
        .unwrap();

    assert!(removed);

    let remaining = storage.pickup::<Account>(&Filters::new()).await.unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].login, "dev");

    let settings = storage.pickup::<Settings>(&Filters::new()).await.unwrap();

    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].theme, "light");
}

#[tokio::test]
async fn dropping_nothing_reports_false() {
    let storage = storage().await.unwrap();

    let removed = storage
        .drop::<Customer>(&Filters::new().with("name", "Ghost"))
        .await
        .unwrap();

    assert!(!removed);
}
