//! Fixture entities and helpers shared by the integration tests.

pub mod billing;
pub mod mail;
pub mod shop;

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use db_storage::{DbStorage, Schema, StorageConfig};
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
    instrument::WithSubscriber,
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    Layer,
    fmt::{format, layer},
    layer::{Context, SubscriberExt},
    util::SubscriberInitExt,
};

/// Route library logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(
            layer()
                .with_test_writer()
                .event_format(format().without_time().with_target(false).compact()),
        )
        .try_init();
}

/// # Errors
///
/// If a fixture declaration is inconsistent.
pub fn schema() -> db_storage::Result<Schema> {
    Schema::builder()
        .register::<shop::Customer>()
        .register::<shop::Order>()
        .register::<shop::Item>()
        .register::<billing::Invoice>()
        .register::<billing::InvoiceLine>()
        .register::<billing::Account>()
        .register::<billing::Settings>()
        .register::<mail::Person>()
        .register::<mail::Letter>()
        .register::<mail::Folder>()
        .build()
}

/// A storage backed by a private in-memory SQLite database, with every fixture table created.
///
/// # Errors
///
/// If the database cannot be opened.
pub async fn storage() -> db_storage::Result<DbStorage> {
    init_tracing();

    // One long-lived connection: every SQLite memory connection is its own database.
    let config = StorageConfig {
        max_connections: 1,
        min_connections: 1,
        ..StorageConfig::new("sqlite::memory:")
    };

    let storage = DbStorage::connect(&config, schema()?).await?;
    storage.create_tables().await?;

    Ok(storage)
}

/// Counts the `select` statements the library logs while [`count`](Self::count) runs.
#[derive(Debug, Clone, Default)]
pub struct StatementCounter(Arc<AtomicUsize>);

impl StatementCounter {
    #[must_use]
    pub fn selects(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Drive `future` with this counter as its only subscriber.
    pub async fn count<F: Future>(&self, future: F) -> F::Output {
        future
            .with_subscriber(tracing_subscriber::registry().with(self.clone()))
            .await
    }
}

struct Message(Option<String>);

impl Visit for Message {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for StatementCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target().split("::").next() != Some("db_storage") {
            return;
        }

        let mut message = Message(None);
        event.record(&mut message);

        if message.0.is_some_and(|e| e.starts_with("select")) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
