//! A Firestore-flavored convenience layer over MongoDB.
//!
//! This crate wraps the official MongoDB driver with a small handle hierarchy
//! (service, database, collection, document reference) plus two conveniences the
//! driver does not provide:
//!
//! - **A logical-expression DSL** - filters written as nested BSON arrays
//!   (`["age", ">=", 18]`, `["and", ..., ...]`) compiled into MongoDB filter
//!   documents, see [`filter`]
//! - **Change-stream dispatch** - callback subscriptions on collections and single
//!   documents, with normalization and background delivery, see [`watch`]
//!
//! Connection management, cursors, transactions, and durability stay the driver's
//! business; this layer only calls documented driver operations and adds no retry,
//! caching, or pooling of its own.
//!
//! # Quick Start
//!
//! ```ignore
//! use bson::{bson, doc};
//! use firemongo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> MongoServiceResult<()> {
//!     let service = MongoService::connect("mongodb://localhost:27017").await?;
//!     let database = service.database("appdb");
//!     let mut people = database.collection("people");
//!
//!     // Fluent pipeline: compile a filter, sort, limit, run.
//!     let adults = people
//!         .filter(bson!(["age", ">=", 18]))
//!         .order_by("age", SortDirection::Asc)
//!         .limit(10)
//!         .get()
//!         .await?;
//!     println!("{} adults", adults.len());
//!
//!     // Per-document reference: upsert, read back, subscribe.
//!     let bob = people.document("bob");
//!     bob.set(doc! { "name": "Bob", "age": 30 }).await?;
//!
//!     let subscription = bob
//!         .on_snapshot(|documents, meta, _read_time| {
//!             println!("{:?} -> {:?}", meta.operation_type, documents[0]);
//!         })
//!         .await?;
//!
//!     bob.update(doc! { "age": 31 }).await?;
//!     subscription.cancel().await;
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Change subscriptions
//!
//! Each callback registration spawns one background task that pulls the stream and
//! delivers events in order. `on_change` hands the callback the raw driver event;
//! `on_snapshot` hands it the normalized (documents, metadata, read time) triple.
//! Use `watch()` instead when you want to drive the stream yourself.

pub mod collection;
pub mod database;
pub mod filter;
pub mod prelude;
pub mod reference;
pub mod service;
pub mod watch;

pub use firemongo_core::{error, expr};

// Re-export BSON types for convenience
pub use bson;

pub use collection::MongoCollection;
pub use database::MongoDatabase;
pub use reference::{MongoDocument, MongoReference};
pub use service::MongoService;
pub use watch::{ChangeMeta, Subscription};
