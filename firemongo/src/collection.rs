//! Collection handle with a fluent aggregation-pipeline builder.
//!
//! [`MongoCollection`] accumulates pipeline stages (`$match`, `$sort`, `$limit`)
//! through chained builder calls and executes them with [`get`](MongoCollection::get)
//! or [`aggregate`](MongoCollection::aggregate). Execution consumes the pipeline:
//! the handle atomically resets to an empty pipeline before the driver call, so a
//! second immediate execution runs an unfiltered scan. This reset-on-read behavior
//! is part of the contract.
//!
//! # Example
//!
//! ```ignore
//! use bson::bson;
//! use firemongo_core::expr::SortDirection;
//!
//! let mut people = database.collection("people");
//! let adults = people
//!     .filter(bson!(["age", ">=", 18]))
//!     .order_by("age", SortDirection::Asc)
//!     .limit(10)
//!     .get()
//!     .await?;
//! ```
//!
//! The pipeline is owned exclusively by one handle instance; concurrent builder and
//! execution calls on a shared handle require external synchronization.

use std::collections::HashMap;
use std::mem;

use bson::{Bson, Document, Timestamp, doc};
use futures::TryStreamExt;
use mongodb::{
    Collection, Cursor,
    change_stream::{ChangeStream, event::ChangeStreamEvent},
};

use firemongo_core::{
    error::{MongoServiceError, MongoServiceResult},
    expr::SortDirection,
};

use crate::{
    filter::compile,
    reference::MongoReference,
    watch::{self, ChangeMeta, Subscription},
};

/// Represents a MongoDB collection.
#[derive(Debug)]
pub struct MongoCollection {
    collection: Collection<Document>,
    pipeline: Vec<Document>,
}

impl MongoCollection {
    /// Creates a new collection handle (internal use).
    pub(crate) fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            pipeline: Vec::new(),
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Returns the pipeline stages accumulated so far, in the order they were added.
    pub fn pipeline(&self) -> &[Document] {
        &self.pipeline
    }

    /// Appends a `$match` stage compiled from a surface-syntax expression.
    ///
    /// The expression is a nested BSON array in the DSL described in
    /// [`firemongo_core::expr`]; values matching no grammar rule are passed to the
    /// server unchanged.
    pub fn filter(&mut self, expr: impl Into<Bson>) -> &mut Self {
        self.pipeline.push(doc! { "$match": compile(&expr.into()) });
        self
    }

    /// Appends a `$sort` stage on the given field.
    pub fn order_by(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        let field = field.into();
        self.pipeline
            .push(doc! { "$sort": { field: direction.sign() } });
        self
    }

    /// Appends a `$limit` stage.
    ///
    /// Negative values are handed to the driver as-is; their behavior is defined by
    /// the server, not by this layer.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.pipeline.push(doc! { "$limit": limit });
        self
    }

    /// Executes the accumulated pipeline and returns the driver cursor.
    ///
    /// The pipeline is taken out of the handle before the driver call, so the handle
    /// is empty again regardless of whether execution succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MongoServiceError::Driver`] if the aggregation fails.
    pub async fn aggregate(&mut self) -> MongoServiceResult<Cursor<Document>> {
        let pipeline = mem::take(&mut self.pipeline);
        self.collection
            .aggregate(pipeline)
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Executes the accumulated pipeline and materializes all matching documents.
    ///
    /// With an empty pipeline this returns every document in the collection.
    pub async fn get(&mut self) -> MongoServiceResult<Vec<Document>> {
        self.aggregate()
            .await?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Executes the accumulated pipeline and returns the documents keyed by id.
    ///
    /// Each document's `_id` is removed and used as the map key: string ids as-is,
    /// ObjectIds as their hex form, anything else through its display rendering.
    /// Documents without an `_id` are skipped.
    pub async fn to_map(&mut self) -> MongoServiceResult<HashMap<String, Document>> {
        let mut data = HashMap::new();
        for mut document in self.get().await? {
            if let Some(id) = document.remove("_id") {
                data.insert(key_string(&id), document);
            }
        }

        Ok(data)
    }

    /// Returns the number of documents in the collection.
    pub async fn count(&self) -> MongoServiceResult<u64> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Drops the collection.
    pub async fn drop(&self) -> MongoServiceResult<()> {
        self.collection
            .drop()
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Returns a reference to the document with the given id.
    ///
    /// The document does not need to exist; writes through the reference upsert it.
    pub fn document(&self, id: impl Into<Bson>) -> MongoReference {
        MongoReference::new(self.collection.clone(), id.into())
    }

    /// Inserts an empty document and returns a reference to it, keyed by the
    /// driver-generated id.
    pub async fn new_document(&self) -> MongoServiceResult<MongoReference> {
        let result = self
            .collection
            .insert_one(Document::new())
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))?;

        Ok(MongoReference::new(
            self.collection.clone(),
            result.inserted_id,
        ))
    }

    /// Opens a change stream over this collection for caller-driven iteration.
    pub async fn watch(
        &self,
    ) -> MongoServiceResult<ChangeStream<ChangeStreamEvent<Document>>> {
        self.collection
            .watch()
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Subscribes a raw-event callback to this collection's change stream.
    ///
    /// The callback receives each driver event unmodified, one at a time, in stream
    /// order, from a background task. Registration returns immediately with the
    /// [`Subscription`] handle.
    pub async fn on_change<F>(&self, callback: F) -> MongoServiceResult<Subscription>
    where
        F: FnMut(ChangeStreamEvent<Document>) + Send + 'static,
    {
        Ok(watch::spawn(self.watch().await?, callback))
    }

    /// Subscribes a snapshot callback to this collection's change stream.
    ///
    /// The callback receives the normalized (documents, metadata, read time) triple
    /// described in [`watch::normalize`](crate::watch::normalize).
    pub async fn on_snapshot<F>(&self, callback: F) -> MongoServiceResult<Subscription>
    where
        F: FnMut(Vec<Document>, ChangeMeta, Option<Timestamp>) + Send + 'static,
    {
        Ok(watch::spawn_snapshot(self.watch().await?, callback))
    }
}

/// Renders a document id as a map key.
pub(crate) fn key_string(id: &Bson) -> String {
    match id {
        Bson::String(value) => value.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, oid::ObjectId};
    use mongodb::{
        Client,
        options::{ClientOptions, ServerAddress},
    };
    use std::time::Duration;

    // The driver connects lazily, so builder-only tests can use a handle that never
    // talks to a server. Nothing listens on the port, and the short selection
    // timeout keeps tests that do hit the driver fast.
    fn offline_collection() -> MongoCollection {
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: "localhost".to_string(),
                port: Some(27099),
            }])
            .server_selection_timeout(Duration::from_millis(100))
            .build();
        let client = Client::with_options(options).expect("client options are valid");

        MongoCollection::new(client.database("testdb").collection("people"))
    }

    #[tokio::test]
    async fn filter_appends_compiled_match_stages_in_order() {
        let mut collection = offline_collection();
        collection
            .filter(bson!(["age", ">", 18]))
            .filter(bson!(["name", "==", "Bob"]));

        assert_eq!(
            collection.pipeline(),
            &[
                doc! { "$match": { "age": { "$gt": 18 } } },
                doc! { "$match": { "name": "Bob" } },
            ],
        );
    }

    #[tokio::test]
    async fn order_by_and_limit_build_their_stage_shapes() {
        let mut collection = offline_collection();
        collection
            .order_by("age", SortDirection::Desc)
            .limit(25);

        assert_eq!(
            collection.pipeline(),
            &[
                doc! { "$sort": { "age": -1 } },
                doc! { "$limit": 25_i64 },
            ],
        );
    }

    #[tokio::test]
    async fn chained_stages_preserve_call_order() {
        let mut collection = offline_collection();
        collection
            .filter(bson!(["age", ">=", 18]))
            .order_by("age", SortDirection::Asc)
            .limit(10);

        let kinds = collection
            .pipeline()
            .iter()
            .map(|stage| stage.keys().next().expect("stage key").as_str())
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["$match", "$sort", "$limit"]);
    }

    #[tokio::test]
    async fn execution_resets_the_pipeline_even_when_the_driver_fails() {
        let mut collection = offline_collection();
        collection.filter(bson!(["age", ">", 18]));
        assert_eq!(collection.pipeline().len(), 1);

        // The pipeline is taken out of the handle before the driver call, so it
        // empties whether or not the aggregation succeeds; with no server behind
        // the handle, it fails after the selection timeout.
        let result = collection.aggregate().await;
        assert!(matches!(result, Err(MongoServiceError::Driver(_))));
        assert!(collection.pipeline().is_empty());
    }

    #[test]
    fn key_string_renders_each_id_kind() {
        let oid = ObjectId::new();
        assert_eq!(key_string(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(key_string(&Bson::String("user-1".to_string())), "user-1");
        assert_eq!(key_string(&Bson::Int32(7)), Bson::Int32(7).to_string());
    }
}
