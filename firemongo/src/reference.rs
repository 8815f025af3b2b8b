//! Per-document reference handles and point-in-time snapshots.
//!
//! A [`MongoReference`] identifies one document by its key within a collection. The
//! reference itself is stateless beyond that key: the document lives in the database,
//! and every operation is one driver call scoped to `{"_id": key}`. Writes are upserts,
//! so a reference may point at a document that does not exist yet.
//!
//! Write payloads never control the key. Any `_id` field present in the payload is
//! stripped before the write; the target is always the reference's own key.

use bson::{Bson, Document, Timestamp, doc};
use mongodb::{
    Collection,
    change_stream::{ChangeStream, event::ChangeStreamEvent},
};
use serde::{Serialize, de::DeserializeOwned};

use firemongo_core::error::{MongoServiceError, MongoServiceResult};

use crate::{
    collection::key_string,
    watch::{self, ChangeMeta, Subscription},
};

/// Represents a reference to one MongoDB document, existing or not.
#[derive(Debug, Clone)]
pub struct MongoReference {
    collection: Collection<Document>,
    doc_id: Bson,
}

impl MongoReference {
    /// Creates a new document reference (internal use).
    pub(crate) fn new(collection: Collection<Document>, doc_id: Bson) -> Self {
        Self { collection, doc_id }
    }

    /// Returns the key this reference points at.
    pub fn id(&self) -> &Bson {
        &self.doc_id
    }

    fn key_filter(&self) -> Document {
        doc! { "_id": self.doc_id.clone() }
    }

    /// Looks up the referenced document.
    ///
    /// Returns `None` when no document with this key exists.
    pub async fn get(&self) -> MongoServiceResult<Option<Document>> {
        self.collection
            .find_one(self.key_filter())
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Takes a point-in-time snapshot of the referenced document.
    pub async fn snapshot(&self) -> MongoServiceResult<MongoDocument> {
        Ok(MongoDocument::new(self.get().await?, self.doc_id.clone()))
    }

    /// Deletes the referenced document. Deleting an absent document is a no-op.
    pub async fn delete(&self) -> MongoServiceResult<()> {
        self.collection
            .delete_one(self.key_filter())
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))?;

        Ok(())
    }

    /// Replaces the referenced document with the payload, inserting it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`MongoServiceError::InvalidDocument`] if the payload does not
    /// serialize to a document, or [`MongoServiceError::Driver`] if the write fails.
    pub async fn set(&self, data: impl Serialize) -> MongoServiceResult<()> {
        let payload = clean_payload(data)?;
        self.collection
            .replace_one(self.key_filter(), payload)
            .upsert(true)
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))?;

        Ok(())
    }

    /// Merges the payload's fields into the referenced document, inserting it if
    /// absent. Fields not named in the payload are left untouched.
    pub async fn update(&self, data: impl Serialize) -> MongoServiceResult<()> {
        let payload = clean_payload(data)?;
        self.collection
            .update_one(self.key_filter(), doc! { "$set": payload })
            .upsert(true)
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))?;

        Ok(())
    }

    /// Appends the payload's values to the array fields it names, inserting the
    /// document if absent.
    pub async fn push(&self, data: impl Serialize) -> MongoServiceResult<()> {
        let payload = clean_payload(data)?;
        self.collection
            .update_one(self.key_filter(), doc! { "$push": payload })
            .upsert(true)
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))?;

        Ok(())
    }

    /// Opens a change stream restricted to this document, for caller-driven
    /// iteration.
    pub async fn watch(
        &self,
    ) -> MongoServiceResult<ChangeStream<ChangeStreamEvent<Document>>> {
        self.collection
            .watch()
            .pipeline(vec![
                doc! { "$match": { "documentKey": { "_id": self.doc_id.clone() } } },
            ])
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Subscribes a raw-event callback to changes of this document.
    ///
    /// Same contract as
    /// [`MongoCollection::on_change`](crate::collection::MongoCollection::on_change),
    /// pre-filtered to events whose document key matches this reference.
    pub async fn on_change<F>(&self, callback: F) -> MongoServiceResult<Subscription>
    where
        F: FnMut(ChangeStreamEvent<Document>) + Send + 'static,
    {
        Ok(watch::spawn(self.watch().await?, callback))
    }

    /// Subscribes a snapshot callback to changes of this document.
    ///
    /// Same contract as
    /// [`MongoCollection::on_snapshot`](crate::collection::MongoCollection::on_snapshot),
    /// pre-filtered to events whose document key matches this reference.
    pub async fn on_snapshot<F>(&self, callback: F) -> MongoServiceResult<Subscription>
    where
        F: FnMut(Vec<Document>, ChangeMeta, Option<Timestamp>) + Send + 'static,
    {
        Ok(watch::spawn_snapshot(self.watch().await?, callback))
    }
}

/// Represents a point-in-time snapshot of one document.
#[derive(Debug, Clone)]
pub struct MongoDocument {
    document: Option<Document>,
    doc_id: Bson,
}

impl MongoDocument {
    pub(crate) fn new(document: Option<Document>, doc_id: Bson) -> Self {
        Self { document, doc_id }
    }

    /// Returns whether the document existed when the snapshot was taken.
    pub fn exists(&self) -> bool {
        self.document.is_some()
    }

    /// Returns the key of the snapshotted document.
    pub fn id(&self) -> &Bson {
        &self.doc_id
    }

    /// Returns the snapshotted document, if it existed.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Consumes the snapshot and returns the document, if it existed.
    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    /// Deserializes the snapshotted document into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`MongoServiceError::DocumentNotFound`] if the document did not exist,
    /// or [`MongoServiceError::Serialization`] if it does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> MongoServiceResult<T> {
        let document = self
            .document
            .clone()
            .ok_or_else(|| MongoServiceError::DocumentNotFound(key_string(&self.doc_id)))?;

        Ok(bson::de::deserialize_from_bson(Bson::Document(document))?)
    }
}

/// Serializes a write payload to a document and strips any `_id` it carries.
///
/// The key of a write is derived solely from the reference's identity, never from
/// payload content.
fn clean_payload(data: impl Serialize) -> MongoServiceResult<Document> {
    let mut document = bson::ser::serialize_to_bson(&data)?
        .as_document()
        .cloned()
        .ok_or_else(|| {
            MongoServiceError::InvalidDocument("write payload must serialize to a document".into())
        })?;
    document.remove("_id");

    Ok(document)
}
