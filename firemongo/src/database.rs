//! Database handle: thin navigation between the service and its collections.

use mongodb::Database;

use firemongo_core::error::{MongoServiceError, MongoServiceResult};

use crate::collection::MongoCollection;

/// Represents a MongoDB database.
#[derive(Debug)]
pub struct MongoDatabase {
    database: Database,
}

impl MongoDatabase {
    /// Creates a new database handle (internal use).
    pub(crate) fn new(database: Database) -> Self {
        Self { database }
    }

    /// Returns the name of this database.
    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Lists the names of the collections in this database.
    pub async fn list(&self) -> MongoServiceResult<Vec<String>> {
        self.database
            .list_collection_names()
            .await
            .map_err(|e| MongoServiceError::Driver(e.to_string()))
    }

    /// Returns a handle to the named collection.
    ///
    /// Each call returns a fresh handle with its own empty pipeline.
    pub fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection::new(self.database.collection(name))
    }
}
