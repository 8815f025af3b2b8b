//! The connection root of the handle hierarchy.

use mongodb::{Client, options::ClientOptions};

use firemongo_core::error::{MongoServiceError, MongoServiceResult};

use crate::database::MongoDatabase;

/// Represents a MongoDB connection.
///
/// The service owns the driver client, which is shared implicitly by every database,
/// collection, and document handle navigated from it. The client is safe for
/// concurrent use; this layer adds no locking of its own.
#[derive(Debug)]
pub struct MongoService {
    client: Client,
}

impl MongoService {
    /// Connects to a MongoDB deployment from a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`MongoServiceError::Initialization`] if the connection string cannot
    /// be parsed or the client cannot be built.
    pub async fn connect(uri: impl AsRef<str>) -> MongoServiceResult<Self> {
        let options = ClientOptions::parse(uri.as_ref())
            .await
            .map_err(|e| MongoServiceError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| MongoServiceError::Initialization(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an existing driver client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns a handle to the named database.
    pub fn database(&self, name: &str) -> MongoDatabase {
        MongoDatabase::new(self.client.database(name))
    }

    /// Shuts the connection down and releases driver resources.
    ///
    /// This consumes the service; handles navigated from it must not be used
    /// afterwards.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}
