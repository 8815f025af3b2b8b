//! Error types and result types for service operations.
//!
//! This module provides error handling for every fallible operation in the project.
//! Use [`MongoServiceResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a MongoDB service.
///
/// This enum covers connection setup, serialization of write payloads, document
/// lifecycle issues, and errors surfaced by the underlying driver.
#[derive(Error, Debug)]
pub enum MongoServiceError {
    /// Error during connection setup or client initialization.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Serialization/deserialization error when converting payloads to or from BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A write payload did not serialize to a BSON document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The requested document was not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
    /// An error surfaced by the underlying MongoDB driver.
    #[error("Driver error: {0}")]
    Driver(String),
}

/// A specialized `Result` type for MongoDB service operations.
///
/// This type alias is used throughout the project to indicate operations that may fail
/// with a [`MongoServiceError`].
pub type MongoServiceResult<T> = Result<T, MongoServiceError>;

impl From<BsonError> for MongoServiceError {
    fn from(err: BsonError) -> Self {
        MongoServiceError::Serialization(err.to_string())
    }
}
