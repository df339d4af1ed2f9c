//! Error types for catalog_api

use std::fmt;

/// Unified error type for catalog operations
#[derive(Debug)]
pub enum CatalogError {
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// HTTP error status code from the upstream API
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse a JSON response
    Parse(serde_json::Error),
    /// Database operation failed
    Database(mongodb::error::Error),
    /// Failed to encode a document for storage
    Encode(mongodb::bson::ser::Error),
    /// Failed to decode a stored document
    Decode(mongodb::bson::de::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Network(e) => write!(f, "Network error: {}", e),
            CatalogError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            CatalogError::Parse(e) => write!(f, "Parse error: {}", e),
            CatalogError::Database(e) => write!(f, "Database error: {}", e),
            CatalogError::Encode(e) => write!(f, "Encode error: {}", e),
            CatalogError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Network(e) => Some(e),
            CatalogError::HttpStatus(_) => None,
            CatalogError::Parse(e) => Some(e),
            CatalogError::Database(e) => Some(e),
            CatalogError::Encode(e) => Some(e),
            CatalogError::Decode(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl From<mongodb::error::Error> for CatalogError {
    fn from(err: mongodb::error::Error) -> Self {
        CatalogError::Database(err)
    }
}

impl From<mongodb::bson::ser::Error> for CatalogError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        CatalogError::Encode(err)
    }
}

impl From<mongodb::bson::de::Error> for CatalogError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        CatalogError::Decode(err)
    }
}

/// Result alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
