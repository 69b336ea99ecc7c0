//! Error types for the resource layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{operation} requires the parent resource to be set first")]
    MissingParent { operation: &'static str },

    #[error("Resource '{name}' has no resource node")]
    MissingResourceNode { name: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ResourceError {
    fn from(e: anyhow::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<sqlx::Error> for ResourceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;
