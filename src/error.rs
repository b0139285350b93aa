//! Error types shared by the schema manager, loader and warehouse backends.

use crate::pipeline::RunState;
use thiserror::Error;

/// Errors that can occur while provisioning or loading the warehouse.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to warehouse: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Statement '{name}' failed: {source}")]
    Statement {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Bulk copy into {table} from {source_path} failed: {message}")]
    BulkSource {
        table: String,
        source_path: String,
        message: String,
    },

    #[error("Schema mismatch on table {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Invalid run transition from {from:?} to {to:?}")]
    InvalidTransition { from: RunState, to: RunState },
}

impl EtlError {
    pub fn statement<E>(name: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EtlError::Statement {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub fn bulk_source(table: &str, source_path: &str, message: impl Into<String>) -> Self {
        EtlError::BulkSource {
            table: table.to_string(),
            source_path: source_path.to_string(),
            message: message.into(),
        }
    }
}

pub type EtlResult<T> = std::result::Result<T, EtlError>;
