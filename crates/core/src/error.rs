use thiserror::Error;

use crate::connection::BackendError;
use crate::sql::SqlError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    #[error("database `{schema}` was not found")]
    Schema { schema: String },
    #[error("table `{table}` was not found in database `{schema}`")]
    Table { schema: String, table: String },
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("database connection failed: {0}")]
    Connection(#[source] BackendError),
    #[error(transparent)]
    NotFound(#[from] Missing),
    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] SqlError),
}

impl InspectError {
    #[must_use]
    pub fn from_backend(context: &'static str, source: BackendError) -> Self {
        if source.is_connection() {
            Self::Connection(source)
        } else {
            Self::Query { context, source }
        }
    }

    #[must_use]
    pub fn missing_schema(schema: &str) -> Self {
        Self::NotFound(Missing::Schema {
            schema: schema.to_string(),
        })
    }

    #[must_use]
    pub fn missing_table(schema: &str, table: &str) -> Self {
        Self::NotFound(Missing::Table {
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
