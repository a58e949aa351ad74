use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConnectionProfile;
use crate::sql::{quote_identifier, QuotedIdentifier, SqlError};
use crate::value::{Row, ScalarValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Connection,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
}

impl BackendError {
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Connection,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Query,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        self.kind == BackendErrorKind::Connection
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// Selecting a schema is connection-scoped state: one handle per navigation pass.
#[async_trait]
pub trait CatalogConnection: Send {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, BackendError>;

    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<ScalarValue>,
    ) -> Result<Vec<Row>, BackendError>;

    async fn select_schema(&mut self, schema: &str) -> Result<(), BackendError>;

    fn quote_identifier(&self, identifier: &str) -> Result<QuotedIdentifier, SqlError> {
        quote_identifier(identifier)
    }
}

#[async_trait]
pub trait ConnectionBackend {
    type Connection: CatalogConnection;

    async fn connect(&self, profile: &ConnectionProfile) -> Result<Self::Connection, BackendError>;
    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BackendError>;
}
