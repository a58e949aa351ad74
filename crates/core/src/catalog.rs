use serde::Serialize;
use tracing::debug;

use crate::connection::{BackendError, CatalogConnection};
use crate::error::InspectError;
use crate::sql::{describe_table_sql, SHOW_DATABASES_SQL, SHOW_TABLES_SQL};
use crate::value::{Row, ScalarValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Multiple,
}

impl KeyRole {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub key: KeyRole,
    pub default_value: Option<String>,
    pub extra: String,
}

impl ColumnDescriptor {
    fn from_describe_row(row: &Row) -> Self {
        let text = |column: &str| row.get(column).and_then(ScalarValue::as_text);
        Self {
            name: text("Field").unwrap_or_default(),
            column_type: text("Type").unwrap_or_default(),
            nullable: text("Null").is_some_and(|raw| raw.eq_ignore_ascii_case("YES")),
            key: KeyRole::parse(&text("Key").unwrap_or_default()),
            default_value: text("Default"),
            extra: text("Extra").unwrap_or_default(),
        }
    }
}

// `Unknown` means the probe itself failed, not that the table is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    Present,
    Absent,
    Unknown(BackendError),
}

#[derive(Debug)]
pub struct Catalog<C> {
    connection: C,
}

impl<C: CatalogConnection> Catalog<C> {
    #[must_use]
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    #[must_use]
    pub fn into_connection(self) -> C {
        self.connection
    }

    pub async fn list_schemas(&mut self) -> Result<Vec<String>, InspectError> {
        debug!("listing databases");
        let rows = self
            .connection
            .query(SHOW_DATABASES_SQL)
            .await
            .map_err(|source| InspectError::from_backend("failed to list databases", source))?;
        Ok(first_column(&rows))
    }

    pub async fn schema_exists(&mut self, schema: &str) -> Result<bool, InspectError> {
        let schemas = self.list_schemas().await?;
        Ok(schemas.iter().any(|candidate| candidate == schema))
    }

    pub async fn list_tables(&mut self, schema: &str) -> Result<Vec<String>, InspectError> {
        if !self.schema_exists(schema).await? {
            return Err(InspectError::missing_schema(schema));
        }

        debug!(schema, "listing tables");
        self.connection
            .select_schema(schema)
            .await
            .map_err(|source| InspectError::from_backend("failed to select database", source))?;
        let rows = self
            .connection
            .query(SHOW_TABLES_SQL)
            .await
            .map_err(|source| InspectError::from_backend("failed to list tables", source))?;
        Ok(first_column(&rows))
    }

    pub async fn probe_table(&mut self, schema: &str, table: &str) -> Existence {
        match self.list_tables(schema).await {
            Ok(tables) if tables.iter().any(|candidate| candidate == table) => Existence::Present,
            Ok(_) | Err(InspectError::NotFound(_) | InspectError::InvalidIdentifier(_)) => {
                Existence::Absent
            }
            Err(InspectError::Connection(source) | InspectError::Query { source, .. }) => {
                Existence::Unknown(source)
            }
        }
    }

    pub async fn table_exists(&mut self, schema: &str, table: &str) -> bool {
        self.probe_table(schema, table).await == Existence::Present
    }

    pub async fn ensure_table(&mut self, schema: &str, table: &str) -> Result<(), InspectError> {
        match self.probe_table(schema, table).await {
            Existence::Present => Ok(()),
            Existence::Absent => Err(InspectError::missing_table(schema, table)),
            Existence::Unknown(source) => Err(InspectError::from_backend(
                "failed to verify that the table exists",
                source,
            )),
        }
    }

    pub async fn describe_table(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, InspectError> {
        self.ensure_table(schema, table).await?;

        let quoted = self.connection.quote_identifier(table)?;
        debug!(schema, table, "describing table");
        let rows = self
            .connection
            .query(&describe_table_sql(&quoted))
            .await
            .map_err(|source| {
                InspectError::from_backend("failed to read table structure", source)
            })?;

        Ok(rows.iter().map(ColumnDescriptor::from_describe_row).collect())
    }
}

fn first_column(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.first().and_then(ScalarValue::as_text))
        .collect()
}
