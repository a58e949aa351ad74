use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::connection::CatalogConnection;
use crate::error::InspectError;
use crate::sql::{SCHEMA_SIZES_SQL, TABLE_SIZES_SQL};
use crate::value::{Row, ScalarValue};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeStat {
    pub object_name: String,
    pub size_bytes: u64,
    pub size_mb: f64,
}

impl SizeStat {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(object_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            object_name: object_name.into(),
            size_bytes,
            size_mb: round_to_hundredths(size_bytes as f64 / BYTES_PER_MEGABYTE),
        }
    }

    fn from_row(row: &Row) -> Option<Self> {
        let name = row.get("object_name").and_then(ScalarValue::as_text)?;
        let size_bytes = row
            .get("size_bytes")
            .map(|value| {
                value.as_u64().unwrap_or_else(|| {
                    // DECIMAL sums may carry a fractional part.
                    value.as_f64().map_or(0, whole_bytes)
                })
            })
            .unwrap_or_default();
        Some(Self::new(name, size_bytes))
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_bytes(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn sorted_descending(rows: &[Row]) -> Vec<SizeStat> {
    let mut stats = rows.iter().filter_map(SizeStat::from_row).collect::<Vec<_>>();
    stats.sort_by(|left, right| right.size_bytes.cmp(&left.size_bytes));
    stats
}

#[derive(Debug)]
pub struct SizeAggregator<'a, C> {
    catalog: &'a mut Catalog<C>,
}

impl<'a, C: CatalogConnection> SizeAggregator<'a, C> {
    #[must_use]
    pub fn new(catalog: &'a mut Catalog<C>) -> Self {
        Self { catalog }
    }

    pub async fn schema_sizes(&mut self) -> Result<Vec<SizeStat>, InspectError> {
        debug!("collecting database sizes");
        let rows = self
            .catalog
            .connection_mut()
            .query(SCHEMA_SIZES_SQL)
            .await
            .map_err(|source| InspectError::from_backend("failed to read database sizes", source))?;
        Ok(sorted_descending(&rows))
    }

    pub async fn table_sizes(&mut self, schema: &str) -> Result<Vec<SizeStat>, InspectError> {
        if !self.catalog.schema_exists(schema).await? {
            return Err(InspectError::missing_schema(schema));
        }

        debug!(schema, "collecting table sizes");
        let rows = self
            .catalog
            .connection_mut()
            .query_with_params(TABLE_SIZES_SQL, vec![ScalarValue::from(schema)])
            .await
            .map_err(|source| InspectError::from_backend("failed to read table sizes", source))?;
        Ok(sorted_descending(&rows))
    }
}
