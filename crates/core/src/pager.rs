use std::num::NonZeroU64;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, ColumnDescriptor, KeyRole};
use crate::connection::{BackendError, CatalogConnection};
use crate::error::InspectError;
use crate::pagination::{total_pages, PageWindow};
use crate::sql::{count_rows_sql, page_rows_sql, QuotedIdentifier};
use crate::value::{Row, ScalarValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub rows: Vec<Row>,
    pub total_records: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(Debug)]
pub struct PageReader<'a, C> {
    catalog: &'a mut Catalog<C>,
    page_size: NonZeroU64,
    order_by_primary_key: bool,
}

impl<'a, C: CatalogConnection> PageReader<'a, C> {
    #[must_use]
    pub fn new(catalog: &'a mut Catalog<C>, page_size: NonZeroU64) -> Self {
        Self {
            catalog,
            page_size,
            order_by_primary_key: false,
        }
    }

    #[must_use]
    pub fn order_by_primary_key(mut self, enabled: bool) -> Self {
        self.order_by_primary_key = enabled;
        self
    }

    pub async fn get_page(
        &mut self,
        schema: &str,
        table: &str,
        page: NonZeroU64,
    ) -> Result<PageResult, InspectError> {
        let order_by = if self.order_by_primary_key {
            let columns = self.catalog.describe_table(schema, table).await?;
            self.primary_key(&columns)?
        } else {
            self.catalog.ensure_table(schema, table).await?;
            Vec::new()
        };
        self.read_page(schema, table, &order_by, page).await
    }

    // `columns` must come from `describe_table` on this catalog, which has
    // already confirmed the table and selected its schema.
    pub async fn get_described_page(
        &mut self,
        schema: &str,
        table: &str,
        columns: &[ColumnDescriptor],
        page: NonZeroU64,
    ) -> Result<PageResult, InspectError> {
        let order_by = if self.order_by_primary_key {
            self.primary_key(columns)?
        } else {
            Vec::new()
        };
        self.read_page(schema, table, &order_by, page).await
    }

    async fn read_page(
        &mut self,
        schema: &str,
        table: &str,
        order_by: &[QuotedIdentifier],
        page: NonZeroU64,
    ) -> Result<PageResult, InspectError> {
        let quoted = self.catalog.connection().quote_identifier(table)?;
        let connection = self.catalog.connection_mut();
        let window = PageWindow::for_page(page, self.page_size);

        let count_rows = connection
            .query(&count_rows_sql(&quoted))
            .await
            .map_err(|source| InspectError::from_backend("failed to count records", source))?;
        let total_records = count_rows
            .first()
            .and_then(|row| row.get("total").or_else(|| row.first()))
            .and_then(ScalarValue::as_u64)
            .ok_or_else(|| {
                InspectError::from_backend(
                    "failed to count records",
                    BackendError::query("count query returned no numeric total"),
                )
            })?;
        let total_pages = total_pages(total_records, self.page_size);

        debug!(
            schema,
            table,
            page = page.get(),
            offset = window.offset,
            limit = window.limit,
            total_records,
            "fetching page"
        );
        let rows = connection
            .query(&page_rows_sql(&quoted, window, order_by))
            .await
            .map_err(|source| InspectError::from_backend("failed to fetch rows", source))?;

        Ok(PageResult {
            rows,
            total_records,
            total_pages,
            current_page: page.get(),
        })
    }

    fn primary_key(
        &self,
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<QuotedIdentifier>, InspectError> {
        let connection = self.catalog.connection();
        columns
            .iter()
            .filter(|column| column.key == KeyRole::Primary)
            .map(|column| {
                connection
                    .quote_identifier(&column.name)
                    .map_err(InspectError::from)
            })
            .collect()
    }
}
