use std::num::NonZeroU64;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, ColumnDescriptor};
use crate::config::{BrowseSettings, ConnectionProfile};
use crate::connection::{CatalogConnection, ConnectionBackend};
use crate::error::InspectError;
use crate::pager::{PageReader, PageResult};
use crate::pagination::{page_links, PageLink};
use crate::sizes::{SizeAggregator, SizeStat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub page: NonZeroU64,
}

impl NavigationRequest {
    #[must_use]
    pub fn from_raw(schema: Option<&str>, table: Option<&str>, page: Option<i64>) -> Self {
        let present = |value: Option<&str>| {
            value
                .filter(|raw| !raw.trim().is_empty())
                .map(str::to_string)
        };
        let page = page
            .and_then(|raw| u64::try_from(raw).ok())
            .and_then(NonZeroU64::new)
            .unwrap_or(NonZeroU64::MIN);

        Self {
            schema: present(schema),
            table: present(table),
            page,
        }
    }

    #[must_use]
    pub fn schemas() -> Self {
        Self::from_raw(None, None, None)
    }

    #[must_use]
    pub fn tables(schema: &str) -> Self {
        Self::from_raw(Some(schema), None, None)
    }

    #[must_use]
    pub fn table(schema: &str, table: &str, page: NonZeroU64) -> Self {
        Self {
            schema: Some(schema.to_string()),
            table: Some(table.to_string()),
            page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaListView {
    pub schemas: Vec<String>,
    pub sizes: Option<Vec<SizeStat>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableListView {
    pub schema: String,
    pub tables: Vec<String>,
    pub table_count: usize,
    pub sizes: Option<Vec<SizeStat>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetailView {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub page: PageResult,
    pub page_links: Vec<PageLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub message: String,
    pub fatal: bool,
}

impl From<&InspectError> for ErrorView {
    fn from(error: &InspectError) -> Self {
        Self {
            message: error.to_string(),
            fatal: error.is_fatal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    SchemaList(SchemaListView),
    TableList(TableListView),
    TableDetail(TableDetailView),
    Error(ErrorView),
}

impl View {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug)]
pub struct Navigator<C> {
    catalog: Catalog<C>,
    settings: BrowseSettings,
}

impl<C: CatalogConnection> Navigator<C> {
    #[must_use]
    pub fn new(connection: C, settings: BrowseSettings) -> Self {
        Self {
            catalog: Catalog::new(connection),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BrowseSettings {
        &self.settings
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog<C> {
        &mut self.catalog
    }

    #[must_use]
    pub fn into_connection(self) -> C {
        self.catalog.into_connection()
    }

    pub async fn navigate(&mut self, request: &NavigationRequest) -> View {
        match self.resolve(request).await {
            Ok(view) => view,
            Err(error) => {
                warn!(error = %error, "navigation failed");
                View::Error(ErrorView::from(&error))
            }
        }
    }

    pub async fn resolve(&mut self, request: &NavigationRequest) -> Result<View, InspectError> {
        match (request.schema.as_deref(), request.table.as_deref()) {
            (Some(schema), Some(table)) => self
                .table_detail(schema, table, request.page)
                .await
                .map(View::TableDetail),
            (Some(schema), None) => self.table_list(schema).await.map(View::TableList),
            (None, _) => self.schema_list().await.map(View::SchemaList),
        }
    }

    async fn schema_list(&mut self) -> Result<SchemaListView, InspectError> {
        let schemas = self.catalog.list_schemas().await?;
        let sizes = if self.settings.collect_sizes {
            optional_stats(SizeAggregator::new(&mut self.catalog).schema_sizes().await)
        } else {
            None
        };

        info!(schemas = schemas.len(), "resolved database list");
        Ok(SchemaListView { schemas, sizes })
    }

    async fn table_list(&mut self, schema: &str) -> Result<TableListView, InspectError> {
        let tables = self.catalog.list_tables(schema).await?;
        let sizes = if self.settings.collect_sizes {
            optional_stats(
                SizeAggregator::new(&mut self.catalog)
                    .table_sizes(schema)
                    .await,
            )
        } else {
            None
        };

        info!(schema, tables = tables.len(), "resolved table list");
        Ok(TableListView {
            schema: schema.to_string(),
            table_count: tables.len(),
            tables,
            sizes,
        })
    }

    async fn table_detail(
        &mut self,
        schema: &str,
        table: &str,
        page: NonZeroU64,
    ) -> Result<TableDetailView, InspectError> {
        let columns = self.catalog.describe_table(schema, table).await?;
        let page = PageReader::new(&mut self.catalog, self.settings.page_size)
            .order_by_primary_key(self.settings.order_by_primary_key)
            .get_described_page(schema, table, &columns, page)
            .await?;
        let page_links = if page.rows.is_empty() {
            Vec::new()
        } else {
            page_links(page.current_page, page.total_pages)
        };

        info!(
            schema,
            table,
            page = page.current_page,
            total_pages = page.total_pages,
            "resolved table detail"
        );
        Ok(TableDetailView {
            schema: schema.to_string(),
            table: table.to_string(),
            columns,
            page,
            page_links,
        })
    }
}

fn optional_stats(result: Result<Vec<SizeStat>, InspectError>) -> Option<Vec<SizeStat>> {
    match result {
        Ok(stats) => Some(stats),
        Err(error) => {
            warn!(error = %error, "size statistics unavailable");
            None
        }
    }
}

// The connection goes back to the backend on every path; a failed release is
// only logged.
pub async fn browse<B: ConnectionBackend>(
    backend: &B,
    profile: &ConnectionProfile,
    settings: BrowseSettings,
    request: &NavigationRequest,
) -> Result<View, InspectError> {
    let connection = backend
        .connect(profile)
        .await
        .map_err(InspectError::Connection)?;
    info!(profile = %profile.name, host = %profile.host, "connected");

    let mut navigator = Navigator::new(connection, settings);
    let outcome = navigator.resolve(request).await;

    if let Err(error) = backend.disconnect(navigator.into_connection()).await {
        warn!(error = %error, "failed to release connection");
    }

    outcome
}
