use std::num::NonZeroU64;
use std::path::PathBuf;

use clap::Parser;
use dbpeek_core::config::{ConfigError, FileConfigStore, InspectorConfig};
use dbpeek_core::navigator::NavigationRequest;

#[derive(Debug, Parser)]
#[command(
    name = "dbpeek",
    version,
    about = "Browse MySQL databases, tables and table rows page by page"
)]
pub struct Cli {
    /// Database to open; omit to list databases.
    pub schema: Option<String>,

    /// Table to open inside SCHEMA.
    pub table: Option<String>,

    /// 1-based page of rows to show.
    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Config file; defaults to `dbpeek/config.toml` under the user config directory.
    #[arg(long, env = "DBPEEK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DBPEEK_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "DBPEEK_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "DBPEEK_USER")]
    pub user: Option<String>,

    #[arg(long)]
    pub page_size: Option<NonZeroU64>,

    /// Skip the storage size statistics.
    #[arg(long)]
    pub no_sizes: bool,

    /// Order rows by primary key so pages stay stable.
    #[arg(long)]
    pub stable_order: bool,

    #[arg(long, env = "DBPEEK_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    #[must_use]
    pub fn request(&self) -> NavigationRequest {
        NavigationRequest::from_raw(self.schema.as_deref(), self.table.as_deref(), self.page)
    }

    pub fn load_config(&self) -> Result<InspectorConfig, ConfigError> {
        let store = match &self.config {
            Some(path) => FileConfigStore::load_from_path(path)?,
            None => FileConfigStore::load_default()?,
        };
        let mut config = store.into_config();
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut InspectorConfig) {
        if let Some(host) = &self.host {
            config.profile.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.profile.port = port;
        }
        if let Some(user) = &self.user {
            config.profile.user.clone_from(user);
        }
        if let Some(page_size) = self.page_size {
            config.browse.page_size = page_size;
        }
        if self.no_sizes {
            config.browse.collect_sizes = false;
        }
        if self.stable_order {
            config.browse.order_by_primary_key = true;
        }
    }
}
