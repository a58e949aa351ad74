pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod navigator;
pub mod pager;
pub mod pagination;
pub mod sizes;
pub mod sql;
pub mod value;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, ColumnDescriptor, Existence, KeyRole};
pub use config::{BrowseSettings, ConnectionProfile, InspectorConfig};
pub use connection::{BackendError, CatalogConnection, ConnectionBackend};
pub use error::InspectError;
pub use navigator::{browse, NavigationRequest, Navigator, View};
pub use pager::{PageReader, PageResult};
pub use sizes::{SizeAggregator, SizeStat};
