// ============================================================================
// tablecfg Library
// ============================================================================

//! Table placement configuration as a writable document.
//!
//! Each table's sharding, replica sets and per-shard director are exposed as
//! a `table_config` row. Writes are decoded and validated, checked against
//! the current cluster metadata, and merged into it with a field-level
//! last-writer-wins join so concurrent edits elsewhere are kept.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tablecfg::{
//!     ClusterDirectory, EngineConfig, SharedMetadata, TableConfigBackend, TableId,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(ClusterDirectory::new());
//! directory.add_server("alpha");
//! directory.add_database("test");
//!
//! let backend = TableConfigBackend::new(
//!     SharedMetadata::default(),
//!     directory,
//!     EngineConfig::default(),
//! );
//!
//! let id = TableId::new_v4();
//! let mut row = Some(json!({"name": "users", "db": "test", "id": id.to_string()}));
//! backend
//!     .write_row(&json!(id.to_string()), true, &mut row, &CancellationToken::new())
//!     .await?;
//!
//! let row = row.unwrap();
//! assert_eq!(row["primary_key"], "id");
//! assert_eq!(row["shards"][0]["director"], "alpha");
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod core;
pub mod document;
pub mod metadata;
pub mod snapshot;

pub use admin::{
    ClusterDirectory, DefaultConfigGenerator, GenerateConfigParams, IdentifierFormat,
    IdentifierResolver, LeastUsedConfigGenerator, SplitPointCalculator, TableConfigBackend,
    TableConfigCoordinator, TableConfigHandle, UniformSplitPointCalculator,
};
pub use config::EngineConfig;
pub use core::{AdminError, DatabaseId, PeerId, Result, ServerId, TableId};
pub use document::{DocumentError, DocumentResult};
pub use metadata::{
    Deletable, MetadataClock, Semilattice, ShardConfig, ShardScheme, SharedMetadata, TableConfig,
    TableMetadata, TableReplicationInfo, TablesMetadata, VersionStamp, Versioned,
};
pub use snapshot::ClusterSnapshot;
