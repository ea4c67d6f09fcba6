//! The `table_config` administration surface
//!
//! - `shard_codec.rs` - shard placement <-> document
//! - `table_codec.rs` - full rows (name, db, id, primary key, shards)
//! - `identifier.rs` - server and database display identifiers
//! - `generate.rs` - initial placement for new tables
//! - `split_points.rs` - shard scheme recalculation
//! - `backend.rs` - read path and the write transaction
//! - `coordinator.rs` - dedicated task that runs backend requests

mod backend;
mod coordinator;
mod generate;
mod identifier;
mod shard_codec;
mod split_points;
mod table_codec;

pub use backend::TableConfigBackend;
pub use coordinator::{TableConfigCoordinator, TableConfigHandle};
pub use generate::{
    DefaultConfigGenerator, GenerateConfigParams, LeastUsedConfigGenerator, ServerUsage,
    calculate_server_usage,
};
pub use identifier::{
    ClusterDirectory, DELETED_DATABASE_NAME, DatabaseEntry, DirectorySnapshot, IdentifierFormat,
    IdentifierResolver, ServerEntry,
};
pub use shard_codec::{decode_shard, decode_shards, encode_shard, encode_table_config};
pub use split_points::{MAX_SHARDS, SplitPointCalculator, UniformSplitPointCalculator};
pub use table_codec::{DEFAULT_PRIMARY_KEY, TableRowUpdate, decode_table_row, format_row};
