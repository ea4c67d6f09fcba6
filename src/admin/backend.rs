// The backend is split by read and write path; both share this module scope.

use super::generate::{
    DefaultConfigGenerator, LeastUsedConfigGenerator, ServerUsage, calculate_server_usage,
};
use super::identifier::IdentifierResolver;
use super::split_points::{SplitPointCalculator, UniformSplitPointCalculator};
use super::table_codec::{TableRowUpdate, decode_table_row, format_row};
use crate::config::EngineConfig;
use crate::core::{AdminError, Result, TableId};
use crate::document::{display_value, uuid_from_value};
use crate::metadata::{
    MetadataClock, ShardScheme, SharedMetadata, TableConfig, TableMetadata,
    TableReplicationInfo, TablesMetadata,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, event, info_span};

/// Serves the `table_config` rows: one document per live table, keyed by the
/// table's id, readable and writable.
pub struct TableConfigBackend {
    tables: SharedMetadata,
    resolver: Arc<dyn IdentifierResolver>,
    generator: Arc<dyn DefaultConfigGenerator>,
    split_points: Arc<dyn SplitPointCalculator>,
    clock: MetadataClock,
    config: EngineConfig,
}

impl TableConfigBackend {
    /// Creates a backend with the built-in placement collaborators.
    pub fn new(
        tables: SharedMetadata,
        resolver: Arc<dyn IdentifierResolver>,
        config: EngineConfig,
    ) -> Self {
        Self {
            tables,
            resolver,
            generator: Arc::new(LeastUsedConfigGenerator),
            split_points: Arc::new(UniformSplitPointCalculator),
            clock: MetadataClock::new(config.peer_id),
            config,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn DefaultConfigGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_split_point_calculator(
        mut self,
        split_points: Arc<dyn SplitPointCalculator>,
    ) -> Self {
        self.split_points = split_points;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn shared_metadata(&self) -> &SharedMetadata {
        &self.tables
    }

    /// Name of the field rows are keyed by.
    pub fn primary_key_name(&self) -> &'static str {
        "id"
    }
}

fn check_interrupted(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(AdminError::Interrupted)
    } else {
        Ok(())
    }
}

include!("backend/read_rows.rs");
include!("backend/write_row.rs");
