//! Initial placement for brand-new tables.

use super::identifier::IdentifierResolver;
use crate::core::{AdminError, Result, ServerId};
use crate::metadata::{ShardConfig, ShardScheme, TableConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;

/// How many assignments each server already carries across live tables.
pub type ServerUsage = BTreeMap<ServerId, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfigParams {
    pub num_replicas: usize,
}

impl Default for GenerateConfigParams {
    fn default() -> Self {
        Self { num_replicas: 1 }
    }
}

/// Adds one table's assignments to `usage`.
///
/// Every replica counts once; a director counts once more on top of that.
pub fn calculate_server_usage(config: &TableConfig, usage: &mut ServerUsage) {
    for shard in &config.shards {
        for replica in &shard.replicas {
            *usage.entry(*replica).or_default() += 1;
        }
        if let Some(director) = shard.director {
            *usage.entry(director).or_default() += 1;
        }
    }
}

/// Chooses the initial placement of a new table.
#[async_trait]
pub trait DefaultConfigGenerator: Send + Sync {
    /// Produces one shard per shard in `shard_scheme`.
    async fn generate(
        &self,
        resolver: &dyn IdentifierResolver,
        usage: &ServerUsage,
        params: &GenerateConfigParams,
        shard_scheme: &ShardScheme,
        cancel: &CancellationToken,
    ) -> Result<TableConfig>;
}

/// Places each shard on the least-loaded available servers.
///
/// Ties are broken by server id so the result is deterministic. The least
/// loaded pick of each shard becomes its director.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastUsedConfigGenerator;

#[async_trait]
impl DefaultConfigGenerator for LeastUsedConfigGenerator {
    async fn generate(
        &self,
        resolver: &dyn IdentifierResolver,
        usage: &ServerUsage,
        params: &GenerateConfigParams,
        shard_scheme: &ShardScheme,
        cancel: &CancellationToken,
    ) -> Result<TableConfig> {
        if cancel.is_cancelled() {
            return Err(AdminError::Interrupted);
        }
        if params.num_replicas == 0 {
            return Err(AdminError::Generation(
                "You must have at least one replica.".to_string(),
            ));
        }

        let mut available = resolver.available_servers();
        if available.len() < params.num_replicas {
            return Err(AdminError::Generation(format!(
                "Can't put {} replicas on servers because there are only {} available servers.",
                params.num_replicas,
                available.len()
            )));
        }

        let mut usage = usage.clone();
        let mut shards = Vec::with_capacity(shard_scheme.shard_count());
        for _ in 0..shard_scheme.shard_count() {
            available.sort_by_key(|server| (usage.get(server).copied().unwrap_or(0), *server));
            let picks = available
                .iter()
                .take(params.num_replicas)
                .copied()
                .collect::<Vec<_>>();
            let director = picks.first().copied();
            let shard = ShardConfig {
                replicas: picks.into_iter().collect::<BTreeSet<_>>(),
                director,
            };
            calculate_server_usage(
                &TableConfig {
                    shards: vec![shard.clone()],
                },
                &mut usage,
            );
            shards.push(shard);
        }

        Ok(TableConfig { shards })
    }
}
