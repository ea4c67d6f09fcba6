//! Shard scheme recalculation when a table's shard count changes.

use crate::core::{AdminError, Result, TableId};
use crate::metadata::{ShardScheme, TableReplicationInfo};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub const MAX_SHARDS: usize = 64;

#[async_trait]
pub trait SplitPointCalculator: Send + Sync {
    /// Produces a scheme with exactly `shard_count` shards for `table_id`.
    async fn recalculate(
        &self,
        table_id: TableId,
        shard_count: usize,
        previous: &TableReplicationInfo,
        cancel: &CancellationToken,
    ) -> Result<ShardScheme>;
}

/// Keeps the current split points while the shard count is unchanged and
/// otherwise spreads the shards evenly over the key-prefix space.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSplitPointCalculator;

#[async_trait]
impl SplitPointCalculator for UniformSplitPointCalculator {
    async fn recalculate(
        &self,
        _table_id: TableId,
        shard_count: usize,
        previous: &TableReplicationInfo,
        cancel: &CancellationToken,
    ) -> Result<ShardScheme> {
        if cancel.is_cancelled() {
            return Err(AdminError::Interrupted);
        }
        if shard_count == 0 {
            return Err(AdminError::SplitPoints(
                "A table must have at least one shard.".to_string(),
            ));
        }
        if shard_count > MAX_SHARDS {
            return Err(AdminError::SplitPoints(format!(
                "Maximum number of shards is {}.",
                MAX_SHARDS
            )));
        }
        if shard_count == previous.shard_scheme.shard_count() {
            return Ok(previous.shard_scheme.clone());
        }
        Ok(ShardScheme::uniform(shard_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unchanged_count_keeps_existing_split_points() {
        let previous = TableReplicationInfo {
            shard_scheme: ShardScheme {
                split_points: vec![42],
            },
            ..Default::default()
        };
        let scheme = UniformSplitPointCalculator
            .recalculate(TableId::new_v4(), 2, &previous, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(scheme.split_points, vec![42]);
    }

    #[tokio::test]
    async fn new_count_produces_well_formed_scheme() {
        let scheme = UniformSplitPointCalculator
            .recalculate(
                TableId::new_v4(),
                MAX_SHARDS,
                &TableReplicationInfo::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(scheme.shard_count(), MAX_SHARDS);
        assert!(scheme.is_well_formed());
    }

    #[tokio::test]
    async fn rejects_too_many_shards() {
        let err = UniformSplitPointCalculator
            .recalculate(
                TableId::new_v4(),
                MAX_SHARDS + 1,
                &TableReplicationInfo::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum number of shards is 64.");
    }
}
