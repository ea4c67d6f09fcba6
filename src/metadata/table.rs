use super::{Deletable, MetadataClock, Semilattice, Versioned};
use crate::core::{DatabaseId, ServerId, TableId};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placement of one shard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardConfig {
    pub replicas: BTreeSet<ServerId>,
    /// `None` means no coordinator is currently assigned.
    pub director: Option<ServerId>,
}

/// Placement of every shard of a table, in key-range order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableConfig {
    pub shards: Vec<ShardConfig>,
}

/// Partitioning of a table's key space.
///
/// Keys are ordered by their first eight bytes read as a big-endian integer.
/// Shard `i` covers `[split_points[i - 1], split_points[i])`; the first and
/// last shards are unbounded below and above.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardScheme {
    pub split_points: Vec<u64>,
}

impl ShardScheme {
    pub fn one_shard() -> Self {
        Self::default()
    }

    /// Evenly spaced split points over the key-prefix space.
    pub fn uniform(shard_count: usize) -> Self {
        let count = shard_count.max(1) as u128;
        let space = u64::MAX as u128 + 1;
        let split_points = (1..count)
            .map(|i| ((space * i) / count) as u64)
            .collect();
        Self { split_points }
    }

    pub fn shard_count(&self) -> usize {
        self.split_points.len() + 1
    }

    pub fn shard_for_key(&self, key: &[u8]) -> usize {
        let prefix = key_prefix(key);
        self.split_points.partition_point(|point| *point <= prefix)
    }

    pub fn is_well_formed(&self) -> bool {
        self.split_points.windows(2).all(|pair| pair[0] < pair[1])
    }
}

fn key_prefix(key: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = key.len().min(8);
    bytes[..len].copy_from_slice(&key[..len]);
    u64::from_be_bytes(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableReplicationInfo {
    pub config: TableConfig,
    pub shard_scheme: ShardScheme,
}

/// Cluster-wide metadata for one table. Each field is versioned separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: Versioned<String>,
    pub database: Versioned<DatabaseId>,
    pub primary_key: Versioned<String>,
    pub replication_info: Versioned<TableReplicationInfo>,
}

impl TableMetadata {
    pub fn new(
        name: String,
        database: DatabaseId,
        primary_key: String,
        replication_info: TableReplicationInfo,
        clock: &MetadataClock,
    ) -> Self {
        Self {
            name: Versioned::new(name, clock),
            database: Versioned::new(database, clock),
            primary_key: Versioned::new(primary_key, clock),
            replication_info: Versioned::new(replication_info, clock),
        }
    }
}

impl Semilattice for TableMetadata {
    fn join(&self, other: &Self) -> Self {
        Self {
            name: self.name.join(&other.name),
            database: self.database.join(&other.database),
            primary_key: self.primary_key.join(&other.primary_key),
            replication_info: self.replication_info.join(&other.replication_info),
        }
    }
}

/// All tables known to the cluster, including tombstoned ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TablesMetadata {
    #[serde(default)]
    pub tables: OrdMap<TableId, Deletable<TableMetadata>>,
}

impl TablesMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the identifier was ever used, deleted or not.
    pub fn contains(&self, table_id: &TableId) -> bool {
        self.tables.contains_key(table_id)
    }

    pub fn active(&self, table_id: &TableId) -> Option<&TableMetadata> {
        self.tables.get(table_id).and_then(Deletable::active)
    }

    pub fn active_mut(&mut self, table_id: &TableId) -> Option<&mut TableMetadata> {
        self.tables.get_mut(table_id).and_then(Deletable::active_mut)
    }

    pub fn active_tables(&self) -> impl Iterator<Item = (&TableId, &TableMetadata)> {
        self.tables
            .iter()
            .filter_map(|(id, entry)| entry.active().map(|table| (id, table)))
    }

    /// Live tables in `database` named `name`.
    pub fn find_by_name(&self, database: DatabaseId, name: &str) -> Vec<TableId> {
        self.active_tables()
            .filter(|(_, table)| *table.database.get() == database && table.name.get() == name)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn insert_active(&mut self, table_id: TableId, table: TableMetadata) {
        self.tables.insert(table_id, Deletable::Active(table));
    }

    /// Tombstones the entry. Returns false if there was no live entry.
    pub fn mark_deleted(&mut self, table_id: &TableId) -> bool {
        match self.tables.remove(table_id) {
            Some(entry) => {
                let was_active = !entry.is_deleted();
                self.tables.insert(*table_id, entry.into_deleted());
                was_active
            }
            None => false,
        }
    }
}

impl Semilattice for TablesMetadata {
    fn join(&self, other: &Self) -> Self {
        let mut tables = self.tables.clone();
        for (table_id, theirs) in other.tables.iter() {
            let merged = match tables.get(table_id) {
                Some(ours) => ours.join(theirs),
                None => theirs.clone(),
            };
            tables.insert(*table_id, merged);
        }
        Self { tables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_scheme_covers_key_space_in_order() {
        let scheme = ShardScheme::uniform(4);
        assert_eq!(scheme.shard_count(), 4);
        assert!(scheme.is_well_formed());
        assert_eq!(scheme.shard_for_key(b""), 0);
        assert_eq!(scheme.shard_for_key(&[0x3f, 0xff]), 0);
        assert_eq!(scheme.shard_for_key(&[0x40]), 1);
        assert_eq!(scheme.shard_for_key(&[0xbf, 0xff, 0xff]), 2);
        assert_eq!(scheme.shard_for_key(&[0xff; 12]), 3);
    }

    #[test]
    fn one_shard_scheme_maps_everything_to_shard_zero() {
        let scheme = ShardScheme::one_shard();
        assert_eq!(scheme.shard_count(), 1);
        assert_eq!(scheme.shard_for_key(b"anything"), 0);
        assert_eq!(ShardScheme::uniform(0), scheme);
    }

    #[test]
    fn deleted_entries_are_hidden_but_still_reserved() {
        let clock = MetadataClock::new(crate::core::PeerId::new_v4());
        let mut tables = TablesMetadata::new();
        let id = TableId::new_v4();
        let db = DatabaseId::new_v4();
        tables.insert_active(
            id,
            TableMetadata::new(
                "users".to_string(),
                db,
                "id".to_string(),
                TableReplicationInfo::default(),
                &clock,
            ),
        );
        assert_eq!(tables.find_by_name(db, "users"), vec![id]);

        assert!(tables.mark_deleted(&id));
        assert!(!tables.mark_deleted(&id));
        assert!(tables.contains(&id));
        assert!(tables.active(&id).is_none());
        assert!(tables.find_by_name(db, "users").is_empty());
        assert_eq!(tables.active_tables().count(), 0);
    }
}
