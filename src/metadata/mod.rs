//! Replicated cluster metadata
//!
//! Every mergeable type here implements [`Semilattice`], whose `join` must be
//! commutative, associative and idempotent so that participants converge no
//! matter in which order they exchange state.

mod deletable;
mod shared;
mod table;
mod versioned;

pub use deletable::Deletable;
pub use shared::SharedMetadata;
pub use table::{
    ShardConfig, ShardScheme, TableConfig, TableMetadata, TableReplicationInfo, TablesMetadata,
};
pub use versioned::{MetadataClock, VersionStamp, Versioned};

pub trait Semilattice: Sized {
    /// Least upper bound of the two states.
    fn join(&self, other: &Self) -> Self;
}
