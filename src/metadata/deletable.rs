use super::Semilattice;
use serde::{Deserialize, Serialize};

/// A metadata entry that is tombstoned in place instead of removed.
///
/// Deleted entries keep their last record so the identifier stays reserved,
/// but reading it requires matching on `Deleted` explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum Deletable<T> {
    Active(T),
    Deleted(T),
}

impl<T> Deletable<T> {
    pub fn active(&self) -> Option<&T> {
        match self {
            Self::Active(value) => Some(value),
            Self::Deleted(_) => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Active(value) => Some(value),
            Self::Deleted(_) => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }

    pub fn into_deleted(self) -> Self {
        match self {
            Self::Active(value) | Self::Deleted(value) => Self::Deleted(value),
        }
    }
}

impl<T: Semilattice> Semilattice for Deletable<T> {
    /// Deletion is absorbing: once either side is deleted, the join is deleted.
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Active(a), Self::Active(b)) => Self::Active(a.join(b)),
            (Self::Active(a) | Self::Deleted(a), Self::Active(b) | Self::Deleted(b)) => {
                Self::Deleted(a.join(b))
            }
        }
    }
}
