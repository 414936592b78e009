//! Chronological ordering of history entries. Pure; no I/O.

use serde::{Deserialize, Serialize};

use crate::record::{ConfigInfo, RevisionRecord};
use crate::timestamp::Timestamp;

/// Direction of a chronological listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

/// Anything carrying a record timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> Timestamp;
}

impl Timestamped for ConfigInfo {
    fn timestamp(&self) -> Timestamp {
        self.id.timestamp
    }
}

impl Timestamped for RevisionRecord {
    fn timestamp(&self) -> Timestamp {
        self.info.id.timestamp
    }
}

impl Timestamped for Timestamp {
    fn timestamp(&self) -> Timestamp {
        *self
    }
}

/// Orders history entries by timestamp.
///
/// The sort is stable in both directions: entries with equal timestamps keep
/// the order in which they were handed in (on-disk enumeration order).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronologicalIndex {
    order: SortOrder,
}

impl ChronologicalIndex {
    pub fn new(order: SortOrder) -> Self {
        Self { order }
    }

    pub fn sort<T: Timestamped>(&self, mut records: Vec<T>) -> Vec<T> {
        match self.order {
            SortOrder::Ascending => records.sort_by_key(|r| r.timestamp()),
            SortOrder::Descending => records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp())),
        }
        records
    }
}
