//! Snapshot comparison

use super::{RecordType, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One record type whose values differ between two snapshots
///
/// Both sides are sorted. A side where the type was absent is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub record_type: RecordType,
    pub old_values: Vec<String>,
    pub new_values: Vec<String>,
}

impl ChangeRecord {
    /// The type appeared (absent before, present now)
    pub fn is_addition(&self) -> bool {
        self.old_values.is_empty() && !self.new_values.is_empty()
    }

    /// The type disappeared (present before, absent now)
    pub fn is_removal(&self) -> bool {
        !self.old_values.is_empty() && self.new_values.is_empty()
    }
}

/// Compare two snapshots
///
/// Returns one [`ChangeRecord`] per record type whose sorted values differ,
/// in `RecordType` order. An empty result means "no change". Absence
/// reasons (empty answer vs failed lookup) are not compared.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<ChangeRecord> {
    let types: BTreeSet<RecordType> = old.record_types().chain(new.record_types()).collect();

    types
        .into_iter()
        .filter_map(|record_type| {
            let old_values = old.sorted_values(record_type);
            let new_values = new.sorted_values(record_type);
            (old_values != new_values).then_some(ChangeRecord {
                record_type,
                old_values,
                new_values,
            })
        })
        .collect()
}
