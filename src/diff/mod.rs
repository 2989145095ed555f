//! Snapshot comparison. Ids that vanish between two snapshots count as sold.

use crate::models::Snapshot;
use std::collections::BTreeSet;

/// `previous − current`. Empty when there is no baseline yet.
pub fn sold(previous: Option<&Snapshot>, current: &Snapshot) -> BTreeSet<String> {
    match previous {
        Some(prev) => prev.ids.difference(&current.ids).cloned().collect(),
        None => BTreeSet::new(),
    }
}

/// `current − previous`: newly listed ids. Empty without a baseline.
pub fn added(previous: Option<&Snapshot>, current: &Snapshot) -> BTreeSet<String> {
    match previous {
        Some(prev) => current.ids.difference(&prev.ids).cloned().collect(),
        None => BTreeSet::new(),
    }
}
