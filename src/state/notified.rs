use std::collections::HashSet;

use crate::types::{DedupScope, MatchKey, QualifyingMatch};

// ---------------------------------------------------------------------------
// NotifiedSet
// ---------------------------------------------------------------------------

/// Keys of matches already alerted. Owned by the scanner and threaded through
/// every cycle; never shared, so no locking.
///
/// With `DedupScope::Process` the set only grows until the process exits: a
/// match that drops out of the window and later re-qualifies under the same
/// key stays silent. With `DedupScope::Cycle` it is emptied after each cycle.
#[derive(Debug)]
pub struct NotifiedSet {
    keys: HashSet<MatchKey>,
    scope: DedupScope,
}

impl NotifiedSet {
    pub fn new(scope: DedupScope) -> Self {
        Self {
            keys: HashSet::new(),
            scope,
        }
    }

    /// Return the matches not alerted yet, in input order, and remember their keys.
    /// A key repeated within `qualifying` is returned once.
    pub fn dedupe(&mut self, qualifying: &[QualifyingMatch]) -> Vec<QualifyingMatch> {
        qualifying
            .iter()
            .filter(|m| self.keys.insert(m.key()))
            .cloned()
            .collect()
    }

    pub fn contains(&self, key: &MatchKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Called once a cycle has finished notifying.
    pub fn end_cycle(&mut self) {
        if self.scope == DedupScope::Cycle {
            self.keys.clear();
        }
    }
}
