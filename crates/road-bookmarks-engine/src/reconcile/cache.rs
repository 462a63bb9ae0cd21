use crate::host::DocumentId;
use std::collections::{HashMap, HashSet};

/// Last bookmark offsets seen per open document.
///
/// Lets the watcher notice changes without going back to the store on every
/// poll. Lives only as long as the process.
#[derive(Debug, Default)]
pub struct PositionCache {
    positions: HashMap<DocumentId, Vec<usize>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `live` for `doc` and report whether it counts as a change.
    ///
    /// A first sighting is a change only when it carries bookmarks. Later
    /// sightings compare as ordered sequences, so a reorder is a change.
    pub fn observe(&mut self, doc: DocumentId, live: &[usize]) -> bool {
        match self.positions.get_mut(&doc) {
            Some(cached) if cached.as_slice() == live => false,
            Some(cached) => {
                *cached = live.to_vec();
                true
            }
            None => {
                self.positions.insert(doc, live.to_vec());
                !live.is_empty()
            }
        }
    }

    /// Overwrite the entry for `doc` without reporting a change
    pub fn prime(&mut self, doc: DocumentId, positions: Vec<usize>) {
        self.positions.insert(doc, positions);
    }

    pub fn get(&self, doc: DocumentId) -> Option<&[usize]> {
        self.positions.get(&doc).map(Vec::as_slice)
    }

    pub fn forget(&mut self, doc: DocumentId) -> Option<Vec<usize>> {
        self.positions.remove(&doc)
    }

    /// Drop entries for documents not in `open`. Returns how many went.
    pub fn retain_open(&mut self, open: &[DocumentId]) -> usize {
        let open: HashSet<_> = open.iter().collect();
        let before = self.positions.len();
        self.positions.retain(|doc, _| open.contains(doc));
        before - self.positions.len()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
