use std::collections::HashSet;

use crate::entry::Entry;

use super::Database;

/// An entry followed by at most `depth` of its ancestors.
///
/// Stops early at a missing parent or at an id already visited, so cyclic
/// or dangling parent chains terminate.
pub struct Lineage<'a> {
    db: &'a Database,
    next: Option<u32>,
    hops_left: u32,
    seen: HashSet<u32>,
}

impl<'a> Lineage<'a> {
    pub(crate) fn new(db: &'a Database, id: u32, depth: u32) -> Self {
        Self {
            db,
            next: Some(id),
            hops_left: depth,
            seen: HashSet::new(),
        }
    }
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        let id = self.next.take()?;
        if !self.seen.insert(id) {
            return None;
        }
        let entry = self.db.get(id)?;

        if self.hops_left > 0 {
            if let Some(parent) = entry.parent_id.filter(|p| *p > 0) {
                self.hops_left -= 1;
                self.next = Some(parent);
            }
        }

        Some(entry)
    }
}
