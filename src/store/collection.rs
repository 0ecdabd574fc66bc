use super::entry::Entry;
use super::error::StoreError;
use crate::metainfo::InfoHash;

/// An ordered collection of entries with unique ids.
///
/// Entries keep insertion order. The store has a single owner; callers
/// collect results (for example verification reports) and apply them through
/// [`Store::get_mut`] or [`Store::upsert`] before saving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    pub(super) entries: Vec<Entry>,
}

/// What [`Store::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// The entry replaced an existing one at the same position.
    Replaced,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &InfoHash) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == *id)
    }

    pub fn get_mut(&mut self, id: &InfoHash) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id() == *id)
    }

    /// Inserts `entry`, or replaces the entry with the same id in place.
    ///
    /// # Errors
    ///
    /// [`StoreError::EntryTypeChanged`] if the existing entry has a different type.
    pub fn upsert(&mut self, entry: impl Into<Entry>) -> Result<Upsert, StoreError> {
        let entry = entry.into();
        let id = entry.id();

        match self.entries.iter().position(|e| e.id() == id) {
            Some(idx) => {
                let existing = self.entries[idx].kind();
                if existing != entry.kind() {
                    return Err(StoreError::EntryTypeChanged {
                        id,
                        existing,
                        new: entry.kind(),
                    });
                }
                self.entries[idx] = entry;
                tracing::debug!(%id, "replaced entry");
                Ok(Upsert::Replaced)
            }
            None => {
                self.entries.push(entry);
                tracing::debug!(%id, "inserted entry");
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Removes the entry with `id`, keeping the order of the others.
    pub fn remove(&mut self, id: &InfoHash) -> Option<Entry> {
        let idx = self.entries.iter().position(|e| e.id() == *id)?;
        Some(self.entries.remove(idx))
    }

    /// Looks up an entry by a case-insensitive prefix of its hex id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when nothing matches (or the prefix is empty),
    /// [`StoreError::Ambiguous`] when more than one entry matches.
    pub fn find(&self, prefix: &str) -> Result<&Entry, StoreError> {
        let idx = self.position_by_prefix(prefix)?;
        Ok(&self.entries[idx])
    }

    pub fn find_mut(&mut self, prefix: &str) -> Result<&mut Entry, StoreError> {
        let idx = self.position_by_prefix(prefix)?;
        Ok(&mut self.entries[idx])
    }

    fn position_by_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(StoreError::NotFound(prefix.to_string()));
        }

        let matches: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id().matches_prefix(prefix))
            .map(|(idx, _)| idx)
            .collect();

        match matches.as_slice() {
            [] => Err(StoreError::NotFound(prefix.to_string())),
            [idx] => Ok(*idx),
            _ => Err(StoreError::Ambiguous {
                prefix: prefix.to_string(),
                candidates: matches.iter().map(|&i| self.entries[i].id()).collect(),
            }),
        }
    }

    /// Shortest hex prefix that identifies each entry, in entry order.
    pub fn unique_prefixes(&self) -> Vec<(InfoHash, String)> {
        let ids: Vec<String> = self.entries.iter().map(|e| e.id().to_hex()).collect();

        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let shared = ids
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, other)| common_prefix_len(id, other))
                    .max()
                    .unwrap_or(0);
                let len = (shared + 1).min(id.len());
                (self.entries[i].id(), id[..len].to_string())
            })
            .collect()
    }

    /// Checks every entry, then id uniqueness.
    pub(super) fn validate(&self) -> Result<(), StoreError> {
        for entry in &self.entries {
            entry
                .validate()
                .map_err(|reason| StoreError::InvalidEntry {
                    id: entry.id(),
                    reason,
                })?;
        }
        self.check_unique()
    }

    /// Fails with [`StoreError::DuplicateEntry`] if two entries share an id.
    fn check_unique(&self) -> Result<(), StoreError> {
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.id()) {
                return Err(StoreError::DuplicateEntry(entry.id()));
            }
        }
        Ok(())
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}
