//! Random-access index over the entries of one archive.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::error::{Result, SearchError, chain};
use crate::io::{ArchiveSource, ReadAt};

use super::parser::ZipParser;

/// Location of one archive entry.
///
/// `offset` is the position of the entry's central directory header, the
/// token the entry reader uses to jump straight to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

/// Entries keyed by name, iterated in the archive's native order.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, usize>,
}

impl ArchiveIndex {
    /// Insert an entry, replacing an earlier one with the same name in place.
    /// Returns `true` when a duplicate was replaced.
    fn insert(&mut self, entry: IndexEntry) -> bool {
        match self.by_name.entry(entry.name.clone()) {
            Entry::Occupied(slot) => {
                self.entries[*slot.get()] = entry;
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ArchiveIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Enumerate every entry of the archive once.
///
/// The read handle is dropped before returning on every path.
pub async fn build_index(source: &ArchiveSource) -> Result<ArchiveIndex> {
    let reader = source.open().await.map_err(|e| SearchError::ArchiveOpen {
        archive: source.to_string(),
        reason: chain(&e),
    })?;
    index_reader(Arc::new(reader)).await
}

/// Index an already opened archive.
pub async fn index_reader<R: ReadAt>(reader: Arc<R>) -> Result<ArchiveIndex> {
    let parser = ZipParser::new(reader);
    let mut directory = parser
        .central_directory()
        .await
        .map_err(|e| SearchError::ArchiveMetadata(chain(&e)))?;

    let mut index = ArchiveIndex::default();
    if directory.total_entries() == 0 {
        return Ok(index);
    }

    loop {
        let entry = directory
            .current_entry()
            .map_err(|e| SearchError::ArchiveMetadata(chain(&e)))?;

        if entry.cdfh_offset == 0 {
            tracing::warn!(
                entry = %entry.file_name,
                "unable to get offset for entry, it will be located by name"
            );
        }

        let replaced = index.insert(IndexEntry {
            name: entry.file_name.clone(),
            offset: entry.cdfh_offset,
            size: entry.uncompressed_size,
        });
        if replaced {
            tracing::warn!(
                entry = %entry.file_name,
                "duplicate entry name in archive, keeping the later header"
            );
        }

        let more = directory
            .advance()
            .map_err(|e| SearchError::ArchiveIteration(chain(&e)))?;
        if !more {
            break;
        }
    }

    tracing::debug!(entries = index.len(), "archive indexed");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, offset: u64) -> IndexEntry {
        IndexEntry {
            name: name.to_string(),
            offset,
            size: offset * 10,
        }
    }

    #[test]
    fn test_insert_keeps_native_order() {
        let mut index = ArchiveIndex::default();
        index.insert(entry("b.txt", 1));
        index.insert(entry("a.txt", 2));

        let names: Vec<_> = index.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b.txt", "a.txt"]);
        assert_eq!(index.get("a.txt").unwrap().offset, 2);
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let mut index = ArchiveIndex::default();
        assert!(!index.insert(entry("a.txt", 1)));
        assert!(!index.insert(entry("b.txt", 2)));
        assert!(index.insert(entry("a.txt", 3)));

        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0], entry("a.txt", 3));
    }
}
