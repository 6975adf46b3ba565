//! JSON-file-backed memory store.
//!
//! The backing file is the source of truth across restarts: every mutation
//! rewrites it from the in-memory list. The write lock is held across the
//! file write, so concurrent mutating requests cannot interleave their
//! read-modify-write cycles.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Memory, MemoryKind};

/// Most entries a single listing returns.
const RECENT_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode store file: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct StoreFile<'a> {
    memories: &'a [Memory],
}

/// Both shapes the store has historically been saved in: the current
/// `{"memories": [...]}` object and a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMemories {
    Wrapped { memories: Vec<Memory> },
    Bare(Vec<Memory>),
}

pub struct MemoryStore {
    path: PathBuf,
    memories: RwLock<Vec<Memory>>,
}

impl MemoryStore {
    /// Opens the store at `path`, loading whatever is already persisted
    /// there. A missing, unreadable, or malformed file yields an empty
    /// store rather than an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let memories = load_memories(&path);
        Self {
            path,
            memories: RwLock::new(memories),
        }
    }

    pub fn len(&self) -> usize {
        self.memories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.read().is_empty()
    }

    /// Up to the 50 most recently added memories, most recent first.
    pub fn list_recent(&self) -> Vec<Memory> {
        let memories = self.memories.read();
        memories.iter().rev().take(RECENT_LIMIT).cloned().collect()
    }

    /// Appends a text memory, content stored verbatim. Returns the new id.
    pub fn add_text(&self, content: &str) -> Result<i64, StoreError> {
        self.append(|id| Memory::text(id, content))
    }

    /// Appends an image or audio memory pointing at `url`. The URL is not
    /// checked for existence; it may reference an external host or a file
    /// under the uploads root.
    pub fn add_media(&self, kind: MemoryKind, url: &str) -> Result<i64, StoreError> {
        self.append(|id| Memory::media(id, kind, url))
    }

    fn append(&self, make: impl FnOnce(i64) -> Memory) -> Result<i64, StoreError> {
        let mut memories = self.memories.write();
        let id = next_id(&memories);
        memories.push(make(id));
        self.persist(&memories)?;
        Ok(id)
    }

    fn persist(&self, memories: &[Memory]) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(&StoreFile { memories })?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

/// Ids are assigned `max(existing ids) + 1`, starting at 1 on an empty
/// store. Never reused; deletion is unsupported.
fn next_id(memories: &[Memory]) -> i64 {
    memories.iter().map(|m| m.id).max().unwrap_or(0) + 1
}

fn load_memories(path: &Path) -> Vec<Memory> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            log::warn!(
                "Failed to read store file {}: {}; starting empty",
                path.display(),
                err
            );
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(StoredMemories::Wrapped { memories }) => memories,
        Ok(StoredMemories::Bare(memories)) => memories,
        Err(err) => {
            log::warn!(
                "Malformed store file {}: {}; starting empty",
                path.display(),
                err
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("memories.json")
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(store_path(&dir));

        assert_eq!(store.add_text("first").unwrap(), 1);
        assert_eq!(store.add_media(MemoryKind::Image, "/x.png").unwrap(), 2);
        assert_eq!(store.add_media(MemoryKind::Audio, "/y.mp3").unwrap(), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_list_recent_returns_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(store_path(&dir));

        store.add_text("hello").unwrap();
        store.add_media(MemoryKind::Image, "/x.png").unwrap();

        let recent = store.list_recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, 2);
        assert_eq!(recent[0].kind, MemoryKind::Image);
        assert_eq!(recent[0].url.as_deref(), Some("/x.png"));
        assert_eq!(recent[1].id, 1);
        assert_eq!(recent[1].kind, MemoryKind::Text);
        assert_eq!(recent[1].content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_list_recent_caps_at_fifty() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(store_path(&dir));

        for i in 0..55 {
            store.add_text(&format!("note {}", i)).unwrap();
        }

        let recent = store.list_recent();
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].id, 55);
        assert_eq!(recent[49].id, 6);
    }

    #[test]
    fn test_reopen_reproduces_sequence_and_continues_ids() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        {
            let store = MemoryStore::open(&path);
            store.add_text("one").unwrap();
            store.add_media(MemoryKind::Image, "/a.png").unwrap();
            store.add_text("three").unwrap();
        }

        let store = MemoryStore::open(&path);
        assert_eq!(store.len(), 3);

        let recent = store.list_recent();
        assert_eq!(recent[0].id, 3);
        assert_eq!(recent[1].id, 2);
        assert_eq!(recent[2].content.as_deref(), Some("one"));

        assert_eq!(store.add_text("four").unwrap(), 4);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(store_path(&dir));
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, "not json {{{").unwrap();

        let store = MemoryStore::open(&path);
        assert!(store.is_empty());
        // The store stays usable and the next write replaces the bad file.
        assert_eq!(store.add_text("fresh").unwrap(), 1);

        let reopened = MemoryStore::open(&path);
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_bare_array_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, r#"[{"id":1,"type":"text","content":"hi"}]"#).unwrap();

        let store = MemoryStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.add_text("next").unwrap(), 2);
    }

    #[test]
    fn test_entries_without_ids_count_as_zero() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, r#"{"memories":[{"type":"text","content":"old"}]}"#).unwrap();

        let store = MemoryStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.add_text("new").unwrap(), 1);
    }

    #[test]
    fn test_repeated_upload_url_gets_distinct_records() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(store_path(&dir));

        let first = store
            .add_media(MemoryKind::Image, "/uploads/images/pic.png")
            .unwrap();
        let second = store
            .add_media(MemoryKind::Image, "/uploads/images/pic.png")
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let recent = store.list_recent();
        assert_eq!(recent[0].url, recent[1].url);
    }
}
