//! In-memory [`FileStore`], used where a real directory would get in the way
//! (tests, throwaway instances).

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, RwLock};

use super::storage::{FileStore, StoredFile};
use crate::{FiledropError, Result};

/// Thread-safe map from basename to content.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<RwLock<BTreeMap<String, Arc<Vec<u8>>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().map(|f| f.len()).unwrap_or(0)
    }

    /// Whether the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content of a stored file, if present.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let files = self.files.read().ok()?;
        files.get(name).map(|c| c.as_ref().clone())
    }
}

fn poisoned() -> FiledropError {
    FiledropError::Io(std::io::Error::other("memory store lock poisoned"))
}

impl FileStore for MemoryStore {
    fn save(&self, name: &str, content: &mut dyn Read) -> Result<u64> {
        // Read fully before taking the lock so a failed stream leaves the
        // previous content in place.
        let mut buf = Vec::new();
        content.read_to_end(&mut buf)?;
        let len = buf.len() as u64;

        self.files
            .write()
            .map_err(|_| poisoned())?
            .insert(name.to_string(), Arc::new(buf));
        Ok(len)
    }

    fn list(&self) -> Result<Vec<String>> {
        let files = self.files.read().map_err(|_| poisoned())?;
        Ok(files.keys().cloned().collect())
    }

    fn open_for_read(&self, name: &str) -> Result<StoredFile> {
        let files = self.files.read().map_err(|_| poisoned())?;
        let content = files
            .get(name)
            .cloned()
            .ok_or_else(|| FiledropError::NotFound(format!("File: {name}")))?;

        Ok(StoredFile {
            len: content.len() as u64,
            reader: Box::new(Cursor::new(ArcBytes(content))),
        })
    }
}

/// Shares stored content with readers without copying it.
struct ArcBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for ArcBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_list_read() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.save("b.txt", &mut &b"bee"[..]).unwrap();
        store.save("a.txt", &mut &b"ay"[..]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.list().unwrap(), vec!["a.txt", "b.txt"]);

        let mut stored = store.open_for_read("b.txt").unwrap();
        let mut buf = String::new();
        stored.reader.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "bee");
        assert_eq!(stored.len, 3);
    }

    #[test]
    fn test_overwrite() {
        let store = MemoryStore::new();
        store.save("a.txt", &mut &b"one"[..]).unwrap();
        store.save("a.txt", &mut &b"two"[..]).unwrap();

        assert_eq!(store.get("a.txt").unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.open_for_read("missing.txt"),
            Err(FiledropError::NotFound(_))
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.save("x.png", &mut &b"x"[..]).unwrap();
        assert_eq!(store.get("x.png").unwrap(), b"x");
    }
}
