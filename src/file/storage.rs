//! File storage for Filedrop.
//!
//! Every stored file lives directly under a single root directory and is
//! addressed by its sanitized basename:
//! ```text
//! {root}/
//! ├── report.PDF
//! ├── holiday_photo.jpg
//! └── .3f2a...-....part   (upload in progress, never listed)
//! ```
//!
//! Names passed to a [`FileStore`] must already be sanitized basenames; the
//! store does not re-validate them.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{FiledropError, Result};

/// Suffix of temporary files written while an upload is in progress.
const PART_SUFFIX: &str = ".part";

/// An opened stored file, ready to be streamed.
pub struct StoredFile {
    /// Size in bytes at the time the file was opened.
    pub len: u64,
    /// Reader over the file content.
    pub reader: Box<dyn Read + Send>,
}

impl std::fmt::Debug for StoredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredFile").field("len", &self.len).finish()
    }
}

/// Storage operations used by the web handlers.
///
/// Operations are blocking; async callers run them on the blocking pool.
pub trait FileStore: Send + Sync {
    /// Store `content` under `name`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    fn save(&self, name: &str, content: &mut dyn Read) -> Result<u64>;

    /// List stored basenames in ascending order.
    fn list(&self) -> Result<Vec<String>>;

    /// Open a stored file for reading.
    ///
    /// Returns [`FiledropError::NotFound`] if no such file exists.
    fn open_for_read(&self, name: &str) -> Result<StoredFile>;
}

/// [`FileStore`] backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `root`.
    ///
    /// The directory is not touched; see [`DiskStore::ensure_root`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it doesn't exist.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Get the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the full path for a stored name.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(format!(".{}{}", Uuid::new_v4(), PART_SUFFIX))
    }

    fn is_temp_name(name: &str) -> bool {
        name.starts_with('.') && name.ends_with(PART_SUFFIX)
    }

    fn write_temp(path: &Path, content: &mut dyn Read) -> io::Result<u64> {
        let mut file = File::create(path)?;
        let written = io::copy(content, &mut file)?;
        file.flush()?;
        file.sync_all()?;
        Ok(written)
    }
}

impl FileStore for DiskStore {
    fn save(&self, name: &str, content: &mut dyn Read) -> Result<u64> {
        let temp = self.temp_path();

        let written = match Self::write_temp(&temp, content) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e.into());
            }
        };

        // rename(2) replaces the target atomically, so readers see either the
        // old or the new content and the last finished upload wins.
        if let Err(e) = fs::rename(&temp, self.file_path(name)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        tracing::debug!(name, bytes = written, "Stored file");
        Ok(written)
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if Self::is_temp_name(&name) {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    fn open_for_read(&self, name: &str) -> Result<StoredFile> {
        let path = self.file_path(name);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FiledropError::NotFound(format!("File: {name}")));
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(FiledropError::NotFound(format!("File: {name}")));
        }

        Ok(StoredFile {
            len: metadata.len(),
            reader: Box::new(file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, DiskStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path());
        (temp_dir, store)
    }

    fn read_all(store: &DiskStore, name: &str) -> Vec<u8> {
        let mut stored = store.open_for_read(name).unwrap();
        let mut buf = Vec::new();
        stored.reader.read_to_end(&mut buf).unwrap();
        buf
    }

    /// Reader that yields some bytes and then fails.
    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "client gone"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"half");
            Ok(4)
        }
    }

    #[test]
    fn test_ensure_root_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("uploads");
        let store = DiskStore::new(&root);

        assert!(!root.exists());
        store.ensure_root().unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn test_save_and_read() {
        let (_temp_dir, store) = setup_store();

        let written = store.save("hello.txt", &mut &b"Hello, World!"[..]).unwrap();

        assert_eq!(written, 13);
        assert_eq!(read_all(&store, "hello.txt"), b"Hello, World!");
        assert_eq!(store.open_for_read("hello.txt").unwrap().len, 13);
    }

    #[test]
    fn test_save_overwrites() {
        let (_temp_dir, store) = setup_store();

        store.save("a.txt", &mut &b"first version"[..]).unwrap();
        store.save("a.txt", &mut &b"second"[..]).unwrap();

        assert_eq!(read_all(&store, "a.txt"), b"second");
        assert_eq!(store.list().unwrap(), vec!["a.txt"]);
    }

    #[test]
    fn test_failed_save_keeps_previous_version() {
        let (temp_dir, store) = setup_store();

        store.save("a.txt", &mut &b"original"[..]).unwrap();
        let result = store.save("a.txt", &mut BrokenReader { sent: false });

        assert!(matches!(result, Err(FiledropError::Io(_))));
        assert_eq!(read_all(&store, "a.txt"), b"original");
        // No temporary file left behind.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path().join("missing"));

        let result = store.save("a.txt", &mut &b"data"[..]);
        assert!(matches!(result, Err(FiledropError::Io(_))));
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = (0..=255).collect();

        store.save("blob.zip", &mut content.as_slice()).unwrap();

        assert_eq!(read_all(&store, "blob.zip"), content);
    }

    #[test]
    fn test_list_sorted_files_only() {
        let (temp_dir, store) = setup_store();

        store.save("b.txt", &mut &b"b"[..]).unwrap();
        store.save("a.png", &mut &b"a"[..]).unwrap();
        store.save("C.pdf", &mut &b"c"[..]).unwrap();
        fs::create_dir(temp_dir.path().join("subdir")).unwrap();
        fs::write(temp_dir.path().join(".0000.part"), b"in flight").unwrap();

        assert_eq!(store.list().unwrap(), vec!["C.pdf", "a.png", "b.txt"]);
    }

    #[test]
    fn test_list_empty_root() {
        let (_temp_dir, store) = setup_store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path().join("does-not-exist"));

        assert_eq!(store.list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_open_not_found() {
        let (_temp_dir, store) = setup_store();

        let result = store.open_for_read("nonexistent.txt");
        assert!(matches!(result, Err(FiledropError::NotFound(_))));
    }

    #[test]
    fn test_open_directory_is_not_found() {
        let (temp_dir, store) = setup_store();
        fs::create_dir(temp_dir.path().join("folder.zip")).unwrap();

        let result = store.open_for_read("folder.zip");
        assert!(matches!(result, Err(FiledropError::NotFound(_))));
    }

    #[test]
    fn test_is_temp_name() {
        assert!(DiskStore::is_temp_name(".abc.part"));
        assert!(!DiskStore::is_temp_name("abc.part"));
        assert!(!DiskStore::is_temp_name(".abc.txt"));
    }
}
