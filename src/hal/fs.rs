//! `std::fs` backed storage

use super::{fill_from, AudioFile, Storage};
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Storage rooted at a directory. Paths are resolved relative to the root,
/// with any leading `/` stripped, the way flash filesystems name files.
#[derive(Debug, Clone)]
pub struct StdStorage {
    root: PathBuf,
}

impl StdStorage {
    /// Create a storage rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        StdStorage {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve a firmware-style path against the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for StdStorage {
    type File = File;

    fn open(&mut self, path: &str) -> std::io::Result<File> {
        File::open(self.resolve(path))
    }
}

impl AudioFile for File {
    fn size(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        fill_from(self, buf)
    }
}

impl<T: AsRef<[u8]>> AudioFile for Cursor<T> {
    fn size(&self) -> u64 {
        self.get_ref().as_ref().len() as u64
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        fill_from(self, buf)
    }
}
