//! # Storage Backends
//!
//! File I/O for the two persistence backends:
//! - `file`: one binary snapshot, replaced atomically (temp file + rename)
//! - `redb`: the redb database from `tienda_core::storage`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tienda_core::{RedbStore, Shop, ShopError, ShopStore, decode_snapshot, encode_snapshot};

/// Which backend a database path uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Redb,
}

impl Backend {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(format!(
                "Unknown backend '{}'. Valid backends: file, redb",
                other
            )),
        }
    }
}

/// Shop stored as a single snapshot file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ShopStore for FileStore {
    fn load(&self) -> Result<Shop, ShopError> {
        match fs::read(&self.path) {
            Ok(bytes) => decode_snapshot(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Shop::new()),
            Err(e) => Err(ShopError::Storage(format!(
                "read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, shop: &Shop) -> Result<(), ShopError> {
        let bytes = encode_snapshot(shop)?;
        let tmp = self.temp_path();
        let io = |e: std::io::Error| ShopError::Storage(format!("write {}: {}", tmp.display(), e));

        fs::write(&tmp, &bytes).map_err(io)?;
        fs::rename(&tmp, &self.path).map_err(io)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Open the store for `path` with the named backend.
pub fn open_store(path: &Path, backend: &str) -> Result<Arc<dyn ShopStore>, String> {
    match Backend::parse(backend)? {
        Backend::File => Ok(Arc::new(FileStore::new(path))),
        Backend::Redb => {
            let store = RedbStore::open(path)
                .map_err(|e| format!("Failed to open redb database {}: {}", path.display(), e))?;
            Ok(Arc::new(store))
        }
    }
}
