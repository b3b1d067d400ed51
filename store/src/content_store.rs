//! The content-addressed blob interface the core consumes, and a
//! filesystem-backed implementation of it.

use crate::address::ContentAddress;
use omnium_spec::{LedgerConfig, OmniumResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A simple content-addressed key-value interface. Addresses are opaque and
/// stable identifiers of the serialized bytes; any collision-resistant hash
/// scheme suffices so long as it is fixed per deployment.
pub trait ContentStore {
    /// Hash the canonical serialization of `blob` and persist it, returning
    /// its address. Storing the same bytes twice is a no-op that returns the
    /// same address.
    fn store(&self, blob: &[u8]) -> OmniumResult<ContentAddress>;

    /// Fetch a previously stored blob, or `None` if the address is unknown.
    fn retrieve(&self, address: &ContentAddress) -> OmniumResult<Option<Vec<u8>>>;

    /// Whether `address` is known to this store.
    fn has(&self, address: &ContentAddress) -> OmniumResult<bool>;

    /// Mark `address` as pinned, exempting it from any future GC pass.
    fn pin(&self, address: &ContentAddress) -> OmniumResult<()>;

    /// Clear a previously set pin.
    fn unpin(&self, address: &ContentAddress) -> OmniumResult<()>;

    /// Read the current head pointer address, if any state has been saved.
    fn get_head(&self) -> OmniumResult<Option<ContentAddress>>;

    /// Persist the new head pointer address.
    fn set_head(&self, address: &ContentAddress) -> OmniumResult<()>;
}

/// Filesystem-backed content store: `blocks/` holds the content-addressed
/// blobs, `data/` holds the head pointer and pin markers.
pub struct FsContentStore {
    blocks_dir: PathBuf,
    data_dir: PathBuf,
}

impl FsContentStore {
    /// Open (creating if necessary) the store rooted at `config.root`.
    pub fn open(config: &LedgerConfig) -> OmniumResult<Self> {
        let blocks_dir = config.blocks_dir();
        let data_dir = config.data_dir();
        fs::create_dir_all(&blocks_dir)?;
        fs::create_dir_all(data_dir.join("pins"))?;
        tracing::debug!(root = %config.root, "opened filesystem content store");
        Ok(Self {
            blocks_dir,
            data_dir,
        })
    }

    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.blocks_dir.join(address.as_key())
    }

    fn pin_path(&self, address: &ContentAddress) -> PathBuf {
        self.data_dir.join("pins").join(address.as_key())
    }

    fn head_path(&self) -> PathBuf {
        self.data_dir.join("head")
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)
}

impl ContentStore for FsContentStore {
    fn store(&self, blob: &[u8]) -> OmniumResult<ContentAddress> {
        let address = ContentAddress::of(blob);
        let path = self.blob_path(&address);
        if !path.exists() {
            write_atomic(&path, blob)?;
            tracing::debug!(address = %address, bytes = blob.len(), "stored blob");
        }
        Ok(address)
    }

    fn retrieve(&self, address: &ContentAddress) -> OmniumResult<Option<Vec<u8>>> {
        let path = self.blob_path(address);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn has(&self, address: &ContentAddress) -> OmniumResult<bool> {
        Ok(self.blob_path(address).exists())
    }

    fn pin(&self, address: &ContentAddress) -> OmniumResult<()> {
        write_atomic(&self.pin_path(address), b"1")?;
        Ok(())
    }

    fn unpin(&self, address: &ContentAddress) -> OmniumResult<()> {
        match fs::remove_file(self.pin_path(address)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn get_head(&self) -> OmniumResult<Option<ContentAddress>> {
        match fs::read_to_string(self.head_path()) {
            Ok(s) => Ok(Some(ContentAddress::from(s))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_head(&self, address: &ContentAddress) -> OmniumResult<()> {
        write_atomic(&self.head_path(), address.as_str().as_bytes())?;
        tracing::info!(head = %address, "advanced head pointer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, FsContentStore) {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            root: dir.path().to_string_lossy().to_string(),
            ..LedgerConfig::default()
        };
        let store = FsContentStore::open(&config).unwrap();
        (dir, store)
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let (_dir, store) = open_tmp();
        let address = store.store(b"hello world").unwrap();
        assert!(store.has(&address).unwrap());
        let got = store.retrieve(&address).unwrap().unwrap();
        assert_eq!(got, b"hello world");
    }

    #[test]
    fn retrieve_unknown_is_none() {
        let (_dir, store) = open_tmp();
        let bogus = ContentAddress::of(b"never stored");
        assert_eq!(store.retrieve(&bogus).unwrap(), None);
        assert!(!store.has(&bogus).unwrap());
    }

    #[test]
    fn head_absent_then_set() {
        let (_dir, store) = open_tmp();
        assert_eq!(store.get_head().unwrap(), None);
        let address = store.store(b"snapshot-bytes").unwrap();
        store.set_head(&address).unwrap();
        assert_eq!(store.get_head().unwrap(), Some(address));
    }

    #[test]
    fn pin_and_unpin_do_not_error_on_unknown() {
        let (_dir, store) = open_tmp();
        let address = store.store(b"payload").unwrap();
        store.pin(&address).unwrap();
        store.unpin(&address).unwrap();
        // unpinning twice is a no-op, not an error.
        store.unpin(&address).unwrap();
    }
}
