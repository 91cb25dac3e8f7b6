//! [`AssetStore`] — thin composition of [`BlockStore`] and the package
//! codec for the common "fetch archive, decode package, fetch named entry"
//! read path and its write-side mirror.
//!
//! Using [`BlockStore`] and [`Package`]/[`Bundle`] directly remains equally
//! valid; this wrapper exists only to save callers from wiring the two
//! together by hand every time.

use std::io::{Read, Seek, Write};
use thiserror::Error;

use crate::package::{Bundle, Package, PackageError};
use crate::store::BlockStore;

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("archive {0} not found in block store")]
    ArchiveNotFound(u16),
    #[error("no entry named {name:?} in archive {archive_id}")]
    EntryNotFound { archive_id: u16, name: String },
    #[error("failed to store archive {0}")]
    PutFailed(u16),
    #[error(transparent)]
    Package(#[from] PackageError),
}

/// Binds a [`BlockStore`] to package-level read/write helpers.
pub struct AssetStore<F> {
    store: BlockStore<F>,
}

impl<F: Read + Write + Seek> AssetStore<F> {
    pub fn new(store: BlockStore<F>) -> Self {
        Self { store }
    }

    pub fn close(self) -> (F, F) {
        self.store.close()
    }

    /// Fetch archive `archive_id`, parse it as a package, and return the
    /// entry named `name`.
    pub fn read_entry(&self, archive_id: u16, name: &str) -> Result<Vec<u8>, AssetStoreError> {
        let blob = self.store.get(archive_id).ok_or(AssetStoreError::ArchiveNotFound(archive_id))?;
        let package = Package::parse(&blob)?;
        package.get(name).ok_or_else(|| AssetStoreError::EntryNotFound {
            archive_id,
            name: name.to_owned(),
        })
    }

    /// Parse archive `archive_id` as a package without extracting a single
    /// entry, for callers that want to enumerate or eagerly unpack it.
    pub fn read_package(&self, archive_id: u16) -> Result<Package, AssetStoreError> {
        let blob = self.store.get(archive_id).ok_or(AssetStoreError::ArchiveNotFound(archive_id))?;
        Ok(Package::parse(&blob)?)
    }

    /// Pack `bundle` and store the resulting blob under `archive_id`.
    pub fn write_bundle(&self, archive_id: u16, bundle: &Bundle) -> Result<(), AssetStoreError> {
        let blob = bundle.pack()?;
        if self.store.put(archive_id, &blob) {
            Ok(())
        } else {
            Err(AssetStoreError::PutFailed(archive_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn write_bundle_then_read_entry() {
        let store = BlockStore::new(0, Cursor::new(Vec::new()), Cursor::new(Vec::new()));
        let assets = AssetStore::new(store);

        let mut bundle = Bundle::new(2, false);
        bundle.put(0, "PLAYER.DAT", b"stats here").unwrap();
        assets.write_bundle(5, &bundle).unwrap();

        assert_eq!(assets.read_entry(5, "player.dat").unwrap(), b"stats here".to_vec());
    }

    #[test]
    fn read_entry_missing_archive() {
        let store = BlockStore::new(0, Cursor::new(Vec::new()), Cursor::new(Vec::new()));
        let assets = AssetStore::new(store);
        assert!(assets.read_entry(99, "anything").is_err());
    }
}
