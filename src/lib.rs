//! cachevault — a block-chained archive store and named-entry package codec.
//!
//! Format guarantees:
//! - All multi-byte fields are big-endian, fixed-width, frozen
//! - A `main_file` is a dense array of 520-byte blocks; an `index_file` is a
//!   dense array of 6-byte size/first-block records
//! - Block headers carry back-references (owning archive, chunk position,
//!   owning index) that are validated on every read — there is no checksum
//! - Packages are keyed by a 32-bit name hash, not a stored name string;
//!   BZip2 is the only compression scheme, applied either to the whole
//!   package footer or to each entry independently

pub mod archive;
pub mod block;
pub mod package;
pub mod store;

pub use archive::{AssetStore, AssetStoreError};
pub use block::{BlockError, BlockHeader, IndexEntry, BLOCK_DATA_SIZE, BLOCK_HEADER_SIZE, BLOCK_SIZE, INDEX_ENTRY_SIZE};
pub use package::{name_hash, Bundle, EntryMeta, Package, PackageError, SlotContents};
pub use store::BlockStore;
