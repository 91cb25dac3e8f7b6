//! Package/Bundle codec: packs a set of named entries into a single blob,
//! either wholly BZip2-compressed or compressed per entry, keyed by a
//! 32-bit name hash rather than a stored name string.
//!
//! [`Package`] is the decoder (parses an existing blob); [`Bundle`] is the
//! encoder (assembles a new blob). See [`bundle`] for the encoder.

pub mod bundle;

pub use bundle::{Bundle, SlotContents};

use byteorder::{ReadBytesExt, BE};
use std::io::{self, Read, Write};
use thiserror::Error;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("truncated package: need at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },
    #[error("entry {index} offset/size out of bounds: offset={offset} size={size} raw_len={raw_len}")]
    EntryOutOfBounds { index: usize, offset: usize, size: usize, raw_len: usize },
    #[error("slot index {0} exceeds bundle capacity")]
    SlotIndexOutOfRange(usize),
    #[error("bzip2 decompression failed: {0}")]
    Decompress(String),
    #[error("bzip2 compression failed: {0}")]
    Compress(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Compute the 32-bit signed name hash: `h = h*61 + (c - 32)` over the
/// upper-cased name, with wrapping arithmetic.
pub fn name_hash(name: &str) -> i32 {
    let mut h: i32 = 0;
    for c in name.chars() {
        let upper = c.to_ascii_uppercase();
        h = h.wrapping_mul(61).wrapping_add(upper as i32 - 32);
    }
    h
}

pub(crate) fn bzip2_compress(data: &[u8]) -> Result<Vec<u8>, PackageError> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|e| PackageError::Compress(e.to_string()))?;
    encoder.finish().map_err(|e| PackageError::Compress(e.to_string()))
}

pub(crate) fn bzip2_decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>, PackageError> {
    let mut decoder = BzDecoder::new(data);
    let mut out = vec![0u8; expected_len];
    decoder.read_exact(&mut out).map_err(|e| PackageError::Decompress(e.to_string()))?;
    Ok(out)
}

/// Metadata for one entry inside a parsed [`Package`].
#[derive(Debug, Clone, Copy)]
pub struct EntryMeta {
    pub name_hash: i32,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub offset_in_raw: usize,
}

/// A decoded archive package: a footer of [`EntryMeta`] records plus the raw
/// (possibly per-entry-compressed) entry bodies.
pub struct Package {
    is_wholly_compressed: bool,
    entries: Vec<EntryMeta>,
    raw_data: Vec<u8>,
    unpacked: Option<Vec<Vec<u8>>>,
}

impl Package {
    /// Parse a package blob per the wire format: a 6-byte header
    /// (uncompressed/compressed footer size) followed by the footer body.
    pub fn parse(src: &[u8]) -> Result<Self, PackageError> {
        if src.len() < 6 {
            return Err(PackageError::Truncated { needed: 6, have: src.len() });
        }
        let mut head = &src[0..6];
        let uncompressed_size = head.read_u24::<BE>()? as usize;
        let compressed_size = head.read_u24::<BE>()? as usize;

        let (raw_data, is_wholly_compressed, base) = if compressed_size != uncompressed_size {
            if src.len() < 6 + compressed_size {
                return Err(PackageError::Truncated { needed: 6 + compressed_size, have: src.len() });
            }
            let body = &src[6..6 + compressed_size];
            let raw = bzip2_decompress(body, uncompressed_size)?;
            (raw, true, 0usize)
        } else {
            (src.to_vec(), false, 6usize)
        };

        if raw_data.len() < base + 2 {
            return Err(PackageError::Truncated { needed: base + 2, have: raw_data.len() });
        }
        let mut cur = &raw_data[base..base + 2];
        let amount = cur.read_u16::<BE>()? as usize;

        let meta_base = base + 2;
        let meta_len = 10 * amount;
        if raw_data.len() < meta_base + meta_len {
            return Err(PackageError::Truncated { needed: meta_base + meta_len, have: raw_data.len() });
        }

        let mut entries = Vec::with_capacity(amount);
        let mut data_cursor = meta_base + meta_len;
        for i in 0..amount {
            let rec = &raw_data[meta_base + i * 10..meta_base + i * 10 + 10];
            let mut c = rec;
            let name_hash = c.read_i32::<BE>()?;
            let uncompressed_size = c.read_u24::<BE>()?;
            let compressed_size = c.read_u24::<BE>()?;

            let offset_in_raw = data_cursor;
            let end = offset_in_raw + compressed_size as usize;
            if end > raw_data.len() {
                return Err(PackageError::EntryOutOfBounds {
                    index: i,
                    offset: offset_in_raw,
                    size: compressed_size as usize,
                    raw_len: raw_data.len(),
                });
            }
            entries.push(EntryMeta { name_hash, uncompressed_size, compressed_size, offset_in_raw });
            data_cursor = end;
        }

        Ok(Self { is_wholly_compressed, entries, raw_data, unpacked: None })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_wholly_compressed(&self) -> bool {
        self.is_wholly_compressed
    }

    /// Fetch an entry's decoded bytes by name. First matching hash wins.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let hash = name_hash(name);
        let index = self.entries.iter().position(|e| e.name_hash == hash)?;

        if let Some(cache) = &self.unpacked {
            return cache.get(index).cloned();
        }

        let meta = &self.entries[index];
        let slice = &self.raw_data[meta.offset_in_raw..meta.offset_in_raw + meta.compressed_size as usize];
        if self.is_wholly_compressed {
            Some(slice.to_vec())
        } else {
            bzip2_decompress(slice, meta.uncompressed_size as usize).ok()
        }
    }

    /// Eagerly decode every entry so `get` no longer needs `raw_data`.
    pub fn unpack(&mut self) -> Result<(), PackageError> {
        let mut out = Vec::with_capacity(self.entries.len());
        for meta in &self.entries {
            let slice = &self.raw_data[meta.offset_in_raw..meta.offset_in_raw + meta.compressed_size as usize];
            let bytes = if self.is_wholly_compressed {
                slice.to_vec()
            } else {
                bzip2_decompress(slice, meta.uncompressed_size as usize)?
            };
            out.push(bytes);
        }
        self.unpacked = Some(out);
        self.raw_data = Vec::new();
        Ok(())
    }
}
