//! [`Bundle`] — the package encoder: a fixed-capacity slot table that emits
//! a single blob via [`Bundle::pack`].

use byteorder::{WriteBytesExt, BE};

use super::{bzip2_compress, name_hash, PackageError};

/// Contents of one occupied slot in a [`Bundle`].
#[derive(Debug, Clone)]
pub struct SlotContents {
    pub name_hash: i32,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    /// Already BZip2-compressed when the bundle is not wholly compressed;
    /// raw bytes otherwise.
    pub payload: Vec<u8>,
}

/// Single-use package encoder: construct, `put`/`remove` slots, `pack` once.
pub struct Bundle {
    is_wholly_compressed: bool,
    slots: Vec<Option<SlotContents>>,
    active_count: usize,
}

impl Bundle {
    pub fn new(capacity: usize, is_wholly_compressed: bool) -> Self {
        Self { is_wholly_compressed, slots: vec![None; capacity], active_count: 0 }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Store `payload` under `name` at `index`. When the bundle is not
    /// wholly compressed, `payload` is BZip2-compressed here and the true
    /// pre-compression length is recorded in `uncompressed_size`.
    pub fn put(&mut self, index: usize, name: &str, payload: &[u8]) -> Result<(), PackageError> {
        let slot = self.slots.get_mut(index).ok_or(PackageError::SlotIndexOutOfRange(index))?;

        let (uncompressed_size, compressed_size, stored) = if self.is_wholly_compressed {
            (payload.len() as u32, payload.len() as u32, payload.to_vec())
        } else {
            let compressed = bzip2_compress(payload)?;
            (payload.len() as u32, compressed.len() as u32, compressed)
        };

        if slot.is_none() {
            self.active_count += 1;
        }
        *slot = Some(SlotContents {
            name_hash: name_hash(name),
            uncompressed_size,
            compressed_size,
            payload: stored,
        });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.take().is_some() {
                self.active_count -= 1;
            }
        }
    }

    fn total_compressed_size(&self) -> usize {
        self.slots.iter().flatten().map(|s| s.compressed_size as usize).sum()
    }

    /// Emit the full package blob: 6-byte header, then the footer (possibly
    /// BZip2-compressed as a whole).
    pub fn pack(&self) -> Result<Vec<u8>, PackageError> {
        let active: Vec<&SlotContents> = self.slots.iter().flatten().collect();

        let footer_len = 2 + active.len() * 10 + self.total_compressed_size();
        let mut footer = Vec::with_capacity(footer_len);
        footer.write_u16::<BE>(active.len() as u16)?;
        for slot in &active {
            footer.write_i32::<BE>(slot.name_hash)?;
            footer.write_u24::<BE>(slot.uncompressed_size)?;
            footer.write_u24::<BE>(slot.compressed_size)?;
        }
        for slot in &active {
            footer.extend_from_slice(&slot.payload);
        }

        let (footer, uncompressed_size) = if self.is_wholly_compressed {
            let uncompressed_size = footer.len() as u32;
            (bzip2_compress(&footer)?, uncompressed_size)
        } else {
            let len = footer.len() as u32;
            (footer, len)
        };

        let mut out = Vec::with_capacity(6 + footer.len());
        out.write_u24::<BE>(uncompressed_size)?;
        out.write_u24::<BE>(footer.len() as u32)?;
        out.extend_from_slice(&footer);
        Ok(out)
    }
}
