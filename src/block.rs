//! On-disk record layouts for the block-chained file store.
//!
//! A `main_file` is a dense array of 520-byte blocks; an `index_file` is a
//! dense array of 6-byte [`IndexEntry`] records. Both are fixed-width so
//! record `i` always lives at a computable offset — there is no delimiter
//! and no trailing padding to scan past. Unlike a self-describing format
//! with magic numbers and checksums, a block only carries enough
//! back-reference information (owning archive, chunk position, owning
//! index) to detect a chain that has been overwritten or interleaved with
//! another index's blocks.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io;
use thiserror::Error;

/// Bytes per block: an 8-byte [`BlockHeader`] followed by 512 payload bytes.
pub const BLOCK_SIZE: usize = 520;
/// Payload capacity of a single block.
pub const BLOCK_DATA_SIZE: usize = 512;
/// Encoded size of a [`BlockHeader`].
pub const BLOCK_HEADER_SIZE: usize = 8;
/// Encoded size of an [`IndexEntry`].
pub const INDEX_ENTRY_SIZE: usize = 6;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("short buffer: need {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("field out of range: {0}")]
    OutOfRange(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Header of a single chained block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub owning_archive_id: u16,
    pub chunk_index: u16,
    pub next_block: u32,
    pub owning_index_id: u8,
}

impl BlockHeader {
    pub fn write(&self, out: &mut [u8]) -> Result<(), BlockError> {
        if out.len() < BLOCK_HEADER_SIZE {
            return Err(BlockError::ShortBuffer { expected: BLOCK_HEADER_SIZE, actual: out.len() });
        }
        if self.next_block > 0x00FF_FFFF {
            return Err(BlockError::OutOfRange("next_block exceeds 24 bits"));
        }
        let mut cur = &mut out[..BLOCK_HEADER_SIZE];
        cur.write_u16::<BE>(self.owning_archive_id)?;
        cur.write_u16::<BE>(self.chunk_index)?;
        cur.write_u24::<BE>(self.next_block)?;
        cur.write_u8(self.owning_index_id)?;
        Ok(())
    }

    pub fn read(buf: &[u8]) -> Result<Self, BlockError> {
        if buf.len() < BLOCK_HEADER_SIZE {
            return Err(BlockError::ShortBuffer { expected: BLOCK_HEADER_SIZE, actual: buf.len() });
        }
        let mut cur = &buf[..BLOCK_HEADER_SIZE];
        let owning_archive_id = cur.read_u16::<BE>()?;
        let chunk_index = cur.read_u16::<BE>()?;
        let next_block = cur.read_u24::<BE>()?;
        let owning_index_id = cur.read_u8()?;
        Ok(Self { owning_archive_id, chunk_index, next_block, owning_index_id })
    }
}

/// Index-file record: size and first block of one archive's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub size: u32,
    pub first_block: u32,
}

impl IndexEntry {
    pub fn write(&self, out: &mut [u8]) -> Result<(), BlockError> {
        if out.len() < INDEX_ENTRY_SIZE {
            return Err(BlockError::ShortBuffer { expected: INDEX_ENTRY_SIZE, actual: out.len() });
        }
        if self.size > 0x00FF_FFFF {
            return Err(BlockError::OutOfRange("size exceeds 24 bits"));
        }
        if self.first_block > 0x00FF_FFFF {
            return Err(BlockError::OutOfRange("first_block exceeds 24 bits"));
        }
        let mut cur = &mut out[..INDEX_ENTRY_SIZE];
        cur.write_u24::<BE>(self.size)?;
        cur.write_u24::<BE>(self.first_block)?;
        Ok(())
    }

    pub fn read(buf: &[u8]) -> Result<Self, BlockError> {
        if buf.len() < INDEX_ENTRY_SIZE {
            return Err(BlockError::ShortBuffer { expected: INDEX_ENTRY_SIZE, actual: buf.len() });
        }
        let mut cur = &buf[..INDEX_ENTRY_SIZE];
        let size = cur.read_u24::<BE>()?;
        let first_block = cur.read_u24::<BE>()?;
        Ok(Self { size, first_block })
    }
}
