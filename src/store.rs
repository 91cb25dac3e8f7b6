//! [`BlockStore`] — persistence engine mapping `archive_id -> bytes` over a
//! pair of flat files.
//!
//! The on-disk layout is a dense array of 6-byte [`IndexEntry`] records in
//! the index file and a dense array of 520-byte blocks in the main file,
//! matching the sector-chain layout used by classic game-client caches:
//! fixed-size sectors, a 24-bit sector/size field, and per-sector
//! back-references validated on every read instead of a checksum.
//!
//! Callers inject their own `Read + Write + Seek` file handles — tests use
//! `std::io::Cursor<Vec<u8>>` or `tempfile`, production callers use
//! `std::fs::File`.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use crate::block::{BlockHeader, IndexEntry, BLOCK_DATA_SIZE, BLOCK_HEADER_SIZE, BLOCK_SIZE, INDEX_ENTRY_SIZE};

/// Block-chained store over an index file and a main (data) file.
///
/// `index_id` is stamped into every block this store writes and checked on
/// every block this store reads, so that two stores sharing one `main_file`
/// (a common layout for caches where several indices interleave into one
/// data file) cannot read each other's archives.
pub struct BlockStore<F> {
    index_id: u8,
    main_file: Mutex<F>,
    index_file: Mutex<F>,
}

impl<F: Read + Write + Seek> BlockStore<F> {
    pub fn new(index_id: u8, main_file: F, index_file: F) -> Self {
        Self { index_id, main_file: Mutex::new(main_file), index_file: Mutex::new(index_file) }
    }

    /// Release the backing handles. Taking `self` by value means the
    /// compiler, not a runtime flag, rejects any further use of this store.
    pub fn close(self) -> (F, F) {
        (self.main_file.into_inner().unwrap(), self.index_file.into_inner().unwrap())
    }

    /// Fetch the archive stored at `archive_id`.
    ///
    /// Returns `None` on any validation failure or IO error — a corrupt
    /// chain is indistinguishable from an archive that was never written.
    pub fn get(&self, archive_id: u16) -> Option<Vec<u8>> {
        let entry = self.read_index_entry(archive_id).ok()??;
        if entry.size == 0 {
            return Some(Vec::new());
        }
        let main_len = {
            let mut f = self.main_file.lock().unwrap();
            file_len(&mut *f).ok()?
        };
        let block_count = main_len / BLOCK_SIZE as u64;

        if entry.first_block == 0 || entry.first_block as u64 > block_count {
            return None;
        }

        let size = entry.size as usize;
        let mut out = Vec::with_capacity(size);
        let mut chunk: u16 = 0;
        let mut block = entry.first_block;
        let mut scratch = [0u8; BLOCK_SIZE];

        let mut f = self.main_file.lock().unwrap();
        while out.len() < size {
            if block == 0 {
                return None;
            }
            let want = (size - out.len()).min(BLOCK_DATA_SIZE) + BLOCK_HEADER_SIZE;
            f.seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64)).ok()?;
            f.read_exact(&mut scratch[..want]).ok()?;

            let header = BlockHeader::read(&scratch[..want]).ok()?;
            if header.owning_archive_id != archive_id
                || header.chunk_index != chunk
                || header.owning_index_id != self.index_id
                || header.next_block as u64 > block_count
            {
                return None;
            }

            out.extend_from_slice(&scratch[BLOCK_HEADER_SIZE..want]);
            block = header.next_block;
            chunk = chunk.checked_add(1)?;
        }

        Some(out)
    }

    /// Store `data` under `archive_id`. Returns `true` on success.
    ///
    /// First attempts to reuse the existing chain (`exists = true`); if any
    /// reused block fails validation the whole attempt is abandoned and
    /// retried in pure-append mode (`exists = false`), which cannot collide
    /// with a validated chain since it only ever claims fresh block numbers.
    pub fn put(&self, archive_id: u16, data: &[u8]) -> bool {
        if self.try_put(archive_id, data, true).unwrap_or(false) {
            return true;
        }
        self.try_put(archive_id, data, false).unwrap_or(false)
    }

    fn try_put(&self, archive_id: u16, data: &[u8], exists: bool) -> io::Result<bool> {
        let mut index_file = self.index_file.lock().unwrap();
        let mut main_file = self.main_file.lock().unwrap();

        let main_len = file_len(&mut *main_file)?;
        let mut next_append_block =
            ((main_len + BLOCK_SIZE as u64 - 1) / BLOCK_SIZE as u64).max(1);

        let mut first_block = if exists {
            match read_entry(&mut *index_file, archive_id)? {
                Some(e) if e.first_block != 0 => e.first_block,
                _ => return Ok(false),
            }
        } else {
            let b = next_append_block;
            next_append_block += 1;
            b as u32
        };

        write_entry(&mut *index_file, archive_id, IndexEntry { size: data.len() as u32, first_block })?;

        let mut written = 0usize;
        let mut chunk: u16 = 0;
        let mut reusing = exists;

        while written < data.len() {
            let remaining = data.len() - written;
            let take = remaining.min(BLOCK_DATA_SIZE);
            let is_last = remaining <= BLOCK_DATA_SIZE;

            let mut next_block: u32 = 0;
            if reusing {
                let block_count = file_len(&mut *main_file)? / BLOCK_SIZE as u64;
                if first_block == 0 || first_block as u64 > block_count {
                    return Ok(false);
                }
                let mut hdr_buf = [0u8; BLOCK_HEADER_SIZE];
                main_file.seek(SeekFrom::Start(first_block as u64 * BLOCK_SIZE as u64))?;
                main_file.read_exact(&mut hdr_buf)?;
                let existing = BlockHeader::read(&hdr_buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                if existing.owning_archive_id != archive_id
                    || existing.chunk_index != chunk
                    || existing.owning_index_id != self.index_id
                {
                    return Ok(false);
                }
                let block_count_now = file_len(&mut *main_file)? / BLOCK_SIZE as u64;
                next_block = if existing.next_block != 0 && existing.next_block as u64 <= block_count_now {
                    existing.next_block
                } else {
                    reusing = false;
                    0
                };
            }

            if !reusing && next_block == 0 {
                let candidate = next_append_block;
                next_append_block += 1;
                next_block = candidate as u32;
                if next_block == first_block {
                    next_block = next_append_block as u32;
                    next_append_block += 1;
                }
            }

            if is_last {
                next_block = 0;
            }

            let header = BlockHeader {
                owning_archive_id: archive_id,
                chunk_index: chunk,
                next_block,
                owning_index_id: self.index_id,
            };
            let mut block_buf = [0u8; BLOCK_SIZE];
            header
                .write(&mut block_buf[..BLOCK_HEADER_SIZE])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            block_buf[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + take]
                .copy_from_slice(&data[written..written + take]);

            main_file.seek(SeekFrom::Start(first_block as u64 * BLOCK_SIZE as u64))?;
            main_file.write_all(&block_buf[..BLOCK_HEADER_SIZE + take])?;

            written += take;
            chunk = chunk.checked_add(1).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "chain exceeds u16 chunk index range")
            })?;
            first_block = next_block;
        }

        Ok(true)
    }

    fn read_index_entry(&self, archive_id: u16) -> io::Result<Option<IndexEntry>> {
        let mut f = self.index_file.lock().unwrap();
        read_entry(&mut *f, archive_id)
    }
}

fn file_len<F: Seek>(f: &mut F) -> io::Result<u64> {
    f.seek(SeekFrom::End(0))
}

fn read_entry<F: Read + Seek>(f: &mut F, archive_id: u16) -> io::Result<Option<IndexEntry>> {
    let offset = archive_id as u64 * INDEX_ENTRY_SIZE as u64;
    let len = file_len(f)?;
    if offset + INDEX_ENTRY_SIZE as u64 > len {
        return Ok(None);
    }
    f.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; INDEX_ENTRY_SIZE];
    f.read_exact(&mut buf)?;
    match IndexEntry::read(&buf) {
        Ok(e) => Ok(Some(e)),
        Err(_) => Ok(None),
    }
}

fn write_entry<F: Write + Seek>(f: &mut F, archive_id: u16, entry: IndexEntry) -> io::Result<()> {
    let offset = archive_id as u64 * INDEX_ENTRY_SIZE as u64;
    let len = file_len(f)?;
    if offset > len {
        f.seek(SeekFrom::Start(len))?;
        let pad = vec![0u8; (offset - len) as usize];
        f.write_all(&pad)?;
    }
    f.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; INDEX_ENTRY_SIZE];
    entry.write(&mut buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    f.write_all(&buf)
}
