//! # Pager - Paged File Cache
//!
//! The pager presents the database file as an array of 4KB pages addressed
//! by page number. Page `n` lives at file offset `n * PAGE_SIZE`.
//!
//! ## Caching Model
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ Pager                                      │
//! │   file: File        (read-write handle)    │
//! │   file_len: u64     (length at open time)  │
//! │   num_pages: u32    (highest touched + 1)  │
//! │   pages: [Option<Box<[u8]>>; MAX_PAGES]    │
//! └────────────────────────────────────────────┘
//! ```
//!
//! - A page miss allocates a zeroed buffer and fills it from the file; a
//!   short read (page past EOF, or a fresh page) leaves the tail zeroed.
//! - Buffers are mutated in place and reach disk only through [`Pager::flush`],
//!   normally via [`Pager::close`]. There is no write-back on eviction
//!   because nothing is ever evicted.
//! - Once handed out, the buffer backing a page number never moves until the
//!   pager is dropped, so callers may hold a borrow across a leaf scan.
//!
//! ## Durability
//!
//! The file is not fsynced. A clean [`Pager::close`] makes all mutations
//! visible to the next open; a crash before that loses them.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use eyre::{Result, WrapErr};

use crate::config::{PAGE_SIZE, TABLE_MAX_PAGES};
use crate::error::EngineError;

#[derive(Debug)]
pub struct Pager {
    file: File,
    file_len: u64,
    num_pages: u32,
    pages: Vec<Option<Box<[u8]>>>,
}

impl Pager {
    /// Opens (or creates) a database file. Rejects files whose size is not a
    /// multiple of [`PAGE_SIZE`] as corrupt.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .wrap_err_with(|| format!("failed to open database file '{}'", path.display()))?;

        let file_len = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat database file '{}'", path.display()))?
            .len();

        if file_len % PAGE_SIZE as u64 != 0 {
            return Err(EngineError::CorruptFile { size: file_len }.into());
        }

        Ok(Self {
            file,
            file_len,
            num_pages: (file_len / PAGE_SIZE as u64) as u32,
            pages: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    /// Number of pages the pager currently knows about: pages present in the
    /// file on open plus any touched or allocated since.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Shared borrow of a page buffer, loading it from the file on first
    /// access.
    pub fn page(&mut self, page_num: u32) -> Result<&[u8]> {
        self.ensure_cached(page_num)?;
        // INVARIANT: ensure_cached populated the slot
        Ok(self.pages[page_num as usize].as_deref().unwrap())
    }

    /// Mutable borrow of a page buffer, loading it from the file on first
    /// access.
    pub fn page_mut(&mut self, page_num: u32) -> Result<&mut [u8]> {
        self.ensure_cached(page_num)?;
        // INVARIANT: ensure_cached populated the slot
        Ok(self.pages[page_num as usize].as_deref_mut().unwrap())
    }

    /// Reserves and returns the next unused page number.
    ///
    /// The page's buffer is materialized immediately, so successive calls
    /// within one split each return a distinct number even before anything
    /// is written. During a root split the engine relies on this ordering:
    /// it allocates the new right sibling first and the new left copy
    /// second, so ancestor updates see stable page numbers.
    pub fn allocate(&mut self) -> Result<u32> {
        let page_num = self.num_pages;
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(EngineError::TableFull { page: page_num }.into());
        }

        self.pages[page_num as usize] = Some(zeroed_page());
        self.num_pages = page_num + 1;

        Ok(page_num)
    }

    /// Writes the full page buffer back to the file. Fails with
    /// [`EngineError::FlushEmpty`] if the page was never cached.
    pub fn flush(&mut self, page_num: u32) -> Result<()> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(EngineError::TableFull { page: page_num }.into());
        }

        let buf = match &self.pages[page_num as usize] {
            Some(buf) => buf,
            None => return Err(EngineError::FlushEmpty { page: page_num }.into()),
        };

        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .wrap_err_with(|| format!("failed to seek to page {}", page_num))?;
        self.file
            .write_all(buf)
            .wrap_err_with(|| format!("failed to write page {}", page_num))?;

        Ok(())
    }

    /// Flushes every cached page in `[0, num_pages)`. The file handle itself
    /// is closed when the pager is dropped.
    pub fn close(&mut self) -> Result<()> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush(page_num)?;
            }
        }
        Ok(())
    }

    fn ensure_cached(&mut self, page_num: u32) -> Result<()> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(EngineError::TableFull { page: page_num }.into());
        }

        if self.pages[page_num as usize].is_none() {
            let mut buf = zeroed_page();
            let offset = page_num as u64 * PAGE_SIZE as u64;

            if offset < self.file_len {
                self.file
                    .seek(SeekFrom::Start(offset))
                    .wrap_err_with(|| format!("failed to seek to page {}", page_num))?;
                read_up_to_page(&mut self.file, &mut buf)
                    .wrap_err_with(|| format!("failed to read page {}", page_num))?;
            }

            self.pages[page_num as usize] = Some(buf);
        }

        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }

        Ok(())
    }
}

fn zeroed_page() -> Box<[u8]> {
    vec![0u8; PAGE_SIZE].into_boxed_slice()
}

/// Fills `buf` from the file's current position, stopping at EOF. Bytes past
/// a short read stay zero.
fn read_up_to_page(file: &mut File, buf: &mut [u8]) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(())
}
