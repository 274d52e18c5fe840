//! # Engine Errors
//!
//! The recoverable failure modes of the engine. These are carried inside
//! `eyre::Report` like every other error in the crate; callers that need to
//! distinguish them (the REPL, tests) use `Report::downcast_ref`.
//!
//! Structural invariant violations - an unknown node-type byte, a parent that
//! does not list its child - are not represented here. They indicate a
//! corrupted tree or a bug and abort the process with a panic diagnostic.

use std::fmt;

use crate::config::{PAGE_SIZE, TABLE_MAX_PAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Insert of a key that is already present. The tree is unchanged.
    DuplicateKey(u32),
    /// A page number would exceed [`TABLE_MAX_PAGES`]. Surfaced to users as
    /// "table is full". Raised mid-split this can leave the in-memory tree
    /// in a non-canonical state; see `Table::insert`.
    TableFull { page: u32 },
    /// The file size on open is not a multiple of [`PAGE_SIZE`].
    CorruptFile { size: u64 },
    /// Flush requested for a page with no cached buffer. Only reachable
    /// through a programming error.
    FlushEmpty { page: u32 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DuplicateKey(_) => write!(f, "duplicate key"),
            EngineError::TableFull { page } => write!(
                f,
                "table is full: page {} exceeds the {}-page limit",
                page, TABLE_MAX_PAGES
            ),
            EngineError::CorruptFile { size } => write!(
                f,
                "corrupt database file: size {} is not a multiple of page size {}",
                size, PAGE_SIZE
            ),
            EngineError::FlushEmpty { page } => {
                write!(f, "attempted to flush uncached page {}", page)
            }
        }
    }
}

impl std::error::Error for EngineError {}
