//! # featherdb - Feather-Weight Embedded Storage Engine
//!
//! featherdb is a single-file, single-table on-disk B+tree storage engine.
//! Rows are fixed-size (a 32-bit id, a 32-byte username, a 255-byte email)
//! and keyed by the id. The engine exposes four operations: open a database
//! file, insert a row, scan all rows in key order, and close (which flushes
//! every cached page back to disk).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Public API (Table)           │
//! ├─────────────────────────────────────┤
//! │   B+Tree Engine (descent, splits)   │
//! ├─────────────────────────────────────┤
//! │  Node Codecs (leaf / internal view) │
//! ├─────────────────────────────────────┤
//! │     Storage Layer (Pager)           │
//! ├─────────────────────────────────────┤
//! │   Paged File I/O (4KB pages)        │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! A database is a single file of concatenated 4KB pages. Page 0 is always
//! the root node; further pages are allocated densely by splits and never
//! freed. Pages are cached in memory by the [`storage::Pager`] and written
//! back only when the table is closed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use featherdb::{Row, Table};
//!
//! let mut table = Table::open("./users.db")?;
//! table.insert(&Row::new(1, "alice", "alice@example.com")?)?;
//! for row in table.scan()? {
//!     println!("{}", row?);
//! }
//! table.close()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: paged file cache (lazy loads, flush on close)
//! - [`btree`]: node codecs and the split/descent engine
//! - [`table`]: the public facade and scan iterator
//! - [`row`]: fixed-layout row serialization
//! - [`cli`]: the interactive shell used by the `featherdb` binary

#[macro_use]
mod macros;

pub mod btree;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod row;
pub mod storage;
pub mod table;

pub use cursor::Cursor;
pub use error::EngineError;
pub use row::Row;
pub use table::{Scan, Table};
