//! # Storage Module
//!
//! The storage layer is a byte-addressed cache over the single database
//! file. The [`Pager`] owns the file handle and an array of up to
//! `TABLE_MAX_PAGES` page buffers; pages are loaded lazily with positioned
//! reads, mutated in memory, and written back with positioned writes only
//! when the table is closed.
//!
//! Nothing above this layer touches the file: the B+tree engine addresses
//! pages purely by number and re-fetches buffers through the pager between
//! mutation steps.

mod pager;

pub use pager::Pager;
