//! # featherdb Layout Constants
//!
//! This module centralizes the on-disk layout constants. Constants that
//! depend on each other are co-located and every derived value is pinned by
//! a compile-time assertion, so a change that breaks the layout fails the
//! build rather than corrupting files.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       ├─> LEAF_NODE_SPACE_FOR_CELLS (PAGE_SIZE - LEAF_NODE_HEADER_SIZE)
//!       │         │
//!       │         └─> LEAF_NODE_MAX_CELLS (space / LEAF_NODE_CELL_SIZE)
//!       │                   │
//!       │                   └─> LEAF_NODE_{LEFT,RIGHT}_SPLIT_COUNT
//!       │
//!       └─> TABLE_MAX_PAGES bounds the file at 100 pages
//!
//! ROW_SIZE (291 bytes = 4 id + 32 username + 255 email)
//!       │
//!       └─> LEAF_NODE_CELL_SIZE (4-byte key + ROW_SIZE)
//!
//! COMMON_NODE_HEADER_SIZE (6 bytes: type, is-root, parent)
//!       │
//!       ├─> LEAF_NODE_HEADER_SIZE (+ num_cells + next_leaf = 14)
//!       └─> INTERNAL_NODE_HEADER_SIZE (+ num_keys + right_child = 14)
//! ```
//!
//! The node codecs in `btree` assert that their zerocopy header structs
//! match these sizes exactly.

// ============================================================================
// PAGE AND FILE LIMITS
// ============================================================================

/// Size of each database page in bytes. The fundamental unit of I/O and of
/// node layout; the file size must always be a multiple of this.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages in a database file. Inserting past this limit
/// fails with `EngineError::TableFull`. There is no free list; pages are
/// allocated densely and never reclaimed.
pub const TABLE_MAX_PAGES: usize = 100;

/// The root node is pinned to page 0 for the lifetime of the file. Root
/// splits copy the old root out and reinitialize page 0 in place.
pub const ROOT_PAGE_NUM: u32 = 0;

// ============================================================================
// ROW LAYOUT
// A row is 291 bytes: little-endian id, then two zero-padded string fields
// ============================================================================

pub const ID_SIZE: usize = 4;
pub const USERNAME_SIZE: usize = 32;
pub const EMAIL_SIZE: usize = 255;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Total serialized size of a row.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

const _: () = assert!(ROW_SIZE == 291, "row layout drifted from 291 bytes");

// ============================================================================
// COMMON NODE HEADER
// Shared by leaf and internal nodes: type tag, is-root flag, parent page
// ============================================================================

pub const COMMON_NODE_HEADER_SIZE: usize = 1 + 1 + 4;

// ============================================================================
// LEAF NODE LAYOUT
// Header: common + num_cells (u32) + next_leaf (u32). Cells are (key, row).
// ============================================================================

pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

pub const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + ROW_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// Cells per leaf. 13 with the 4KB page and 291-byte row.
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// On a leaf split the upper half of the `LEAF_NODE_MAX_CELLS + 1` logical
/// cells moves to the new right sibling.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1).div_ceil(2);
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_RIGHT_SPLIT_COUNT;

const _: () = assert!(LEAF_NODE_MAX_CELLS == 13, "leaf capacity drifted");
const _: () = assert!(
    LEAF_NODE_LEFT_SPLIT_COUNT + LEAF_NODE_RIGHT_SPLIT_COUNT == LEAF_NODE_MAX_CELLS + 1,
    "leaf split counts must cover every cell exactly once"
);

// ============================================================================
// INTERNAL NODE LAYOUT
// Header: common + num_keys (u32) + right_child (u32). Cells are (child, key)
// where the key is the max key reachable through that child.
// ============================================================================

pub const INTERNAL_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

pub const INTERNAL_NODE_CELL_SIZE: usize = 4 + 4;

/// Keys per internal node. Deliberately tiny so that multi-level splits are
/// exercised by small datasets; the page could hold far more.
pub const INTERNAL_NODE_MAX_KEYS: usize = 3;

/// An internal split distributes `INTERNAL_NODE_MAX_KEYS + 1` keys: the left
/// node keeps `LEFT_SPLIT_COUNT`, the right sibling takes
/// `RIGHT_SPLIT_COUNT`, and one key is promoted to the parent.
pub const INTERNAL_NODE_RIGHT_SPLIT_COUNT: usize = (INTERNAL_NODE_MAX_KEYS + 1).div_ceil(2);
pub const INTERNAL_NODE_LEFT_SPLIT_COUNT: usize =
    INTERNAL_NODE_MAX_KEYS + 1 - INTERNAL_NODE_RIGHT_SPLIT_COUNT - 1;

const _: () = assert!(
    INTERNAL_NODE_LEFT_SPLIT_COUNT + INTERNAL_NODE_RIGHT_SPLIT_COUNT + 1
        == INTERNAL_NODE_MAX_KEYS + 1,
    "internal split counts plus the promoted key must cover every key"
);
const _: () = assert!(
    INTERNAL_NODE_HEADER_SIZE
        + (INTERNAL_NODE_MAX_KEYS + 1) * INTERNAL_NODE_CELL_SIZE
        <= PAGE_SIZE,
    "internal node must fit in a page even mid-split"
);
