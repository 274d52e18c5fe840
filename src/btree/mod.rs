//! # B+Tree Module
//!
//! The tree layer interprets pager buffers as B+tree nodes and implements
//! the structural operations over them.
//!
//! ## Node Types
//!
//! Every page is one node. A node starts with a common 6-byte header (type
//! tag, is-root flag, parent page number) and continues with a
//! variant-specific header and cell array:
//!
//! - **Leaf nodes** hold `(key, row)` cells in sorted order and link to
//!   their right sibling through `next_leaf`, forming an ascending chain
//!   across the whole table.
//! - **Internal nodes** hold `(child, key)` cells plus a `right_child`
//!   pointer. The key of cell `i` is the maximum key reachable through
//!   `cells[i].child`; everything greater lives under `right_child`.
//!
//! ## Layout (leaf)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------------------------
//! 0       1     node type (0 internal, 1 leaf)
//! 1       1     is-root flag
//! 2       4     parent page number
//! 6       4     num_cells
//! 10      4     next_leaf (0 = none)
//! 14      295   cell 0: key (4) + row (291)
//! ...           up to 13 cells, rest unused
//! ```
//!
//! ## Layout (internal)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------------------------
//! 0       6     common header as above
//! 6       4     num_keys
//! 10      4     right_child page number
//! 14      8     cell 0: child (4) + key (4)
//! ...           up to 3 keys
//! ```
//!
//! The codecs ([`LeafNode`], [`InternalNode`] and their `Mut` twins) are
//! borrowed views over a single page buffer; the engine ([`BTree`])
//! re-fetches pages through the pager between mutation steps instead of
//! holding several live views at once.

mod internal;
mod leaf;
mod node;
mod tree;

pub use internal::{InternalCell, InternalNode, InternalNodeMut};
pub use leaf::{LeafNode, LeafNodeMut, SearchResult};
pub use node::{NodeHeader, NodeType, max_key};
pub use tree::BTree;
