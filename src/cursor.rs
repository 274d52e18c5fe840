//! # Cursor
//!
//! A cursor names a position in the table: a leaf page, a cell index within
//! it, and an end-of-table flag. It is plain position data; the pager and
//! the tree engine do the actual page access.
//!
//! A cursor is invalidated by any tree mutation other than the one it was
//! produced for: a split moves cells between pages, so a stale cursor may
//! point into the wrong leaf. Callers must re-run `find` after an insert
//! rather than reusing a cursor.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub(crate) page_num: u32,
    pub(crate) cell_num: u32,
    pub(crate) end_of_table: bool,
}

impl Cursor {
    pub(crate) fn new(page_num: u32, cell_num: u32) -> Self {
        Self {
            page_num,
            cell_num,
            end_of_table: false,
        }
    }

    /// The leaf page this cursor points into.
    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    /// The cell index within the leaf.
    pub fn cell_num(&self) -> u32 {
        self.cell_num
    }

    /// Whether the cursor has advanced past the last row.
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }
}
