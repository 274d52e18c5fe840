//! # Table - the Engine Facade
//!
//! [`Table`] ties the layers together: it owns the [`Pager`], pins the tree
//! root to page 0, and exposes the four engine operations - open, insert,
//! scan, close. Multiple tables over different files may coexist; there is
//! no global state.
//!
//! ## Lifecycle
//!
//! Opening an empty file initializes page 0 as an empty root leaf. All
//! mutations stay in the pager's cache until [`Table::close`] flushes them;
//! dropping a table without closing loses them (the file is never fsynced
//! either way - durability requires a clean close).
//!
//! ## Scans
//!
//! [`Table::scan`] positions a cursor on the leftmost leaf and walks the
//! sibling chain lazily, yielding rows in ascending key order without ever
//! re-descending the tree or buffering the table.

use std::io::Write;
use std::path::Path;

use eyre::Result;

use crate::btree::{BTree, LeafNode};
use crate::cursor::Cursor;
use crate::error::EngineError;
use crate::row::Row;
use crate::storage::Pager;

pub struct Table {
    pager: Pager,
}

impl Table {
    /// Opens a database file, creating and initializing it if missing or
    /// empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pager = Pager::open(path)?;
        if pager.num_pages() == 0 {
            BTree::create(&mut pager)?;
        }
        Ok(Self { pager })
    }

    /// Inserts a row keyed by its id. Fails with
    /// [`EngineError::DuplicateKey`] (before any modification) if the key
    /// is present and [`EngineError::TableFull`] if the file is out of
    /// pages. A table-full failure while a split was propagating can leave
    /// the tree non-canonical; rows inserted earlier remain scannable.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let key = row.key();
        let cursor = BTree::new(&mut self.pager).find(key)?;

        {
            let page = self.pager.page(cursor.page_num())?;
            let leaf = LeafNode::from_page(page)?;
            if cursor.cell_num() < leaf.num_cells()
                && leaf.key_at(cursor.cell_num() as usize)? == key
            {
                return Err(EngineError::DuplicateKey(key).into());
            }
        }

        BTree::new(&mut self.pager).insert_at(&cursor, key, row)
    }

    /// Lazy forward scan over all rows in ascending key order.
    pub fn scan(&mut self) -> Result<Scan<'_>> {
        let cursor = self.start()?;
        Ok(Scan {
            table: self,
            cursor,
        })
    }

    /// Cursor at the first row: the leftmost leaf, cell 0; end-of-table if
    /// the tree is empty.
    fn start(&mut self) -> Result<Cursor> {
        let mut cursor = BTree::new(&mut self.pager).find(0)?;

        let page = self.pager.page(cursor.page_num())?;
        let leaf = LeafNode::from_page(page)?;
        if leaf.num_cells() == 0 {
            cursor.end_of_table = true;
        }

        Ok(cursor)
    }

    /// Flushes every cached page to disk and consumes the table. The file
    /// handle closes when the pager drops.
    pub fn close(mut self) -> Result<()> {
        self.pager.close()
    }

    /// Writes the `.btree` pretty-print of the whole tree to `out`.
    pub fn print_tree<W: Write>(&mut self, out: &mut W) -> Result<()> {
        BTree::new(&mut self.pager).print(out)
    }
}

/// Forward-only row iterator following the leaf sibling chain.
pub struct Scan<'a> {
    table: &'a mut Table,
    cursor: Cursor,
}

impl Scan<'_> {
    fn read_and_advance(&mut self) -> Result<Row> {
        let row = {
            let page = self.table.pager.page(self.cursor.page_num)?;
            let leaf = LeafNode::from_page(page)?;
            Row::deserialize(leaf.value_at(self.cursor.cell_num as usize)?)
        };

        self.cursor.cell_num += 1;
        let page = self.table.pager.page(self.cursor.page_num)?;
        let leaf = LeafNode::from_page(page)?;
        if self.cursor.cell_num >= leaf.num_cells() {
            let next_leaf = leaf.next_leaf();
            if next_leaf == 0 {
                self.cursor.end_of_table = true;
            } else {
                self.cursor.page_num = next_leaf;
                self.cursor.cell_num = 0;
            }
        }

        Ok(row)
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.end_of_table {
            return None;
        }
        match self.read_and_advance() {
            Ok(row) => Some(Ok(row)),
            Err(err) => {
                self.cursor.end_of_table = true;
                Some(Err(err))
            }
        }
    }
}
