//! # B+Tree Engine
//!
//! The structural core: descent, leaf insertion, node splitting, and root
//! growth. The engine borrows the pager for the duration of one operation
//! and addresses nodes purely by page number.
//!
//! ## Descent
//!
//! `find` walks from page 0 (always the root). At an internal node it picks
//! the first cell whose key is >= the search key, falling through to
//! `right_child`; at a leaf it binary-searches the cells and yields a
//! cursor at the key's slot, whether or not the key is present.
//!
//! ## Splits
//!
//! A full leaf splits by gathering its 13 cells plus the incoming one into
//! a sorted sequence, keeping the lower 7 in place and moving the upper 7
//! to a freshly allocated right sibling that takes over the old `next_leaf`
//! link:
//!
//! ```text
//!        parent                      parent (key refreshed, sibling added)
//!          │                            │        │
//!   [1 2 3 ... 13 14]   ──>   [1 ... 7] ──────> [8 ... 14]
//! ```
//!
//! The parent's key for the old leaf is refreshed first, then the sibling
//! is inserted; a full parent splits the same way, recursively. Splitting
//! an internal node promotes one key to its parent instead of copying it.
//!
//! ## Root Growth
//!
//! The root never moves from page 0. When it splits, its bytes are copied
//! to a new page (the left child) and page 0 is reinitialized as an
//! internal node over the two halves. During a root split the right sibling
//! is allocated before the left copy; `Pager::allocate` documents this
//! ordering contract.
//!
//! ## Aliasing Discipline
//!
//! A split touches up to six pages. Rather than holding several live
//! mutable views, every step re-fetches its page through the pager and
//! drops the view before the next step; gathered cell data is copied out
//! first where two pages would otherwise be alive at once.
//!
//! ## Failure Semantics
//!
//! Page allocation is attempted before any page is mutated, so a table-full
//! insert into a full leaf leaves the tree untouched. A failure while a
//! split propagates upward can leave a sibling linked into the leaf chain
//! but absent from its parent; scans stay ordered but the tree is no longer
//! canonical. There is no rollback.

use std::io::Write;

use eyre::Result;

use crate::config::{
    INTERNAL_NODE_LEFT_SPLIT_COUNT, INTERNAL_NODE_MAX_KEYS, LEAF_NODE_LEFT_SPLIT_COUNT,
    LEAF_NODE_MAX_CELLS, ROOT_PAGE_NUM, ROW_SIZE,
};
use crate::cursor::Cursor;
use crate::row::Row;
use crate::storage::Pager;

use super::internal::{InternalNode, InternalNodeMut};
use super::leaf::{LeafNode, LeafNodeMut};
use super::node::{NodeHeader, NodeType, max_key};

pub struct BTree<'a> {
    pager: &'a mut Pager,
}

impl<'a> BTree<'a> {
    pub fn new(pager: &'a mut Pager) -> Self {
        Self { pager }
    }

    /// Initializes page 0 as an empty root leaf. Called once, on the first
    /// open of an empty file.
    pub fn create(pager: &'a mut Pager) -> Result<Self> {
        let page = pager.page_mut(ROOT_PAGE_NUM)?;
        let mut root = LeafNodeMut::init(page)?;
        root.set_is_root(true);
        Ok(Self { pager })
    }

    /// Descends to the leaf responsible for `key` and returns a cursor at
    /// the slot where the key lives or would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Cursor> {
        let mut page_num = ROOT_PAGE_NUM;

        loop {
            let page = self.pager.page(page_num)?;
            match NodeHeader::from_bytes(page)?.node_type() {
                NodeType::Leaf => {
                    let leaf = LeafNode::from_page(page)?;
                    let cell_num = leaf.find_key(key)?.index() as u32;
                    return Ok(Cursor::new(page_num, cell_num));
                }
                NodeType::Internal => {
                    let node = InternalNode::from_page(page)?;
                    let child_index = node.find_child(key)?;
                    page_num = node.child_at(child_index)?;
                }
            }
        }
    }

    /// Inserts `(key, row)` at the cursor's slot, splitting the leaf if it
    /// is full. The cursor must come from `find(key)` on the current tree.
    pub fn insert_at(&mut self, cursor: &Cursor, key: u32, row: &Row) -> Result<()> {
        let num_cells = {
            let page = self.pager.page(cursor.page_num)?;
            LeafNode::from_page(page)?.num_cells()
        };

        if (num_cells as usize) >= LEAF_NODE_MAX_CELLS {
            return self.split_leaf_and_insert(cursor, key, row);
        }

        let mut serialized = [0u8; ROW_SIZE];
        row.serialize(&mut serialized);

        let page = self.pager.page_mut(cursor.page_num)?;
        let mut leaf = LeafNodeMut::from_page(page)?;
        leaf.insert_at(cursor.cell_num as usize, key, &serialized)
    }

    fn split_leaf_and_insert(&mut self, cursor: &Cursor, key: u32, row: &Row) -> Result<()> {
        let old_page_num = cursor.page_num;

        // Gather the 14 logical cells before touching anything, so a failed
        // allocation leaves the tree unchanged.
        let (old_parent, old_next_leaf, old_was_root, mut cells) = {
            let page = self.pager.page(old_page_num)?;
            let leaf = LeafNode::from_page(page)?;
            let mut cells: Vec<(u32, [u8; ROW_SIZE])> =
                Vec::with_capacity(LEAF_NODE_MAX_CELLS + 1);
            for i in 0..leaf.num_cells() as usize {
                let mut value = [0u8; ROW_SIZE];
                value.copy_from_slice(leaf.value_at(i)?);
                cells.push((leaf.key_at(i)?, value));
            }
            (leaf.parent(), leaf.next_leaf(), leaf.is_root(), cells)
        };

        let mut serialized = [0u8; ROW_SIZE];
        row.serialize(&mut serialized);
        cells.insert(cursor.cell_num as usize, (key, serialized));

        let new_page_num = self.pager.allocate()?;

        {
            let page = self.pager.page_mut(new_page_num)?;
            let mut new_leaf = LeafNodeMut::init(page)?;
            new_leaf.set_parent(old_parent);
            new_leaf.set_next_leaf(old_next_leaf);
            for (i, (cell_key, value)) in cells[LEAF_NODE_LEFT_SPLIT_COUNT..].iter().enumerate() {
                new_leaf.write_cell(i, *cell_key, value)?;
            }
            new_leaf.set_num_cells((cells.len() - LEAF_NODE_LEFT_SPLIT_COUNT) as u32);
        }

        {
            let page = self.pager.page_mut(old_page_num)?;
            let mut old_leaf = LeafNodeMut::from_page(page)?;
            for (i, (cell_key, value)) in cells[..LEAF_NODE_LEFT_SPLIT_COUNT].iter().enumerate() {
                old_leaf.write_cell(i, *cell_key, value)?;
            }
            old_leaf.set_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT as u32);
            old_leaf.set_next_leaf(new_page_num);
        }

        if old_was_root {
            return self.create_new_root(new_page_num);
        }

        // Refresh the parent's key for the shrunken left leaf, then attach
        // the sibling. Both splits keep this order.
        let old_max = {
            let page = self.pager.page(old_page_num)?;
            LeafNode::from_page(page)?.max_key()?
        };
        {
            let page = self.pager.page_mut(old_parent)?;
            let mut parent = InternalNodeMut::from_page(page)?;
            let index = parent.find_child_by_page(old_page_num)?;
            if index < parent.num_keys() as usize {
                parent.set_key_at(index, old_max)?;
            }
        }

        self.insert_into_internal(old_parent, new_page_num)
    }

    /// Grows the tree by one level after the root split. `right_child_page`
    /// is the freshly created right sibling; the old root's bytes move to a
    /// new left page and page 0 becomes an internal node over both.
    fn create_new_root(&mut self, right_child_page: u32) -> Result<()> {
        let left_child_page = self.pager.allocate()?;

        let root_bytes = self.pager.page(ROOT_PAGE_NUM)?.to_vec();
        {
            let page = self.pager.page_mut(left_child_page)?;
            page.copy_from_slice(&root_bytes);
            let header = NodeHeader::from_bytes_mut(page)?;
            header.set_is_root(false);
            header.set_parent(ROOT_PAGE_NUM);
        }

        let left_max = max_key(self.pager.page(left_child_page)?)?;
        let left_type = NodeHeader::from_bytes(self.pager.page(left_child_page)?)?.node_type();

        {
            let page = self.pager.page_mut(ROOT_PAGE_NUM)?;
            let mut root = InternalNodeMut::init(page, right_child_page)?;
            root.set_is_root(true);
            root.write_cell(0, left_child_page, left_max)?;
            root.set_num_keys(1);
        }

        {
            let page = self.pager.page_mut(right_child_page)?;
            NodeHeader::from_bytes_mut(page)?.set_parent(ROOT_PAGE_NUM);
        }

        if left_type == NodeType::Internal {
            self.reparent_children(left_child_page)?;
        }

        Ok(())
    }

    /// Attaches `child_page` under `parent_page`, splitting the parent if it
    /// is already at `INTERNAL_NODE_MAX_KEYS`.
    fn insert_into_internal(&mut self, parent_page: u32, child_page: u32) -> Result<()> {
        {
            let page = self.pager.page_mut(child_page)?;
            NodeHeader::from_bytes_mut(page)?.set_parent(parent_page);
        }

        let (num_keys, right_child) = {
            let page = self.pager.page(parent_page)?;
            let node = InternalNode::from_page(page)?;
            (node.num_keys(), node.right_child())
        };

        if num_keys as usize >= INTERNAL_NODE_MAX_KEYS {
            return self.split_internal_and_insert(parent_page, child_page);
        }

        let child_max = max_key(self.pager.page(child_page)?)?;
        let right_max = max_key(self.pager.page(right_child)?)?;

        let page = self.pager.page_mut(parent_page)?;
        let mut parent = InternalNodeMut::from_page(page)?;

        if child_max > right_max {
            // New child becomes the rightmost: demote the old right child
            // into the cell array under its max key.
            parent.write_cell(num_keys as usize, right_child, right_max)?;
            parent.set_num_keys(num_keys + 1);
            parent.set_right_child(child_page);
        } else {
            let index = parent.find_child(child_max)?;
            parent.insert_cell_at(index, child_page, child_max)?;
        }

        Ok(())
    }

    fn split_internal_and_insert(&mut self, page_num: u32, child_page: u32) -> Result<()> {
        // Gather every (child, key) entry including the right child as a
        // synthetic tail keyed by its max key, then slot the new child in.
        let (split_parent, was_root, right_child, mut entries) = {
            let page = self.pager.page(page_num)?;
            let node = InternalNode::from_page(page)?;
            let mut entries: Vec<(u32, u32)> = Vec::with_capacity(INTERNAL_NODE_MAX_KEYS + 2);
            for i in 0..node.num_keys() as usize {
                let cell = node.cell_at(i)?;
                entries.push((cell.child(), cell.key()));
            }
            (node.parent(), node.is_root(), node.right_child(), entries)
        };
        let right_max = max_key(self.pager.page(right_child)?)?;
        entries.push((right_child, right_max));

        let child_max = max_key(self.pager.page(child_page)?)?;
        let position = entries
            .iter()
            .position(|&(_, entry_key)| child_max <= entry_key)
            .unwrap_or(entries.len());
        entries.insert(position, (child_page, child_max));

        let left_entries = &entries[..INTERNAL_NODE_LEFT_SPLIT_COUNT];
        let (left_right_child, promoted_key) = entries[INTERNAL_NODE_LEFT_SPLIT_COUNT];
        let right_entries = &entries[INTERNAL_NODE_LEFT_SPLIT_COUNT + 1..entries.len() - 1];
        let tail_child = entries[entries.len() - 1].0;

        // The right sibling is reserved before any further allocation; root
        // splits then allocate the left copy second.
        let new_page_num = self.pager.allocate()?;
        {
            let page = self.pager.page_mut(new_page_num)?;
            let mut node = InternalNodeMut::init(page, tail_child)?;
            node.set_parent(split_parent);
            for (i, (child, cell_key)) in right_entries.iter().enumerate() {
                node.write_cell(i, *child, *cell_key)?;
            }
            node.set_num_keys(right_entries.len() as u32);
        }

        if was_root {
            let left_page_num = self.pager.allocate()?;
            {
                let page = self.pager.page_mut(left_page_num)?;
                let mut node = InternalNodeMut::init(page, left_right_child)?;
                node.set_parent(ROOT_PAGE_NUM);
                for (i, (child, cell_key)) in left_entries.iter().enumerate() {
                    node.write_cell(i, *child, *cell_key)?;
                }
                node.set_num_keys(left_entries.len() as u32);
            }
            {
                let page = self.pager.page_mut(ROOT_PAGE_NUM)?;
                let mut root = InternalNodeMut::init(page, new_page_num)?;
                root.set_is_root(true);
                root.write_cell(0, left_page_num, promoted_key)?;
                root.set_num_keys(1);
            }
            {
                let page = self.pager.page_mut(new_page_num)?;
                NodeHeader::from_bytes_mut(page)?.set_parent(ROOT_PAGE_NUM);
            }
            self.reparent_children(left_page_num)?;
            self.reparent_children(new_page_num)?;
            return Ok(());
        }

        {
            let page = self.pager.page_mut(page_num)?;
            let mut node = InternalNodeMut::init(page, left_right_child)?;
            node.set_parent(split_parent);
            for (i, (child, cell_key)) in left_entries.iter().enumerate() {
                node.write_cell(i, *child, *cell_key)?;
            }
            node.set_num_keys(left_entries.len() as u32);
        }
        self.reparent_children(page_num)?;
        self.reparent_children(new_page_num)?;

        // Same canonical order as the leaf split: refresh the grandparent's
        // stale key for the shrunken node, then attach the sibling.
        let left_max = max_key(self.pager.page(page_num)?)?;
        {
            let page = self.pager.page_mut(split_parent)?;
            let mut grandparent = InternalNodeMut::from_page(page)?;
            let index = grandparent.find_child_by_page(page_num)?;
            if index < grandparent.num_keys() as usize {
                grandparent.set_key_at(index, left_max)?;
            }
        }

        self.insert_into_internal(split_parent, new_page_num)
    }

    /// Points every child of `internal_page` back at it.
    fn reparent_children(&mut self, internal_page: u32) -> Result<()> {
        let children: Vec<u32> = {
            let page = self.pager.page(internal_page)?;
            let node = InternalNode::from_page(page)?;
            (0..=node.num_keys() as usize)
                .map(|i| node.child_at(i))
                .collect::<Result<_>>()?
        };

        for child in children {
            let page = self.pager.page_mut(child)?;
            NodeHeader::from_bytes_mut(page)?.set_parent(internal_page);
        }

        Ok(())
    }

    /// Pretty-prints the tree rooted at page 0, one node per line:
    ///
    /// ```text
    /// - internal (size 1)
    ///   - leaf (size 7)
    ///     - 1
    ///   - key 7
    ///   - leaf (size 8)
    ///     - 8
    /// ```
    pub fn print<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.print_node(out, ROOT_PAGE_NUM, 0)
    }

    fn print_node<W: Write>(&mut self, out: &mut W, page_num: u32, depth: usize) -> Result<()> {
        let page = self.pager.page(page_num)?;
        match NodeHeader::from_bytes(page)?.node_type() {
            NodeType::Leaf => {
                let leaf = LeafNode::from_page(page)?;
                let num_cells = leaf.num_cells();
                let mut keys = Vec::with_capacity(num_cells as usize);
                for i in 0..num_cells as usize {
                    keys.push(leaf.key_at(i)?);
                }

                writeln!(out, "{}- leaf (size {})", indent(depth), num_cells)?;
                for key in keys {
                    writeln!(out, "{}- {}", indent(depth + 1), key)?;
                }
            }
            NodeType::Internal => {
                let node = InternalNode::from_page(page)?;
                let num_keys = node.num_keys();
                let mut cells = Vec::with_capacity(num_keys as usize);
                for i in 0..num_keys as usize {
                    let cell = node.cell_at(i)?;
                    cells.push((cell.child(), cell.key()));
                }
                let right_child = node.right_child();

                writeln!(out, "{}- internal (size {})", indent(depth), num_keys)?;
                for (child, key) in cells {
                    self.print_node(out, child, depth + 1)?;
                    writeln!(out, "{}- key {}", indent(depth + 1), key)?;
                }
                self.print_node(out, right_child, depth + 1)?;
            }
        }
        Ok(())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
