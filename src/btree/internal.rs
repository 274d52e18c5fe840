//! # Internal Node Codec
//!
//! Internal nodes guide descent. Each of the `num_keys` cells pairs a child
//! page number with the maximum key reachable through that child; keys
//! greater than every cell key live under the separate `right_child`
//! pointer, so the node always has `num_keys + 1` children.
//!
//! ## Page Layout
//!
//! ```text
//! +---------------------------------+
//! | Common header (6 bytes)         |
//! | num_keys (4) right_child (4)    |
//! +---------------------------------+
//! | Cell 0: child (4) | key (4)     |
//! | Cell 1: child (4) | key (4)     |
//! | Cell 2: child (4) | key (4)     |
//! +---------------------------------+
//! | Unused                          |
//! +---------------------------------+
//! ```
//!
//! `num_keys` is capped at 3 (see `config::constants`), far below what the
//! page could hold, so splits are reachable by small test datasets.

use eyre::{Result, ensure};
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{
    INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_KEYS, PAGE_SIZE,
};

use super::node::NodeType;

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct InternalHeader {
    node_type: u8,
    is_root: u8,
    parent: U32<LittleEndian>,
    num_keys: U32<LittleEndian>,
    right_child: U32<LittleEndian>,
}

const _: () = assert!(size_of::<InternalHeader>() == INTERNAL_NODE_HEADER_SIZE);

impl InternalHeader {
    fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InternalHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InternalHeader: {:?}", e))
    }

    fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InternalHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InternalHeader: {:?}", e))
    }

    fn is_root(&self) -> bool {
        self.is_root != 0
    }

    fn set_is_root(&mut self, is_root: bool) {
        self.is_root = is_root as u8;
    }

    zerocopy_accessors! {
        parent: u32,
        num_keys: u32,
        right_child: u32,
    }
}

/// One (child, key) cell: `key` is the max key reachable through `child`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct InternalCell {
    child: U32<LittleEndian>,
    key: U32<LittleEndian>,
}

const _: () = assert!(size_of::<InternalCell>() == INTERNAL_NODE_CELL_SIZE);

impl InternalCell {
    pub fn new(child: u32, key: u32) -> Self {
        Self {
            child: U32::new(child),
            key: U32::new(key),
        }
    }

    zerocopy_accessors! {
        child: u32,
        key: u32,
    }
}

#[derive(Debug)]
pub struct InternalNode<'a> {
    data: &'a [u8],
}

pub struct InternalNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(index: usize) -> usize {
    INTERNAL_NODE_HEADER_SIZE + index * INTERNAL_NODE_CELL_SIZE
}

impl<'a> InternalNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = InternalHeader::from_bytes(data)?;
        ensure!(
            NodeType::from_byte(header.node_type) == NodeType::Internal,
            "expected internal page, got leaf"
        );
        Ok(Self { data })
    }

    pub fn num_keys(&self) -> u32 {
        // INVARIANT: page validated in from_page
        InternalHeader::from_bytes(self.data).unwrap().num_keys()
    }

    pub fn right_child(&self) -> u32 {
        InternalHeader::from_bytes(self.data).unwrap().right_child()
    }

    pub fn parent(&self) -> u32 {
        InternalHeader::from_bytes(self.data).unwrap().parent()
    }

    pub fn is_root(&self) -> bool {
        InternalHeader::from_bytes(self.data).unwrap().is_root()
    }

    pub fn cell_at(&self, index: usize) -> Result<&'a InternalCell> {
        ensure!(
            index < self.num_keys() as usize,
            "cell index {} out of bounds (num_keys={})",
            index,
            self.num_keys()
        );
        let offset = cell_offset(index);
        InternalCell::ref_from_bytes(&self.data[offset..offset + INTERNAL_NODE_CELL_SIZE])
            .map_err(|e| eyre::eyre!("failed to read internal cell {}: {:?}", index, e))
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        Ok(self.cell_at(index)?.key())
    }

    /// Child pointer `index`, where `index == num_keys` names `right_child`.
    pub fn child_at(&self, index: usize) -> Result<u32> {
        let num_keys = self.num_keys() as usize;
        ensure!(
            index <= num_keys,
            "child index {} out of bounds (num_keys={})",
            index,
            num_keys
        );
        if index == num_keys {
            Ok(self.right_child())
        } else {
            Ok(self.cell_at(index)?.child())
        }
    }

    /// Binary search for the smallest index whose cell key is >= `key`;
    /// `num_keys` (the right child) if `key` exceeds every cell key.
    pub fn find_child(&self, key: u32) -> Result<usize> {
        let mut lo = 0usize;
        let mut hi = self.num_keys() as usize;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if key <= self.key_at(mid)? {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        Ok(lo)
    }

    /// Index of the cell whose child is `child_page`, or `num_keys` for the
    /// right child. A miss means the parent pointer graph is broken, which
    /// the tree cannot survive; it aborts.
    pub fn find_child_by_page(&self, child_page: u32) -> Result<usize> {
        let num_keys = self.num_keys() as usize;
        for index in 0..num_keys {
            if self.cell_at(index)?.child() == child_page {
                return Ok(index);
            }
        }
        if self.right_child() == child_page {
            return Ok(num_keys);
        }
        panic!(
            "internal node does not contain child page {}: parent pointers are corrupt",
            child_page
        );
    }

    /// Key of the last cell. By the tree's construction this is the max key
    /// under that cell's child; keys under `right_child` are greater, but
    /// the engine's comparisons are defined over this cell-key form. Must
    /// not be called on an empty node.
    pub fn max_key(&self) -> Result<u32> {
        let num_keys = self.num_keys();
        ensure!(num_keys > 0, "max_key on empty internal node");
        self.key_at(num_keys as usize - 1)
    }
}

impl<'a> InternalNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = InternalHeader::from_bytes(data)?;
        ensure!(
            NodeType::from_byte(header.node_type) == NodeType::Internal,
            "expected internal page, got leaf"
        );
        Ok(Self { data })
    }

    /// Stamps an internal header onto the page with no cells and the given
    /// right child. Not the root, parent 0; callers adjust afterwards.
    pub fn init(data: &'a mut [u8], right_child: u32) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );

        let header = InternalHeader::from_bytes_mut(data)?;
        header.node_type = NodeType::Internal as u8;
        header.set_is_root(false);
        header.set_parent(0);
        header.set_num_keys(0);
        header.set_right_child(right_child);

        Ok(Self { data })
    }

    pub fn num_keys(&self) -> u32 {
        // INVARIANT: page validated in from_page/init
        InternalHeader::from_bytes(self.data).unwrap().num_keys()
    }

    pub fn right_child(&self) -> u32 {
        InternalHeader::from_bytes(self.data).unwrap().right_child()
    }

    pub fn parent(&self) -> u32 {
        InternalHeader::from_bytes(self.data).unwrap().parent()
    }

    fn header_mut(&mut self) -> &mut InternalHeader {
        // INVARIANT: page validated in from_page/init
        InternalHeader::from_bytes_mut(self.data).unwrap()
    }

    pub fn set_num_keys(&mut self, num_keys: u32) {
        self.header_mut().set_num_keys(num_keys);
    }

    pub fn set_right_child(&mut self, page_num: u32) {
        self.header_mut().set_right_child(page_num);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        self.header_mut().set_parent(page_num);
    }

    pub fn set_is_root(&mut self, is_root: bool) {
        self.header_mut().set_is_root(is_root);
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        self.as_ref().key_at(index)
    }

    pub fn child_at(&self, index: usize) -> Result<u32> {
        self.as_ref().child_at(index)
    }

    pub fn find_child(&self, key: u32) -> Result<usize> {
        self.as_ref().find_child(key)
    }

    pub fn find_child_by_page(&self, child_page: u32) -> Result<usize> {
        self.as_ref().find_child_by_page(child_page)
    }

    pub fn max_key(&self) -> Result<u32> {
        self.as_ref().max_key()
    }

    /// Writes cell `index` in place without shifting or touching `num_keys`.
    pub fn write_cell(&mut self, index: usize, child: u32, key: u32) -> Result<()> {
        ensure!(
            index < INTERNAL_NODE_MAX_KEYS,
            "cell index {} exceeds internal capacity {}",
            index,
            INTERNAL_NODE_MAX_KEYS
        );

        let offset = cell_offset(index);
        let cell = InternalCell::new(child, key);
        self.data[offset..offset + INTERNAL_NODE_CELL_SIZE].copy_from_slice(cell.as_bytes());

        Ok(())
    }

    /// Inserts a cell at `index`, shifting later cells right and bumping
    /// `num_keys`. The caller guarantees the node is not full.
    pub fn insert_cell_at(&mut self, index: usize, child: u32, key: u32) -> Result<()> {
        let num_keys = self.num_keys() as usize;
        ensure!(
            num_keys < INTERNAL_NODE_MAX_KEYS,
            "insert into full internal node (num_keys={})",
            num_keys
        );
        ensure!(
            index <= num_keys,
            "insert index {} out of bounds (num_keys={})",
            index,
            num_keys
        );

        if index < num_keys {
            self.data
                .copy_within(cell_offset(index)..cell_offset(num_keys), cell_offset(index + 1));
        }

        self.write_cell(index, child, key)?;
        self.set_num_keys(num_keys as u32 + 1);

        Ok(())
    }

    /// Replaces the key of cell `index`, keeping its child.
    pub fn set_key_at(&mut self, index: usize, key: u32) -> Result<()> {
        ensure!(
            index < self.num_keys() as usize,
            "cell index {} out of bounds (num_keys={})",
            index,
            self.num_keys()
        );

        let offset = cell_offset(index);
        let cell = InternalCell::mut_from_bytes(
            &mut self.data[offset..offset + INTERNAL_NODE_CELL_SIZE],
        )
        .map_err(|e| eyre::eyre!("failed to read internal cell {}: {:?}", index, e))?;
        cell.set_key(key);

        Ok(())
    }

    pub fn as_ref(&self) -> InternalNode<'_> {
        InternalNode { data: self.data }
    }
}
