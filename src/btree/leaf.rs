//! # Leaf Node Codec
//!
//! Leaf nodes store the table's rows. Each cell is a 4-byte little-endian
//! key followed by the 291-byte row, packed back to back after the 14-byte
//! header; cells are kept sorted strictly ascending by key. Leaves link to
//! their right sibling through `next_leaf` (0 = last leaf), so a full-table
//! scan never re-descends the tree.
//!
//! ## Page Layout
//!
//! ```text
//! +-------------------------------+
//! | Common header (6 bytes)       |
//! | num_cells (4) next_leaf (4)   |
//! +-------------------------------+
//! | Cell 0: key | row (295 bytes) |
//! | Cell 1: key | row             |
//! | ...  up to 13 cells           |
//! +-------------------------------+
//! | Unused                        |
//! +-------------------------------+
//! ```
//!
//! [`LeafNode`] and [`LeafNodeMut`] are borrowed views over one page
//! buffer. Neither performs any I/O; splitting and parent maintenance live
//! in the tree engine.

use eyre::{Result, ensure};
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_KEY_SIZE, LEAF_NODE_MAX_CELLS,
    PAGE_SIZE, ROW_SIZE,
};

use super::node::NodeType;

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct LeafHeader {
    node_type: u8,
    is_root: u8,
    parent: U32<LittleEndian>,
    num_cells: U32<LittleEndian>,
    next_leaf: U32<LittleEndian>,
}

const _: () = assert!(size_of::<LeafHeader>() == LEAF_NODE_HEADER_SIZE);

impl LeafHeader {
    fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
    }

    fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
    }

    fn is_root(&self) -> bool {
        self.is_root != 0
    }

    fn set_is_root(&mut self, is_root: bool) {
        self.is_root = is_root as u8;
    }

    zerocopy_accessors! {
        parent: u32,
        num_cells: u32,
        next_leaf: u32,
    }
}

/// Result of a leaf key search: the cell holding the key, or the cell index
/// where it would be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Found(usize),
    NotFound(usize),
}

impl SearchResult {
    /// The cell index regardless of whether the key was present.
    pub fn index(self) -> usize {
        match self {
            SearchResult::Found(i) | SearchResult::NotFound(i) => i,
        }
    }
}

#[derive(Debug)]
pub struct LeafNode<'a> {
    data: &'a [u8],
}

pub struct LeafNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(index: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + index * LEAF_NODE_CELL_SIZE
}

impl<'a> LeafNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = LeafHeader::from_bytes(data)?;
        ensure!(
            NodeType::from_byte(header.node_type) == NodeType::Leaf,
            "expected leaf page, got internal"
        );
        Ok(Self { data })
    }

    pub fn num_cells(&self) -> u32 {
        // INVARIANT: page validated in from_page
        LeafHeader::from_bytes(self.data).unwrap().num_cells()
    }

    pub fn next_leaf(&self) -> u32 {
        LeafHeader::from_bytes(self.data).unwrap().next_leaf()
    }

    pub fn parent(&self) -> u32 {
        LeafHeader::from_bytes(self.data).unwrap().parent()
    }

    pub fn is_root(&self) -> bool {
        LeafHeader::from_bytes(self.data).unwrap().is_root()
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        ensure!(
            index < self.num_cells() as usize,
            "cell index {} out of bounds (num_cells={})",
            index,
            self.num_cells()
        );
        let offset = cell_offset(index);
        let mut key = [0u8; LEAF_NODE_KEY_SIZE];
        key.copy_from_slice(&self.data[offset..offset + LEAF_NODE_KEY_SIZE]);
        Ok(u32::from_le_bytes(key))
    }

    /// The serialized row of cell `index`, pointing into the page buffer.
    pub fn value_at(&self, index: usize) -> Result<&'a [u8]> {
        ensure!(
            index < self.num_cells() as usize,
            "cell index {} out of bounds (num_cells={})",
            index,
            self.num_cells()
        );
        let offset = cell_offset(index) + LEAF_NODE_KEY_SIZE;
        Ok(&self.data[offset..offset + ROW_SIZE])
    }

    /// Binary search for the smallest cell whose key is >= `key`.
    pub fn find_key(&self, key: u32) -> Result<SearchResult> {
        let mut lo = 0usize;
        let mut hi = self.num_cells() as usize;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_key = self.key_at(mid)?;
            if mid_key == key {
                return Ok(SearchResult::Found(mid));
            }
            if key < mid_key {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        Ok(SearchResult::NotFound(lo))
    }

    /// Key of the last cell. Must not be called on an empty leaf.
    pub fn max_key(&self) -> Result<u32> {
        let num_cells = self.num_cells();
        ensure!(num_cells > 0, "max_key on empty leaf");
        self.key_at(num_cells as usize - 1)
    }
}

impl<'a> LeafNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = LeafHeader::from_bytes(data)?;
        ensure!(
            NodeType::from_byte(header.node_type) == NodeType::Leaf,
            "expected leaf page, got internal"
        );
        Ok(Self { data })
    }

    /// Stamps an empty leaf header onto the page: no cells, no sibling, not
    /// the root, parent 0.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );

        let header = LeafHeader::from_bytes_mut(data)?;
        header.node_type = NodeType::Leaf as u8;
        header.set_is_root(false);
        header.set_parent(0);
        header.set_num_cells(0);
        header.set_next_leaf(0);

        Ok(Self { data })
    }

    pub fn num_cells(&self) -> u32 {
        // INVARIANT: page validated in from_page/init
        LeafHeader::from_bytes(self.data).unwrap().num_cells()
    }

    pub fn next_leaf(&self) -> u32 {
        LeafHeader::from_bytes(self.data).unwrap().next_leaf()
    }

    pub fn parent(&self) -> u32 {
        LeafHeader::from_bytes(self.data).unwrap().parent()
    }

    pub fn is_root(&self) -> bool {
        LeafHeader::from_bytes(self.data).unwrap().is_root()
    }

    fn header_mut(&mut self) -> &mut LeafHeader {
        // INVARIANT: page validated in from_page/init
        LeafHeader::from_bytes_mut(self.data).unwrap()
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        self.header_mut().set_num_cells(num_cells);
    }

    pub fn set_next_leaf(&mut self, page_num: u32) {
        self.header_mut().set_next_leaf(page_num);
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

    pub fn find_key(&self, key: u32) -> Result<SearchResult> {
        self.as_ref().find_key(key)
    }

    pub fn max_key(&self) -> Result<u32> {
        self.as_ref().max_key()
    }

    /// Writes cell `index` in place without shifting or touching
    /// `num_cells`. Used when a split redistributes a gathered cell
    /// sequence.
    pub fn write_cell(&mut self, index: usize, key: u32, row: &[u8]) -> Result<()> {
        ensure!(
            index < LEAF_NODE_MAX_CELLS,
            "cell index {} exceeds leaf capacity {}",
            index,
            LEAF_NODE_MAX_CELLS
        );
        ensure!(
            row.len() == ROW_SIZE,
            "row must be exactly {} bytes, got {}",
            ROW_SIZE,
            row.len()
        );

        let offset = cell_offset(index);
        self.data[offset..offset + LEAF_NODE_KEY_SIZE].copy_from_slice(&key.to_le_bytes());
        self.data[offset + LEAF_NODE_KEY_SIZE..offset + LEAF_NODE_CELL_SIZE]
            .copy_from_slice(row);

        Ok(())
    }

    /// Inserts a cell at `index`, shifting later cells right. The caller
    /// guarantees the leaf is not full and that `index` keeps the cells
    /// sorted.
    pub fn insert_at(&mut self, index: usize, key: u32, row: &[u8]) -> Result<()> {
        let num_cells = self.num_cells() as usize;
        ensure!(
            num_cells < LEAF_NODE_MAX_CELLS,
            "insert into full leaf (num_cells={})",
            num_cells
        );
        ensure!(
            index <= num_cells,
            "insert index {} out of bounds (num_cells={})",
            index,
            num_cells
        );

        if index < num_cells {
            self.data
                .copy_within(cell_offset(index)..cell_offset(num_cells), cell_offset(index + 1));
        }

        self.write_cell(index, key, row)?;
        self.set_num_cells(num_cells as u32 + 1);

        Ok(())
    }

    pub fn as_ref(&self) -> LeafNode<'_> {
        LeafNode { data: self.data }
    }
}
