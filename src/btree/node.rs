//! Common node header shared by leaf and internal nodes.

use eyre::{Result, ensure};
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::COMMON_NODE_HEADER_SIZE;

use super::internal::InternalNode;
use super::leaf::LeafNode;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl NodeType {
    /// Decodes the on-page type tag. Any other byte means the page is not a
    /// node at all; the tree cannot continue, so this aborts.
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => NodeType::Internal,
            1 => NodeType::Leaf,
            _ => panic!("unknown node type tag {:#04x}: page is corrupt", b),
        }
    }
}

/// The 6-byte prefix every node starts with.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct NodeHeader {
    node_type: u8,
    is_root: u8,
    parent: U32<LittleEndian>,
}

const _: () = assert!(size_of::<NodeHeader>() == COMMON_NODE_HEADER_SIZE);

impl NodeHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from_byte(self.node_type)
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type as u8;
    }

    pub fn is_root(&self) -> bool {
        self.is_root != 0
    }

    pub fn set_is_root(&mut self, is_root: bool) {
        self.is_root = is_root as u8;
    }

    zerocopy_accessors! {
        parent: u32,
    }
}

/// Maximum key stored in a node: the last cell's key for both variants.
///
/// For an internal node this is the max key under `cells[num_keys - 1]`'s
/// child, not the true subtree max under `right_child`. The engine's
/// sibling comparisons are defined in terms of this cell-key form and the
/// golden tree shapes depend on it. Callers must only pass non-empty nodes.
pub fn max_key(page: &[u8]) -> Result<u32> {
    match NodeHeader::from_bytes(page)?.node_type() {
        NodeType::Leaf => LeafNode::from_page(page)?.max_key(),
        NodeType::Internal => InternalNode::from_page(page)?.max_key(),
    }
}
