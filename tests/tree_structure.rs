//! Structural tests: golden tree prints and invariant walks over the
//! on-disk pages of a closed table.

use featherdb::btree::{InternalNode, LeafNode, NodeHeader, NodeType};
use featherdb::config::ROOT_PAGE_NUM;
use featherdb::storage::Pager;
use featherdb::{Row, Table};
use tempfile::tempdir;

/// The order used by the four-leaf scenario: 1..=30 shuffled.
const SHUFFLED_30: [u32; 30] = [
    18, 7, 10, 29, 23, 4, 14, 30, 15, 26, 22, 19, 2, 1, 21, 11, 6, 20, 5, 8, 9, 3, 12, 27, 17,
    16, 13, 24, 25, 28,
];

fn numbered_row(key: u32) -> Row {
    Row::new(
        key as i32,
        &format!("user{}", key),
        &format!("person{}@example.com", key),
    )
    .unwrap()
}

fn build_table(dir: &tempfile::TempDir, keys: impl IntoIterator<Item = u32>) -> Table {
    let mut table = Table::open(dir.path().join("test.db")).unwrap();
    for key in keys {
        table.insert(&numbered_row(key)).unwrap();
    }
    table
}

fn tree_string(table: &mut Table) -> String {
    let mut out = Vec::new();
    table.print_tree(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn leaf_block(out: &mut String, depth: usize, keys: std::ops::RangeInclusive<u32>) {
    let indent = "  ".repeat(depth);
    let count = keys.end() - keys.start() + 1;
    out.push_str(&format!("{}- leaf (size {})\n", indent, count));
    for key in keys {
        out.push_str(&format!("{}  - {}\n", indent, key));
    }
}

fn key_line(out: &mut String, depth: usize, key: u32) {
    out.push_str(&format!("{}- key {}\n", "  ".repeat(depth), key));
}

#[test]
fn empty_tree_prints_an_empty_leaf() {
    let dir = tempdir().unwrap();
    let mut table = build_table(&dir, []);

    assert_eq!(tree_string(&mut table), "- leaf (size 0)\n");
}

#[test]
fn single_leaf_prints_sorted_regardless_of_insert_order() {
    let dir = tempdir().unwrap();
    let mut table = build_table(&dir, [3, 1, 2]);

    assert_eq!(
        tree_string(&mut table),
        "- leaf (size 3)\n  - 1\n  - 2\n  - 3\n"
    );
}

#[test]
fn fifteen_sequential_keys_print_two_leaves_under_one_key() {
    let dir = tempdir().unwrap();
    let mut table = build_table(&dir, 1..=15);

    let mut expected = String::from("- internal (size 1)\n");
    leaf_block(&mut expected, 1, 1..=7);
    key_line(&mut expected, 1, 7);
    leaf_block(&mut expected, 1, 8..=15);

    assert_eq!(tree_string(&mut table), expected);
}

#[test]
fn thirty_shuffled_keys_print_four_leaves_under_three_keys() {
    let dir = tempdir().unwrap();
    let mut table = build_table(&dir, SHUFFLED_30);

    let mut expected = String::from("- internal (size 3)\n");
    leaf_block(&mut expected, 1, 1..=7);
    key_line(&mut expected, 1, 7);
    leaf_block(&mut expected, 1, 8..=15);
    key_line(&mut expected, 1, 15);
    leaf_block(&mut expected, 1, 16..=22);
    key_line(&mut expected, 1, 22);
    leaf_block(&mut expected, 1, 23..=30);

    assert_eq!(tree_string(&mut table), expected);
}

#[test]
fn thirty_five_sequential_keys_grow_a_three_level_tree() {
    let dir = tempdir().unwrap();
    let mut table = build_table(&dir, 1..=35);

    let mut expected = String::from("- internal (size 1)\n");
    expected.push_str("  - internal (size 1)\n");
    leaf_block(&mut expected, 2, 1..=7);
    key_line(&mut expected, 2, 7);
    leaf_block(&mut expected, 2, 8..=14);
    key_line(&mut expected, 1, 14);
    expected.push_str("  - internal (size 2)\n");
    leaf_block(&mut expected, 2, 15..=21);
    key_line(&mut expected, 2, 21);
    leaf_block(&mut expected, 2, 22..=28);
    key_line(&mut expected, 2, 28);
    leaf_block(&mut expected, 2, 29..=35);

    assert_eq!(tree_string(&mut table), expected);
}

#[test]
fn tree_shape_survives_a_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let before = {
        let mut table = Table::open(&path).unwrap();
        for key in SHUFFLED_30 {
            table.insert(&numbered_row(key)).unwrap();
        }
        let mut out = Vec::new();
        table.print_tree(&mut out).unwrap();
        table.close().unwrap();
        out
    };

    let mut table = Table::open(&path).unwrap();
    let mut after = Vec::new();
    table.print_tree(&mut after).unwrap();

    assert_eq!(after, before);
}

/// Recursively checks the subtree rooted at `page_num` and returns its true
/// maximum key. Verifies, for every internal node, that each cell key
/// equals the max key of that cell's child subtree, that the right child's
/// keys exceed every cell key, and that every child's parent pointer names
/// this node.
fn check_subtree(pager: &mut Pager, page_num: u32, expected_parent: Option<u32>) -> u32 {
    let node_type = {
        let page = pager.page(page_num).unwrap();
        let header = NodeHeader::from_bytes(page).unwrap();
        assert_eq!(header.is_root(), expected_parent.is_none());
        assert_eq!(page_num == ROOT_PAGE_NUM, expected_parent.is_none());
        if let Some(parent) = expected_parent {
            assert_eq!(header.parent(), parent, "bad parent link on page {page_num}");
        }
        header.node_type()
    };

    match node_type {
        NodeType::Leaf => {
            let page = pager.page(page_num).unwrap();
            let leaf = LeafNode::from_page(page).unwrap();
            let num_cells = leaf.num_cells() as usize;
            assert!(num_cells > 0, "empty non-root leaf at page {page_num}");
            for i in 1..num_cells {
                assert!(
                    leaf.key_at(i - 1).unwrap() < leaf.key_at(i).unwrap(),
                    "leaf {page_num} is not strictly sorted"
                );
            }
            leaf.max_key().unwrap()
        }
        NodeType::Internal => {
            let (cells, right_child) = {
                let page = pager.page(page_num).unwrap();
                let node = InternalNode::from_page(page).unwrap();
                let cells: Vec<(u32, u32)> = (0..node.num_keys() as usize)
                    .map(|i| {
                        let cell = node.cell_at(i).unwrap();
                        (cell.child(), cell.key())
                    })
                    .collect();
                (cells, node.right_child())
            };

            let mut last_key = None;
            for (child, key) in &cells {
                let child_max = check_subtree(pager, *child, Some(page_num));
                assert_eq!(
                    child_max, *key,
                    "internal {page_num} cell key does not match child {child} max"
                );
                if let Some(last) = last_key {
                    assert!(*key > last, "internal {page_num} keys are not ascending");
                }
                last_key = Some(*key);
            }

            let right_max = check_subtree(pager, right_child, Some(page_num));
            if let Some(last) = last_key {
                assert!(
                    right_max > last,
                    "right child of internal {page_num} holds keys below its cell keys"
                );
            }
            right_max
        }
    }
}

#[test]
fn persisted_tree_satisfies_the_structural_invariants() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut table = Table::open(&path).unwrap();
        for key in SHUFFLED_30 {
            table.insert(&numbered_row(key)).unwrap();
        }
        table.close().unwrap();
    }

    let mut pager = Pager::open(&path).unwrap();
    let max = check_subtree(&mut pager, ROOT_PAGE_NUM, None);
    assert_eq!(max, 30);
}

#[test]
fn leaf_chain_visits_all_keys_in_ascending_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut table = Table::open(&path).unwrap();
        for key in 1..=35 {
            table.insert(&numbered_row(key)).unwrap();
        }
        table.close().unwrap();
    }

    let mut pager = Pager::open(&path).unwrap();

    // descend to the leftmost leaf
    let mut page_num = ROOT_PAGE_NUM;
    loop {
        let page = pager.page(page_num).unwrap();
        match NodeHeader::from_bytes(page).unwrap().node_type() {
            NodeType::Leaf => break,
            NodeType::Internal => {
                let node = InternalNode::from_page(page).unwrap();
                page_num = node.child_at(0).unwrap();
            }
        }
    }

    let mut keys = Vec::new();
    loop {
        let page = pager.page(page_num).unwrap();
        let leaf = LeafNode::from_page(page).unwrap();
        for i in 0..leaf.num_cells() as usize {
            keys.push(leaf.key_at(i).unwrap());
        }
        match leaf.next_leaf() {
            0 => break,
            next => page_num = next,
        }
    }

    assert_eq!(keys, (1..=35).collect::<Vec<_>>());
}
