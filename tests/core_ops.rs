// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests against the public `Tree` façade.
//!
//! Exercises the tree the way an external caller would: open, insert,
//! search, remove, range/prefix scan, reopen after flush. Internal node
//! layout is never touched here (see the inline `#[cfg(test)]` suites in
//! `src/` for that).

use bptree::{Key, Record, Tree, TreeError, VALUE_SIZE};
use tempfile::tempdir;

fn val(b: u8) -> [u8; VALUE_SIZE] {
    [b; VALUE_SIZE]
}

/// Scenario 1: open empty, insert a handful of keys, point lookup, meta
/// reflects a single-leaf tree.
#[test]
fn small_insert_and_lookup() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    tree.insert(Key::new(1, 0, 0, 0), val(b'A')).unwrap();
    tree.insert(Key::new(2, 0, 0, 0), val(b'B')).unwrap();
    tree.insert(Key::new(3, 0, 0, 0), val(b'C')).unwrap();

    assert_eq!(tree.search(Key::new(2, 0, 0, 0)).unwrap(), val(b'B'));

    let meta = tree.get_meta();
    assert_eq!(meta.num_key, 3);
    assert_eq!(meta.height, 1);
    assert_eq!(meta.leaf_node_num, 1);
}

/// Scenario 2: insert enough keys to force splits; leaf chain still yields
/// every key in order and the tree has grown past a single level.
#[test]
fn bulk_insert_splits_and_preserves_order() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    let n = 500u32;
    for i in 1..=n {
        tree.insert(Key::new(i, 0, 0, 0), val((i % 256) as u8))
            .unwrap();
    }

    let meta = tree.get_meta();
    assert_eq!(meta.num_key, n as u64);
    assert!(meta.height >= 2, "500 keys at ORDER=8 must push past one level");

    let mut left = Key::EMPTY;
    let right = Key::new(n, 0, 0, 0);
    let mut out = vec![
        Record {
            key: Key::EMPTY,
            value: val(0)
        };
        64
    ];
    let mut seen = Vec::new();
    loop {
        let (count, has_more) = tree.search_range(&mut left, right, &mut out, 64).unwrap();
        seen.extend(out[..count].iter().map(|r| r.key.k0));
        if !has_more {
            break;
        }
    }
    let expected: Vec<u32> = (1..=n).collect();
    assert_eq!(seen, expected);
}

/// Scenario 3: after bulk insert, remove a contiguous middle run; merges and
/// borrows cascade but the surviving keys remain intact and in order.
#[test]
fn removing_a_middle_run_preserves_surviving_order() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    let n = 300u32;
    for i in 1..=n {
        tree.insert(Key::new(i, 0, 0, 0), val(1)).unwrap();
    }

    let start = 100u32;
    let end = 200u32;
    for i in start..end {
        tree.remove(Key::new(i, 0, 0, 0)).unwrap();
    }

    let meta = tree.get_meta();
    assert_eq!(meta.num_key, (n - (end - start)) as u64);

    for i in start..end {
        assert!(matches!(
            tree.search(Key::new(i, 0, 0, 0)),
            Err(TreeError::NotFound)
        ));
    }
    for i in 1..start {
        tree.search(Key::new(i, 0, 0, 0)).unwrap();
    }
    for i in end..=n {
        tree.search(Key::new(i, 0, 0, 0)).unwrap();
    }
}

/// Scenario 4: remove everything inserted; the tree collapses to a single
/// empty root leaf, and the first-leaf offset equals the root offset.
#[test]
fn removing_everything_collapses_to_one_empty_leaf() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    let n = 400u32;
    for i in 1..=n {
        tree.insert(Key::new(i, 0, 0, 0), val(1)).unwrap();
    }
    for i in 1..=n {
        tree.remove(Key::new(i, 0, 0, 0)).unwrap();
    }

    let meta = tree.get_meta();
    assert_eq!(meta.num_key, 0);
    assert_eq!(meta.height, 1);
    assert_eq!(meta.root_offset, meta.leaf_offset);
}

/// Scenario 5: range scan `(left, right]` resumes across calls using the
/// cursor the previous call advanced.
#[test]
fn range_scan_is_left_exclusive_right_inclusive_and_resumable() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    for i in 1..=10u32 {
        tree.insert(Key::new(i, 0, 0, 0), val(i as u8)).unwrap();
    }

    let mut left = Key::new(2, 0, 0, 0);
    let right = Key::new(8, 0, 0, 0);
    let mut out = vec![
        Record {
            key: Key::EMPTY,
            value: val(0)
        };
        3
    ];

    let (count, has_more) = tree.search_range(&mut left, right, &mut out, 3).unwrap();
    assert_eq!(count, 3);
    assert!(has_more);
    assert_eq!(
        out[..count].iter().map(|r| r.key.k0).collect::<Vec<_>>(),
        vec![3, 4, 5]
    );

    let (count, has_more) = tree.search_range(&mut left, right, &mut out, 3).unwrap();
    assert_eq!(count, 3);
    assert!(!has_more);
    assert_eq!(
        out[..count].iter().map(|r| r.key.k0).collect::<Vec<_>>(),
        vec![6, 7, 8]
    );
}

/// Scenario 6: prefix (composite subfield) scan matches exactly the records
/// whose subfield at `key_index` equals the target value, in ascending
/// full-key order, regardless of `key_index` being a non-leading subfield.
#[test]
fn prefix_scan_matches_non_leading_subfield() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    for k0 in 0..6u32 {
        for k1 in 0..6u32 {
            tree.insert(Key::new(k0, k1, 0, 0), val(1)).unwrap();
        }
    }

    let mut left = Key::EMPTY;
    let mut next_key = Key::EMPTY;
    let mut out = vec![
        Record {
            key: Key::EMPTY,
            value: val(0)
        };
        64
    ];
    let right = Key::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX);
    let (count, has_more) = tree
        .search_prefix(&mut left, right, 3, 1, &mut out, 64, &mut next_key)
        .unwrap();
    assert!(!has_more);
    assert_eq!(count, 6);

    let mut got: Vec<(u32, u32)> = out[..count].iter().map(|r| (r.key.k0, r.key.k1)).collect();
    got.sort();
    assert_eq!(got, vec![(0, 3), (1, 3), (2, 3), (3, 3), (4, 3), (5, 3)]);
}

/// Prefix scan bounded by `right` stops before records beyond the bound,
/// even though they would otherwise match the subfield filter.
#[test]
fn prefix_scan_respects_right_bound() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    for k0 in 0..10u32 {
        tree.insert(Key::new(k0, 7, 0, 0), val(1)).unwrap();
    }

    let mut left = Key::EMPTY;
    let right = Key::new(5, 0, 0, 0);
    let mut next_key = Key::EMPTY;
    let mut out = vec![
        Record {
            key: Key::EMPTY,
            value: val(0)
        };
        64
    ];
    let (count, has_more) = tree
        .search_prefix(&mut left, right, 7, 1, &mut out, 64, &mut next_key)
        .unwrap();
    assert!(!has_more);
    let got: Vec<u32> = out[..count].iter().map(|r| r.key.k0).collect();
    assert_eq!(got, vec![0, 1, 2, 3, 4]);
}

/// Reopening the file after a flush (without `force_empty`) resumes service
/// against the same on-disk state.
#[test]
fn reopen_after_flush_preserves_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.db");

    {
        let mut tree = Tree::open(&path, true).unwrap();
        for i in 1..=50u32 {
            tree.insert(Key::new(i, 0, 0, 0), val(i as u8)).unwrap();
        }
        tree.flush().unwrap();
    }

    let tree = Tree::open(&path, false).unwrap();
    let meta = tree.get_meta();
    assert_eq!(meta.num_key, 50);
    for i in 1..=50u32 {
        assert_eq!(tree.search(Key::new(i, 0, 0, 0)).unwrap(), val(i as u8));
    }
}

/// Duplicate insert, not-found remove/update, and the reserved empty-key
/// sentinel are all rejected without disturbing existing state.
#[test]
fn rejects_duplicates_missing_keys_and_the_empty_sentinel() {
    let dir = tempdir().unwrap();
    let mut tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    tree.insert(Key::new(1, 0, 0, 0), val(1)).unwrap();
    assert!(matches!(
        tree.insert(Key::new(1, 0, 0, 0), val(2)),
        Err(TreeError::DuplicateKey)
    ));
    assert!(matches!(
        tree.insert(Key::EMPTY, val(9)),
        Err(TreeError::InvalidArgument { .. })
    ));
    assert!(matches!(
        tree.remove(Key::new(2, 0, 0, 0)),
        Err(TreeError::NotFound)
    ));
    assert!(matches!(
        tree.update(Key::new(2, 0, 0, 0), val(1)),
        Err(TreeError::NotFound)
    ));

    assert_eq!(tree.get_meta().num_key, 1);
    assert_eq!(tree.search(Key::new(1, 0, 0, 0)).unwrap(), val(1));
}

/// `search_prefix` rejects a `key_index` outside the composite key's four
/// subfields.
#[test]
fn prefix_scan_rejects_out_of_range_key_index() {
    let dir = tempdir().unwrap();
    let tree = Tree::open(dir.path().join("t.db"), true).unwrap();

    let mut left = Key::EMPTY;
    let mut next_key = Key::EMPTY;
    let mut out = vec![
        Record {
            key: Key::EMPTY,
            value: val(0)
        };
        1
    ];
    let right = Key::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX);
    assert!(matches!(
        tree.search_prefix(&mut left, right, 0, 4, &mut out, 1, &mut next_key),
        Err(TreeError::InvalidArgument { .. })
    ));
}
