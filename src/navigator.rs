// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Pure-read descent from the root to the leaf a key belongs in.
//!
//! Every internal node's slots are an upper-bound index: slot `i`'s key is
//! the smallest key reachable through slot `i + 1`, so descent always picks
//! the first slot whose key is strictly greater than the search key, falling
//! back to the rightmost (sentinel) slot when none is. This also makes
//! `Key::EMPTY` behave correctly as a "from the very beginning" lower bound
//! for scans: since no real key is ever the reserved all-zero sentinel,
//! every real separator compares strictly greater than it, so the search
//! always lands on the leftmost slot without needing to special-case it.

use crate::error::TreeResult;
use crate::key::Key;
use crate::node::{InternalNode, NULL_OFFSET};
use crate::tree::Tree;

/// Select the child offset an upper-bound search over `node`'s slots routes
/// `key` to: the first slot (among all but the rightmost) whose key is
/// strictly greater than `key`, or the rightmost (sentinel) slot if none is.
fn upper_bound_child(node: &InternalNode, key: &Key) -> u64 {
    let n = node.slots.len();
    for slot in &node.slots[..n - 1] {
        if slot.key > *key {
            return slot.child;
        }
    }
    node.slots[n - 1].child
}

impl Tree {
    /// Descend from the root through internal levels to the bottom-most
    /// internal node (the one whose children are leaves). Returns
    /// [`NULL_OFFSET`] when the root itself is a leaf.
    pub(crate) fn search_index(&self, key: &Key) -> TreeResult<u64> {
        if self.meta.height <= 1 {
            return Ok(NULL_OFFSET);
        }

        let mut current = self.meta.root_offset;
        let hops = self.meta.height as usize - 2;
        for _ in 0..hops {
            let node = self.read_internal(current)?;
            current = upper_bound_child(&node, key);
        }
        Ok(current)
    }

    /// Given the bottom-most internal node offset from [`Tree::search_index`]
    /// (or [`NULL_OFFSET`] when the tree has a single leaf), select the leaf
    /// `key` belongs in.
    pub(crate) fn search_leaf(&self, bottom: u64, key: &Key) -> TreeResult<u64> {
        if bottom == NULL_OFFSET {
            return Ok(self.meta.root_offset);
        }
        let node = self.read_internal(bottom)?;
        Ok(upper_bound_child(&node, key))
    }
}
