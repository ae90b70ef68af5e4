// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Point search, bounded range scan, and composite-prefix scan.
//!
//! Range and prefix scans share one walking pattern: locate the leaf that
//! would hold the lower bound, find the first record past it, then follow
//! `next` across the leaf chain until the upper bound, the chain end, or the
//! caller's output buffer is exhausted. Both resume cleanly: the caller's
//! cursor key is advanced to the last emitted key, so re-issuing the call
//! with that cursor as the new lower bound continues exactly where it left
//! off (the scan's lower bound is exclusive, so nothing is re-emitted).

use crate::error::{TreeError, TreeResult};
use crate::key::Key;
use crate::node::{Record, NULL_OFFSET, VALUE_SIZE};
use crate::tree::Tree;

impl Tree {
    /// Look up a single key. Fails with `NotFound` if absent.
    pub fn search(&self, key: Key) -> TreeResult<[u8; VALUE_SIZE]> {
        let bottom = self.search_index(&key)?;
        let leaf_offset = self.search_leaf(bottom, &key)?;
        let leaf = self.read_leaf(leaf_offset)?;
        match leaf.find(&key) {
            Ok(pos) => Ok(leaf.records[pos].value),
            Err(_) => Err(TreeError::NotFound),
        }
    }

    /// Emit every record with key in `(left, right]`, in ascending order,
    /// into `out` (up to `out.len()` or `max`, whichever is smaller).
    ///
    /// Returns `(count, has_more)`. When `has_more` is true, `left` has been
    /// advanced to the last key emitted, so the caller can resume the scan
    /// by calling again with the same `right` and `out`.
    pub fn search_range(
        &self,
        left: &mut Key,
        right: Key,
        out: &mut [Record],
        max: usize,
    ) -> TreeResult<(usize, bool)> {
        let max = max.min(out.len());
        if max == 0 {
            return Ok((0, false));
        }

        let bottom = self.search_index(left)?;
        let mut leaf_offset = self.search_leaf(bottom, left)?;
        let mut pos = {
            let leaf = self.read_leaf(leaf_offset)?;
            leaf.records.partition_point(|r| r.key <= *left)
        };

        let mut count = 0usize;
        let mut last_key = *left;

        loop {
            if leaf_offset == NULL_OFFSET {
                return Ok((count, false));
            }
            let leaf = self.read_leaf(leaf_offset)?;
            while pos < leaf.records.len() {
                let record = leaf.records[pos];
                if record.key > right {
                    return Ok((count, false));
                }
                if count == max {
                    *left = last_key;
                    return Ok((count, true));
                }
                out[count] = record;
                last_key = record.key;
                count += 1;
                pos += 1;
            }
            leaf_offset = leaf.header.next;
            pos = 0;
        }
    }

    /// Emit every record with key in `(left, right]` whose subfield at
    /// `key_index` equals `value`, walking the leaf chain forward from the
    /// resume cursor `left`, in ascending full-key order.
    ///
    /// Unlike [`Tree::search_range`], matches are not generally contiguous
    /// in key order for `key_index > 0` (the tree sorts on the full tuple
    /// led by subfield 0), so this is a filtered linear walk bounded by
    /// `right` rather than a tight synthetic-bound range scan; see
    /// `DESIGN.md` for why `key_index == 0` is not special-cased into a
    /// tighter bound.
    ///
    /// Returns `(count, has_more)` and sets `next_key` to the resume cursor
    /// in both cases (equal to `left`'s new value when `has_more`).
    pub fn search_prefix(
        &self,
        left: &mut Key,
        right: Key,
        value: u32,
        key_index: u8,
        out: &mut [Record],
        max: usize,
        next_key: &mut Key,
    ) -> TreeResult<(usize, bool)> {
        if key_index > 3 {
            return Err(TreeError::InvalidArgument {
                reason: format!("key_index {} out of range 0..=3", key_index),
            });
        }
        let max = max.min(out.len());

        let bottom = self.search_index(left)?;
        let mut leaf_offset = self.search_leaf(bottom, left)?;
        let mut pos = {
            let leaf = self.read_leaf(leaf_offset)?;
            leaf.records.partition_point(|r| r.key <= *left)
        };

        let mut count = 0usize;
        let mut last_key = *left;

        loop {
            if leaf_offset == NULL_OFFSET {
                *next_key = last_key;
                return Ok((count, false));
            }
            let leaf = self.read_leaf(leaf_offset)?;
            while pos < leaf.records.len() {
                let record = leaf.records[pos];
                if record.key > right {
                    *next_key = last_key;
                    return Ok((count, false));
                }
                let matches = record.key.subfield(key_index) == Some(value);
                if matches {
                    if count == max {
                        *left = last_key;
                        *next_key = last_key;
                        return Ok((count, true));
                    }
                    out[count] = record;
                    count += 1;
                }
                last_key = record.key;
                pos += 1;
            }
            leaf_offset = leaf.header.next;
            pos = 0;
        }
    }
}
