// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The Tree façade: owns the [`Pager`] and the in-memory [`Meta`] snapshot,
//! and provides the low-level node I/O every other module (`navigator`,
//! `mutator`, `scanner`) builds on.
//!
//! Splitting the public surface across `impl Tree` blocks in separate files
//! (this module for open/close/node-IO, `navigator` for descent, `mutator`
//! for insert/remove/update, `scanner` for search/range/prefix) keeps each
//! file focused on one concern while all of them share the same struct and
//! therefore the same borrow of the pager and meta block.

use std::path::Path;

use crate::error::{TreeError, TreeResult};
use crate::meta::{Meta, META_BLOCK_SIZE, META_OFFSET};
use crate::node::{InternalNode, LeafNode, NodeKind, NODE_BLOCK_SIZE, NULL_OFFSET};
use crate::pager::Pager;

fn io_err(operation: &str, reason: impl std::fmt::Display) -> TreeError {
    TreeError::IoError {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
}

/// An open B+ tree index backed by a single memory-mapped file.
pub struct Tree {
    pub(crate) pager: Pager,
    pub(crate) meta: Meta,
}

impl Tree {
    /// Open `path`, creating a fresh tree if `force_empty` is set or the
    /// file does not yet exist.
    pub fn open(path: impl AsRef<Path>, force_empty: bool) -> TreeResult<Self> {
        let path = path.as_ref();
        if force_empty && path.exists() {
            std::fs::remove_file(path).map_err(|e| io_err("open", e))?;
        }

        let (mut pager, created) = Pager::open(path)?;

        if created {
            let meta = Meta::new_empty();
            pager.ensure_capacity(meta.slot)?;
            let mut tree = Self { pager, meta };
            let root = LeafNode::new(NULL_OFFSET);
            let root_offset = tree.meta.root_offset;
            tree.write_leaf(root_offset, &root)?;
            tree.write_meta()?;
            return Ok(tree);
        }

        let bytes = pager.read_block(META_OFFSET, META_BLOCK_SIZE)?;
        let meta = Meta::from_bytes(&bytes);
        meta.validate()?;
        Ok(Self { pager, meta })
    }

    /// Synchronously sync the mapped region to disk.
    pub fn flush(&self) -> TreeResult<()> {
        self.pager.flush()
    }

    /// Flush and release the backing file and its mapping.
    pub fn close(self) -> TreeResult<()> {
        self.pager.flush()
    }

    /// A read-only snapshot of the tree's current shape and counters.
    pub fn get_meta(&self) -> Meta {
        self.meta
    }

    pub(crate) fn write_meta(&mut self) -> TreeResult<()> {
        let bytes = self.meta.to_bytes();
        self.pager.write_block(META_OFFSET, &bytes)
    }

    pub(crate) fn read_leaf(&self, offset: u64) -> TreeResult<LeafNode> {
        let bytes = self.pager.read_block(offset, NODE_BLOCK_SIZE)?;
        LeafNode::decode(&bytes, offset)
    }

    pub(crate) fn read_internal(&self, offset: u64) -> TreeResult<InternalNode> {
        let bytes = self.pager.read_block(offset, NODE_BLOCK_SIZE)?;
        InternalNode::decode(&bytes, offset)
    }

    pub(crate) fn write_leaf(&mut self, offset: u64, node: &LeafNode) -> TreeResult<()> {
        self.pager.ensure_capacity(offset + NODE_BLOCK_SIZE as u64)?;
        self.pager.write_block(offset, &node.encode())
    }

    pub(crate) fn write_internal(&mut self, offset: u64, node: &InternalNode) -> TreeResult<()> {
        self.pager.ensure_capacity(offset + NODE_BLOCK_SIZE as u64)?;
        self.pager.write_block(offset, &node.encode())
    }

    /// Reserve the next node-sized slot, growing the file first if needed.
    pub(crate) fn alloc_node(&mut self) -> TreeResult<u64> {
        let offset = self.meta.alloc(NODE_BLOCK_SIZE as u64);
        self.pager.ensure_capacity(offset + NODE_BLOCK_SIZE as u64)?;
        Ok(offset)
    }

    /// Read just the kind discriminant byte, to dispatch without decoding
    /// (and checksumming) a whole block when only the kind is needed.
    fn read_kind(&self, offset: u64) -> TreeResult<NodeKind> {
        let byte = self.pager.read_block(offset, 1)?[0];
        if byte == NodeKind::Leaf as u8 {
            Ok(NodeKind::Leaf)
        } else {
            Ok(NodeKind::Internal)
        }
    }

    /// Rewrite a child's `parent` field after it has moved between nodes
    /// (split, borrow, or merge), without needing to know its kind up front.
    pub(crate) fn set_child_parent(&mut self, child_offset: u64, new_parent: u64) -> TreeResult<()> {
        match self.read_kind(child_offset)? {
            NodeKind::Leaf => {
                let mut leaf = self.read_leaf(child_offset)?;
                leaf.header.parent = new_parent;
                self.write_leaf(child_offset, &leaf)
            }
            NodeKind::Internal => {
                let mut node = self.read_internal(child_offset)?;
                node.header.parent = new_parent;
                self.write_internal(child_offset, &node)
            }
        }
    }

    /// The `parent` field of the node at `offset`, whichever kind it is.
    pub(crate) fn parent_of(&self, offset: u64) -> TreeResult<u64> {
        match self.read_kind(offset)? {
            NodeKind::Leaf => Ok(self.read_leaf(offset)?.header.parent),
            NodeKind::Internal => Ok(self.read_internal(offset)?.header.parent),
        }
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        let _ = self.pager.flush();
    }
}
