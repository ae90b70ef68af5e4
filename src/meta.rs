// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The meta block: a fixed record at offset 0 describing the tree's shape
//! and the next free allocation slot.
//!
//! Every other node offset is relative to this block, so it is read once on
//! open and kept in memory thereafter; it is re-written to disk at the end
//! of every mutating operation.

use crate::error::{TreeError, TreeResult};
use crate::key::KEY_SIZE;
use crate::node::{NODE_BLOCK_SIZE, ORDER, VALUE_SIZE};

/// Magic value identifying a file as belonging to this format.
pub const MAGIC: u32 = 0xB7EE_7EE1;

/// Fixed on-disk size of the meta block, including reserved padding for
/// fields a future format revision might add without relayout.
pub const META_BLOCK_SIZE: usize = 96;

/// Offset of the meta block; also the sentinel "no node" offset, since no
/// real node is ever allocated at offset 0.
pub const META_OFFSET: u64 = 0;

/// Shape and bookkeeping for one open tree.
#[derive(Debug, Clone, Copy)]
pub struct Meta {
    pub magic: u32,
    pub order: u32,
    pub value_size: u32,
    pub key_size: u32,
    pub num_key: u64,
    pub internal_node_num: u64,
    pub leaf_node_num: u64,
    pub height: u32,
    pub root_offset: u64,
    pub leaf_offset: u64,
    pub slot: u64,
}

impl Meta {
    /// Meta describing a brand-new tree: one leaf, acting as both root and
    /// the head of the leaf chain, allocated directly after the meta block.
    pub fn new_empty() -> Self {
        let root_offset = META_OFFSET + META_BLOCK_SIZE as u64;
        Self {
            magic: MAGIC,
            order: ORDER as u32,
            value_size: VALUE_SIZE as u32,
            key_size: KEY_SIZE as u32,
            num_key: 0,
            internal_node_num: 0,
            leaf_node_num: 1,
            height: 1,
            root_offset,
            leaf_offset: root_offset,
            slot: root_offset + NODE_BLOCK_SIZE as u64,
        }
    }

    /// Reserve `size` bytes at the current slot and advance it; returns the
    /// offset the caller should write its new block at.
    pub fn alloc(&mut self, size: u64) -> u64 {
        let offset = self.slot;
        self.slot += size;
        offset
    }

    /// Check that this meta block was produced by, and is compatible with,
    /// the constants this build was compiled with.
    pub fn validate(&self) -> TreeResult<()> {
        if self.magic != MAGIC {
            return Err(TreeError::IoError {
                operation: "open".to_string(),
                reason: format!("bad magic: expected {:#x}, found {:#x}", MAGIC, self.magic),
            });
        }
        if self.order != ORDER as u32 {
            return Err(TreeError::IoError {
                operation: "open".to_string(),
                reason: format!(
                    "order mismatch: file was built with order {}, this build uses {}",
                    self.order, ORDER
                ),
            });
        }
        if self.value_size != VALUE_SIZE as u32 {
            return Err(TreeError::IoError {
                operation: "open".to_string(),
                reason: format!(
                    "value_size mismatch: file was built with {}, this build uses {}",
                    self.value_size, VALUE_SIZE
                ),
            });
        }
        if self.key_size != KEY_SIZE as u32 {
            return Err(TreeError::IoError {
                operation: "open".to_string(),
                reason: format!(
                    "key_size mismatch: file was built with {}, this build uses {}",
                    self.key_size, KEY_SIZE
                ),
            });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; META_BLOCK_SIZE] {
        let mut bytes = [0u8; META_BLOCK_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.order.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.value_size.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.key_size.to_be_bytes());
        bytes[16..24].copy_from_slice(&self.num_key.to_be_bytes());
        bytes[24..32].copy_from_slice(&self.internal_node_num.to_be_bytes());
        bytes[32..40].copy_from_slice(&self.leaf_node_num.to_be_bytes());
        bytes[40..44].copy_from_slice(&self.height.to_be_bytes());
        bytes[44..52].copy_from_slice(&self.root_offset.to_be_bytes());
        bytes[52..60].copy_from_slice(&self.leaf_offset.to_be_bytes());
        bytes[60..68].copy_from_slice(&self.slot.to_be_bytes());
        // bytes[68..META_BLOCK_SIZE] remain reserved, zeroed padding.
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            magic: u32::from_be_bytes(bytes[0..4].try_into().unwrap()),
            order: u32::from_be_bytes(bytes[4..8].try_into().unwrap()),
            value_size: u32::from_be_bytes(bytes[8..12].try_into().unwrap()),
            key_size: u32::from_be_bytes(bytes[12..16].try_into().unwrap()),
            num_key: u64::from_be_bytes(bytes[16..24].try_into().unwrap()),
            internal_node_num: u64::from_be_bytes(bytes[24..32].try_into().unwrap()),
            leaf_node_num: u64::from_be_bytes(bytes[32..40].try_into().unwrap()),
            height: u32::from_be_bytes(bytes[40..44].try_into().unwrap()),
            root_offset: u64::from_be_bytes(bytes[44..52].try_into().unwrap()),
            leaf_offset: u64::from_be_bytes(bytes[52..60].try_into().unwrap()),
            slot: u64::from_be_bytes(bytes[60..68].try_into().unwrap()),
        }
    }
}
