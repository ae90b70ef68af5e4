// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for B+ tree operations.
//!
//! Provides structured error handling with enough context to diagnose a
//! failure without re-running the operation under a debugger.

use std::fmt;

/// Standard Result type for all tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Error types produced by the B+ tree core.
#[derive(Debug, Clone)]
pub enum TreeError {
    /// Insert of a key that already exists.
    DuplicateKey,

    /// Lookup, removal, or update of a key that does not exist.
    NotFound,

    /// A reserved key value (the empty sentinel) was passed as a user key,
    /// or a `key_index` fell outside the composite key's subfields.
    InvalidArgument { reason: String },

    /// Pager failure: open, truncate, map, remap, or sync, or an on-disk
    /// format that does not match this build (bad magic, incompatible
    /// `order`/`value_size`, or a checksum mismatch on a node block).
    IoError { operation: String, reason: String },

    /// A node read from disk failed its checksum or structural validation.
    CorruptedNode { offset: u64, reason: String },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "key already exists"),
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {}", reason),
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::CorruptedNode { offset, reason } => {
                write!(f, "corrupted node at offset {}: {}", offset, reason)
            }
        }
    }
}

impl std::error::Error for TreeError {}

impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        TreeError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
