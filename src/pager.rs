// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The pager owns the backing file and its memory map, and grows the file
//! on demand as the tree allocates new blocks.
//!
//! ## Algorithm
//! Growth follows a doubling strategy: starting from [`DB_SIZE`], the file
//! length is repeatedly doubled until it is at least as large as the
//! requested capacity, then `File::set_len` truncates (extends) to that
//! length and the map is recreated. Doubling keeps the number of remaps
//! logarithmic in the file's final size instead of linear in the number of
//! blocks allocated.
//!
//! Every remap invalidates any `&[u8]` borrowed from the previous map, so
//! the pager never hands out a reference that outlives a call to
//! [`Pager::ensure_capacity`]; callers read blocks into owned structs
//! before making any allocation that might grow the file.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;

use crate::error::{TreeError, TreeResult};

/// Baseline file size new databases start at, and the unit growth doubles
/// from. Scaled down from the original megabyte-granularity implementation
/// so tests can observe a grow without allocating huge files.
pub const DB_SIZE: u64 = 4096;

fn io_err(operation: &str, err: impl std::fmt::Display) -> TreeError {
    TreeError::IoError {
        operation: operation.to_string(),
        reason: err.to_string(),
    }
}

/// Owns the open file handle and its current memory map.
pub struct Pager {
    file: File,
    mmap: MmapMut,
    file_size: u64,
}

impl Pager {
    /// Open `path`, creating it at [`DB_SIZE`] if it does not exist yet.
    /// Returns the pager and whether the file was freshly created, so the
    /// caller can decide between initialising and loading a meta block.
    pub fn open(path: &Path) -> TreeResult<(Self, bool)> {
        let created = !path.exists();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| io_err("open", e))?;

        let file_size = if created {
            file.set_len(DB_SIZE).map_err(|e| io_err("set_len", e))?;
            DB_SIZE
        } else {
            file.metadata().map_err(|e| io_err("metadata", e))?.len()
        };

        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|e| io_err("mmap", e))?;

        Ok((
            Self {
                file,
                mmap,
                file_size,
            },
            created,
        ))
    }

    /// Current mapped file length in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Grow the file (and remap it) until it can hold `required` bytes.
    /// No-op if the file is already large enough.
    pub fn ensure_capacity(&mut self, required: u64) -> TreeResult<()> {
        if required <= self.file_size {
            return Ok(());
        }

        let mut new_size = if self.file_size == 0 {
            DB_SIZE
        } else {
            self.file_size
        };
        while new_size < required {
            new_size *= 2;
        }

        self.file
            .set_len(new_size)
            .map_err(|e| io_err("grow", e))?;
        self.mmap = unsafe { MmapMut::map_mut(&self.file) }.map_err(|e| io_err("remap", e))?;
        self.file_size = new_size;
        Ok(())
    }

    /// Copy `len` bytes starting at `offset` into an owned buffer.
    pub fn read_block(&self, offset: u64, len: usize) -> TreeResult<Vec<u8>> {
        let start = offset as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| io_err("read_block", "offset overflow"))?;
        if end > self.mmap.len() {
            return Err(io_err(
                "read_block",
                format!("offset {} + {} exceeds mapped length {}", offset, len, self.mmap.len()),
            ));
        }
        Ok(self.mmap[start..end].to_vec())
    }

    /// Write `bytes` at `offset`. The caller must have already ensured
    /// capacity via [`Pager::ensure_capacity`].
    pub fn write_block(&mut self, offset: u64, bytes: &[u8]) -> TreeResult<()> {
        let start = offset as usize;
        let end = start
            .checked_add(bytes.len())
            .ok_or_else(|| io_err("write_block", "offset overflow"))?;
        if end > self.mmap.len() {
            return Err(io_err(
                "write_block",
                format!(
                    "offset {} + {} exceeds mapped length {}",
                    offset,
                    bytes.len(),
                    self.mmap.len()
                ),
            ));
        }
        self.mmap[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Flush the memory map to disk.
    pub fn flush(&self) -> TreeResult<()> {
        self.mmap.flush().map_err(|e| io_err("flush", e))
    }
}
