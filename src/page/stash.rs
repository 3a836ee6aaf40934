use serde::Serialize;

use crate::error::{NavError, Result};

/// How a payload landed in the stash buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StashWrite {
    Allocated,
    Reused,
    Reallocated,
}

/// Byte payload handed to a page when it is pushed.
///
/// The buffer belongs to the receiving page, survives cache cycles and is
/// released when the page unloads.
#[derive(Debug, Default)]
pub struct Stash {
    buffer: Option<Vec<u8>>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `payload` in. A buffer of the same size is reused, any other size
    /// gets a fresh allocation. On allocation failure the previous content is
    /// left untouched.
    pub fn store(&mut self, payload: &[u8]) -> Result<StashWrite> {
        match self.buffer.as_mut() {
            Some(buffer) if buffer.len() == payload.len() => {
                buffer.copy_from_slice(payload);
                Ok(StashWrite::Reused)
            }
            existing => {
                let write = if existing.is_some() {
                    StashWrite::Reallocated
                } else {
                    StashWrite::Allocated
                };
                let mut fresh = allocate(payload.len())?;
                fresh.extend_from_slice(payload);
                self.buffer = Some(fresh);
                Ok(write)
            }
        }
    }

    /// Copy the stash into `out` when the sizes match exactly. `out` is left
    /// untouched otherwise.
    pub fn read_into(&self, out: &mut [u8]) -> bool {
        match self.buffer.as_deref() {
            Some(buffer) if buffer.len() == out.len() => {
                out.copy_from_slice(buffer);
                true
            }
            _ => false,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    pub fn len(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the buffer, returning the size that was freed.
    pub fn clear(&mut self) -> Option<usize> {
        self.buffer.take().map(|buffer| buffer.len())
    }

    /// Short content fingerprint used in logs instead of raw bytes.
    pub fn digest(&self) -> Option<String> {
        self.buffer.as_deref().map(|buffer| {
            let hex = blake3::hash(buffer).to_hex();
            hex.as_str()[..16].to_string()
        })
    }
}

fn allocate(len: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| NavError::AllocationFailure(len))?;
    Ok(buffer)
}
