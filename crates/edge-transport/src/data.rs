//! Data objects handed to `send_data`.
//!
//! The dispatcher asks a [`DataHandle`] to validate itself before anything is
//! forwarded; a transport never sees an object that failed validation.

use std::os::raw::c_void;

use edge_transport_sdk::data::{RawDataChunk, RawEdgeData, EDGE_DATA_MAGIC, MAX_DATA_CHUNKS};

use crate::error::{EdgeError, Result};

/// A data object that can be sent through a transport.
pub trait DataHandle {
    /// Self-reported validity. An error here stops the send before dispatch
    /// and is returned to the caller unchanged.
    fn validate(&self) -> Result<()>;

    /// Pointer passed to the transport's `send_data` entry.
    fn as_raw(&self) -> *mut c_void;
}

/// Owned data object made of up to [`MAX_DATA_CHUNKS`] memory chunks.
///
/// Keeps a C view ([`RawEdgeData`]) of its chunks in sync so it can be passed
/// across the ABI without copying.
#[derive(Debug)]
pub struct EdgeData {
    buffers: Vec<Vec<u8>>,
    chunks: Vec<RawDataChunk>,
    raw: Box<RawEdgeData>,
}

impl EdgeData {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            chunks: Vec::new(),
            raw: Box::new(RawEdgeData {
                magic: EDGE_DATA_MAGIC,
                num_chunks: 0,
                chunks: std::ptr::null(),
            }),
        }
    }

    /// Build a single-chunk object.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let mut data = Self::new();
        data.add(bytes)?;
        Ok(data)
    }

    /// Append a chunk. Empty chunks and chunks beyond the limit are rejected.
    pub fn add(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(EdgeError::invalid("data chunk is empty"));
        }
        if self.buffers.len() >= MAX_DATA_CHUNKS {
            return Err(EdgeError::invalid(format!(
                "data object already holds {} chunks",
                MAX_DATA_CHUNKS
            )));
        }

        // The heap buffer of each Vec<u8> stays put when `buffers` grows.
        self.chunks.push(RawDataChunk {
            data: bytes.as_ptr(),
            len: bytes.len(),
        });
        self.buffers.push(bytes);

        self.raw.num_chunks = self.chunks.len() as u32;
        self.raw.chunks = self.chunks.as_ptr();
        Ok(())
    }

    pub fn num_chunks(&self) -> usize {
        self.buffers.len()
    }

    pub fn total_len(&self) -> usize {
        self.buffers.iter().map(Vec::len).sum()
    }
}

impl Default for EdgeData {
    fn default() -> Self {
        Self::new()
    }
}

impl DataHandle for EdgeData {
    fn validate(&self) -> Result<()> {
        if self.raw.magic != EDGE_DATA_MAGIC {
            return Err(EdgeError::invalid("data object is corrupted"));
        }
        if self.buffers.is_empty() {
            return Err(EdgeError::invalid("data object has no chunks"));
        }
        Ok(())
    }

    fn as_raw(&self) -> *mut c_void {
        &*self.raw as *const RawEdgeData as *mut c_void
    }
}

/// Borrowed data object coming from C callers.
///
/// Valid when the pointer is non-null, carries the data magic and holds
/// 1..=[`MAX_DATA_CHUNKS`] chunks.
#[derive(Debug, Clone, Copy)]
pub struct RawDataRef(*mut c_void);

impl RawDataRef {
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }
}

impl DataHandle for RawDataRef {
    fn validate(&self) -> Result<()> {
        // SAFETY: C callers pass either null or a data object they own.
        let data = unsafe { RawEdgeData::from_ptr(self.0) }
            .ok_or_else(|| EdgeError::invalid("data handle is null or corrupted"))?;

        let count = data.num_chunks as usize;
        if count == 0 || count > MAX_DATA_CHUNKS || data.chunks.is_null() {
            return Err(EdgeError::invalid(format!(
                "data handle has an invalid chunk count: {}",
                count
            )));
        }
        Ok(())
    }

    fn as_raw(&self) -> *mut c_void {
        self.0
    }
}
