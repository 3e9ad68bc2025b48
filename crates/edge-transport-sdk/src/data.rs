//! Data object layout passed to `send_data`.

use std::os::raw::c_void;

/// Magic value stamped into every live [`RawEdgeData`].
pub const EDGE_DATA_MAGIC: u32 = 0xfeed_da7a;

/// Maximum number of memory chunks in one data object.
pub const MAX_DATA_CHUNKS: usize = 16;

/// One contiguous block of payload memory.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDataChunk {
    pub data: *const u8,
    pub len: usize,
}

/// C view of a data object.
///
/// The memory is owned by the sender and is only valid for the duration of
/// the `send_data` call; transports copy what they need to keep.
#[repr(C)]
#[derive(Debug)]
pub struct RawEdgeData {
    pub magic: u32,
    pub num_chunks: u32,
    pub chunks: *const RawDataChunk,
}

impl RawEdgeData {
    /// Reinterpret an opaque `send_data` argument.
    ///
    /// Returns `None` for null pointers or a bad magic value.
    ///
    /// # Safety
    /// A non-null `ptr` must point to readable memory at least the size of
    /// `RawEdgeData`.
    pub unsafe fn from_ptr<'a>(ptr: *const c_void) -> Option<&'a RawEdgeData> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: non-null and readable per the caller contract.
        let data = unsafe { &*(ptr as *const RawEdgeData) };
        (data.magic == EDGE_DATA_MAGIC).then_some(data)
    }

    /// Chunk descriptors of this object.
    ///
    /// # Safety
    /// `chunks` must point to `num_chunks` valid descriptors.
    pub unsafe fn chunks(&self) -> &[RawDataChunk] {
        if self.chunks.is_null() || self.num_chunks == 0 {
            return &[];
        }
        // SAFETY: guaranteed by the caller.
        unsafe { std::slice::from_raw_parts(self.chunks, self.num_chunks as usize) }
    }

    /// Total payload size in bytes.
    ///
    /// # Safety
    /// Same contract as [`RawEdgeData::chunks`].
    pub unsafe fn total_len(&self) -> usize {
        unsafe { self.chunks() }.iter().map(|c| c.len).sum()
    }
}

impl RawDataChunk {
    /// Payload bytes of this chunk.
    ///
    /// # Safety
    /// `data` must point to `len` readable bytes.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.data.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }
}
