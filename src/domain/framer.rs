//! Transfer Framing
//!
//! The controller reassembles the image purely by arrival order, so the
//! payload carries no sequence numbers.
//!
//! # Wire Payload
//!
//! ```text
//! [0-3]   : Width (u32 little-endian)
//! [4-7]   : Height (u32 little-endian)
//! [8-..]  : Packed 4-bit bitmap, height * ceil(width / 2) bytes
//! ```
//!
//! # Chunking
//!
//! ```text
//! chunk 0   : header + first `first_chunk_body_size` bytes of bitmap
//! chunk 1.. : up to `chunk_size` bytes each, last one may be shorter
//! ```

use crate::domain::error::FrameError;
use crate::domain::models::EncodedImage;

/// Size of the width/height header in bytes
pub const HEADER_LEN: usize = 8;

/// Bitmap bytes carried by the first chunk (500 byte MTU - 8 byte header)
pub const DEFAULT_FIRST_CHUNK_BODY: usize = 492;

/// Maximum size of every chunk after the first
pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
}

impl FrameHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LEN {
            return Err(FrameError::TruncatedHeader(bytes.len()));
        }
        Ok(Self {
            width: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Transport size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    first_chunk_body_size: usize,
    chunk_size: usize,
}

impl ChunkLimits {
    pub fn new(first_chunk_body_size: usize, chunk_size: usize) -> Result<Self, FrameError> {
        if first_chunk_body_size == 0 {
            return Err(FrameError::ZeroFirstChunkBody);
        }
        if chunk_size == 0 {
            return Err(FrameError::ZeroChunkSize);
        }
        Ok(Self {
            first_chunk_body_size,
            chunk_size,
        })
    }

    pub fn first_chunk_body_size(&self) -> usize {
        self.first_chunk_body_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Largest allowed first chunk, header included
    pub fn first_chunk_limit(&self) -> usize {
        HEADER_LEN.saturating_add(self.first_chunk_body_size)
    }
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            first_chunk_body_size: DEFAULT_FIRST_CHUNK_BODY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Header followed by the packed bitmap.
pub fn wire_payload(packed: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(HEADER_LEN + packed.len());
    payload.extend_from_slice(&FrameHeader { width, height }.to_bytes());
    payload.extend_from_slice(packed);
    payload
}

/// A wire payload ready to be cut into chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
    limits: ChunkLimits,
}

impl Frame {
    pub fn new(image: &EncodedImage, limits: ChunkLimits) -> Self {
        Self {
            payload: wire_payload(&image.data, image.width, image.height),
            limits,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn limits(&self) -> ChunkLimits {
        self.limits
    }

    pub fn chunks(&self) -> Chunks<'_> {
        split(
            &self.payload,
            self.limits.first_chunk_limit(),
            self.limits.chunk_size,
        )
    }
}

/// Build the wire payload for `packed` and cut it into chunks.
pub fn frame(packed: &[u8], width: u32, height: u32, limits: ChunkLimits) -> Frame {
    Frame {
        payload: wire_payload(packed, width, height),
        limits,
    }
}

/// Split `payload` into a first chunk of at most `first_limit` bytes and
/// following chunks of at most `chunk_size` bytes.
///
/// An empty payload yields no chunks. Both limits must be non-zero.
pub fn split(payload: &[u8], first_limit: usize, chunk_size: usize) -> Chunks<'_> {
    debug_assert!(first_limit > 0 && chunk_size > 0);
    Chunks {
        rest: payload,
        first_limit: first_limit.max(1),
        chunk_size: chunk_size.max(1),
        first: true,
    }
}

/// Lazy, ordered chunk sequence over a borrowed payload
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a [u8],
    first_limit: usize,
    chunk_size: usize,
    first: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let limit = if self.first {
            self.first_limit
        } else {
            self.chunk_size
        };
        self.first = false;
        let (chunk, rest) = self.rest.split_at(limit.min(self.rest.len()));
        self.rest = rest;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.rest.is_empty() {
            0
        } else if self.first {
            let after_first = self.rest.len().saturating_sub(self.first_limit);
            1 + after_first.div_ceil(self.chunk_size)
        } else {
            self.rest.len().div_ceil(self.chunk_size)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl std::iter::FusedIterator for Chunks<'_> {}
