//! Helpers for building PNG byte streams in tests.

use crate::chunk::{chunk_crc, ChunkType, PNG_SIGNATURE};

/// 3x2 RGB image with gAMA, two tEXt, zTXt, iTXt, tIME and pHYs chunks.
pub fn sample_image() -> Vec<u8> {
    std::fs::read("src/stripes.png").unwrap()
}

/// Encode one complete chunk with a correct CRC.
pub fn png_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(&ChunkType(*chunk_type), data).to_be_bytes());
    out
}

/// 13-byte IHDR payload.
pub fn ihdr_data(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
    data
}

#[derive(Debug, Clone)]
pub struct PngBuilder {
    bytes: Vec<u8>,
}

impl PngBuilder {
    /// Starts with just the signature.
    pub fn new() -> Self {
        Self {
            bytes: PNG_SIGNATURE.to_vec(),
        }
    }

    pub fn chunk(mut self, chunk_type: &[u8; 4], data: &[u8]) -> Self {
        self.bytes.extend(png_chunk(chunk_type, data));
        self
    }

    pub fn ihdr(self, width: u32, height: u32, bit_depth: u8, color_type: u8) -> Self {
        self.chunk(b"IHDR", &ihdr_data(width, height, bit_depth, color_type))
    }

    pub fn iend(self) -> Self {
        self.chunk(b"IEND", b"")
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
