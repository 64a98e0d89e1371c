//! Chunk framing: the PNG signature, length-prefixed chunk records and their
//! CRC-32 checks.

use serde::{Serialize, Serializer};
use std::fmt::{self, Debug, Display, Write};

/// The 8 bytes every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Largest declared chunk length the format allows (2^31 - 1).
pub const MAX_CHUNK_LENGTH: u32 = 0x7fff_ffff;

/// Length (4) + type (4) + CRC (4).
const CHUNK_OVERHEAD: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("Unexpected end of file while reading chunk header")]
    TruncatedHeader { offset: usize },

    #[error("Invalid chunk length")]
    InvalidLength { offset: usize, length: u32 },

    #[error("Unexpected end of file while reading chunk data")]
    TruncatedData { offset: usize, length: u32 },
}

impl ChunkError {
    /// Byte offset of the chunk's length field.
    pub fn offset(&self) -> usize {
        match *self {
            ChunkError::TruncatedHeader { offset }
            | ChunkError::InvalidLength { offset, .. }
            | ChunkError::TruncatedData { offset, .. } => offset,
        }
    }
}

/// A four byte chunk type tag, taken verbatim from the stream.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);

#[allow(nonstandard_style)]
impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const PLTE: Self = Self(*b"PLTE");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const tEXt: Self = Self(*b"tEXt");
    pub const zTXt: Self = Self(*b"zTXt");
    pub const iTXt: Self = Self(*b"iTXt");
    pub const tIME: Self = Self(*b"tIME");
    pub const pHYs: Self = Self(*b"pHYs");

    /// Critical chunks have an uppercase first letter; a reader must
    /// understand them to display the image.
    pub fn is_critical(&self) -> bool {
        self.0[0].is_ascii_uppercase()
    }

    /// Short human-readable description of what the chunk holds.
    pub fn description(&self) -> String {
        let known = match &self.0 {
            b"IHDR" => "Image Header",
            b"PLTE" => "Palette",
            b"IDAT" => "Image Data",
            b"IEND" => "Image End",
            b"tRNS" => "Transparency",
            b"cHRM" => "Chromaticity",
            b"gAMA" => "Gamma",
            b"iCCP" => "ICC Profile",
            b"sBIT" => "Significant Bits",
            b"sRGB" => "Standard RGB Color Space",
            b"tEXt" => "Text",
            b"zTXt" => "Compressed Text",
            b"iTXt" => "International Text",
            b"bKGD" => "Background Color",
            b"hIST" => "Histogram",
            b"pHYs" => "Physical Dimensions",
            b"sPLT" => "Suggested Palette",
            b"tIME" => "Time Stamp",
            _ => return format!("Unknown chunk ({self})"),
        };
        known.to_string()
    }
}

impl Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            f.write_char(b as char)?;
        }
        Ok(())
    }
}

impl Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Serialize for ChunkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One chunk record, borrowing its payload from the PNG buffer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub chunk_type: ChunkType,
    /// Declared payload length.
    pub length: u32,
    pub data: &'a [u8],
    /// CRC as stored in the stream.
    pub crc: u32,
    /// Offset of the length field within the buffer.
    pub offset: usize,
}

impl Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("chunk_type", &self.chunk_type)
            .field("length", &self.length)
            .field("data", &&self.data[..self.data.len().min(12)])
            .field("crc", &format_args!("0x{:08x}", self.crc))
            .field("offset", &self.offset)
            .finish()
    }
}

/// Returns true if `buf` starts with the PNG signature.
pub fn verify_png_signature(buf: &[u8]) -> bool {
    buf.len() >= PNG_SIGNATURE.len() && buf[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Read the chunk whose length field starts at `offset`, and return it
/// together with the offset of the following chunk.
pub fn read_chunk(buf: &[u8], offset: usize) -> Result<(Chunk<'_>, usize), ChunkError> {
    let remaining = buf.len().saturating_sub(offset);
    if remaining < CHUNK_OVERHEAD {
        return Err(ChunkError::TruncatedHeader { offset });
    }

    let length = read_u32(&buf[offset..]);
    if length > MAX_CHUNK_LENGTH {
        return Err(ChunkError::InvalidLength { offset, length });
    }

    let chunk_type = ChunkType([
        buf[offset + 4],
        buf[offset + 5],
        buf[offset + 6],
        buf[offset + 7],
    ]);

    // The header check above guarantees 12 bytes, so the payload plus the CRC
    // must fit in what is left after the 8 header bytes.
    if remaining - 8 - 4 < length as usize {
        return Err(ChunkError::TruncatedData { offset, length });
    }

    let data_start = offset + 8;
    let crc_start = data_start + length as usize;
    let data = &buf[data_start..crc_start];
    let crc = read_u32(&buf[crc_start..]);

    let chunk = Chunk {
        chunk_type,
        length,
        data,
        crc,
        offset,
    };
    Ok((chunk, crc_start + 4))
}

/// CRC-32 over a chunk type and payload, as stored after every chunk.
pub fn chunk_crc(chunk_type: &ChunkType, data: &[u8]) -> u32 {
    let mut crc = crc32fast::Hasher::new();
    crc.update(&chunk_type.0);
    crc.update(data);
    crc.finalize()
}

/// Recompute the chunk's CRC and compare it with the stored one.
pub fn validate_chunk_crc(chunk: &Chunk<'_>) -> bool {
    chunk_crc(&chunk.chunk_type, chunk.data) == chunk.crc
}

/// Big-endian u32 from the first four bytes. Callers check the length.
pub(crate) fn read_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}
