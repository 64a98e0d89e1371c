//! Dispatch from chunk type to the matching ancillary metadata decoder.

use crate::chunk::{Chunk, ChunkType};
use crate::phys::{extract_physical_dimensions, PhysError, PhysicalDimensions};
use crate::text::{
    extract_compressed_text_metadata, extract_international_text_metadata,
    extract_text_metadata, TextError, TextMetadata,
};
use crate::time::{extract_timestamp, TimeError, Timestamp};

/// A failure decoding one ancillary chunk. These never abort a parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Phys(#[from] PhysError),
}

/// The chunk types with a metadata decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownChunk {
    Text,
    CompressedText,
    InternationalText,
    Time,
    PhysicalDimensions,
}

impl KnownChunk {
    pub fn from_type(chunk_type: ChunkType) -> Option<Self> {
        match chunk_type {
            ChunkType::tEXt => Some(KnownChunk::Text),
            ChunkType::zTXt => Some(KnownChunk::CompressedText),
            ChunkType::iTXt => Some(KnownChunk::InternationalText),
            ChunkType::tIME => Some(KnownChunk::Time),
            ChunkType::pHYs => Some(KnownChunk::PhysicalDimensions),
            _ => None,
        }
    }

    pub fn decode(self, chunk: &Chunk<'_>) -> Result<ChunkMetadata, MetadataError> {
        Ok(match self {
            KnownChunk::Text => ChunkMetadata::Text(extract_text_metadata(chunk)?),
            KnownChunk::CompressedText => {
                ChunkMetadata::Text(extract_compressed_text_metadata(chunk)?)
            }
            KnownChunk::InternationalText => {
                ChunkMetadata::Text(extract_international_text_metadata(chunk)?)
            }
            KnownChunk::Time => ChunkMetadata::Timestamp(extract_timestamp(chunk)?),
            KnownChunk::PhysicalDimensions => {
                ChunkMetadata::PhysicalDimensions(extract_physical_dimensions(chunk)?)
            }
        })
    }
}

/// Metadata decoded from a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkMetadata {
    Text(TextMetadata),
    Timestamp(Timestamp),
    PhysicalDimensions(PhysicalDimensions),
}

/// Decode `chunk` if it is one of the metadata chunk types. Returns `None`
/// for any other type.
pub fn extract_metadata_from_chunk(
    chunk: &Chunk<'_>,
) -> Option<Result<ChunkMetadata, MetadataError>> {
    KnownChunk::from_type(chunk.chunk_type).map(|known| known.decode(chunk))
}
