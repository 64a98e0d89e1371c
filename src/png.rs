use crate::chunk::{
    read_chunk, validate_chunk_crc, verify_png_signature, ChunkError, ChunkType, PNG_SIGNATURE,
};
use crate::error::{AppError, ErrorKind};
use crate::ihdr::{extract_basic_info, BasicInfo, IhdrError};
use crate::metadata::{extract_metadata_from_chunk, ChunkMetadata};
use crate::phys::PhysicalDimensions;
use crate::text::TextMetadata;
use crate::time::Timestamp;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 100 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_CHUNKS: usize = 1000;

/// Failures that abort a parse.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File is too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Not a valid PNG file")]
    InvalidSignature,

    #[error("Chunk count exceeded the limit ({0})")]
    TooManyChunks(usize),

    #[error("Invalid CRC in {chunk_type} chunk")]
    CrcMismatch { chunk_type: ChunkType, offset: usize },

    #[error("Multiple IHDR chunks found")]
    DuplicateIhdr { offset: usize },

    #[error("IHDR chunk not found")]
    MissingIhdr,

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Ihdr(#[from] IhdrError),
}

impl PngError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PngError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            PngError::InvalidSignature
            | PngError::CrcMismatch { .. }
            | PngError::DuplicateIhdr { .. }
            | PngError::MissingIhdr => ErrorKind::CorruptedFile,
            PngError::Io(_)
            | PngError::TooManyChunks(_)
            | PngError::Chunk(_)
            | PngError::Ihdr(_) => ErrorKind::ParseError,
        }
    }

    /// Technical details to show alongside the message.
    pub fn details(&self) -> Option<String> {
        match self {
            PngError::CrcMismatch { offset, .. } | PngError::DuplicateIhdr { offset } => {
                Some(format!("chunk at byte offset {offset}"))
            }
            PngError::Chunk(ChunkError::InvalidLength { offset, length }) => {
                Some(format!("declared length 0x{length:08x} at byte offset {offset}"))
            }
            PngError::Chunk(err) => Some(format!("chunk at byte offset {}", err.offset())),
            PngError::Ihdr(err) => Some(err.details()),
            PngError::Io(err) => Some(err.kind().to_string()),
            _ => None,
        }
    }
}

impl From<&PngError> for AppError {
    fn from(err: &PngError) -> Self {
        AppError {
            kind: err.kind(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

/// Limits and checks applied by [`parse_png`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Files declaring more bytes than this are rejected before reading.
    pub max_file_size: u64,
    /// Maximum number of chunks read before IEND.
    pub max_chunks: usize,
    /// Verify every chunk's CRC.
    pub strict_mode: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            strict_mode: false,
        }
    }
}

/// Something that can be parsed: a name, a declared size, and its bytes.
pub trait PngSource {
    fn name(&self) -> &str;

    /// Size in bytes, known before reading.
    fn size(&self) -> io::Result<u64>;

    fn read_all(&mut self) -> io::Result<Vec<u8>>;
}

/// A PNG file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

impl PngSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// PNG bytes already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl PngSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Catalogue entry for a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub size: u32,
    pub description: String,
    pub critical: bool,
}

/// An ancillary chunk that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkWarning {
    pub chunk_type: ChunkType,
    pub offset: usize,
    pub message: String,
}

/// Everything decoded from one PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PngMetadata {
    pub basic_info: BasicInfo,
    /// In chunk order; keywords may repeat.
    pub text_metadata: Vec<TextMetadata>,
    pub timestamp: Option<Timestamp>,
    pub physical_dimensions: Option<PhysicalDimensions>,
    /// Every chunk other than IHDR, in chunk order.
    pub other_chunks: Vec<ChunkInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ChunkWarning>,
}

impl PngMetadata {
    fn new(basic_info: BasicInfo) -> Self {
        Self {
            basic_info,
            text_metadata: Vec::new(),
            timestamp: None,
            physical_dimensions: None,
            other_chunks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn add(&mut self, metadata: ChunkMetadata) {
        match metadata {
            ChunkMetadata::Text(text) => self.text_metadata.push(text),
            ChunkMetadata::Timestamp(ts) => self.timestamp = Some(ts),
            ChunkMetadata::PhysicalDimensions(dims) => self.physical_dimensions = Some(dims),
        }
    }
}

/// Outcome of [`parse_png`], with the time it took.
#[derive(Debug)]
pub struct ParseResult {
    pub outcome: Result<PngMetadata, PngError>,
    pub processing_time: Duration,
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn metadata(&self) -> Option<&PngMetadata> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PngError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<PngMetadata, PngError> {
        self.outcome
    }
}

/// Read `source` and decode its metadata.
pub fn parse_png<S: PngSource + ?Sized>(source: &mut S, options: &ParseOptions) -> ParseResult {
    let start = Instant::now();
    let outcome = parse_source(source, options);
    let processing_time = start.elapsed();
    if let Err(err) = &outcome {
        log::debug!("Parsing {} failed after {processing_time:?}: {err}", source.name());
    }
    ParseResult {
        outcome,
        processing_time,
    }
}

fn parse_source<S: PngSource + ?Sized>(
    source: &mut S,
    options: &ParseOptions,
) -> Result<PngMetadata, PngError> {
    let size = source.size()?;
    check_file_size(size, options)?;
    let buf = source.read_all()?;
    read_png_data(&buf, source.name(), size, options)
}

/// Reject sizes above [`ParseOptions::max_file_size`]. Callers reading from
/// disk should run this before the read.
pub fn check_file_size(size: u64, options: &ParseOptions) -> Result<(), PngError> {
    if size > options.max_file_size {
        return Err(PngError::FileTooLarge {
            size,
            max: options.max_file_size,
        });
    }
    Ok(())
}

/// Walk the chunks in `buf` and decode its metadata. `file_name` and
/// `file_size` are copied into [`BasicInfo`]. Both `file_size` and the
/// buffer length are held to [`ParseOptions::max_file_size`].
pub fn read_png_data(
    buf: &[u8],
    file_name: &str,
    file_size: u64,
    options: &ParseOptions,
) -> Result<PngMetadata, PngError> {
    check_file_size(file_size.max(buf.len() as u64), options)?;
    if !verify_png_signature(buf) {
        return Err(PngError::InvalidSignature);
    }

    let mut chunks = Vec::new();
    let mut ihdr = None;

    let mut pos = PNG_SIGNATURE.len();
    while pos < buf.len() {
        if chunks.len() >= options.max_chunks {
            return Err(PngError::TooManyChunks(options.max_chunks));
        }

        let (chunk, next) = read_chunk(buf, pos)?;
        log::debug!("{} chunk at {pos}: {} bytes", chunk.chunk_type, chunk.length);

        if options.strict_mode && !validate_chunk_crc(&chunk) {
            return Err(PngError::CrcMismatch {
                chunk_type: chunk.chunk_type,
                offset: pos,
            });
        }

        chunks.push(chunk);

        match chunk.chunk_type {
            ChunkType::IHDR => {
                if ihdr.is_some() {
                    return Err(PngError::DuplicateIhdr { offset: pos });
                }
                ihdr = Some(chunk);
            }
            ChunkType::IEND => {
                break;
            }
            _ => {}
        }

        pos = next;
    }

    let ihdr = ihdr.ok_or(PngError::MissingIhdr)?;
    let mut metadata = PngMetadata::new(extract_basic_info(&ihdr, file_name, file_size)?);

    for chunk in chunks.iter().filter(|c| c.chunk_type != ChunkType::IHDR) {
        metadata.other_chunks.push(ChunkInfo {
            chunk_type: chunk.chunk_type,
            size: chunk.length,
            description: chunk.chunk_type.description(),
            critical: chunk.chunk_type.is_critical(),
        });

        match extract_metadata_from_chunk(chunk) {
            Some(Ok(decoded)) => metadata.add(decoded),
            Some(Err(err)) => {
                log::warn!(
                    "Failed to extract metadata from {} chunk at {}: {err}",
                    chunk.chunk_type,
                    chunk.offset
                );
                metadata.warnings.push(ChunkWarning {
                    chunk_type: chunk.chunk_type,
                    offset: chunk.offset,
                    message: err.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(metadata)
}
