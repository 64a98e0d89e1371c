//! Fast reader for PNG metadata: image header, text chunks, modification
//! time and pixel density.
//!
//! # Example
//!
//! ```
//! let data = std::fs::read("src/stripes.png").unwrap();
//! let metadata = pngmeta::read_bytes(&data).unwrap();
//! assert_eq!(3, metadata.basic_info.width);
//! assert_eq!(2, metadata.basic_info.height);
//! let keywords = metadata.text_metadata.iter().map(|t| t.keyword.as_str()).collect::<Vec<_>>();
//! assert_eq!(vec!["Title", "Author", "Comment", "Description"], keywords);
//! ```

pub mod chunk;
pub mod error;
pub mod export;
pub mod format;
pub mod ihdr;
pub mod metadata;
pub mod phys;
pub mod png;
pub mod text;
pub mod time;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use crate::chunk::{Chunk, ChunkType};
pub use crate::error::{AppError, ErrorKind};
pub use crate::ihdr::{BasicInfo, ColorType};
pub use crate::phys::{PhysicalDimensions, UnitSpecifier};
pub use crate::png::{
    parse_png, ChunkInfo, ChunkWarning, FileSource, MemorySource, ParseOptions, ParseResult,
    PngError, PngMetadata, PngSource,
};
pub use crate::text::{TextMetadata, TextValue};
pub use crate::time::Timestamp;

use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Decoding error: {0}")]
    Decoding(#[from] PngError),
}

pub type Result<T, E = PngError> = std::result::Result<T, E>;

/// Read and decode the file at `path` with default [`ParseOptions`]. The
/// size limit is checked before the file is read.
pub fn read_file(path: &Path) -> Result<PngMetadata, Error> {
    let options = ParseOptions::default();
    let mut source = FileSource::new(path);
    let size = source.size()?;
    png::check_file_size(size, &options)?;
    let buf = source.read_all()?;
    Ok(png::read_png_data(&buf, source.name(), size, &options)?)
}

/// Decode an in-memory PNG with default [`ParseOptions`].
pub fn read_bytes(data: &[u8]) -> Result<PngMetadata> {
    png::read_png_data(data, "", data.len() as u64, &ParseOptions::default())
}
