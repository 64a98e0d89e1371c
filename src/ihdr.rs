use crate::chunk::{read_u32, Chunk, ChunkType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IhdrError {
    #[error("Expected IHDR chunk")]
    WrongType(ChunkType),

    #[error("Invalid IHDR chunk size")]
    InvalidSize(u32),

    #[error("Invalid image dimensions")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid bit depth")]
    InvalidBitDepth(u8),

    #[error("Invalid color type")]
    InvalidColorType(u8),

    #[error("Invalid bit depth for palette color type")]
    InvalidPaletteBitDepth(u8),

    #[error("Invalid bit depth for color type")]
    InvalidBitDepthForColorType { color_type: ColorType, bit_depth: u8 },
}

impl IhdrError {
    /// The offending values, for error reports.
    pub fn details(&self) -> String {
        match self {
            IhdrError::WrongType(found) => format!("found {found} chunk"),
            IhdrError::InvalidSize(len) => format!("IHDR data is {len} bytes, expected 13"),
            IhdrError::InvalidDimensions { width, height } => {
                format!("width {width}, height {height}")
            }
            IhdrError::InvalidBitDepth(depth) | IhdrError::InvalidPaletteBitDepth(depth) => {
                format!("bit depth {depth}")
            }
            IhdrError::InvalidColorType(ty) => format!("color type {ty}"),
            IhdrError::InvalidBitDepthForColorType {
                color_type,
                bit_depth,
            } => format!("bit depth {bit_depth} with {} color type", color_type.name()),
        }
    }
}

/// Pixel layout declared in IHDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
#[repr(u8)]
pub enum ColorType {
    Grayscale = 0,
    Rgb = 2,
    Palette = 3,
    GrayscaleAlpha = 4,
    Rgba = 6,
}

impl ColorType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Palette),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::Rgba),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorType::Grayscale => "Grayscale",
            ColorType::Rgb => "RGB",
            ColorType::Palette => "Palette",
            ColorType::GrayscaleAlpha => "Grayscale with Alpha",
            ColorType::Rgba => "RGBA",
        }
    }

    /// Samples per pixel.
    pub fn channel_count(self) -> u8 {
        match self {
            ColorType::Grayscale | ColorType::Palette => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    fn allows_bit_depth(self, bit_depth: u8) -> bool {
        match self {
            ColorType::Grayscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Palette => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => {
                matches!(bit_depth, 8 | 16)
            }
        }
    }
}

impl From<ColorType> for u8 {
    fn from(color_type: ColorType) -> u8 {
        color_type as u8
    }
}

/// Image header fields, plus the file name and size the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub file_name: String,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

/// Decode and validate an IHDR chunk.
pub fn extract_basic_info(
    chunk: &Chunk<'_>,
    file_name: &str,
    file_size: u64,
) -> Result<BasicInfo, IhdrError> {
    if chunk.chunk_type != ChunkType::IHDR {
        return Err(IhdrError::WrongType(chunk.chunk_type));
    }
    let data = chunk.data;
    if data.len() != 13 {
        return Err(IhdrError::InvalidSize(data.len() as u32));
    }

    let width = read_u32(&data[0..]);
    let height = read_u32(&data[4..]);
    let bit_depth = data[8];
    let color_type = data[9];
    let compression_method = data[10];
    let filter_method = data[11];
    let interlace_method = data[12];

    if width == 0 || height == 0 {
        return Err(IhdrError::InvalidDimensions { width, height });
    }
    if !matches!(bit_depth, 1 | 2 | 4 | 8 | 16) {
        return Err(IhdrError::InvalidBitDepth(bit_depth));
    }
    let color_type = ColorType::from_u8(color_type).ok_or(IhdrError::InvalidColorType(color_type))?;
    if !color_type.allows_bit_depth(bit_depth) {
        return Err(match color_type {
            ColorType::Palette => IhdrError::InvalidPaletteBitDepth(bit_depth),
            _ => IhdrError::InvalidBitDepthForColorType {
                color_type,
                bit_depth,
            },
        });
    }

    Ok(BasicInfo {
        file_name: file_name.to_string(),
        file_size,
        width,
        height,
        bit_depth,
        color_type,
        compression_method,
        filter_method,
        interlace_method,
    })
}
