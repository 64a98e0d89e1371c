use crate::chunk::{read_u32, Chunk, ChunkType};
use serde::Serialize;

/// Inches in one metre.
pub const INCHES_PER_METER: f64 = 39.3701;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhysError {
    #[error("Expected pHYs chunk")]
    WrongType(ChunkType),

    #[error("Invalid pHYs chunk size")]
    InvalidSize(usize),

    #[error("Invalid unit specifier in pHYs chunk")]
    InvalidUnit(u8),

    #[error("Invalid pixel density in pHYs chunk")]
    InvalidDensity { x: u32, y: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
#[repr(u8)]
pub enum UnitSpecifier {
    /// Only the aspect ratio is meaningful.
    Unknown = 0,
    Meter = 1,
}

impl UnitSpecifier {
    pub fn name(self) -> &'static str {
        match self {
            UnitSpecifier::Unknown => "unknown",
            UnitSpecifier::Meter => "meter",
        }
    }
}

impl From<UnitSpecifier> for u8 {
    fn from(unit: UnitSpecifier) -> u8 {
        unit as u8
    }
}

/// Intended pixel density, from pHYs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalDimensions {
    pub pixels_per_unit_x: u32,
    pub pixels_per_unit_y: u32,
    pub unit_specifier: UnitSpecifier,
}

/// Printed size of an image, in centimetres rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrintSize {
    pub width: f64,
    pub height: f64,
}

impl PhysicalDimensions {
    /// Dots per inch along the X axis. Only defined for metre units, and
    /// `None` when the density rounds to zero.
    pub fn dpi(&self) -> Option<u32> {
        match self.unit_specifier {
            UnitSpecifier::Meter => {
                let dpi = (f64::from(self.pixels_per_unit_x) / INCHES_PER_METER).round() as u32;
                (dpi != 0).then_some(dpi)
            }
            UnitSpecifier::Unknown => None,
        }
    }

    /// Printed size of a `width` x `height` image at [`Self::dpi`].
    pub fn print_size_cm(&self, width: u32, height: u32) -> Option<PrintSize> {
        let dpi = f64::from(self.dpi()?);
        let cm = |pixels: u32| (f64::from(pixels) / dpi * 2.54 * 10.0).round() / 10.0;
        Some(PrintSize {
            width: cm(width),
            height: cm(height),
        })
    }
}

/// Decode a pHYs chunk.
pub fn extract_physical_dimensions(chunk: &Chunk<'_>) -> Result<PhysicalDimensions, PhysError> {
    if chunk.chunk_type != ChunkType::pHYs {
        return Err(PhysError::WrongType(chunk.chunk_type));
    }
    let data = chunk.data;
    if data.len() != 9 {
        return Err(PhysError::InvalidSize(data.len()));
    }

    let x = read_u32(&data[0..]);
    let y = read_u32(&data[4..]);
    let unit_specifier = match data[8] {
        0 => UnitSpecifier::Unknown,
        1 => UnitSpecifier::Meter,
        other => return Err(PhysError::InvalidUnit(other)),
    };
    if x == 0 || y == 0 {
        return Err(PhysError::InvalidDensity { x, y });
    }

    Ok(PhysicalDimensions {
        pixels_per_unit_x: x,
        pixels_per_unit_y: y,
        unit_specifier,
    })
}
