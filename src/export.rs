//! Render [`PngMetadata`] as JSON, CSV or a plain-text report.

use crate::format::{
    compression_method_name, filter_method_name, format_file_size, interlace_method_name,
};
use crate::ihdr::BasicInfo;
use crate::phys::{PhysicalDimensions, PrintSize};
use crate::png::{ChunkInfo, PngMetadata};
use crate::text::TextMetadata;
use crate::time::{CalendarDateTime, Timestamp};
use serde::Serialize;
use std::fmt::Write;
use std::io;

pub const EXPORT_VERSION: &str = "1.0";

const SECONDS_PER_MONTH: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Formatting error")]
    Fmt(#[from] std::fmt::Error),

    #[error("Export is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
        }
    }
}

/// Render `metadata` in `format`, stamped with the current time.
pub fn export(metadata: &PngMetadata, format: ExportFormat) -> Result<String, ExportError> {
    export_at(metadata, format, CalendarDateTime::now())
}

/// Render `metadata` in `format` as if exported at `now`.
pub fn export_at(
    metadata: &PngMetadata,
    format: ExportFormat,
    now: CalendarDateTime,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => export_json(metadata, now),
        ExportFormat::Csv => export_csv(metadata),
        ExportFormat::Text => export_text(metadata, now),
    }
}

/// `base_YYYYMMDD_HHMMSS.ext`
pub fn generate_filename(base_name: &str, format: ExportFormat, now: CalendarDateTime) -> String {
    format!(
        "{base_name}_{:04}{:02}{:02}_{:02}{:02}{:02}.{}",
        now.year,
        now.month,
        now.day,
        now.hour,
        now.minute,
        now.second,
        format.extension()
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    export_info: ExportInfo,
    basic_info: JsonBasicInfo<'a>,
    text_metadata: &'a [TextMetadata],
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<JsonTimestamp<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    physical_dimensions: Option<JsonPhysicalDimensions<'a>>,
    other_chunks: &'a [ChunkInfo],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportInfo {
    export_date: CalendarDateTime,
    format: ExportFormat,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonBasicInfo<'a> {
    #[serde(flatten)]
    info: &'a BasicInfo,
    color_type_name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonTimestamp<'a> {
    #[serde(flatten)]
    timestamp: &'a Timestamp,
    iso8601: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPhysicalDimensions<'a> {
    #[serde(flatten)]
    dimensions: &'a PhysicalDimensions,
    unit_name: &'static str,
    dpi: Option<u32>,
    print_size_cm: Option<PrintSize>,
}

/// Pretty-printed JSON.
pub fn export_json(metadata: &PngMetadata, now: CalendarDateTime) -> Result<String, ExportError> {
    let info = &metadata.basic_info;
    let doc = JsonExport {
        export_info: ExportInfo {
            export_date: now,
            format: ExportFormat::Json,
            version: EXPORT_VERSION,
        },
        basic_info: JsonBasicInfo {
            info,
            color_type_name: info.color_type.name(),
        },
        text_metadata: &metadata.text_metadata,
        timestamp: metadata.timestamp.as_ref().map(|ts| JsonTimestamp {
            timestamp: ts,
            iso8601: ts.date.to_iso8601(),
        }),
        physical_dimensions: metadata.physical_dimensions.as_ref().map(|dims| {
            JsonPhysicalDimensions {
                dimensions: dims,
                unit_name: dims.unit_specifier.name(),
                dpi: dims.dpi(),
                print_size_cm: dims.print_size_cm(info.width, info.height),
            }
        }),
        other_chunks: &metadata.other_chunks,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// CSV with a UTF-8 byte order mark and the columns
/// `section,item,value,unit,description`.
pub fn export_csv(metadata: &PngMetadata) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(["section", "item", "value", "unit", "description"])?;

    let info = &metadata.basic_info;
    let mut basic = |item: &str, value: String, unit: &str, description: &str| {
        writer.write_record(["basic", item, value.as_str(), unit, description])
    };
    basic("file_name", info.file_name.clone(), "", "")?;
    basic(
        "file_size",
        info.file_size.to_string(),
        "bytes",
        &format_file_size(info.file_size),
    )?;
    basic("width", info.width.to_string(), "pixels", "")?;
    basic("height", info.height.to_string(), "pixels", "")?;
    basic("bit_depth", info.bit_depth.to_string(), "bits", "")?;
    basic(
        "color_type",
        u8::from(info.color_type).to_string(),
        "",
        info.color_type.name(),
    )?;
    basic(
        "compression_method",
        info.compression_method.to_string(),
        "",
        &compression_method_name(info.compression_method),
    )?;
    basic(
        "filter_method",
        info.filter_method.to_string(),
        "",
        &filter_method_name(info.filter_method),
    )?;
    basic(
        "interlace_method",
        info.interlace_method.to_string(),
        "",
        &interlace_method_name(info.interlace_method),
    )?;

    for text in &metadata.text_metadata {
        let source = format!("{} chunk", text.kind.chunk_type());
        let value = text.text.to_string();
        writer.write_record(["text", text.keyword.as_str(), value.as_str(), "", source.as_str()])?;
        if let Some(translated) = &text.translated_keyword {
            let item = format!("{translated} (translated)");
            writer.write_record(["text", item.as_str(), value.as_str(), "", source.as_str()])?;
        }
    }

    if let Some(ts) = &metadata.timestamp {
        for (item, value) in [
            ("year", u32::from(ts.year)),
            ("month", u32::from(ts.month)),
            ("day", u32::from(ts.day)),
            ("hour", u32::from(ts.hour)),
            ("minute", u32::from(ts.minute)),
            ("second", u32::from(ts.second)),
        ] {
            writer.write_record(["timestamp", item, value.to_string().as_str(), "", ""])?;
        }
    }

    if let Some(dims) = &metadata.physical_dimensions {
        let unit = format!("pixels/{}", dims.unit_specifier.name());
        writer.write_record([
            "physical",
            "pixels_per_unit_x",
            dims.pixels_per_unit_x.to_string().as_str(),
            unit.as_str(),
            "",
        ])?;
        writer.write_record([
            "physical",
            "pixels_per_unit_y",
            dims.pixels_per_unit_y.to_string().as_str(),
            unit.as_str(),
            "",
        ])?;
        if let Some(dpi) = dims.dpi() {
            writer.write_record(["physical", "dpi", dpi.to_string().as_str(), "dots/inch", ""])?;
        }
        if let Some(size) = dims.print_size_cm(info.width, info.height) {
            writer.write_record([
                "physical",
                "print_width",
                size.width.to_string().as_str(),
                "cm",
                "",
            ])?;
            writer.write_record([
                "physical",
                "print_height",
                size.height.to_string().as_str(),
                "cm",
                "",
            ])?;
        }
    }

    for chunk in &metadata.other_chunks {
        let description = format!("{} - {}", chunk.description, criticality(chunk));
        writer.write_record([
            "chunk",
            chunk.chunk_type.to_string().as_str(),
            chunk.size.to_string().as_str(),
            "bytes",
            description.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(format!("\u{feff}{}", String::from_utf8(bytes)?))
}

/// A plain-text report for people.
pub fn export_text(metadata: &PngMetadata, now: CalendarDateTime) -> Result<String, ExportError> {
    const RULE: &str = "========================================";

    let mut out = String::new();
    let info = &metadata.basic_info;

    writeln!(out, "PNG Metadata Report")?;
    writeln!(out, "Generated: {now}")?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    writeln!(out, "## Basic Information")?;
    writeln!(out, "File name: {}", info.file_name)?;
    writeln!(out, "File size: {}", format_file_size(info.file_size))?;
    writeln!(out, "Dimensions: {} x {} pixels", info.width, info.height)?;
    writeln!(out, "Color: {}-bit {}", info.bit_depth, info.color_type.name())?;
    writeln!(
        out,
        "Compression: {} ({})",
        info.compression_method,
        compression_method_name(info.compression_method)
    )?;
    writeln!(
        out,
        "Filter: {} ({})",
        info.filter_method,
        filter_method_name(info.filter_method)
    )?;
    writeln!(
        out,
        "Interlace: {} ({})",
        info.interlace_method,
        interlace_method_name(info.interlace_method)
    )?;
    writeln!(out)?;

    if !metadata.text_metadata.is_empty() {
        writeln!(out, "## Text Metadata")?;
        for text in &metadata.text_metadata {
            write!(out, "{}: {}", text.keyword, text.text)?;
            if text.compressed {
                write!(out, " (compressed)")?;
            }
            match (&text.language_tag, &text.translated_keyword) {
                (Some(lang), Some(translated)) => write!(out, " ({lang}, translated: {translated})")?,
                (Some(lang), None) => write!(out, " ({lang})")?,
                (None, Some(translated)) => write!(out, " (translated: {translated})")?,
                (None, None) => {}
            }
            if text.text.as_str().is_none() {
                write!(out, " [not decompressed]")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }

    if let Some(ts) = &metadata.timestamp {
        writeln!(out, "## Last Modified")?;
        writeln!(
            out,
            "Date: {}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second
        )?;
        let months = (now.unix_timestamp() - ts.date.unix_timestamp()) / SECONDS_PER_MONTH;
        if months > 0 {
            writeln!(out, "Age: {months} months")?;
        }
        writeln!(out)?;
    }

    if let Some(dims) = &metadata.physical_dimensions {
        writeln!(out, "## Physical Dimensions")?;
        writeln!(
            out,
            "Pixel density: {} x {} pixels/{}",
            dims.pixels_per_unit_x,
            dims.pixels_per_unit_y,
            dims.unit_specifier.name()
        )?;
        if let Some(dpi) = dims.dpi() {
            writeln!(out, "DPI: {dpi} x {dpi} dots/inch")?;
        }
        if let Some(size) = dims.print_size_cm(info.width, info.height) {
            let inches = |cm: f64| (cm / 2.54 * 10.0).round() / 10.0;
            writeln!(
                out,
                "Print size: {} x {} cm ({} x {} inches)",
                size.width,
                size.height,
                inches(size.width),
                inches(size.height)
            )?;
        }
        writeln!(out)?;
    }

    if !metadata.other_chunks.is_empty() {
        writeln!(out, "## Chunks")?;
        for chunk in &metadata.other_chunks {
            writeln!(
                out,
                "{:<8} {:<12} ({}) - {}",
                chunk.chunk_type.to_string(),
                format_file_size(u64::from(chunk.size)),
                criticality(chunk),
                chunk.description
            )?;
        }
        writeln!(out)?;
        let total: u64 = metadata.other_chunks.iter().map(|c| u64::from(c.size)).sum();
        writeln!(out, "Chunk count: {}", metadata.other_chunks.len())?;
        writeln!(out, "Total data size: {}", format_file_size(total))?;
    }

    if !metadata.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Skipped Chunks")?;
        for warning in &metadata.warnings {
            writeln!(
                out,
                "{} at offset {}: {}",
                warning.chunk_type, warning.offset, warning.message
            )?;
        }
    }

    write!(out, "{RULE}")?;
    Ok(out)
}

fn criticality(chunk: &ChunkInfo) -> &'static str {
    if chunk.critical {
        "Critical"
    } else {
        "Ancillary"
    }
}
