#![no_main]

use libfuzzer_sys::fuzz_target;
use pngmeta::export::{export_at, ExportFormat};
use pngmeta::time::CalendarDateTime;
use pngmeta::{parse_png, MemorySource, ParseOptions};

fuzz_target!(|data: &[u8]| {
    let strict = ParseOptions {
        strict_mode: true,
        ..ParseOptions::default()
    };
    let _ = parse_png(&mut MemorySource::new("fuzz.png", data), &strict);

    if let Ok(metadata) = pngmeta::read_bytes(data) {
        let now = CalendarDateTime::from_unix_timestamp(0).unwrap();
        for format in [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Text] {
            let _ = export_at(&metadata, format, now);
        }
    }
});
