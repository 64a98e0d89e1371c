//! Display helpers for metadata values.

/// Human-readable size: "512 bytes", "1.5 KB", "2.0 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

pub fn compression_method_name(method: u8) -> String {
    match method {
        0 => "Deflate".to_string(),
        other => format!("Unknown ({other})"),
    }
}

pub fn filter_method_name(method: u8) -> String {
    match method {
        0 => "Adaptive".to_string(),
        other => format!("Unknown ({other})"),
    }
}

pub fn interlace_method_name(method: u8) -> String {
    match method {
        0 => "None".to_string(),
        1 => "Adam7".to_string(),
        other => format!("Unknown ({other})"),
    }
}
