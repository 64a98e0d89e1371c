//! Checks run on a file before it is parsed.

use crate::chunk::{verify_png_signature, PNG_SIGNATURE};
use crate::error::{AppError, ErrorKind};
use crate::png::DEFAULT_MAX_FILE_SIZE;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: u64,
    /// Also read the first bytes and check the PNG signature.
    pub check_png_signature: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allowed_mime_types: vec!["image/png".to_string()],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            check_png_signature: true,
        }
    }
}

/// True if `file_name` ends in `.png`, in any case.
pub fn validate_file_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Check a file's type and size without reading it. The MIME type is used
/// when known, the file extension otherwise.
pub fn validate_file(
    file_name: &str,
    mime_type: Option<&str>,
    file_size: u64,
    options: &ValidationOptions,
) -> Result<(), AppError> {
    let type_ok = match mime_type {
        Some(mime) => options.allowed_mime_types.iter().any(|m| m == mime),
        None => validate_file_extension(file_name),
    };
    if !type_ok {
        return Err(AppError::new(
            ErrorKind::InvalidFileType,
            "Please select a PNG file",
        )
        .with_details(mime_type.unwrap_or(file_name).to_string()));
    }

    if file_size > options.max_file_size {
        let max_mb = (options.max_file_size as f64 / (1024.0 * 1024.0)).round();
        return Err(AppError::new(
            ErrorKind::FileTooLarge,
            format!("File is too large (limit {max_mb} MB)"),
        )
        .with_details(format!("{file_size} bytes")));
    }

    if file_size == 0 {
        return Err(AppError::new(ErrorKind::CorruptedFile, "File is empty"));
    }

    Ok(())
}

/// Validate a file on disk, including its signature if
/// [`ValidationOptions::check_png_signature`] is set.
pub fn validate_png_file(path: &Path, options: &ValidationOptions) -> Result<(), AppError> {
    let read_error = |err: std::io::Error| {
        AppError::new(ErrorKind::ParseError, "Failed to read file").with_details(err.to_string())
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_size = std::fs::metadata(path).map_err(read_error)?.len();
    validate_file(&file_name, None, file_size, options)?;

    if options.check_png_signature {
        let mut header = Vec::with_capacity(PNG_SIGNATURE.len());
        std::fs::File::open(path)
            .and_then(|f| f.take(PNG_SIGNATURE.len() as u64).read_to_end(&mut header))
            .map_err(read_error)?;
        if !verify_png_signature(&header) {
            return Err(AppError::new(
                ErrorKind::CorruptedFile,
                "Not a valid PNG file",
            ));
        }
    }

    Ok(())
}
