use clap::Parser;
use pngmeta::export::{export, ExportFormat};
use pngmeta::validate::{validate_png_file, ValidationOptions};
use pngmeta::{parse_png, AppError, FileSource, ParseOptions};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Print the metadata stored in a PNG file.
#[derive(Parser, Clone, Debug)]
#[command(version)]
struct Opt {
    /// PNG file to inspect
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = ExportFormat::Text)]
    format: ExportFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail on chunk CRC mismatches
    #[arg(long)]
    strict: bool,

    #[arg(long, default_value_t = pngmeta::png::DEFAULT_MAX_CHUNKS)]
    max_chunks: usize,

    /// Bytes
    #[arg(long, default_value_t = pngmeta::png::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Print processing time
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", opt.input.display());
            ExitCode::FAILURE
        }
    }
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
    let validation = ValidationOptions {
        max_file_size: opt.max_file_size,
        ..ValidationOptions::default()
    };
    validate_png_file(&opt.input, &validation).map_err(report)?;

    let options = ParseOptions {
        max_file_size: opt.max_file_size,
        max_chunks: opt.max_chunks,
        strict_mode: opt.strict,
    };
    let result = parse_png(&mut FileSource::new(&opt.input), &options);
    if opt.verbose {
        eprintln!("Processed in {:?}", result.processing_time);
    }
    let metadata = result
        .into_result()
        .map_err(|err| report(AppError::from(&err)))?;

    for warning in &metadata.warnings {
        eprintln!(
            "warning: skipped {} chunk at offset {}: {}",
            warning.chunk_type, warning.offset, warning.message
        );
    }

    let rendered = export(&metadata, opt.format)?;
    match &opt.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn report(err: AppError) -> AppError {
    if let Some(details) = &err.details {
        eprintln!("{} ({}): {details}", err.message, err.kind);
    }
    err
}
