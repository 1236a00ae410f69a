//! Sprucelabel: annotation export for dead-spruce detection imagery.
//!
//! Annotators draw bounding boxes on georeferenced aerial and satellite
//! images. This crate turns those boxes into training data: a ZIP archive of
//! YOLO label files or a single COCO document, optionally with the source
//! images alongside.
//!
//! # Modules
//!
//! - [`model`]: Image and annotation records, pixel and YOLO boxes
//! - [`store`]: Read-only data access (`ImageStore`, JSON catalog backend)
//! - [`export`]: Encoders, archive builder and the export pipeline
//! - [`validation`]: Catalog checks that predict export problems
//! - [`error`]: Error types for sprucelabel operations

pub mod error;
pub mod export;
pub mod model;
pub mod store;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::{ErrorPayload, SprucelabelError};

use export::{ExportOptions, ExportReport, ExportRequest};
use store::{Catalog, CatalogStore};

/// The sprucelabel CLI application.
#[derive(Parser)]
#[command(name = "sprucelabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Export annotations as a YOLO or COCO ZIP archive.
    Export(ExportArgs),
    /// Check a catalog for problems that would break an export.
    Validate(ValidateArgs),
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    /// Image catalog (JSON dump of the image and annotation tables).
    catalog: PathBuf,

    /// Label format ('yolo' or 'coco').
    #[arg(long, default_value = "yolo")]
    format: String,

    /// Comma-separated image ids to export (default: all images).
    #[arg(long)]
    image_ids: Option<String>,

    /// Embed the stored image files ('true' or 'false').
    #[arg(long, default_value = "true")]
    include_images: String,

    /// Directory stored file paths are relative to (default: the catalog's directory).
    #[arg(long, env = "SPRUCELABEL_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Directory for temporary archives (default: the system temp dir).
    #[arg(long, env = "SPRUCELABEL_EXPORTS_DIR")]
    exports_dir: Option<PathBuf>,

    /// Directory the finished archive is delivered to.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Image catalog to validate.
    catalog: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the sprucelabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SprucelabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Export(args)) => run_export(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("sprucelabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation export for dead-spruce detection imagery.");
            println!();
            println!("Run 'sprucelabel --help' for usage information.");
            Ok(())
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

fn parse_report_format(name: &'static str, raw: &str) -> Result<ReportFormat, SprucelabelError> {
    match raw {
        "text" => Ok(ReportFormat::Text),
        "json" => Ok(ReportFormat::Json),
        other => Err(SprucelabelError::InvalidParameter {
            name,
            message: format!("'{}' (supported: text, json)", other),
        }),
    }
}

#[derive(Serialize)]
struct ExportSuccess<'a> {
    success: bool,
    path: &'a Path,
    report: &'a ExportReport,
}

/// Execute the export subcommand.
fn run_export(args: ExportArgs) -> Result<(), SprucelabelError> {
    let output = parse_report_format("report", &args.report)?;

    match export_to_dir(&args) {
        Ok((path, report)) => match output {
            ReportFormat::Json => {
                let success = ExportSuccess {
                    success: true,
                    path: &path,
                    report: &report,
                };
                let json =
                    serde_json::to_string_pretty(&success).map_err(SprucelabelError::ReportJson)?;
                println!("{}", json);
                Ok(())
            }
            ReportFormat::Text => {
                print!("{}", report);
                println!("  written to {}", path.display());
                Ok(())
            }
        },
        Err(err) => {
            if output == ReportFormat::Json {
                if let Ok(json) = serde_json::to_string_pretty(&err.to_payload()) {
                    println!("{}", json);
                }
            }
            Err(err)
        }
    }
}

fn export_to_dir(args: &ExportArgs) -> Result<(PathBuf, ExportReport), SprucelabelError> {
    // Parameters are checked before the catalog is touched.
    let request = ExportRequest::from_params(
        args.image_ids.as_deref(),
        Some(args.include_images.as_str()),
        Some(args.format.as_str()),
    )?;

    let mut store = CatalogStore::open(&args.catalog)?;
    if let Some(root) = &args.storage_root {
        store = store.with_storage_root(root);
    }

    let mut options = ExportOptions::default();
    if let Some(dir) = &args.exports_dir {
        options.exports_dir = dir.clone();
    }

    let artifact = export::export_dataset(&store, &request, &options)?;
    let report = artifact.report().clone();
    let path = artifact.persist_into(&args.output_dir)?;
    Ok((path, report))
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), SprucelabelError> {
    let output = parse_report_format("output", &args.output)?;

    // Validate the raw catalog so misplaced annotations are still visible.
    let catalog = Catalog::read(&args.catalog)?;
    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_catalog(&catalog.images, &opts);

    match output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(SprucelabelError::ReportJson)?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    if !report.is_ok() {
        Err(SprucelabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
