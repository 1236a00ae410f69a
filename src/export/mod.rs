//! Export pipeline: selected images in, downloadable ZIP archive out.
//!
//! [`export_dataset`] resolves the requested images through an
//! [`ImageStore`], encodes them as YOLO label files or one COCO document,
//! optionally embeds the stored image files, and writes everything into a
//! temporary archive. The returned [`ExportArtifact`] owns that temporary
//! file: it is removed when the artifact is delivered or dropped, on success
//! and failure alike.
//!
//! Failures are split the same way throughout:
//! - bad parameters are rejected by [`ExportRequest::from_params`] before any
//!   I/O;
//! - store failures, missing dimensions (YOLO) and annotation id overflow
//!   (COCO) abort before the archive is created;
//! - a stored image file missing from disk is logged, recorded in the
//!   [`ExportReport`], and skipped;
//! - archive write failures abort the export and discard the partial archive.

pub mod archive;
pub mod coco;
pub mod report;
pub mod request;
pub mod yolo;

pub use archive::ArchiveBuilder;
pub use report::ExportReport;
pub use request::{ExportFormat, ExportRequest};

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::SprucelabelError;
use crate::model::{ImageRecord, ImageWithAnnotations};
use crate::store::ImageStore;

/// Archive entry name of the COCO document.
pub const COCO_ENTRY_NAME: &str = "annotations.json";

/// Environment-independent knobs for one export run.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Directory for the temporary archive.
    pub exports_dir: PathBuf,
    /// Timestamp used for the archive name and COCO `date_created`.
    pub now: DateTime<Utc>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            exports_dir: std::env::temp_dir(),
            now: Utc::now(),
        }
    }
}

impl ExportOptions {
    /// Options writing temporary archives into `exports_dir`.
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
            ..Default::default()
        }
    }

    /// Pins the export timestamp.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// A finished archive waiting to be delivered.
///
/// The bytes live in a temporary file that is deleted when the artifact is
/// dropped or delivered.
#[derive(Debug)]
pub struct ExportArtifact {
    file_name: String,
    temp: NamedTempFile,
    report: ExportReport,
}

impl ExportArtifact {
    /// Download name, `<format>-export_<unix millis>.zip`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Summary of the archive contents.
    pub fn report(&self) -> &ExportReport {
        &self.report
    }

    /// Location of the temporary archive.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Streams the archive into `writer`, then deletes the temporary file
    /// whether or not the copy succeeded.
    pub fn deliver_to<W: Write + ?Sized>(mut self, writer: &mut W) -> Result<u64, SprucelabelError> {
        let result = self.copy_out(writer);

        let path = self.temp.path().to_path_buf();
        if let Err(err) = self.temp.close() {
            warn!(path = %path.display(), error = %err, "failed to remove temporary archive");
        }

        match &result {
            Ok(bytes) => info!(file = %self.file_name, bytes, "delivered export archive"),
            Err(err) => warn!(file = %self.file_name, error = %err, "export delivery failed"),
        }
        result
    }

    /// Delivers the archive to `<dir>/<file_name>` and returns that path.
    ///
    /// An existing file of that name is never replaced; the call fails with
    /// [`SprucelabelError::Io`] (`AlreadyExists`) and the temporary archive is
    /// discarded. A partially written destination file is removed on failure.
    pub fn persist_into(self, dir: &Path) -> Result<PathBuf, SprucelabelError> {
        fs::create_dir_all(dir)?;
        let dest = dir.join(&self.file_name);
        let file = OpenOptions::new().write(true).create_new(true).open(&dest)?;

        match self.deliver_to(&mut BufWriter::new(file)) {
            Ok(_) => Ok(dest),
            Err(err) => {
                let _ = fs::remove_file(&dest);
                Err(err)
            }
        }
    }

    fn copy_out<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64, SprucelabelError> {
        let file = self.temp.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        let copied = io::copy(file, writer)?;
        writer.flush()?;
        Ok(copied)
    }
}

/// Runs an export and returns the finished archive.
pub fn export_dataset<S: ImageStore + ?Sized>(
    store: &S,
    request: &ExportRequest,
    options: &ExportOptions,
) -> Result<ExportArtifact, SprucelabelError> {
    info!(
        format = %request.format,
        image_ids = ?request.image_ids,
        include_images = request.include_images,
        "starting export"
    );

    let images = store.list_images(request.id_filter())?;
    debug!(count = images.len(), "resolved images");

    // Encode or check everything that can fail before the archive exists.
    let payload = match request.format {
        ExportFormat::Yolo => Payload::Yolo(label_dimensions(&images)?),
        ExportFormat::Coco => {
            let document = coco::encode(&images, options.now)?;
            Payload::Coco(coco::to_coco_string(&document)?)
        }
    };

    let file_name = request.archive_file_name(options.now);
    let mut report = ExportReport {
        format: request.format.name().to_string(),
        file_name: file_name.clone(),
        images: images.len(),
        annotations: images.iter().map(|img| img.annotations.len()).sum(),
        ..Default::default()
    };

    fs::create_dir_all(&options.exports_dir)?;
    let temp = tempfile::Builder::new()
        .prefix(&format!("{}-export_", request.format))
        .suffix(".zip")
        .tempfile_in(&options.exports_dir)?;
    debug!(path = %temp.path().display(), "writing temporary archive");

    let mut builder = ArchiveBuilder::new(BufWriter::new(temp));

    match payload {
        Payload::Yolo(dimensions) => {
            for (entry, (width, height)) in images.iter().zip(dimensions) {
                let labels = yolo::encode_labels(&entry.annotations, width, height);
                builder.add_bytes(&entry.image.label_file_name(), labels.as_bytes())?;
                report.label_entries += 1;

                if request.include_images {
                    add_stored_image(store, &mut builder, &entry.image, &mut report)?;
                }
            }
        }
        Payload::Coco(json) => {
            builder.add_bytes(COCO_ENTRY_NAME, json.as_bytes())?;
            report.label_entries += 1;

            if request.include_images {
                for entry in &images {
                    add_stored_image(store, &mut builder, &entry.image, &mut report)?;
                }
            }
        }
    }

    let temp = builder
        .finish()?
        .into_inner()
        .map_err(|err| SprucelabelError::Io(err.into_error()))?;
    report.archive_bytes = temp.as_file().metadata()?.len();

    info!(
        file = %file_name,
        images = report.images,
        annotations = report.annotations,
        image_entries = report.image_entries,
        missing = report.missing_images.len(),
        bytes = report.archive_bytes,
        "export archive ready"
    );

    Ok(ExportArtifact {
        file_name,
        temp,
        report,
    })
}

enum Payload {
    /// Pixel dimensions per image, aligned with the image list.
    Yolo(Vec<(u32, u32)>),
    /// Serialized COCO document.
    Coco(String),
}

fn label_dimensions(images: &[ImageWithAnnotations]) -> Result<Vec<(u32, u32)>, SprucelabelError> {
    images
        .iter()
        .map(|entry| {
            entry
                .image
                .dimensions()
                .ok_or_else(|| SprucelabelError::MissingImageDimensions {
                    image_id: entry.image.id.as_u64(),
                    file_path: entry.image.file_path.clone(),
                })
        })
        .collect()
}

fn add_stored_image<S: ImageStore + ?Sized, W: Write + Seek>(
    store: &S,
    builder: &mut ArchiveBuilder<W>,
    image: &ImageRecord,
    report: &mut ExportReport,
) -> Result<(), SprucelabelError> {
    match store.open_image(image)? {
        Some(mut reader) => {
            builder.add_reader(image.stored_file_name(), &mut reader)?;
            report.image_entries += 1;
        }
        None => {
            warn!(image_id = %image.id, path = %image.file_path, "image file not found; skipping");
            report.missing_images.push(image.file_path.clone());
        }
    }
    Ok(())
}
