use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for sprucelabel operations.
#[derive(Debug, Error)]
pub enum SprucelabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Failed to read image catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse image catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Image {image_id} ({file_path}) has no usable pixel dimensions; YOLO export needs width and height")]
    MissingImageDimensions { image_id: u64, file_path: String },

    #[error("Image {image_id} has {count} annotations; derived COCO ids stay within the image's id block only up to 999")]
    AnnotationIdOverflow { image_id: u64, count: usize },

    #[error("YOLO label parse error at line {line}: {message}")]
    YoloLabelParse { line: usize, message: String },

    #[error("Failed to write COCO JSON: {0}")]
    CocoJsonWrite(#[source] serde_json::Error),

    #[error("Failed to parse COCO JSON: {0}")]
    CocoJsonParse(#[source] serde_json::Error),

    #[error("Failed to render JSON report: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Archive already contains an entry named '{0}'")]
    DuplicateArchiveEntry(String),

    #[error("Archive write failed: {0}")]
    ArchiveWrite(#[from] zip::result::ZipError),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

impl SprucelabelError {
    /// Stable, machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            SprucelabelError::Io(_) => "io_error",
            SprucelabelError::UnsupportedFormat(_) => "unsupported_format",
            SprucelabelError::InvalidParameter { .. } => "invalid_parameter",
            SprucelabelError::CatalogRead { .. } => "catalog_read_failed",
            SprucelabelError::CatalogParse { .. } => "catalog_parse_failed",
            SprucelabelError::MissingImageDimensions { .. } => "missing_image_dimensions",
            SprucelabelError::AnnotationIdOverflow { .. } => "annotation_id_overflow",
            SprucelabelError::YoloLabelParse { .. } => "yolo_label_parse_failed",
            SprucelabelError::CocoJsonWrite(_) => "coco_json_write_failed",
            SprucelabelError::CocoJsonParse(_) => "coco_json_parse_failed",
            SprucelabelError::ReportJson(_) => "report_render_failed",
            SprucelabelError::DuplicateArchiveEntry(_) => "duplicate_archive_entry",
            SprucelabelError::ArchiveWrite(_) => "archive_write_failed",
            SprucelabelError::ValidationFailed { .. } => "validation_failed",
        }
    }

    /// Returns true for failures caused by the request itself rather than
    /// by the catalog, the filesystem, or the archive writer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SprucelabelError::UnsupportedFormat(_) | SprucelabelError::InvalidParameter { .. }
        )
    }

    /// Builds the structured failure payload reported to callers.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            success: false,
            error: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Structured failure payload, serialized as
/// `{"success": false, "error": "...", "message": "..."}`.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorPayload {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_names_failure_and_message() {
        let err = SprucelabelError::UnsupportedFormat("'voc' (supported: yolo, coco)".into());
        let payload = err.to_payload();

        assert!(!payload.success);
        assert_eq!(payload.error, "unsupported_format");
        assert!(payload.message.contains("voc"));

        let json = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "unsupported_format");
    }

    #[test]
    fn client_errors_are_request_problems_only() {
        assert!(SprucelabelError::UnsupportedFormat("x".into()).is_client_error());
        assert!(SprucelabelError::InvalidParameter {
            name: "include_images",
            message: "maybe".into()
        }
        .is_client_error());
        assert!(!SprucelabelError::DuplicateArchiveEntry("a.txt".into()).is_client_error());
    }
}
