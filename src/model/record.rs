//! Image and annotation records as the persistence layer stores them.
//!
//! Field names on the wire follow the original table columns (`image_id`,
//! `file_path`, `image_width`, ...), so a catalog dumped straight from the
//! database deserializes without a mapping step.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bbox::PixelBox;
use super::ids::{AnnotationId, ImageId};

/// Coordinate reference system assigned when an upload does not name one.
pub const DEFAULT_CRS: &str = "EPSG:32632";

/// Extension used for YOLO label files.
pub const LABEL_EXTENSION: &str = "txt";

/// An uploaded georeferenced image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Primary key.
    #[serde(rename = "image_id")]
    pub id: ImageId,

    /// Name of the file as the uploader sent it.
    pub filename: String,

    /// Path of the stored file, relative to the storage root.
    pub file_path: String,

    /// Width in pixels. Nullable in the store.
    #[serde(rename = "image_width", default)]
    pub width: Option<u32>,

    /// Height in pixels. Nullable in the store.
    #[serde(rename = "image_height", default)]
    pub height: Option<u32>,

    /// When the imagery was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<DateTime<Utc>>,

    /// Forest region the image covers.
    #[serde(default)]
    pub region: String,

    /// Ground resolution in metres per pixel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,

    /// Coordinate reference system identifier.
    #[serde(default = "default_crs")]
    pub crs: String,

    /// User id of the uploader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<u64>,

    /// Upload timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

fn default_crs() -> String {
    DEFAULT_CRS.to_string()
}

impl ImageRecord {
    /// Creates a record with the fields the export pipeline needs; the
    /// georeferencing metadata is left at its defaults.
    pub fn new(
        id: impl Into<ImageId>,
        file_path: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        let file_path = file_path.into();
        let filename = base_name(&file_path).to_string();
        Self {
            id: id.into(),
            filename,
            file_path,
            width: Some(width),
            height: Some(height),
            capture_date: None,
            region: String::new(),
            resolution: None,
            crs: default_crs(),
            uploaded_by: None,
            uploaded_at: None,
        }
    }

    /// Sets the upload timestamp.
    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(uploaded_at);
        self
    }

    /// Clears the pixel dimensions, as for rows written before they were
    /// measured.
    pub fn without_dimensions(mut self) -> Self {
        self.width = None;
        self.height = None;
        self
    }

    /// Basename of the stored file, e.g. `image-1712-42.tif`.
    pub fn stored_file_name(&self) -> &str {
        base_name(&self.file_path)
    }

    /// Name of this image's YOLO label file: the stored basename with its
    /// extension replaced by `.txt`.
    pub fn label_file_name(&self) -> String {
        Path::new(self.stored_file_name())
            .with_extension(LABEL_EXTENSION)
            .to_string_lossy()
            .into_owned()
    }

    /// Returns `(width, height)` when both are known and non-zero.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// A bounding box drawn on an image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Primary key.
    #[serde(rename = "annotation_id")]
    pub id: AnnotationId,

    /// Image the box was drawn on.
    pub image_id: ImageId,

    /// Annotator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    /// Box in pixel space, stored as flat `x`, `y`, `width`, `height` columns.
    #[serde(flatten)]
    pub bbox: PixelBox,

    /// Category index. A missing column reads as the store default (0);
    /// an explicit `null` stays `None`.
    #[serde(default = "default_label_class")]
    pub label_class: Option<u8>,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_label_class() -> Option<u8> {
    Some(0)
}

impl AnnotationRecord {
    /// Creates an annotation with class 0.
    pub fn new(id: impl Into<AnnotationId>, image_id: impl Into<ImageId>, bbox: PixelBox) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            user_id: None,
            bbox,
            label_class: default_label_class(),
            created_at: None,
        }
    }

    /// Sets the category index.
    pub fn with_label_class(mut self, label_class: Option<u8>) -> Self {
        self.label_class = label_class;
        self
    }
}

/// An image together with its ordered annotations, the unit the data-access
/// layer hands to the export pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageWithAnnotations {
    #[serde(flatten)]
    pub image: ImageRecord,

    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
}

impl ImageWithAnnotations {
    pub fn new(image: ImageRecord, annotations: Vec<AnnotationRecord>) -> Self {
        Self { image, annotations }
    }
}

fn base_name(path: &str) -> &str {
    // Stored paths may come from either platform.
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
