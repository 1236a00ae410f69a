//! COCO JSON encoder for the exported dataset.
//!
//! COCO boxes are `[x, y, width, height]` with `(x, y)` the top-left corner in
//! pixels, which is exactly how annotations are stored, so no coordinate
//! conversion happens here.
//!
//! # Annotation ids
//!
//! The annotation at zero-based position `i` on image `image_id` gets id
//! `image_id * 1000 + i + 1`. Existing consumers of these exports have seen
//! these ids, so the scheme is kept. Every id of an image stays inside its
//! block `image_id * 1000 + 1 ..= image_id * 1000 + 999`, so `id / 1000`
//! names the image. An image with more than [`MAX_ANNOTATIONS_PER_IMAGE`]
//! annotations would spill into the next block, and encoding fails with
//! [`SprucelabelError::AnnotationIdOverflow`] instead.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SprucelabelError;
use crate::model::ImageWithAnnotations;

/// Most annotations one image can carry while all of its derived ids keep
/// `id / 1000 == image_id`.
pub const MAX_ANNOTATIONS_PER_IMAGE: usize = 999;

const ANNOTATION_ID_STRIDE: u64 = 1000;

/// Category id of the single exported class.
pub const DEAD_SPRUCE_CATEGORY_ID: u64 = 1;

const LICENSE_ID: u64 = 1;

/// Top-level COCO document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoDocument {
    pub info: CocoInfo,
    pub licenses: Vec<CocoLicense>,
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

/// COCO dataset info block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoInfo {
    pub year: i32,
    pub version: String,
    pub description: String,
    pub contributor: String,
    pub url: String,
    pub date_created: String,
}

/// COCO license entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoLicense {
    pub id: u64,
    pub name: String,
    pub url: String,
}

/// COCO image entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_name: String,
    pub license: u64,
    #[serde(default)]
    pub flickr_url: String,
    #[serde(default)]
    pub coco_url: String,
    pub date_captured: String,
}

/// COCO annotation entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    /// `[x, y, width, height]` in pixels.
    pub bbox: [i64; 4],
    pub area: i64,
    /// Always empty: annotations are boxes only.
    #[serde(default)]
    pub segmentation: Vec<serde_json::Value>,
    pub iscrowd: u8,
}

/// COCO category entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
    pub supercategory: String,
}

/// Builds the COCO document for `images`, in input order.
///
/// `created_at` fills `info.date_created` and stands in for `date_captured`
/// on images without an upload timestamp.
pub fn encode(
    images: &[ImageWithAnnotations],
    created_at: DateTime<Utc>,
) -> Result<CocoDocument, SprucelabelError> {
    let created = iso_timestamp(created_at);

    let mut coco_images = Vec::with_capacity(images.len());
    let mut coco_annotations = Vec::new();

    for entry in images {
        let image = &entry.image;
        let image_id = image.id.as_u64();

        coco_images.push(CocoImage {
            id: image_id,
            width: image.width,
            height: image.height,
            file_name: image.stored_file_name().to_string(),
            license: LICENSE_ID,
            flickr_url: String::new(),
            coco_url: String::new(),
            date_captured: image
                .uploaded_at
                .map(iso_timestamp)
                .unwrap_or_else(|| created.clone()),
        });

        for (index, ann) in entry.annotations.iter().enumerate() {
            let (x, y, w, h) = (ann.bbox.x, ann.bbox.y, ann.bbox.width, ann.bbox.height);
            coco_annotations.push(CocoAnnotation {
                id: annotation_id(image_id, index, entry.annotations.len())?,
                image_id,
                category_id: category_id_for(ann.label_class),
                bbox: [x.into(), y.into(), w.into(), h.into()],
                area: ann.bbox.area(),
                segmentation: Vec::new(),
                iscrowd: 0,
            });
        }
    }

    Ok(CocoDocument {
        info: CocoInfo {
            year: created_at.year(),
            version: "1.0".to_string(),
            description: "Annotations exported from Spruce Detection System".to_string(),
            contributor: "Spruce Detection Team".to_string(),
            url: String::new(),
            date_created: created,
        },
        licenses: vec![CocoLicense {
            id: LICENSE_ID,
            name: "CC BY 4.0".to_string(),
            url: "https://creativecommons.org/licenses/by/4.0/".to_string(),
        }],
        images: coco_images,
        annotations: coco_annotations,
        categories: vec![CocoCategory {
            id: DEAD_SPRUCE_CATEGORY_ID,
            name: "dead_spruce".to_string(),
            supercategory: "tree".to_string(),
        }],
    })
}

/// Derived annotation id, `image_id * 1000 + index + 1`.
///
/// `count` is the number of annotations on the image; any image with more
/// than [`MAX_ANNOTATIONS_PER_IMAGE`] is rejected as a whole.
pub fn annotation_id(image_id: u64, index: usize, count: usize) -> Result<u64, SprucelabelError> {
    let overflow = || SprucelabelError::AnnotationIdOverflow { image_id, count };
    if count > MAX_ANNOTATIONS_PER_IMAGE {
        return Err(overflow());
    }
    image_id
        .checked_mul(ANNOTATION_ID_STRIDE)
        .and_then(|base| base.checked_add(index as u64 + 1))
        .ok_or_else(overflow)
}

/// Category id written for a `label_class`.
///
/// Class `0` and a missing class both map to category 1. Only category 1
/// is declared in the document, so any other class produces an annotation
/// whose category is not listed.
pub fn category_id_for(label_class: Option<u8>) -> u64 {
    match label_class {
        Some(class) if class != 0 => u64::from(class),
        _ => DEAD_SPRUCE_CATEGORY_ID,
    }
}

/// Serializes a document as pretty JSON (two-space indentation).
pub fn to_coco_string(document: &CocoDocument) -> Result<String, SprucelabelError> {
    serde_json::to_string_pretty(document).map_err(SprucelabelError::CocoJsonWrite)
}

/// Parses a COCO document written by [`to_coco_string`].
pub fn from_coco_str(json: &str) -> Result<CocoDocument, SprucelabelError> {
    serde_json::from_str(json).map_err(SprucelabelError::CocoJsonParse)
}

/// Parses a COCO document from raw bytes.
///
/// Useful for fuzzing and reading archive entries without a UTF-8 pass.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, SprucelabelError> {
    serde_json::from_slice(bytes).map_err(SprucelabelError::CocoJsonParse)
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
