//! Catalog validation for sprucelabel.
//!
//! Checks a catalog for problems that would make an export fail or come out
//! wrong:
//! - Structural integrity (unique IDs, annotations under the right image)
//! - Export blockers (missing dimensions, colliding archive entry names,
//!   more annotations than COCO ids allow)
//! - Geometric oddities (empty boxes, boxes outside the image)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashMap;

use crate::export::coco::MAX_ANNOTATIONS_PER_IMAGE;
use crate::model::{AnnotationId, ImageId, ImageWithAnnotations};

/// How strictly a catalog is judged.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// Fail on warnings too.
    pub strict: bool,
}

/// Validates catalog images and returns a report of all issues found.
///
/// In strict mode every warning is reported as an error.
pub fn validate_catalog(images: &[ImageWithAnnotations], opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_images(images, &mut report);
    validate_entry_names(images, &mut report);
    validate_annotations(images, &mut report);

    if opts.strict {
        for issue in &mut report.issues {
            issue.severity = Severity::Error;
        }
    }

    report
}

/// Validates image records.
fn validate_images(images: &[ImageWithAnnotations], report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ImageId, usize> = HashMap::new();

    for (idx, entry) in images.iter().enumerate() {
        let image = &entry.image;
        let id = image.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "Image ID {} already used by catalog entry {}",
                    id, first_idx
                ),
                IssueContext::Image { id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.dimensions().is_none() {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Missing or zero dimensions {}x{}; YOLO export cannot normalize its boxes",
                    display_dim(image.width),
                    display_dim(image.height)
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_path.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFilePath,
                "Empty stored file path",
                IssueContext::Image { id },
            ));
        }

        if entry.annotations.len() > MAX_ANNOTATIONS_PER_IMAGE {
            report.add(ValidationIssue::error(
                IssueCode::AnnotationIdOverflow,
                format!(
                    "{} annotations; COCO export allows at most {} per image",
                    entry.annotations.len(),
                    MAX_ANNOTATIONS_PER_IMAGE
                ),
                IssueContext::Image { id },
            ));
        }
    }
}

/// Checks that archive entry names derived from stored paths stay unique.
fn validate_entry_names(images: &[ImageWithAnnotations], report: &mut ValidationReport) {
    let mut owners: HashMap<String, ImageId> = HashMap::new();

    for entry in images {
        let image = &entry.image;
        let stored = image.stored_file_name().to_string();
        let label = image.label_file_name();

        let names = if stored == label {
            vec![stored]
        } else {
            vec![stored, label]
        };

        for name in names {
            match owners.get(&name) {
                Some(owner) if *owner != image.id => {
                    report.add(ValidationIssue::error(
                        IssueCode::DuplicateEntryName,
                        format!(
                            "Archive entry '{}' would collide with image {}",
                            name, owner
                        ),
                        IssueContext::Image {
                            id: image.id.as_u64(),
                        },
                    ));
                }
                Some(_) => {}
                None => {
                    owners.insert(name, image.id);
                }
            }
        }
    }
}

/// Validates annotations, using their enclosing image for bounds.
fn validate_annotations(images: &[ImageWithAnnotations], report: &mut ValidationReport) {
    let mut seen_ids: HashMap<AnnotationId, ImageId> = HashMap::new();

    for entry in images {
        let image = &entry.image;

        for annotation in &entry.annotations {
            let id = annotation.id.as_u64();

            if let Some(first_image) = seen_ids.get(&annotation.id) {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicateAnnotationId,
                    format!(
                        "Duplicate annotation ID {} (also under image {})",
                        id, first_image
                    ),
                    IssueContext::Annotation { id },
                ));
            } else {
                seen_ids.insert(annotation.id, image.id);
            }

            if annotation.image_id != image.id {
                report.add(ValidationIssue::error(
                    IssueCode::MisplacedAnnotation,
                    format!(
                        "Belongs to image {} but is listed under image {}; it will not be exported",
                        annotation.image_id, image.id
                    ),
                    IssueContext::Annotation { id },
                ));
                continue;
            }

            if annotation.label_class.is_none() {
                report.add(ValidationIssue::warning(
                    IssueCode::MissingLabelClass,
                    "No label class; exported as YOLO class 0 and COCO category 1",
                    IssueContext::Annotation { id },
                ));
            }

            let bbox = &annotation.bbox;
            if !bbox.has_positive_area() {
                report.add(ValidationIssue::warning(
                    IssueCode::InvalidBBoxArea,
                    format!(
                        "Zero or negative size {}x{}",
                        bbox.width, bbox.height
                    ),
                    IssueContext::Annotation { id },
                ));
            }

            if let Some((width, height)) = image.dimensions() {
                if !bbox.is_within(width, height) {
                    report.add(ValidationIssue::warning(
                        IssueCode::BBoxOutOfBounds,
                        format!(
                            "Bounding box ({}, {}, {}x{}) extends outside image bounds (0, 0, {}, {})",
                            bbox.x, bbox.y, bbox.width, bbox.height, width, height
                        ),
                        IssueContext::Annotation { id },
                    ));
                }
            }
        }
    }
}

fn display_dim(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
