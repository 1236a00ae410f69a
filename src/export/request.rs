//! Validated export parameters.
//!
//! Callers hand over raw optional strings (query parameters, CLI flags);
//! [`ExportRequest::from_params`] turns them into a typed request or rejects
//! them before any file is touched.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::SprucelabelError;
use crate::model::ImageId;

/// Label format of an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// One normalized `.txt` label file per image.
    #[default]
    Yolo,
    /// One `annotations.json` for the whole selection.
    Coco,
}

impl ExportFormat {
    /// Lower-case name, as used in parameters and archive names.
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Yolo => "yolo",
            ExportFormat::Coco => "coco",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = SprucelabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yolo" => Ok(ExportFormat::Yolo),
            "coco" => Ok(ExportFormat::Coco),
            _ => Err(SprucelabelError::UnsupportedFormat(format!(
                "'{}' (supported: yolo, coco)",
                s
            ))),
        }
    }
}

/// What to export and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
    /// Images to export; empty means every image.
    pub image_ids: BTreeSet<ImageId>,
    pub format: ExportFormat,
    /// Embed the stored image files next to the labels.
    pub include_images: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            image_ids: BTreeSet::new(),
            format: ExportFormat::Yolo,
            include_images: true,
        }
    }
}

impl ExportRequest {
    /// Creates a request for every image in `format`, images included.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Restricts the export to `ids`.
    pub fn with_image_ids(mut self, ids: impl IntoIterator<Item = impl Into<ImageId>>) -> Self {
        self.image_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether stored image files are embedded.
    pub fn with_include_images(mut self, include_images: bool) -> Self {
        self.include_images = include_images;
        self
    }

    /// Builds a request from raw parameter strings.
    ///
    /// - `image_ids`: comma-separated integers; entries that do not parse are
    ///   dropped. Missing or empty selects every image.
    /// - `include_images`: `true`/`false`/`1`/`0`/`yes`/`no`, default `true`.
    /// - `format`: `yolo` or `coco` (any case), default `yolo`.
    pub fn from_params(
        image_ids: Option<&str>,
        include_images: Option<&str>,
        format: Option<&str>,
    ) -> Result<Self, SprucelabelError> {
        let format = match format {
            Some(raw) => raw.parse()?,
            None => ExportFormat::default(),
        };
        let include_images = match include_images {
            Some(raw) => parse_flag("include_images", raw)?,
            None => true,
        };
        let image_ids = image_ids.map(parse_image_ids).unwrap_or_default();

        Ok(Self {
            image_ids,
            format,
            include_images,
        })
    }

    /// The id filter to hand to a store; `None` when all images are wanted.
    pub fn id_filter(&self) -> Option<&BTreeSet<ImageId>> {
        if self.image_ids.is_empty() {
            None
        } else {
            Some(&self.image_ids)
        }
    }

    /// Download name of the archive, `<format>-export_<unix millis>.zip`.
    pub fn archive_file_name(&self, now: DateTime<Utc>) -> String {
        format!("{}-export_{}.zip", self.format, now.timestamp_millis())
    }
}

/// Parses a comma-separated id list, silently dropping invalid entries.
pub fn parse_image_ids(raw: &str) -> BTreeSet<ImageId> {
    raw.split(',')
        .filter_map(|token| token.trim().parse::<u64>().ok())
        .map(ImageId::new)
        .collect()
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, SprucelabelError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SprucelabelError::InvalidParameter {
            name,
            message: format!("'{}' is not a boolean (use true or false)", raw),
        }),
    }
}
