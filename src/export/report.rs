//! Summary of a finished export.

use serde::Serialize;
use std::fmt;

/// What went into an export archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Format name (`yolo` or `coco`).
    pub format: String,
    /// Download name of the archive.
    pub file_name: String,
    /// Images selected for export.
    pub images: usize,
    /// Annotations written across all images.
    pub annotations: usize,
    /// Label entries (`.txt` files or `annotations.json`).
    pub label_entries: usize,
    /// Stored image files embedded in the archive.
    pub image_entries: usize,
    /// Stored paths of images that were requested but not found on disk.
    pub missing_images: Vec<String>,
    /// Size of the finished archive in bytes.
    pub archive_bytes: u64,
}

impl ExportReport {
    /// Returns true if every requested image file made it into the archive.
    pub fn is_complete(&self) -> bool {
        self.missing_images.is_empty()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exported {} ({} format)", self.file_name, self.format)?;
        writeln!(
            f,
            "  {} images, {} annotations",
            self.images, self.annotations
        )?;
        writeln!(
            f,
            "  archive: {} label entr{}, {} image file(s), {} bytes",
            self.label_entries,
            if self.label_entries == 1 { "y" } else { "ies" },
            self.image_entries,
            self.archive_bytes
        )?;

        if !self.missing_images.is_empty() {
            writeln!(f)?;
            writeln!(f, "Missing image files ({}):", self.missing_images.len())?;
            for path in &self.missing_images {
                writeln!(f, "  - {}", path)?;
            }
        }

        Ok(())
    }
}
