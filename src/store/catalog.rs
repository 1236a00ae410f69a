//! JSON-catalog-backed image store.
//!
//! A catalog is a dump of the image and annotation tables:
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "image_id": 1,
//!       "filename": "harz_tile.tif",
//!       "file_path": "uploads/images/image-1712-42.tif",
//!       "image_width": 1000,
//!       "image_height": 800,
//!       "annotations": [
//!         { "annotation_id": 1, "image_id": 1, "x": 100, "y": 200, "width": 50, "height": 60, "label_class": 0 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Stored `file_path`s are resolved against a storage root, by default the
//! directory holding the catalog.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ImageStore;
use crate::error::SprucelabelError;
use crate::model::{ImageId, ImageRecord, ImageWithAnnotations};

/// Top-level catalog document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub images: Vec<ImageWithAnnotations>,
}

impl Catalog {
    /// Reads a catalog file.
    pub fn read(path: &Path) -> Result<Self, SprucelabelError> {
        let data = fs::read(path).map_err(|source| SprucelabelError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| SprucelabelError::CatalogParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total number of annotations across all images.
    pub fn annotation_count(&self) -> usize {
        self.images.iter().map(|img| img.annotations.len()).sum()
    }
}

/// An [`ImageStore`] over an in-memory [`Catalog`] and a storage directory.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    catalog: Catalog,
    storage_root: PathBuf,
}

impl CatalogStore {
    /// Loads the catalog at `path`, using its directory as storage root.
    pub fn open(path: &Path) -> Result<Self, SprucelabelError> {
        let catalog = Catalog::read(path)?;
        let storage_root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::from_catalog(catalog, storage_root))
    }

    /// Wraps an already-loaded catalog.
    ///
    /// Images are ordered by id and annotations by annotation id.
    /// Annotations nested under an image they do not belong to are dropped.
    pub fn from_catalog(mut catalog: Catalog, storage_root: impl Into<PathBuf>) -> Self {
        catalog.images.sort_by_key(|entry| entry.image.id);
        for entry in &mut catalog.images {
            let image_id = entry.image.id;
            entry.annotations.retain(|ann| {
                let keep = ann.image_id == image_id;
                if !keep {
                    warn!(
                        annotation_id = %ann.id,
                        annotation_image_id = %ann.image_id,
                        image_id = %image_id,
                        "dropping annotation nested under the wrong image"
                    );
                }
                keep
            });
            entry.annotations.sort_by_key(|ann| ann.id);
        }

        Self {
            catalog,
            storage_root: storage_root.into(),
        }
    }

    /// Resolves stored paths against `root` instead.
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// The normalized catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Where the stored file of `image` is expected on disk.
    pub fn image_path(&self, image: &ImageRecord) -> PathBuf {
        self.storage_root.join(&image.file_path)
    }

    /// Fills in missing dimensions by reading the stored file's header.
    fn backfill_dimensions(&self, image: &mut ImageRecord) {
        if image.width.is_some() && image.height.is_some() {
            return;
        }

        let path = self.image_path(image);
        match imagesize::size(&path) {
            Ok(size) => {
                if let (Ok(w), Ok(h)) = (u32::try_from(size.width), u32::try_from(size.height)) {
                    debug!(image_id = %image.id, width = w, height = h, "measured image dimensions");
                    image.width = Some(w);
                    image.height = Some(h);
                }
            }
            Err(err) => {
                debug!(image_id = %image.id, path = %path.display(), error = %err, "could not measure image");
            }
        }
    }
}

impl ImageStore for CatalogStore {
    fn list_images(
        &self,
        ids: Option<&BTreeSet<ImageId>>,
    ) -> Result<Vec<ImageWithAnnotations>, SprucelabelError> {
        let mut selected: Vec<ImageWithAnnotations> = self
            .catalog
            .images
            .iter()
            .filter(|entry| ids.map_or(true, |ids| ids.contains(&entry.image.id)))
            .cloned()
            .collect();

        for entry in &mut selected {
            self.backfill_dimensions(&mut entry.image);
        }

        Ok(selected)
    }

    fn open_image(&self, image: &ImageRecord) -> Result<Option<Box<dyn Read>>, SprucelabelError> {
        match File::open(self.image_path(image)) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SprucelabelError::Io(err)),
        }
    }
}
