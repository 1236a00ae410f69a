//! Data access for the export pipeline.
//!
//! The pipeline never mutates anything: it lists images with their
//! annotations and reads stored image files. [`ImageStore`] is that seam;
//! [`CatalogStore`] backs it with a JSON catalog plus a storage directory.

mod catalog;

pub use catalog::{Catalog, CatalogStore};

use std::collections::BTreeSet;
use std::io::Read;

use crate::error::SprucelabelError;
use crate::model::{ImageId, ImageRecord, ImageWithAnnotations};

/// Read-only access to images, their annotations and their stored files.
pub trait ImageStore {
    /// Lists images ordered by id, each with its annotations ordered by
    /// annotation id.
    ///
    /// `None` selects every image. Ids with no matching image are simply
    /// absent from the result.
    fn list_images(
        &self,
        ids: Option<&BTreeSet<ImageId>>,
    ) -> Result<Vec<ImageWithAnnotations>, SprucelabelError>;

    /// Opens the stored file behind `image`, or `Ok(None)` if it is not
    /// on disk.
    fn open_image(&self, image: &ImageRecord) -> Result<Option<Box<dyn Read>>, SprucelabelError>;
}
