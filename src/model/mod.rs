//! Records and geometry shared by the store, the validators and the
//! export encoders.
//!
//! Boxes are stored the way annotators draw them (top-left corner plus size
//! in integer pixels). YOLO needs them normalized to the image size, COCO
//! takes them verbatim.
//!
//! # Example
//!
//! ```
//! use sprucelabel::model::{AnnotationRecord, ImageRecord, ImageWithAnnotations, PixelBox};
//!
//! let image = ImageWithAnnotations::new(
//!     ImageRecord::new(1u64, "uploads/images/tile.tif", 1000, 800),
//!     vec![AnnotationRecord::new(1u64, 1u64, PixelBox::new(100, 200, 50, 60))],
//! );
//! assert_eq!(image.image.label_file_name(), "tile.txt");
//! ```

mod bbox;
mod ids;
mod record;

pub use bbox::{PixelBox, YoloBox};
pub use ids::{AnnotationId, ImageId};
pub use record::{
    AnnotationRecord, ImageRecord, ImageWithAnnotations, DEFAULT_CRS, LABEL_EXTENSION,
};
