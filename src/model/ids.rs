//! Newtype IDs for images and annotations.
//!
//! COCO annotation ids are derived from image ids, so the two must never be
//! mixed up; separate types make that a compile error.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the primary key value.
            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

record_id! {
    /// Primary key of an uploaded image (`image_id` column).
    ImageId
}

record_id! {
    /// Primary key of a stored bounding box (`annotation_id` column).
    AnnotationId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_numerically() {
        assert!(ImageId(2) < ImageId(10));
        assert!(AnnotationId(10) > AnnotationId(5));
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&ImageId(42)).expect("serialize");
        assert_eq!(json, "42");
        let back: AnnotationId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(back, AnnotationId(7));
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", ImageId(3)), "ImageId(3)");
        assert_eq!(format!("{:?}", AnnotationId(4)), "AnnotationId(4)");
        assert_eq!(ImageId::from(5).to_string(), "5");
    }
}
