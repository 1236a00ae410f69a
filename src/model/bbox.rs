//! Bounding box types: the stored pixel box and the YOLO normalized box.

use serde::{Deserialize, Serialize};

/// An axis-aligned box as annotators draw it: top-left corner plus size,
/// in integer pixels.
///
/// Note: nothing here enforces positive sizes or that the box lies inside
/// the image. Such boxes are exported as-is; validation reports them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelBox {
    /// Creates a new box from its top-left corner and size.
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the area in square pixels.
    ///
    /// May be zero or negative if the box is malformed.
    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Returns true if the box has a strictly positive width and height.
    #[inline]
    pub fn has_positive_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns true if the box lies entirely inside a `image_width` x
    /// `image_height` image.
    pub fn is_within(&self, image_width: u32, image_height: u32) -> bool {
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        self.x >= 0
            && self.y >= 0
            && right <= i64::from(image_width)
            && bottom <= i64::from(image_height)
    }

    /// Converts to YOLO normalized center form.
    ///
    /// Results are not clamped: a box hanging off the image edge produces
    /// values outside `[0, 1]`. Callers must ensure both dimensions are
    /// non-zero.
    pub fn to_yolo(&self, image_width: u32, image_height: u32) -> YoloBox {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let (img_w, img_h) = (f64::from(image_width), f64::from(image_height));

        YoloBox {
            x_center: (x + w / 2.0) / img_w,
            y_center: (y + h / 2.0) / img_h,
            width: w / img_w,
            height: h / img_h,
        }
    }
}

/// A box in YOLO's normalized center form, as fractions of the image size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct YoloBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBox {
    /// Maps back to pixel space, returning `(x, y, width, height)` with
    /// `(x, y)` the top-left corner. Values are left fractional.
    pub fn to_pixel(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let (img_w, img_h) = (f64::from(image_width), f64::from(image_height));
        let w = self.width * img_w;
        let h = self.height * img_h;
        let x = self.x_center * img_w - w / 2.0;
        let y = self.y_center * img_h - h / 2.0;
        (x, y, w, h)
    }

    /// Returns true if all four values are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x_center.is_finite()
            && self.y_center.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}
