#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use sprucelabel::model::{AnnotationRecord, ImageRecord, ImageWithAnnotations, PixelBox};

/// Largest error a six-digit YOLO value can carry once scaled back to
/// pixels.
pub fn eps_yolo(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-6
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_dimensions() -> BoxedStrategy<(u32, u32)> {
    (1u32..=10_000, 1u32..=10_000).boxed()
}

/// Boxes anywhere in a generous range, including ones hanging off the
/// image or with non-positive size.
pub fn arb_pixel_box() -> BoxedStrategy<PixelBox> {
    (-5_000i32..=15_000, -5_000i32..=15_000, -100i32..=10_000, -100i32..=10_000)
        .prop_map(|(x, y, w, h)| PixelBox::new(x, y, w, h))
        .boxed()
}

pub fn arb_bbox_within(width: u32, height: u32) -> BoxedStrategy<PixelBox> {
    let (w, h) = (width as i32, height as i32);
    (0..w, 0..h)
        .prop_flat_map(move |(x, y)| (Just(x), Just(y), 1..=(w - x), 1..=(h - y)))
        .prop_map(|(x, y, bw, bh)| PixelBox::new(x, y, bw, bh))
        .boxed()
}

pub fn arb_label_class() -> BoxedStrategy<Option<u8>> {
    prop_oneof![
        3 => (0u8..=3).prop_map(Some),
        1 => Just(None),
    ]
    .boxed()
}

/// Annotations for one image, all inside it.
pub fn arb_annotations(
    image_id: u64,
    width: u32,
    height: u32,
    max_anns: usize,
) -> BoxedStrategy<Vec<AnnotationRecord>> {
    proptest::collection::vec((arb_bbox_within(width, height), arb_label_class()), 0..=max_anns)
        .prop_map(move |boxes| {
            boxes
                .into_iter()
                .enumerate()
                .map(|(idx, (bbox, class))| {
                    AnnotationRecord::new(image_id * 10_000 + idx as u64 + 1, image_id, bbox)
                        .with_label_class(class)
                })
                .collect()
        })
        .boxed()
}

/// A list of images with unique ids, each with up to `max_anns` boxes.
pub fn arb_images(max_images: usize, max_anns: usize) -> BoxedStrategy<Vec<ImageWithAnnotations>> {
    proptest::collection::btree_set(1u64..=100_000, 0..=max_images)
        .prop_flat_map(move |ids: BTreeSet<u64>| {
            ids.into_iter()
                .map(|id| {
                    (2u32..=4096, 2u32..=4096)
                        .prop_flat_map(move |(w, h)| {
                            arb_annotations(id, w, h, max_anns).prop_map(move |anns| {
                                ImageWithAnnotations::new(
                                    ImageRecord::new(id, format!("uploads/images/image-{id}.tif"), w, h),
                                    anns,
                                )
                            })
                        })
                        .boxed()
                })
                .collect::<Vec<_>>()
        })
        .boxed()
}
