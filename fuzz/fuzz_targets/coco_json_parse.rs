//! Feeds arbitrary bytes to the COCO document reader used on exported
//! `annotations.json` entries.
//!
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use sprucelabel::export::coco::{from_coco_slice, to_coco_string};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Anything that parses must serialize again.
    if let Ok(document) = from_coco_slice(data) {
        let _ = to_coco_string(&document);
    }
});
