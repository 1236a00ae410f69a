#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use sprucelabel::model::{AnnotationRecord, ImageRecord, ImageWithAnnotations, PixelBox};
use sprucelabel::store::Catalog;
use zip::ZipArchive;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

pub fn write_catalog(path: &Path, images: Vec<ImageWithAnnotations>) {
    let catalog = Catalog { images };
    let json = serde_json::to_string_pretty(&catalog).expect("serialize catalog");
    fs::write(path, json).expect("write catalog");
}

/// Two annotated images and one without boxes, stored as BMPs under
/// `uploads/images/`.
pub fn sample_images() -> Vec<ImageWithAnnotations> {
    vec![
        ImageWithAnnotations::new(
            ImageRecord::new(1u64, "uploads/images/image-1-a.bmp", 1000, 800),
            vec![
                AnnotationRecord::new(1u64, 1u64, PixelBox::new(100, 200, 50, 60)),
                AnnotationRecord::new(2u64, 1u64, PixelBox::new(400, 300, 80, 40))
                    .with_label_class(Some(1)),
            ],
        ),
        ImageWithAnnotations::new(
            ImageRecord::new(2u64, "uploads/images/image-2-b.bmp", 640, 480),
            vec![AnnotationRecord::new(3u64, 2u64, PixelBox::new(0, 0, 640, 480))],
        ),
        ImageWithAnnotations::new(
            ImageRecord::new(3u64, "uploads/images/image-3-c.bmp", 320, 240),
            vec![],
        ),
    ]
}

/// Writes the sample catalog plus its stored files under `root` and
/// returns the catalog path.
pub fn write_sample_store(root: &Path) -> std::path::PathBuf {
    let images = sample_images();
    for entry in &images {
        let (w, h) = entry.image.dimensions().expect("sample dimensions");
        write_bmp(&root.join(&entry.image.file_path), w, h);
    }
    let catalog = root.join("catalog.json");
    write_catalog(&catalog, images);
    catalog
}

/// Reads every entry of a ZIP file, in archive order.
pub fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).expect("open archive");
    let mut archive = ZipArchive::new(file).expect("read archive");
    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("archive entry");
        let mut data = Vec::new();
        entry.read_to_end(&mut data).expect("read entry");
        out.push((entry.name().to_string(), data));
    }
    out
}

pub fn entry_names(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
    entries.iter().map(|(name, _)| name.as_str()).collect()
}

pub fn entry_text<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a str {
    let (_, data) = entries
        .iter()
        .find(|(n, _)| n == name)
        .unwrap_or_else(|| panic!("missing entry {name}"));
    std::str::from_utf8(data).expect("utf-8 entry")
}
