//! ZIP container assembly.
//!
//! [`ArchiveBuilder`] accepts an ordered sequence of named entries and
//! produces one finished archive. It knows nothing about label formats, so
//! the encoders stay free of I/O and the builder can be exercised over an
//! in-memory cursor.

use std::collections::BTreeSet;
use std::io::{self, Read, Seek, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SprucelabelError;

/// DEFLATE level used for every entry.
const COMPRESSION_LEVEL: i64 = 9;

/// Writes named entries into a ZIP archive in insertion order.
pub struct ArchiveBuilder<W: Write + Seek> {
    writer: ZipWriter<W>,
    options: SimpleFileOptions,
    names: BTreeSet<String>,
    entries: Vec<String>,
    bytes_in: u64,
}

impl<W: Write + Seek> ArchiveBuilder<W> {
    /// Starts an empty archive over `inner`.
    pub fn new(inner: W) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));
        Self {
            writer: ZipWriter::new(inner),
            options,
            names: BTreeSet::new(),
            entries: Vec::new(),
            bytes_in: 0,
        }
    }

    /// Adds an entry holding `data`.
    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), SprucelabelError> {
        self.start_entry(name)?;
        self.writer.write_all(data)?;
        self.bytes_in += data.len() as u64;
        debug!(entry = name, bytes = data.len(), "added archive entry");
        Ok(())
    }

    /// Adds an entry whose contents are streamed from `reader`.
    pub fn add_reader<R: Read + ?Sized>(
        &mut self,
        name: &str,
        reader: &mut R,
    ) -> Result<u64, SprucelabelError> {
        self.start_entry(name)?;
        let copied = io::copy(reader, &mut self.writer)?;
        self.bytes_in += copied;
        debug!(entry = name, bytes = copied, "streamed archive entry");
        Ok(copied)
    }

    /// Entry names in the order they were added.
    pub fn entry_names(&self) -> &[String] {
        &self.entries
    }

    /// Total uncompressed bytes written so far.
    pub fn uncompressed_bytes(&self) -> u64 {
        self.bytes_in
    }

    /// Writes the central directory and returns the underlying writer.
    pub fn finish(self) -> Result<W, SprucelabelError> {
        Ok(self.writer.finish()?)
    }

    fn start_entry(&mut self, name: &str) -> Result<(), SprucelabelError> {
        if !self.names.insert(name.to_string()) {
            return Err(SprucelabelError::DuplicateArchiveEntry(name.to_string()));
        }
        self.writer.start_file(name, self.options)?;
        self.entries.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::ZipArchive;

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut file = archive.by_name(name).expect("entry exists");
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).expect("read entry");
        buf
    }

    #[test]
    fn writes_entries_in_insertion_order() {
        let mut builder = ArchiveBuilder::new(Cursor::new(Vec::new()));
        builder.add_bytes("b.txt", b"second").expect("add b");
        builder.add_bytes("a.txt", b"first").expect("add a");
        builder
            .add_reader("img.tif", &mut Cursor::new(vec![1u8, 2, 3]))
            .expect("add reader");
        assert_eq!(builder.entry_names(), ["b.txt", "a.txt", "img.tif"]);
        assert_eq!(builder.uncompressed_bytes(), 14);

        let cursor = builder.finish().expect("finish");
        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).expect("open zip");

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("entry").name().to_string())
            .collect();
        assert_eq!(names, vec!["b.txt", "a.txt", "img.tif"]);
        assert_eq!(read_entry(&mut archive, "a.txt"), b"first");
        assert_eq!(read_entry(&mut archive, "img.tif"), vec![1, 2, 3]);
    }

    #[test]
    fn empty_entries_are_kept() {
        let mut builder = ArchiveBuilder::new(Cursor::new(Vec::new()));
        builder.add_bytes("empty.txt", b"").expect("add");
        let cursor = builder.finish().expect("finish");

        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).expect("open zip");
        assert_eq!(archive.len(), 1);
        assert!(read_entry(&mut archive, "empty.txt").is_empty());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut builder = ArchiveBuilder::new(Cursor::new(Vec::new()));
        builder.add_bytes("x.txt", b"1").expect("add first");
        let err = builder.add_bytes("x.txt", b"2").unwrap_err();
        assert!(matches!(err, SprucelabelError::DuplicateArchiveEntry(name) if name == "x.txt"));
    }
}
