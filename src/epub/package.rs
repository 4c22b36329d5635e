//! Append-only zip writer with single-open-entry discipline.

use std::io::{self, Seek, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};

/// How an entry is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCompression {
    /// No compression. Required for `mimetype`.
    Stored,
    /// Deflate at the configured text level.
    Text,
    /// Deflate at the codec's default level, used for image payloads.
    Default,
}

/// Wraps a [`ZipWriter`] and tracks the single open entry.
///
/// Opening an entry while another is open is an error; writes without an
/// open entry are rejected. Entries cannot be reopened once closed.
pub struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    open: Option<String>,
    text_level: i64,
    entries: usize,
}

impl<W: Write + Seek> PackageWriter<W> {
    /// Create a writer; `text_level` is the deflate level (0-9) for text entries.
    pub fn new(writer: W, text_level: u32) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            open: None,
            text_level: i64::from(text_level.min(9)),
            entries: 0,
        }
    }

    pub fn start_entry(&mut self, name: &str, compression: EntryCompression) -> Result<()> {
        if let Some(open) = &self.open {
            return Err(Error::EntryAlreadyOpen {
                open: open.clone(),
                requested: name.to_string(),
            });
        }

        let options = match compression {
            EntryCompression::Stored => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
            EntryCompression::Text => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.text_level)),
            EntryCompression::Default => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
            }
        };

        log::debug!("open entry {name} ({compression:?})");
        self.zip.start_file(name, options)?;
        self.open = Some(name.to_string());
        self.entries += 1;
        Ok(())
    }

    pub fn finish_entry(&mut self) -> Result<()> {
        match self.open.take() {
            Some(name) => {
                log::debug!("close entry {name}");
                Ok(())
            }
            None => Err(Error::NoOpenEntry),
        }
    }

    /// Write a complete entry in one go.
    pub fn write_entry(
        &mut self,
        name: &str,
        compression: EntryCompression,
        data: &[u8],
    ) -> Result<()> {
        self.start_entry(name, compression)?;
        self.write_all(data)?;
        self.finish_entry()
    }

    /// Stream a complete entry from a reader.
    pub fn copy_entry<R: io::Read + ?Sized>(
        &mut self,
        name: &str,
        compression: EntryCompression,
        reader: &mut R,
    ) -> Result<u64> {
        self.start_entry(name, compression)?;
        let copied = io::copy(reader, self)?;
        self.finish_entry()?;
        Ok(copied)
    }

    /// Number of entries started so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Write the central directory and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        if let Some(open) = self.open.take() {
            log::debug!("close entry {open}");
        }
        Ok(self.zip.finish()?)
    }
}

impl<W: Write + Seek> Write for PackageWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.open.is_none() {
            return Err(io::Error::other(Error::NoOpenEntry));
        }
        self.zip.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.zip.flush()
    }
}
