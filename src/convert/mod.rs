//! The boundary between a markup converter and the package assembler.
//!
//! A [`Converter`] reads the whole source and writes markup into a
//! [`ContentSink`]. The sink is an [`std::io::Write`] that lands in the section
//! file currently open in the package, plus the callbacks a converter needs
//! while streaming: page breaks, image references and chapter labels.

mod text;

use std::io::{BufRead, Write};

use crate::book::BookInfo;
use crate::error::Result;

pub use text::{TextConverter, image_section_lines};

/// Output side handed to a converter.
pub trait ContentSink: Write {
    /// Close the current section and open the next one.
    ///
    /// `line` is the source line number the new section starts at; it feeds
    /// the book's image-fit predicate.
    fn next_section(&mut self, line: usize) -> Result<()>;

    /// Register an image reference and return the path to embed.
    ///
    /// Always returns a usable path, even when the image format cannot be
    /// listed in the manifest.
    fn resolve_image(&mut self, source: &str) -> String;

    /// Add a chapter label for the current section.
    fn add_chapter(&mut self, chapter_id: &str, name: &str);

    /// Relabel the most recently added chapter.
    fn rename_last_chapter(&mut self, name: &str);
}

/// Converts a source text stream into section markup.
pub trait Converter {
    /// Drain `source`, writing converted markup into `sink`.
    ///
    /// Called exactly once per assembly. Callbacks must be made synchronously
    /// and in document order.
    fn convert(
        &mut self,
        source: &mut dyn BufRead,
        sink: &mut dyn ContentSink,
        book: &BookInfo,
    ) -> Result<()>;
}
