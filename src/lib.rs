//! # tsuzuri
//!
//! Streaming EPUB 3 package assembly for converted plain-text books.
//!
//! A [`Converter`] reads the source text once and writes markup into a
//! [`ContentSink`]. The [`EpubAssembler`] around it takes care of everything a
//! package needs while the body streams past:
//!
//! - sequential section files (`OPS/xhtml/0001.xhtml`, ...) split at page breaks
//! - deduplicated, renamed images (`OPS/images/0001.png`, ...)
//! - chapter labels for the navigation document and NCX
//! - cover resolution, manifest and spine
//! - copying image bytes from loose files or a companion zip
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::io::BufReader;
//! use std::path::Path;
//! use tsuzuri::{BookInfo, TextConverter, assemble};
//!
//! let source = Path::new("neko.txt");
//! let mut reader = BufReader::new(std::fs::File::open(source)?);
//! let book = BookInfo::new("吾輩は猫である", "夏目漱石").with_cover("cover.jpg");
//!
//! let assembled = assemble(
//!     &mut TextConverter::new(),
//!     &mut reader,
//!     source,
//!     None,
//!     Path::new("neko.epub"),
//!     &book,
//! )?;
//! println!("{} sections", assembled.sections.len());
//! # Ok::<(), tsuzuri::Error>(())
//! ```

pub mod book;
pub mod convert;
pub mod diagnostics;
pub mod epub;
pub mod error;
pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod config;

pub use book::{BookInfo, Chapter, Image, Section, WritingDirection};
pub use convert::{ContentSink, Converter, TextConverter};
pub use diagnostics::{Diagnostics, LogDiagnostics};
pub use epub::{Assembled, EpubAssembler, EpubConfig, ImageSource, assemble};
pub use error::{Error, ErrorKind, Result};
pub use util::decode_text;
