use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// Book-level information supplied by the caller.
///
/// Read-only for the duration of an assembly.
#[derive(Debug, Clone)]
pub struct BookInfo {
    pub title: String,
    pub creator: String,
    pub language: String,
    pub modified: DateTime<Utc>,
    pub direction: WritingDirection,
    /// Cover image location.
    ///
    /// `None` and `Some("")` both mean "no cover". Anything else is a local
    /// path or an `http(s)://` URL.
    pub cover: Option<String>,
    /// Source line numbers that start an image-only section.
    pub image_section_lines: BTreeSet<usize>,
}

/// Text flow of the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum WritingDirection {
    #[default]
    Vertical,
    Horizontal,
}

/// One page-break-delimited content file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Section {
    pub id: String,
    pub image_fit: bool,
}

/// A navigation label attached to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Chapter {
    pub section_id: String,
    pub chapter_id: String,
    pub name: String,
}

/// An image listed in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Image {
    pub id: String,
    pub file_name: String,
    pub media_type: String,
    pub is_cover: bool,
}

impl BookInfo {
    pub fn new(title: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creator: creator.into(),
            language: "ja".to_string(),
            modified: Utc::now(),
            direction: WritingDirection::default(),
            cover: None,
            image_section_lines: BTreeSet::new(),
        }
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_direction(mut self, direction: WritingDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_image_section_lines(mut self, lines: impl IntoIterator<Item = usize>) -> Self {
        self.image_section_lines = lines.into_iter().collect();
        self
    }

    /// Whether the section starting at `line` holds a single full-page image.
    pub fn is_image_section_line(&self, line: usize) -> bool {
        self.image_section_lines.contains(&line)
    }

    pub fn is_vertical(&self) -> bool {
        self.direction == WritingDirection::Vertical
    }

    /// Stable package identifier derived from title and creator.
    ///
    /// The same title/creator pair always yields the same name-based UUID.
    pub fn identifier(&self) -> uuid::Uuid {
        let name = format!("{}-{}", self.title, self.creator);
        let digest = sha1_smol::Sha1::from(name.as_bytes()).digest().bytes();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        uuid::Builder::from_sha1_bytes(bytes).into_uuid()
    }

    /// Modification timestamp as `yyyy-MM-ddTHH:mm:ssZ`.
    pub fn modified_stamp(&self) -> String {
        self.modified.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl Default for BookInfo {
    fn default() -> Self {
        Self::new("", "")
    }
}
