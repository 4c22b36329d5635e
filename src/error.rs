//! Error types for tsuzuri operations.

use thiserror::Error;

/// Errors that can occur while assembling a package.
///
/// Only [`ErrorKind::Container`] errors abort an assembly. Everything else is
/// handed to a [`Diagnostics`](crate::Diagnostics) sink and the offending item
/// is skipped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("cannot open entry {requested}: {open} is still open")]
    EntryAlreadyOpen { open: String, requested: String },

    #[error("no archive entry is open")]
    NoOpenEntry,

    #[error("unsupported image format {media_type}: {path}")]
    UnsupportedImage { path: String, media_type: String },

    #[error("unsupported cover image format {media_type}: {path}")]
    UnsupportedCover { path: String, media_type: String },

    #[error("image file not found: {0}")]
    MissingImage(String),

    #[error("failed to fetch cover image {location}: {reason}")]
    CoverFetch { location: String, reason: String },

    #[cfg(feature = "cli")]
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported image or cover media type.
    Format,
    /// A referenced image could not be found when copying payloads.
    ResourceMissing,
    /// The cover image could not be read or downloaded.
    CoverFetch,
    /// The output container (or something feeding it) failed.
    Container,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedImage { .. } | Error::UnsupportedCover { .. } => ErrorKind::Format,
            Error::MissingImage(_) => ErrorKind::ResourceMissing,
            Error::CoverFetch { .. } => ErrorKind::CoverFetch,
            _ => ErrorKind::Container,
        }
    }

    /// Whether this error aborts the assembly.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Container
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let format = Error::UnsupportedImage {
            path: "a.bmp".into(),
            media_type: "image/bmp".into(),
        };
        assert_eq!(format.kind(), ErrorKind::Format);
        assert!(!format.is_fatal());

        assert_eq!(
            Error::MissingImage("a.png".into()).kind(),
            ErrorKind::ResourceMissing
        );

        let io = Error::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Container);
        assert!(io.is_fatal());
        assert!(Error::NoOpenEntry.is_fatal());
    }
}
