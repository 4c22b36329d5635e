//! Cover image resolution.

use std::fs;
use std::io::Read;

use crate::book::{BookInfo, Image};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::util::{extension, image_media_type, is_remote, is_supported_image};

use super::images::ImageRegistry;

/// Fixed id of the book-level cover image.
pub const COVER_ID: &str = "cover";

/// Reads cover bytes from a location.
pub trait Fetch {
    fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Reads local files and downloads `http(s)://` URLs.
///
/// Downloads block without a timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverFetcher;

impl Fetch for CoverFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if is_remote(location) {
            log::debug!("downloading cover {location}");
            let response = ureq::get(location).call().map_err(|e| Error::CoverFetch {
                location: location.to_string(),
                reason: e.to_string(),
            })?;
            let mut data = Vec::new();
            response.into_reader().read_to_end(&mut data)?;
            Ok(data)
        } else {
            Ok(fs::read(location)?)
        }
    }
}

/// A cover ready to be written: its manifest record and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub image: Image,
    pub data: Vec<u8>,
}

/// Reconcile the book's cover setting with the registered images.
///
/// The provisional cover flag on the first embedded image is always cleared.
/// When the book names a supported cover that can be read, a cover record is
/// put at the front of the image list and returned with its bytes.
/// Unsupported or unreadable covers are reported and yield `None`; the first
/// image is not restored as cover.
pub fn resolve_cover(
    book: &BookInfo,
    images: &mut ImageRegistry,
    fetcher: &dyn Fetch,
    diagnostics: &mut dyn Diagnostics,
) -> Option<Cover> {
    images.clear_cover_flags();

    let location = match book.cover.as_deref() {
        None | Some("") => {
            log::debug!("no cover");
            return None;
        }
        Some(location) => location,
    };

    let ext = extension(location);
    let media_type = image_media_type(ext);
    if !is_supported_image(&media_type) {
        diagnostics.report(Error::UnsupportedCover {
            path: location.to_string(),
            media_type,
        });
        return None;
    }

    let data = match fetcher.fetch(location) {
        Ok(data) => data,
        Err(Error::CoverFetch { location, reason }) => {
            diagnostics.report(Error::CoverFetch { location, reason });
            return None;
        }
        Err(e) => {
            diagnostics.report(Error::CoverFetch {
                location: location.to_string(),
                reason: e.to_string(),
            });
            return None;
        }
    };

    let image = Image {
        id: COVER_ID.to_string(),
        file_name: format!("{COVER_ID}.{ext}"),
        media_type,
        is_cover: true,
    };
    images.insert_cover(image.clone());
    log::debug!("cover {location} -> {}", image.file_name);
    Some(Cover { image, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct StaticFetcher(Option<&'static [u8]>);

    impl Fetch for StaticFetcher {
        fn fetch(&self, location: &str) -> Result<Vec<u8>> {
            self.0.map(<[u8]>::to_vec).ok_or_else(|| Error::CoverFetch {
                location: location.to_string(),
                reason: "unreachable".into(),
            })
        }
    }

    fn registry_with_images() -> ImageRegistry {
        let mut registry = ImageRegistry::new();
        registry.resolve("a.png");
        registry.resolve("b.png");
        registry
    }

    fn cover_flags(registry: &ImageRegistry) -> usize {
        registry.images().iter().filter(|i| i.is_cover).count()
    }

    #[test]
    fn test_absent_cover_clears_first_image() {
        let mut registry = registry_with_images();
        let mut diagnostics: Vec<Error> = Vec::new();
        let book = BookInfo::new("T", "C");
        let cover = resolve_cover(&book, &mut registry, &StaticFetcher(Some(b"x")), &mut diagnostics);
        assert!(cover.is_none());
        assert_eq!(cover_flags(&registry), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_cover_clears_first_image() {
        let mut registry = registry_with_images();
        let mut diagnostics: Vec<Error> = Vec::new();
        let book = BookInfo::new("T", "C").with_cover("");
        let cover = resolve_cover(&book, &mut registry, &StaticFetcher(Some(b"x")), &mut diagnostics);
        assert!(cover.is_none());
        assert_eq!(cover_flags(&registry), 0);
    }

    #[test]
    fn test_valid_cover_goes_first() {
        let mut registry = registry_with_images();
        let mut diagnostics: Vec<Error> = Vec::new();
        let book = BookInfo::new("T", "C").with_cover("art/front.JPG");
        let cover = resolve_cover(&book, &mut registry, &StaticFetcher(Some(b"jpeg")), &mut diagnostics)
            .unwrap();

        assert_eq!(cover.image.file_name, "cover.JPG");
        assert_eq!(cover.image.media_type, "image/jpeg");
        assert_eq!(cover.data, b"jpeg");
        assert_eq!(registry.images()[0], cover.image);
        assert_eq!(registry.images().len(), 3);
        assert_eq!(cover_flags(&registry), 1);
    }

    #[test]
    fn test_invalid_cover_means_no_cover() {
        let mut registry = registry_with_images();
        let mut diagnostics: Vec<Error> = Vec::new();
        let book = BookInfo::new("T", "C").with_cover("cover.bmp");
        let cover = resolve_cover(&book, &mut registry, &StaticFetcher(Some(b"x")), &mut diagnostics);
        assert!(cover.is_none());
        assert_eq!(cover_flags(&registry), 0);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), ErrorKind::Format);
    }

    #[test]
    fn test_unreadable_cover_is_reported() {
        let mut registry = registry_with_images();
        let mut diagnostics: Vec<Error> = Vec::new();
        let book = BookInfo::new("T", "C").with_cover("http://example.invalid/c.png");
        let cover = resolve_cover(&book, &mut registry, &StaticFetcher(None), &mut diagnostics);
        assert!(cover.is_none());
        assert_eq!(registry.images().len(), 2);
        assert_eq!(cover_flags(&registry), 0);
        assert_eq!(diagnostics[0].kind(), ErrorKind::CoverFetch);
    }

    #[test]
    fn test_fetcher_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        fs::write(&path, b"png bytes").unwrap();
        let data = CoverFetcher.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(data, b"png bytes");
        assert!(CoverFetcher.fetch("/nonexistent/cover.png").is_err());
    }
}
