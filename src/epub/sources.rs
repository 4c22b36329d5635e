//! Where referenced image bytes come from.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::Result;
use crate::util::{decode_text, normalize_entry_name};

use super::OPS_DIR;
use super::images::ImageRegistry;
use super::package::{EntryCompression, PackageWriter};

/// Encoding tried for zip entry names that are not valid UTF-8.
const ENTRY_NAME_ENCODING: &str = "shift_jis";

/// Location of the images a source text refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Loose files, resolved relative to this directory.
    Directory(PathBuf),
    /// Entries of a companion zip; `prefix` is stripped from entry names
    /// before they are matched against image references.
    Archive { path: PathBuf, prefix: String },
}

impl ImageSource {
    /// Pick the image source for a source text.
    ///
    /// A `.zip` source file is a companion archive; `entry_hint` names the
    /// text entry inside it and its directory becomes the stripped prefix.
    /// Anything else resolves images next to the source file.
    pub fn for_source(source_file: &Path, entry_hint: Option<&str>) -> Self {
        let is_zip = source_file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

        if is_zip {
            let prefix = entry_hint
                .map(normalize_entry_name)
                .and_then(|hint| hint.rfind('/').map(|pos| hint[..=pos].to_string()))
                .unwrap_or_default();
            return ImageSource::Archive {
                path: source_file.to_path_buf(),
                prefix,
            };
        }

        let dir = source_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        ImageSource::Directory(dir.to_path_buf())
    }

    /// Copy every pending image of `registry` into the package.
    ///
    /// Copied sources are removed from the pending table; sources that cannot
    /// be found stay pending for the caller to report.
    pub fn copy_into<W: Write + Seek>(
        &self,
        registry: &mut ImageRegistry,
        package: &mut PackageWriter<W>,
    ) -> Result<usize> {
        match self {
            ImageSource::Directory(dir) => copy_from_dir(dir, registry, package),
            ImageSource::Archive { path, prefix } => {
                copy_from_archive(path, prefix, registry, package)
            }
        }
    }
}

fn copy_from_dir<W: Write + Seek>(
    dir: &Path,
    registry: &mut ImageRegistry,
    package: &mut PackageWriter<W>,
) -> Result<usize> {
    let mut copied = 0;
    for (source, target) in registry.pending() {
        let path = dir.join(source.replace('\\', "/"));
        if !path.is_file() {
            continue;
        }
        let mut file = BufReader::new(File::open(&path)?);
        package.copy_entry(&format!("{OPS_DIR}{target}"), EntryCompression::Default, &mut file)?;
        registry.complete(&source);
        copied += 1;
    }
    Ok(copied)
}

fn copy_from_archive<W: Write + Seek>(
    path: &Path,
    prefix: &str,
    registry: &mut ImageRegistry,
    package: &mut PackageWriter<W>,
) -> Result<usize> {
    // entry names are compared in normalized form; several spellings of a
    // source can map to one entry
    let mut wanted: HashMap<String, Vec<String>> = HashMap::new();
    for (source, _) in registry.pending() {
        wanted
            .entry(normalize_entry_name(&source))
            .or_default()
            .push(source);
    }
    if wanted.is_empty() {
        return Ok(0);
    }

    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
    let mut copied = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = normalize_entry_name(&decode_text(entry.name_raw(), Some(ENTRY_NAME_ENCODING)));
        let Some(relative) = name.strip_prefix(prefix) else {
            continue;
        };
        let Some(sources) = wanted.get(relative) else {
            continue;
        };
        let targets: Vec<String> = sources.iter().filter_map(|s| registry.complete(s)).collect();
        match targets.as_slice() {
            [] => {}
            [target] => {
                package.copy_entry(&format!("{OPS_DIR}{target}"), EntryCompression::Default, &mut entry)?;
                copied += 1;
            }
            _ => {
                let mut data = Vec::new();
                entry.read_to_end(&mut data)?;
                for target in &targets {
                    package.write_entry(&format!("{OPS_DIR}{target}"), EntryCompression::Default, &data)?;
                    copied += 1;
                }
            }
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_for_source_directory() {
        assert_eq!(
            ImageSource::for_source(Path::new("/books/neko/neko.txt"), None),
            ImageSource::Directory(PathBuf::from("/books/neko"))
        );
        assert_eq!(
            ImageSource::for_source(Path::new("neko.txt"), None),
            ImageSource::Directory(PathBuf::from("."))
        );
    }

    #[test]
    fn test_for_source_archive_prefix() {
        assert_eq!(
            ImageSource::for_source(Path::new("/books/neko.ZIP"), Some("neko/neko.txt")),
            ImageSource::Archive {
                path: PathBuf::from("/books/neko.ZIP"),
                prefix: "neko/".into(),
            }
        );
        assert_eq!(
            ImageSource::for_source(Path::new("neko.zip"), Some("neko.txt")),
            ImageSource::Archive {
                path: PathBuf::from("neko.zip"),
                prefix: String::new(),
            }
        );
    }

    fn read_entry(bytes: Vec<u8>, name: &str) -> Option<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).ok()?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        Some(data)
    }

    #[test]
    fn test_copy_from_dir_leaves_missing_pending() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("fig")).unwrap();
        fs::write(dir.path().join("fig/a.png"), b"png").unwrap();

        let mut registry = ImageRegistry::new();
        registry.resolve("fig/a.png");
        registry.resolve("fig\\a.png");
        registry.resolve("fig/missing.png");

        let mut package = PackageWriter::new(Cursor::new(Vec::new()), 9);
        let copied = ImageSource::Directory(dir.path().to_path_buf())
            .copy_into(&mut registry, &mut package)
            .unwrap();
        assert_eq!(copied, 2);
        assert_eq!(registry.take_unresolved(), ["fig/missing.png"]);

        let bytes = package.finish().unwrap().into_inner();
        assert_eq!(read_entry(bytes.clone(), "OPS/images/0001.png").unwrap(), b"png");
        assert_eq!(read_entry(bytes, "OPS/images/0002.png").unwrap(), b"png");
    }

    #[test]
    fn test_copy_from_archive_strips_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("book.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            let options = SimpleFileOptions::default();
            zip.start_file("book/book.txt", options).unwrap();
            zip.write_all("本文".as_bytes()).unwrap();
            zip.start_file("book/img/a.jpg", options).unwrap();
            zip.write_all(b"jpeg").unwrap();
            zip.start_file("other/img/a.jpg", options).unwrap();
            zip.write_all(b"wrong").unwrap();
            zip.finish().unwrap();
        }

        let mut registry = ImageRegistry::new();
        registry.resolve("img\\a.jpg");
        registry.resolve("img/b.jpg");

        let source = ImageSource::for_source(&zip_path, Some("book/book.txt"));
        let mut package = PackageWriter::new(Cursor::new(Vec::new()), 9);
        let copied = source.copy_into(&mut registry, &mut package).unwrap();
        assert_eq!(copied, 1);
        assert_eq!(registry.take_unresolved(), ["img/b.jpg"]);

        let bytes = package.finish().unwrap().into_inner();
        assert_eq!(read_entry(bytes, "OPS/images/0001.jpg").unwrap(), b"jpeg");
    }

    #[test]
    fn test_copy_from_archive_fills_every_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("book.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            zip.start_file("book/img/a.jpg", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"jpeg").unwrap();
            zip.finish().unwrap();
        }

        let mut registry = ImageRegistry::new();
        registry.resolve("img/a.jpg");
        registry.resolve("img\\a.jpg");

        let source = ImageSource::for_source(&zip_path, Some("book/book.txt"));
        let mut package = PackageWriter::new(Cursor::new(Vec::new()), 9);
        let copied = source.copy_into(&mut registry, &mut package).unwrap();
        assert_eq!(copied, 2);
        assert!(registry.take_unresolved().is_empty());

        let bytes = package.finish().unwrap().into_inner();
        assert_eq!(read_entry(bytes.clone(), "OPS/images/0001.jpg").unwrap(), b"jpeg");
        assert_eq!(read_entry(bytes, "OPS/images/0002.jpg").unwrap(), b"jpeg");
    }
}
