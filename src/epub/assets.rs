//! Fixed files copied verbatim into every package.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Relative names of the fixed files, in archive order.
///
/// `mimetype` must stay first; it is the only stored entry.
pub const ASSET_NAMES: [&str; 6] = [
    "mimetype",
    "META-INF/container.xml",
    "OPS/css/vertical.css",
    "OPS/css/vertical_image.css",
    "OPS/css/horizontal.css",
    "OPS/css/horizontal_image.css",
];

const MIMETYPE: &[u8] = b"application/epub+zip";

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OPS/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const VERTICAL_CSS: &[u8] = br#"@charset "UTF-8";
html {
  writing-mode: vertical-rl;
  -webkit-writing-mode: vertical-rl;
  -epub-writing-mode: vertical-rl;
}
body { margin: 0; padding: 0; line-height: 1.75; }
p { margin: 0; }
h2 { font-size: 1.2em; margin-left: 1em; }
"#;

const HORIZONTAL_CSS: &[u8] = br#"@charset "UTF-8";
html {
  writing-mode: horizontal-tb;
  -webkit-writing-mode: horizontal-tb;
  -epub-writing-mode: horizontal-tb;
}
body { margin: 0; padding: 0; line-height: 1.6; }
p { margin: 0; }
h2 { font-size: 1.2em; margin-bottom: 1em; }
"#;

const IMAGE_CSS: &[u8] = br#"@charset "UTF-8";
html, body { margin: 0; padding: 0; height: 100%; }
.main { text-align: center; height: 100%; }
img { max-width: 100%; max-height: 100%; }
"#;

/// One fixed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub data: Vec<u8>,
}

/// The set of fixed files written before the body.
#[derive(Debug, Clone)]
pub struct TemplateAssets {
    assets: Vec<Asset>,
}

impl TemplateAssets {
    /// The compiled-in defaults.
    pub fn builtin() -> Self {
        let data: [&[u8]; 6] = [
            MIMETYPE,
            CONTAINER_XML,
            VERTICAL_CSS,
            IMAGE_CSS,
            HORIZONTAL_CSS,
            IMAGE_CSS,
        ];
        let assets = ASSET_NAMES
            .iter()
            .zip(data)
            .map(|(name, data)| Asset {
                name: name.to_string(),
                data: data.to_vec(),
            })
            .collect();
        Self { assets }
    }

    /// Load every fixed file from a template directory laid out like the
    /// archive (`<dir>/mimetype`, `<dir>/OPS/css/vertical.css`, ...).
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut assets = Vec::with_capacity(ASSET_NAMES.len());
        for name in ASSET_NAMES {
            let data = fs::read(dir.join(name))?;
            assets.push(Asset {
                name: name.to_string(),
                data,
            });
        }
        log::debug!("loaded {} template assets from {}", assets.len(), dir.display());
        Ok(Self { assets })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Stylesheet hrefs relative to `OPS/`, for the manifest.
    pub fn stylesheets(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|a| a.name.ends_with(".css"))
            .filter_map(|a| a.name.strip_prefix(super::OPS_DIR))
            .map(str::to_string)
            .collect()
    }
}

impl Default for TemplateAssets {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let assets = TemplateAssets::builtin();
        assert_eq!(assets.assets()[0].name, "mimetype");
        assert_eq!(assets.assets()[0].data, b"application/epub+zip");
        assert_eq!(
            assets.stylesheets(),
            [
                "css/vertical.css",
                "css/vertical_image.css",
                "css/horizontal.css",
                "css/horizontal_image.css",
            ]
        );
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ASSET_NAMES {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("custom {name}")).unwrap();
        }
        let assets = TemplateAssets::from_dir(dir.path()).unwrap();
        assert_eq!(assets.assets()[2].data, b"custom OPS/css/vertical.css");
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TemplateAssets::from_dir(dir.path()).is_err());
    }
}
