//! Image reference deduplication and renaming.

use std::collections::HashMap;

use crate::book::Image;
use crate::util::{extension, format_id, image_media_type, is_supported_image};

/// Directory for image payloads, relative to `OPS/`.
pub const IMAGES_DIR: &str = "images/";

/// Outcome of resolving one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First reference to a supported image; a new [`Image`] was recorded.
    Registered(String),
    /// The source was seen before; the earlier path is returned.
    Existing(String),
    /// First reference to an image whose format cannot be listed in the
    /// manifest. The path is still assigned and the bytes are still copied.
    Unsupported { href: String, media_type: String },
}

impl Resolution {
    /// Path to embed in content files (`../images/0001.png`).
    pub fn href(&self) -> &str {
        match self {
            Resolution::Registered(href) | Resolution::Existing(href) => href,
            Resolution::Unsupported { href, .. } => href,
        }
    }
}

/// Assigns sequential names to referenced images.
///
/// Identity is the exact source path string. Every distinct source gets a
/// target `images/<id>.<ext>` and stays pending until its bytes have been
/// copied into the package.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    index: usize,
    images: Vec<Image>,
    targets: HashMap<String, String>,
    pending: Vec<String>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a source path to the path content files should embed.
    pub fn resolve(&mut self, source: &str) -> Resolution {
        if let Some(target) = self.targets.get(source) {
            return Resolution::Existing(embed_path(target));
        }

        let ext = extension(source);
        self.index += 1;
        let id = format_id(self.index);
        let file_name = if ext.is_empty() {
            id.clone()
        } else {
            format!("{id}.{ext}")
        };
        let target = format!("{IMAGES_DIR}{file_name}");
        let href = embed_path(&target);
        let media_type = image_media_type(ext);

        self.targets.insert(source.to_string(), target);
        self.pending.push(source.to_string());

        if !is_supported_image(&media_type) {
            return Resolution::Unsupported { href, media_type };
        }

        self.images.push(Image {
            id,
            file_name,
            media_type,
            // first image stands in as cover until the cover is resolved
            is_cover: self.index == 1,
        });
        Resolution::Registered(href)
    }

    /// Images listed in the manifest, in registration order.
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn clear_cover_flags(&mut self) {
        for image in &mut self.images {
            image.is_cover = false;
        }
    }

    /// Put the resolved cover at the front of the image list.
    pub fn insert_cover(&mut self, image: Image) {
        self.images.insert(0, image);
    }

    /// Remove the cover from the front of the list once its bytes are written.
    pub fn take_cover(&mut self) -> Option<Image> {
        match self.images.first() {
            Some(image) if image.is_cover => Some(self.images.remove(0)),
            _ => None,
        }
    }

    /// Sources still waiting to be copied, with their targets.
    pub fn pending(&self) -> Vec<(String, String)> {
        self.pending
            .iter()
            .filter_map(|source| {
                self.targets
                    .get(source)
                    .map(|target| (source.clone(), target.clone()))
            })
            .collect()
    }

    /// Mark a source as copied and return its target.
    ///
    /// Returns `None` when the source is unknown or was already copied.
    pub fn complete(&mut self, source: &str) -> Option<String> {
        let pos = self.pending.iter().position(|s| s == source)?;
        self.pending.remove(pos);
        self.targets.get(source).cloned()
    }

    /// Drain every source that was never copied.
    pub fn take_unresolved(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn embed_path(target: &str) -> String {
    format!("../{target}")
}
