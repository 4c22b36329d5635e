mod assets;
mod chapters;
mod cover;
mod images;
mod package;
mod sections;
mod sources;
mod templates;
mod writer;

/// Package content directory inside the archive.
pub const OPS_DIR: &str = "OPS/";

pub use assets::{ASSET_NAMES, Asset, TemplateAssets};
pub use chapters::ChapterList;
pub use cover::{COVER_ID, Cover, CoverFetcher, Fetch, resolve_cover};
pub use images::{IMAGES_DIR, ImageRegistry, Resolution};
pub use package::{EntryCompression, PackageWriter};
pub use sections::{SectionTracker, XHTML_DIR, section_entry_name};
pub use sources::ImageSource;
pub use templates::{Render, Template, TemplateContext, XmlTemplates};
pub use writer::{Assembled, EpubAssembler, EpubConfig, assemble};
