use std::fs::File;
use std::io::{self, BufRead, BufWriter, Seek, Write};
use std::path::Path;

use crate::book::{BookInfo, Chapter, Image, Section};
use crate::convert::{ContentSink, Converter};
use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::error::{Error, Result};

use super::OPS_DIR;
use super::assets::TemplateAssets;
use super::chapters::ChapterList;
use super::cover::{CoverFetcher, Fetch, resolve_cover};
use super::images::{IMAGES_DIR, ImageRegistry, Resolution};
use super::package::{EntryCompression, PackageWriter};
use super::sections::{SectionTracker, XHTML_DIR, section_entry_name};
use super::sources::ImageSource;
use super::templates::{Render, Template, TemplateContext, XmlTemplates};

/// Converter output is buffered up to this many bytes before it is written
/// into the open section entry.
const BODY_BUFFER_SIZE: usize = 8 * 1024;

/// Configuration for EPUB assembly.
#[derive(Debug, Clone)]
pub struct EpubConfig {
    /// Deflate level (0-9) for text entries, default 9. Images always use the
    /// codec's default level.
    pub compression_level: Option<u32>,
    /// Heading of the navigation document.
    pub toc_title: String,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            toc_title: "目次".to_string(),
        }
    }
}

/// What ended up in a package.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Assembled {
    pub sections: Vec<Section>,
    pub chapters: Vec<Chapter>,
    /// Images listed in the manifest, excluding the cover.
    pub images: Vec<Image>,
    pub cover: Option<Image>,
    /// Image references whose bytes could not be found.
    pub missing: Vec<String>,
}

/// Assembles EPUB 3 packages from a converter's streamed output.
///
/// The assembler itself only holds configuration; every call to
/// [`assemble`](EpubAssembler::assemble) builds its own registries, so one
/// assembler can be reused for any number of books.
///
/// # Example
///
/// ```no_run
/// use std::io::BufReader;
/// use std::path::Path;
/// use tsuzuri::{BookInfo, EpubAssembler, LogDiagnostics, TextConverter};
///
/// let source = Path::new("neko.txt");
/// let mut reader = BufReader::new(std::fs::File::open(source)?);
/// let book = BookInfo::new("吾輩は猫である", "夏目漱石");
/// EpubAssembler::new().assemble(
///     &mut TextConverter::new(),
///     &mut reader,
///     source,
///     None,
///     Path::new("neko.epub"),
///     &book,
///     &mut LogDiagnostics,
/// )?;
/// # Ok::<(), tsuzuri::Error>(())
/// ```
pub struct EpubAssembler {
    config: EpubConfig,
    assets: TemplateAssets,
    renderer: Box<dyn Render>,
    fetcher: Box<dyn Fetch>,
}

impl EpubAssembler {
    pub fn new() -> Self {
        Self {
            config: EpubConfig::default(),
            assets: TemplateAssets::builtin(),
            renderer: Box::new(XmlTemplates),
            fetcher: Box::new(CoverFetcher),
        }
    }

    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_assets(mut self, assets: TemplateAssets) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_renderer(mut self, renderer: impl Render + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Assemble a package into `output`.
    ///
    /// `source_file` and `entry_hint` decide where image bytes are read from,
    /// see [`ImageSource::for_source`]. On a fatal error the partially written
    /// file is left in place.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble<C: Converter + ?Sized>(
        &self,
        converter: &mut C,
        source: &mut dyn BufRead,
        source_file: &Path,
        entry_hint: Option<&str>,
        output: &Path,
        book: &BookInfo,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Assembled> {
        let images = ImageSource::for_source(source_file, entry_hint);
        let file = BufWriter::new(File::create(output)?);
        let (assembled, mut file) =
            self.assemble_to_writer(converter, source, &images, file, book, diagnostics)?;
        file.flush()?;
        log::info!(
            "wrote {}: {} sections, {} images{}",
            output.display(),
            assembled.sections.len(),
            assembled.images.len(),
            if assembled.cover.is_some() { ", cover" } else { "" }
        );
        Ok(assembled)
    }

    /// Assemble a package into any [`Write`] + [`Seek`] destination.
    pub fn assemble_to_writer<C: Converter + ?Sized, W: Write + Seek>(
        &self,
        converter: &mut C,
        source: &mut dyn BufRead,
        images: &ImageSource,
        writer: W,
        book: &BookInfo,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<(Assembled, W)> {
        let identifier = book.identifier().hyphenated().to_string();
        let modified = book.modified_stamp();
        let stylesheets = self.assets.stylesheets();
        let text_level = self.config.compression_level.unwrap_or(9);

        let mut assembly = Assembly {
            book,
            renderer: self.renderer.as_ref(),
            identifier: &identifier,
            modified: &modified,
            toc_title: &self.config.toc_title,
            stylesheets: &stylesheets,
            package: PackageWriter::new(writer, text_level),
            sections: SectionTracker::new(),
            chapters: ChapterList::new(),
            images: ImageRegistry::new(),
            diagnostics,
            buffer: Vec::with_capacity(BODY_BUFFER_SIZE),
        };

        log::debug!("copying {} template assets", self.assets.assets().len());
        assembly.copy_assets(&self.assets)?;

        log::debug!("streaming body");
        assembly.start_section(0)?;
        converter.convert(source, &mut assembly, book)?;
        assembly.end_section()?;

        log::debug!("resolving cover");
        let cover = resolve_cover(
            book,
            &mut assembly.images,
            self.fetcher.as_ref(),
            &mut *assembly.diagnostics,
        );

        log::debug!("rendering package documents");
        assembly.write_metadata()?;

        log::debug!("copying {} images", assembly.images.pending_count());
        if let Some(cover) = &cover {
            let name = format!("{OPS_DIR}{IMAGES_DIR}{}", cover.image.file_name);
            assembly
                .package
                .write_entry(&name, EntryCompression::Default, &cover.data)?;
            assembly.images.take_cover();
        }
        let copied = images.copy_into(&mut assembly.images, &mut assembly.package)?;
        let missing = assembly.images.take_unresolved();
        for source in &missing {
            assembly.diagnostics.report(Error::MissingImage(source.clone()));
        }
        log::debug!("copied {copied} images, {} missing", missing.len());

        let Assembly {
            package,
            sections,
            chapters,
            images: registry,
            ..
        } = assembly;
        log::debug!(
            "closing package: {} entries, {} chapters",
            package.entry_count(),
            chapters.len()
        );
        let writer = package.finish()?;

        let assembled = Assembled {
            sections: sections.into_sections(),
            chapters: chapters.into_chapters(),
            images: registry.images().to_vec(),
            cover: cover.map(|c| c.image),
            missing,
        };
        Ok((assembled, writer))
    }
}

impl Default for EpubAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a package with the default assembler, logging non-fatal problems.
pub fn assemble<C: Converter + ?Sized>(
    converter: &mut C,
    source: &mut dyn BufRead,
    source_file: &Path,
    entry_hint: Option<&str>,
    output: &Path,
    book: &BookInfo,
) -> Result<Assembled> {
    EpubAssembler::new().assemble(
        converter,
        source,
        source_file,
        entry_hint,
        output,
        book,
        &mut LogDiagnostics,
    )
}

/// State of one in-flight assembly.
struct Assembly<'a, 'd, W: Write + Seek> {
    book: &'a BookInfo,
    renderer: &'a dyn Render,
    identifier: &'a str,
    modified: &'a str,
    toc_title: &'a str,
    stylesheets: &'a [String],
    package: PackageWriter<W>,
    sections: SectionTracker,
    chapters: ChapterList,
    images: ImageRegistry,
    diagnostics: &'d mut dyn Diagnostics,
    buffer: Vec<u8>,
}

impl<W: Write + Seek> Assembly<'_, '_, W> {
    fn context<'s>(&'s self, section: Option<&'s Section>) -> TemplateContext<'s> {
        TemplateContext {
            book: self.book,
            identifier: self.identifier,
            modified: self.modified,
            toc_title: self.toc_title,
            section,
            sections: self.sections.sections(),
            images: self.images.images(),
            chapters: self.chapters.chapters(),
            stylesheets: self.stylesheets,
        }
    }

    fn copy_assets(&mut self, assets: &TemplateAssets) -> Result<()> {
        for (i, asset) in assets.assets().iter().enumerate() {
            let compression = if i == 0 {
                EntryCompression::Stored
            } else {
                EntryCompression::Text
            };
            self.package.write_entry(&asset.name, compression, &asset.data)?;
        }
        Ok(())
    }

    fn start_section(&mut self, line: usize) -> Result<()> {
        let image_fit = self.book.is_image_section_line(line);
        let section = self.sections.allocate(image_fit).clone();
        // placeholder label until the converter finds a heading
        self.chapters.add(&section.id, &section.id, &section.id);

        self.package
            .start_entry(&section_entry_name(&section), EntryCompression::Text)?;
        let header = self
            .renderer
            .render(Template::SectionHeader, &self.context(Some(&section)))?;
        self.package.write_all(header.as_bytes())?;
        Ok(())
    }

    fn end_section(&mut self) -> Result<()> {
        self.flush_buffer()?;
        let footer = self
            .renderer
            .render(Template::SectionFooter, &self.context(self.sections.current()))?;
        self.package.write_all(footer.as_bytes())?;
        self.package.finish_entry()
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.package.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    fn write_metadata(&mut self) -> Result<()> {
        let documents = [
            (format!("{OPS_DIR}package.opf"), Template::Package),
            (format!("{OPS_DIR}{XHTML_DIR}nav.xhtml"), Template::Navigation),
            (format!("{OPS_DIR}toc.ncx"), Template::Ncx),
        ];
        for (name, template) in documents {
            let text = self.renderer.render(template, &self.context(None))?;
            self.package
                .write_entry(&name, EntryCompression::Text, text.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write + Seek> Write for Assembly<'_, '_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= BODY_BUFFER_SIZE {
            self.flush_buffer()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()
    }
}

impl<W: Write + Seek> ContentSink for Assembly<'_, '_, W> {
    fn next_section(&mut self, line: usize) -> Result<()> {
        self.end_section()?;
        self.start_section(line)
    }

    fn resolve_image(&mut self, source: &str) -> String {
        match self.images.resolve(source) {
            Resolution::Unsupported { href, media_type } => {
                self.diagnostics.report(Error::UnsupportedImage {
                    path: source.to_string(),
                    media_type,
                });
                href
            }
            resolution => resolution.href().to_string(),
        }
    }

    fn add_chapter(&mut self, chapter_id: &str, name: &str) {
        if let Some(section) = self.sections.current() {
            self.chapters.add(&section.id, chapter_id, name);
        }
    }

    fn rename_last_chapter(&mut self, name: &str) {
        self.chapters.rename_last(name);
    }
}
