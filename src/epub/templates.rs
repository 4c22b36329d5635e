//! Text bodies rendered from the accumulated bookkeeping.
//!
//! The assembler only depends on the [`Render`] trait. [`XmlTemplates`] is the
//! built-in implementation and writes EPUB 3 documents directly.

use crate::book::{BookInfo, Chapter, Image, Section};
use crate::error::{Error, Result};
use crate::util::escape_xml;

/// Which document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Opening markup of a section file, up to the body content.
    SectionHeader,
    /// Closing markup of a section file.
    SectionFooter,
    /// `OPS/package.opf`
    Package,
    /// `OPS/xhtml/nav.xhtml`
    Navigation,
    /// `OPS/toc.ncx`
    Ncx,
}

/// Everything a template may refer to.
///
/// `section` is set while a section is being opened or closed; the lists hold
/// whatever has been accumulated at the time of rendering.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub book: &'a BookInfo,
    /// Hyphenated UUID, without the `urn:uuid:` prefix.
    pub identifier: &'a str,
    pub modified: &'a str,
    pub toc_title: &'a str,
    pub section: Option<&'a Section>,
    pub sections: &'a [Section],
    pub images: &'a [Image],
    pub chapters: &'a [Chapter],
    /// Stylesheet hrefs relative to `OPS/`.
    pub stylesheets: &'a [String],
}

/// Turns a template id and a context into text.
pub trait Render {
    fn render(&self, template: Template, ctx: &TemplateContext<'_>) -> Result<String>;
}

/// Built-in EPUB 3 templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlTemplates;

impl Render for XmlTemplates {
    fn render(&self, template: Template, ctx: &TemplateContext<'_>) -> Result<String> {
        match template {
            Template::SectionHeader => {
                let section = ctx
                    .section
                    .ok_or_else(|| Error::Template("section header needs a section".into()))?;
                Ok(section_header(ctx, section))
            }
            Template::SectionFooter => Ok(SECTION_FOOTER.to_string()),
            Template::Package => Ok(generate_opf(ctx)),
            Template::Navigation => Ok(generate_nav(ctx)),
            Template::Ncx => Ok(generate_ncx(ctx)),
        }
    }
}

const SECTION_FOOTER: &str = "</div>\n</body>\n</html>\n";

fn section_header(ctx: &TemplateContext<'_>, section: &Section) -> String {
    let (class, css) = if ctx.book.is_vertical() {
        ("vrtl", "vertical")
    } else {
        ("hltr", "horizontal")
    };
    let variant = if section.image_fit { "_image" } else { "" };
    let lang = escape_xml(&ctx.book.language);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    out.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{lang}\" class=\"{class}\">\n"
    ));
    out.push_str("<head>\n<meta charset=\"UTF-8\"/>\n");
    out.push_str(&format!("<title>{}</title>\n", escape_xml(&ctx.book.title)));
    out.push_str(&format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"../css/{css}{variant}.css\"/>\n"
    ));
    out.push_str("</head>\n");
    out.push_str(&format!("<body>\n<div class=\"main\" id=\"s{}\">\n", section.id));
    out
}

/// Manifest id of a section item.
fn section_item_id(section: &Section) -> String {
    format!("sec{}", section.id)
}

/// Manifest id of an image item.
fn image_item_id(image: &Image) -> String {
    format!("img{}", image.id)
}

/// Link target of a chapter relative to `base` (`""` from nav, `xhtml/` from the NCX).
fn chapter_href(chapter: &Chapter, base: &str) -> String {
    if chapter.chapter_id == chapter.section_id {
        format!("{base}{}.xhtml", chapter.section_id)
    } else {
        format!("{base}{}.xhtml#{}", chapter.section_id, chapter.chapter_id)
    }
}

fn generate_opf(ctx: &TemplateContext<'_>) -> String {
    let book = ctx.book;
    let mut opf = String::new();

    opf.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" xml:lang="{}" unique-identifier="unique-id" prefix="rendition: http://www.idpf.org/vocab/rendition/#">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        escape_xml(&book.language)
    ));
    opf.push_str(&format!(
        "    <dc:title id=\"title\">{}</dc:title>\n",
        escape_xml(&book.title)
    ));
    if !book.creator.is_empty() {
        opf.push_str(&format!(
            "    <dc:creator id=\"creator01\">{}</dc:creator>\n",
            escape_xml(&book.creator)
        ));
    }
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&book.language)
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"unique-id\">urn:uuid:{}</dc:identifier>\n",
        ctx.identifier
    ));
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        ctx.modified
    ));
    if let Some(cover) = ctx.images.iter().find(|i| i.is_cover) {
        opf.push_str(&format!(
            "    <meta name=\"cover\" content=\"{}\"/>\n",
            image_item_id(cover)
        ));
    }
    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str("    <item id=\"nav\" href=\"xhtml/nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    for (i, href) in ctx.stylesheets.iter().enumerate() {
        opf.push_str(&format!(
            "    <item id=\"css{}\" href=\"{}\" media-type=\"text/css\"/>\n",
            i + 1,
            escape_xml(href)
        ));
    }
    for section in ctx.sections {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"xhtml/{}.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
            section_item_id(section),
            section.id
        ));
    }
    for image in ctx.images {
        let properties = if image.is_cover {
            " properties=\"cover-image\""
        } else {
            ""
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"images/{}\" media-type=\"{}\"{properties}/>\n",
            image_item_id(image),
            escape_xml(&image.file_name),
            image.media_type
        ));
    }
    opf.push_str("  </manifest>\n");

    let direction = if book.is_vertical() { "rtl" } else { "ltr" };
    opf.push_str(&format!(
        "  <spine page-progression-direction=\"{direction}\" toc=\"ncx\">\n"
    ));
    for section in ctx.sections {
        if section.image_fit {
            opf.push_str(&format!(
                "    <itemref idref=\"{}\" properties=\"rendition:page-spread-center\"/>\n",
                section_item_id(section)
            ));
        } else {
            opf.push_str(&format!(
                "    <itemref idref=\"{}\"/>\n",
                section_item_id(section)
            ));
        }
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_nav(ctx: &TemplateContext<'_>) -> String {
    let lang = escape_xml(&ctx.book.language);
    let mut nav = String::new();

    nav.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    nav.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{lang}\" lang=\"{lang}\">\n"
    ));
    nav.push_str(&format!(
        "<head>\n<meta charset=\"UTF-8\"/>\n<title>{}</title>\n</head>\n<body>\n",
        escape_xml(&ctx.book.title)
    ));
    nav.push_str("<nav epub:type=\"toc\" id=\"toc\">\n");
    nav.push_str(&format!("<h1>{}</h1>\n<ol>\n", escape_xml(ctx.toc_title)));
    for chapter in ctx.chapters {
        nav.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_xml(&chapter_href(chapter, "")),
            escape_xml(&chapter.name)
        ));
    }
    nav.push_str("</ol>\n</nav>\n</body>\n</html>\n");
    nav
}

fn generate_ncx(ctx: &TemplateContext<'_>) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="urn:uuid:"#,
    );
    ncx.push_str(ctx.identifier);
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_xml(&ctx.book.title));
    ncx.push_str("</text>\n  </docTitle>\n");
    if !ctx.book.creator.is_empty() {
        ncx.push_str(&format!(
            "  <docAuthor>\n    <text>{}</text>\n  </docAuthor>\n",
            escape_xml(&ctx.book.creator)
        ));
    }
    ncx.push_str("  <navMap>\n");

    for (i, chapter) in ctx.chapters.iter().enumerate() {
        let play_order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navPoint-{play_order}\" playOrder=\"{play_order}\">\n"
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape_xml(&chapter.name)
        ));
        ncx.push_str(&format!(
            "      <content src=\"{}\"/>\n",
            escape_xml(&chapter_href(chapter, "xhtml/"))
        ));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::WritingDirection;

    fn context<'a>(
        book: &'a BookInfo,
        sections: &'a [Section],
        images: &'a [Image],
        chapters: &'a [Chapter],
        stylesheets: &'a [String],
    ) -> TemplateContext<'a> {
        TemplateContext {
            book,
            identifier: "00000000-0000-5000-8000-000000000000",
            modified: "2024-01-01T00:00:00Z",
            toc_title: "目次",
            section: sections.last(),
            sections,
            images,
            chapters,
            stylesheets,
        }
    }

    #[test]
    fn test_header_stylesheet_follows_direction_and_fit() {
        let book = BookInfo::new("T", "C").with_direction(WritingDirection::Horizontal);
        let sections = [Section {
            id: "0002".into(),
            image_fit: true,
        }];
        let ctx = context(&book, &sections, &[], &[], &[]);
        let header = XmlTemplates.render(Template::SectionHeader, &ctx).unwrap();
        assert!(header.contains("../css/horizontal_image.css"));
        assert!(header.contains("class=\"hltr\""));
        assert!(header.contains("<title>T</title>"));
    }

    #[test]
    fn test_header_without_section_fails() {
        let book = BookInfo::new("T", "C");
        let ctx = context(&book, &[], &[], &[], &[]);
        let err = XmlTemplates
            .render(Template::SectionHeader, &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_package_lists_sections_images_and_cover() {
        let book = BookInfo::new("A & B", "C");
        let sections = [
            Section {
                id: "0001".into(),
                image_fit: false,
            },
            Section {
                id: "0002".into(),
                image_fit: true,
            },
        ];
        let images = [
            Image {
                id: "cover".into(),
                file_name: "cover.jpg".into(),
                media_type: "image/jpeg".into(),
                is_cover: true,
            },
            Image {
                id: "0001".into(),
                file_name: "0001.png".into(),
                media_type: "image/png".into(),
                is_cover: false,
            },
        ];
        let stylesheets = ["css/vertical.css".to_string()];
        let ctx = context(&book, &sections, &images, &[], &stylesheets);
        let opf = XmlTemplates.render(Template::Package, &ctx).unwrap();

        assert!(opf.contains("<dc:title id=\"title\">A &amp; B</dc:title>"));
        assert!(opf.contains("href=\"xhtml/0002.xhtml\""));
        assert!(opf.contains("href=\"images/cover.jpg\" media-type=\"image/jpeg\" properties=\"cover-image\""));
        assert!(opf.contains("href=\"images/0001.png\" media-type=\"image/png\"/>"));
        assert!(opf.contains("<meta name=\"cover\" content=\"imgcover\"/>"));
        assert!(opf.contains("page-progression-direction=\"rtl\""));
        assert!(opf.contains("idref=\"sec0002\" properties=\"rendition:page-spread-center\""));
        assert!(opf.contains("href=\"css/vertical.css\""));
        assert_eq!(opf.matches("cover-image").count(), 1);
    }

    #[test]
    fn test_nav_and_ncx_link_chapters() {
        let book = BookInfo::new("T", "C");
        let chapters = [
            Chapter {
                section_id: "0001".into(),
                chapter_id: "0001".into(),
                name: "序".into(),
            },
            Chapter {
                section_id: "0001".into(),
                chapter_id: "h2".into(),
                name: "<二>".into(),
            },
        ];
        let ctx = context(&book, &[], &[], &chapters, &[]);

        let nav = XmlTemplates.render(Template::Navigation, &ctx).unwrap();
        assert!(nav.contains("<h1>目次</h1>"));
        assert!(nav.contains("<a href=\"0001.xhtml\">序</a>"));
        assert!(nav.contains("<a href=\"0001.xhtml#h2\">&lt;二&gt;</a>"));

        let ncx = XmlTemplates.render(Template::Ncx, &ctx).unwrap();
        assert!(ncx.contains("<content src=\"xhtml/0001.xhtml#h2\"/>"));
        assert!(ncx.contains("playOrder=\"2\""));
        assert!(ncx.contains("urn:uuid:00000000-0000-5000-8000-000000000000"));
    }
}
