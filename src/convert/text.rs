//! Minimal converter for annotated plain text.
//!
//! Understands a small subset of Aozora Bunko notation:
//!
//! - `［＃改ページ］` on its own line starts a new section
//! - `［＃挿絵（fig01.png）入る］` embeds an image
//! - `…［＃「見出し」は大見出し］` marks a heading (also `中見出し`, `小見出し`, `見出し`)
//!
//! Every other line becomes a paragraph.

use std::collections::BTreeSet;
use std::io::BufRead;

use crate::book::BookInfo;
use crate::error::Result;
use crate::util::escape_xml;

use super::{ContentSink, Converter};

const PAGE_BREAKS: [&str; 2] = ["［＃改ページ］", "[#改ページ]"];
const HEADING_KINDS: [&str; 4] = ["見出し", "大見出し", "中見出し", "小見出し"];

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    PageBreak,
    Image(&'a str),
    Heading(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if PAGE_BREAKS.contains(&trimmed) {
        return Line::PageBreak;
    }
    if let Some(path) = image_reference(trimmed) {
        return Line::Image(path);
    }
    if let Some(text) = heading(trimmed) {
        return Line::Heading(text);
    }
    Line::Text(line)
}

fn image_reference(line: &str) -> Option<&str> {
    let note = line
        .strip_prefix("［＃")?
        .strip_suffix("入る］")?
        .strip_suffix('）')?;
    let open = note.rfind('（')?;
    let inner = &note[open + '（'.len_utf8()..];
    // size hints follow the path: （fig.png、横320×縦240）
    let path = inner.split('、').next().unwrap_or(inner).trim();
    (!path.is_empty()).then_some(path)
}

fn heading(line: &str) -> Option<&str> {
    let start = line.rfind("［＃「")?;
    let note = &line[start + "［＃「".len()..];
    let (text, rest) = note.split_once("」は")?;
    let kind = rest.strip_suffix('］')?;
    HEADING_KINDS.contains(&kind).then_some(text)
}

/// Converts annotated plain text into XHTML body markup.
///
/// The first heading of a section renames that section's placeholder
/// chapter; later headings in the same section add chapters of their own,
/// anchored by id.
#[derive(Debug, Default)]
pub struct TextConverter {
    headings: usize,
}

impl TextConverter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Converter for TextConverter {
    fn convert(
        &mut self,
        source: &mut dyn BufRead,
        sink: &mut dyn ContentSink,
        _book: &BookInfo,
    ) -> Result<()> {
        let mut labelled = false;

        for (index, line) in source.lines().enumerate() {
            let line = line?;
            match classify(&line) {
                Line::PageBreak => {
                    sink.next_section(index + 1)?;
                    labelled = false;
                }
                Line::Image(path) => {
                    let href = sink.resolve_image(path);
                    writeln!(sink, "<p><img src=\"{}\" alt=\"\"/></p>", escape_xml(&href))?;
                }
                Line::Heading(text) => {
                    if labelled {
                        self.headings += 1;
                        let id = format!("h{}", self.headings);
                        sink.add_chapter(&id, text);
                        writeln!(sink, "<h2 id=\"{id}\">{}</h2>", escape_xml(text))?;
                    } else {
                        sink.rename_last_chapter(text);
                        writeln!(sink, "<h2>{}</h2>", escape_xml(text))?;
                        labelled = true;
                    }
                }
                Line::Text("") => writeln!(sink, "<p><br/></p>")?,
                Line::Text(text) => writeln!(sink, "<p>{}</p>", escape_xml(text))?,
            }
        }
        Ok(())
    }
}

/// Start lines of sections whose only content is one image.
///
/// Line numbers match the ones [`TextConverter`] passes to
/// [`ContentSink::next_section`]: `0` for the first section, the line after
/// each page break for the rest.
pub fn image_section_lines(text: &str) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    let mut start = 0;
    let mut images = 0;
    let mut other = 0;

    let mut close = |start: usize, images: usize, other: usize| {
        if images == 1 && other == 0 {
            lines.insert(start);
        }
    };

    for (index, line) in text.lines().enumerate() {
        match classify(line) {
            Line::PageBreak => {
                close(start, images, other);
                start = index + 1;
                images = 0;
                other = 0;
            }
            Line::Image(_) => images += 1,
            Line::Text(t) if t.trim().is_empty() => {}
            _ => other += 1,
        }
    }
    close(start, images, other);
    lines
}
