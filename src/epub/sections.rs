//! Section numbering.

use crate::book::Section;
use crate::util::format_id;

/// Directory for section files, relative to `OPS/`.
pub const XHTML_DIR: &str = "xhtml/";

/// Hands out sequential section ids and remembers every section created.
#[derive(Debug, Default)]
pub struct SectionTracker {
    sections: Vec<Section>,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next section and return it.
    pub fn allocate(&mut self, image_fit: bool) -> &Section {
        let id = format_id(self.sections.len() + 1);
        self.sections.push(Section { id, image_fit });
        &self.sections[self.sections.len() - 1]
    }

    /// The most recently created section.
    pub fn current(&self) -> Option<&Section> {
        self.sections.last()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

/// Archive path of a section file (`OPS/xhtml/0001.xhtml`).
pub fn section_entry_name(section: &Section) -> String {
    format!("{}{XHTML_DIR}{}.xhtml", super::OPS_DIR, section.id)
}
