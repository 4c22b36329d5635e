//! Navigation labels collected while the body streams.

use crate::book::Chapter;

#[derive(Debug, Default)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
}

impl ChapterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chapter bound to `section_id`.
    pub fn add(&mut self, section_id: &str, chapter_id: &str, name: &str) {
        self.chapters.push(Chapter {
            section_id: section_id.to_string(),
            chapter_id: chapter_id.to_string(),
            name: name.to_string(),
        });
    }

    /// Rename the most recently added chapter.
    ///
    /// Callers must add a chapter first; with none present this does nothing.
    pub fn rename_last(&mut self, name: &str) {
        debug_assert!(!self.is_empty(), "rename with no chapters");
        if let Some(last) = self.chapters.last_mut() {
            last.name = name.to_string();
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }
}
