use crate::error::ErrorKind;
use crate::hash::ContentHash;
use crate::render::Renderer;

use super::RichText;

/// Ungraded text shown between questions.
///
/// Identity includes the region's position in the quiz, so identical text
/// at two places yields two ids.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub id: String,
    pub index: usize,
    pub title_raw: Option<String>,
    /// Escaped title, empty when none was given.
    pub title: String,
    pub text: Option<RichText>,
}

#[derive(Debug)]
pub(crate) struct TextRegionBuilder {
    index: usize,
    title_raw: Option<String>,
    title: String,
    text: Option<RichText>,
}

impl TextRegionBuilder {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            title_raw: None,
            title: String::new(),
            text: None,
        }
    }

    pub(crate) fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub(crate) fn set_title<R: Renderer>(&mut self, text: &str, renderer: &R) -> Result<(), ErrorKind> {
        if self.title_raw.is_some() {
            return Err(ErrorKind::semantic("Text title has already been set"));
        }
        if self.text.is_some() {
            return Err(ErrorKind::semantic("Must set text title before text itself"));
        }
        self.title_raw = Some(text.to_string());
        self.title = renderer.escape(text);
        Ok(())
    }

    pub(crate) fn set_text<R: Renderer>(&mut self, text: &str, renderer: &mut R) -> Result<(), ErrorKind> {
        if self.text.is_some() {
            return Err(ErrorKind::semantic("Text has already been set"));
        }
        self.text = Some(RichText::render(text, renderer)?);
        Ok(())
    }

    pub(crate) fn finish(self) -> TextRegion {
        let index = self.index.to_string();
        let body = self.text.as_ref().map_or("", |t| t.rendered.as_str());
        let hash = ContentHash::of_fields([
            index.as_bytes(),
            self.title.as_bytes(),
            body.as_bytes(),
        ]);
        TextRegion {
            id: hash.to_hex(),
            index: self.index,
            title_raw: self.title_raw,
            title: self.title,
            text: self.text,
        }
    }
}
