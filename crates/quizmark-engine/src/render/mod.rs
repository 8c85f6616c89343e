//! # Rendering
//!
//! The parser never formats text itself. Every prompt, choice, feedback and
//! solution field is passed once through a [`Renderer`], and the rendered
//! form (not the authored source) is what gets hashed and checked for
//! duplicates.
//!
//! - **`markdown`**: [`MarkdownRenderer`], Markdown to HTML with local image
//!   collection
//! - [`PlainTextRenderer`]: escaping only, for plain-text exports

pub mod markdown;

use std::path::PathBuf;

use crate::hash::ContentHash;

pub use markdown::MarkdownRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("File \"{0}\" does not exist")]
    NotFound(PathBuf),
    #[error("File \"{path}\" cannot be read:\n{source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Hash collision occurred during image deduplication")]
    NameCollision,
}

/// An external file referenced by rendered content, to be packaged alongside
/// the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Content hash of `data`.
    pub id: String,
    /// Unique file name within the package.
    pub name: String,
    /// Where the file was read from.
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl Resource {
    pub fn new(name: String, path: PathBuf, data: Vec<u8>) -> Self {
        let id = blake3::hash(&data).to_hex().to_string();
        Self {
            id,
            name,
            path,
            data,
        }
    }

    /// Path of the resource inside an export package.
    pub fn package_path(&self) -> String {
        format!("images/{}", self.name)
    }
}

/// Converts authored text into its rendered form.
///
/// Implementations must be deterministic: the same input under the same
/// configuration always renders to the same output, since rendered content
/// is the basis of every entity's identity.
pub trait Renderer {
    /// Renders a block of authored Markdown-ish text.
    fn render_inline(&mut self, text: &str) -> Result<String, RenderError>;

    /// Escapes text that is used verbatim (titles, short answers).
    fn escape(&self, text: &str) -> String;

    /// Hands over every external resource discovered so far.
    fn take_resources(&mut self) -> Vec<Resource>;

    fn render_hash(&mut self, text: &str) -> Result<(String, ContentHash), RenderError> {
        let rendered = self.render_inline(text)?;
        let hash = ContentHash::of(&rendered);
        Ok((rendered, hash))
    }
}

/// Renders by escaping only; useful when the export target is plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    fn render_inline(&mut self, text: &str) -> Result<String, RenderError> {
        Ok(self.escape(text))
    }

    fn escape(&self, text: &str) -> String {
        html_escape::encode_safe(text).into_owned()
    }

    fn take_resources(&mut self) -> Vec<Resource> {
        Vec::new()
    }
}
