use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use super::{RenderError, Renderer, Resource};

/// Markdown to HTML renderer backed by pulldown-cmark.
///
/// Local images are read from disk, deduplicated by content hash and
/// rewritten to their package path; remote images are left untouched.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    resource_dir: Option<PathBuf>,
    resources: Vec<Resource>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative image paths against `dir` instead of the working directory.
    pub fn with_resource_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: Some(dir.into()),
            resources: Vec::new(),
        }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_SMART_PUNCTUATION
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(src).as_ref());
        match &self.resource_dir {
            Some(dir) if expanded.is_relative() => dir.join(expanded),
            _ => expanded,
        }
    }

    /// Loads and registers a local image, returning its package path.
    fn register_image(&mut self, src: &str) -> Result<String, RenderError> {
        let path = self.resolve(src);
        let data = std::fs::read(&path).map_err(|source| match source.kind() {
            IoErrorKind::NotFound => RenderError::NotFound(path.clone()),
            _ => RenderError::Unreadable {
                path: path.clone(),
                source,
            },
        })?;
        let name = file_name(&path);
        let mut resource = Resource::new(name, path, data);

        if let Some(existing) = self.resources.iter().find(|r| r.id == resource.id) {
            return Ok(existing.package_path());
        }

        resource.name = self.unique_name(&resource)?;
        log::debug!(
            "registered resource {} from {}",
            resource.name,
            resource.path.display()
        );
        let package_path = resource.package_path();
        self.resources.push(resource);
        Ok(package_path)
    }

    fn unique_name(&self, resource: &Resource) -> Result<String, RenderError> {
        let taken = |name: &str| self.resources.iter().any(|r| r.name == name);
        if !taken(&resource.name) {
            return Ok(resource.name.clone());
        }
        let stem = resource
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = resource
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut n = 8;
        while n <= resource.id.len() {
            let candidate = format!("{stem}_{}{suffix}", &resource.id[..n]);
            if !taken(&candidate) {
                return Ok(candidate);
            }
            n *= 2;
        }
        Err(RenderError::NameCollision)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

impl Renderer for MarkdownRenderer {
    fn render_inline(&mut self, text: &str) -> Result<String, RenderError> {
        let mut events = Vec::new();
        for event in Parser::new_ext(text, Self::options()) {
            let event = match event {
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) if !dest_url.is_empty() && !is_remote(&dest_url) => {
                    let package_path = self.register_image(&dest_url)?;
                    Event::Start(Tag::Image {
                        link_type,
                        dest_url: CowStr::from(package_path),
                        title,
                        id,
                    })
                }
                other => other,
            };
            events.push(event);
        }

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out.trim_end().to_string())
    }

    fn escape(&self, text: &str) -> String {
        html_escape::encode_safe(text).into_owned()
    }

    fn take_resources(&mut self) -> Vec<Resource> {
        std::mem::take(&mut self.resources)
    }
}
