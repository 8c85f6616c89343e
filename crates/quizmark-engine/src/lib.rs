pub mod error;
pub mod hash;
pub mod models;
pub mod parsing;
pub mod render;

// Re-export key types for easier usage
pub use error::{ErrorKind, QuizError};
pub use hash::ContentHash;
pub use models::*;
pub use parsing::{ParseOptions, parse_quiz};
pub use render::{MarkdownRenderer, PlainTextRenderer, RenderError, Renderer, Resource};
