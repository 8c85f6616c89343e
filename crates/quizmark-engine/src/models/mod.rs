//! # Quiz model
//!
//! Entities are built during a single pass and are immutable afterwards.
//! Builders (`QuestionBuilder`, `GroupBuilder`, `TextRegionBuilder`) hold the
//! in-progress state and enforce per-entity rules; `finish` runs the final
//! checks and computes identities.

pub mod choice;
pub mod group;
pub mod numerical;
pub mod points;
pub mod question;
pub mod quiz;
pub mod text_region;

pub use choice::Choice;
pub use group::{Group, GroupMember};
pub use numerical::NumericalAnswer;
pub use points::Points;
pub use question::{Question, QuestionType};
pub use quiz::{Quiz, QuizEntry, QuizItem, QuizOptions};
pub use text_region::TextRegion;

pub(crate) use group::GroupBuilder;
pub(crate) use question::QuestionBuilder;
pub(crate) use text_region::TextRegionBuilder;

use crate::render::{RenderError, Renderer};

/// Authored text together with its rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub raw: String,
    pub rendered: String,
}

impl RichText {
    pub(crate) fn render<R: Renderer>(text: &str, renderer: &mut R) -> Result<Self, RenderError> {
        Ok(Self {
            raw: text.to_string(),
            rendered: renderer.render_inline(text)?,
        })
    }
}
