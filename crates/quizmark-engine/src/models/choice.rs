use crate::error::ErrorKind;
use crate::hash::ContentHash;
use crate::render::Renderer;

use super::RichText;

/// One answer option of a question.
///
/// The id is keyed by the owning question's hash, so the same choice text
/// in two questions gets two ids. Feedback does not affect the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub id: String,
    /// Id of the question this choice belongs to.
    pub question_id: String,
    pub raw: String,
    pub rendered: String,
    pub correct: bool,
    pub feedback: Option<RichText>,
}

impl Choice {
    /// Builds a Markdown-rendered choice (multiple choice, multiple answers).
    pub(crate) fn rendered<R: Renderer>(
        text: &str,
        correct: bool,
        question: &ContentHash,
        renderer: &mut R,
    ) -> Result<Self, ErrorKind> {
        let rendered = renderer.render_inline(text)?;
        Ok(Self::build(text, rendered, correct, question))
    }

    /// Builds a short-answer value, which is matched literally and so only escaped.
    pub(crate) fn literal<R: Renderer>(text: &str, question: &ContentHash, renderer: &R) -> Self {
        let rendered = renderer.escape(text);
        Self::build(text, rendered, true, question)
    }

    fn build(raw: &str, rendered: String, correct: bool, question: &ContentHash) -> Self {
        Self {
            id: ContentHash::keyed(question, &rendered).to_hex(),
            question_id: question.to_hex(),
            raw: raw.to_string(),
            rendered,
            correct,
            feedback: None,
        }
    }

    pub(crate) fn set_feedback<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        if self.feedback.is_some() {
            return Err(ErrorKind::semantic("Feedback can only be specified once"));
        }
        self.feedback = Some(RichText::render(text, renderer)?);
        Ok(())
    }

    /// Whether this choice reads as a true/false answer.
    pub fn is_boolean_text(&self) -> bool {
        self.raw.eq_ignore_ascii_case("true") || self.raw.eq_ignore_ascii_case("false")
    }
}
