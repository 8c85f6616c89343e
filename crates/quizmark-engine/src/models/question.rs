use std::collections::HashSet;
use std::fmt;

use crate::error::ErrorKind;
use crate::hash::ContentHash;
use crate::render::Renderer;

use super::{Choice, NumericalAnswer, Points, RichText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    MultipleAnswers,
    ShortAnswer,
    Numerical,
    Essay,
    FileUpload,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice_question",
            QuestionType::TrueFalse => "true_false_question",
            QuestionType::MultipleAnswers => "multiple_answers_question",
            QuestionType::ShortAnswer => "short_answer_question",
            QuestionType::Numerical => "numerical_question",
            QuestionType::Essay => "essay_question",
            QuestionType::FileUpload => "file_upload_question",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized question. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub hash: ContentHash,
    pub question_type: QuestionType,
    pub title_raw: Option<String>,
    /// Escaped title, `Question` when none was given.
    pub title: String,
    pub raw: String,
    pub rendered: String,
    pub choices: Vec<Choice>,
    pub points: Points,
    pub feedback: Option<RichText>,
    pub correct_feedback: Option<RichText>,
    pub incorrect_feedback: Option<RichText>,
    pub numerical: Option<NumericalAnswer>,
    pub solution: Option<RichText>,
}

impl Question {
    pub fn correct_choices(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter().filter(|c| c.correct)
    }
}

/// Accumulates a question's parts while its directives are being read.
///
/// The question type stays open until a directive pins it (short answer,
/// multiple answers, numerical, essay, upload); otherwise it is inferred at
/// [`QuestionBuilder::finish`] from the choices.
#[derive(Debug)]
pub(crate) struct QuestionBuilder {
    question_type: Option<QuestionType>,
    title_raw: Option<String>,
    title: String,
    raw: String,
    rendered: String,
    hash: ContentHash,
    choices: Vec<Choice>,
    seen_choices: HashSet<String>,
    correct_count: usize,
    points: Points,
    feedback: Option<RichText>,
    correct_feedback: Option<RichText>,
    incorrect_feedback: Option<RichText>,
    numerical: Option<NumericalAnswer>,
    solution: Option<RichText>,
}

impl QuestionBuilder {
    pub(crate) fn new<R: Renderer>(
        text: &str,
        title: Option<String>,
        points: Option<Points>,
        renderer: &mut R,
    ) -> Result<Self, ErrorKind> {
        let (rendered, hash) = renderer.render_hash(text)?;
        let escaped_title = match &title {
            Some(t) => renderer.escape(t),
            None => "Question".to_string(),
        };
        Ok(Self {
            question_type: None,
            title_raw: title,
            title: escaped_title,
            raw: text.to_string(),
            rendered,
            hash,
            choices: Vec::new(),
            seen_choices: HashSet::new(),
            correct_count: 0,
            points: points.unwrap_or(Points::ONE),
            feedback: None,
            correct_feedback: None,
            incorrect_feedback: None,
            numerical: None,
            solution: None,
        })
    }

    pub(crate) fn rendered(&self) -> &str {
        &self.rendered
    }

    fn type_name(&self) -> &'static str {
        self.question_type.map_or("unknown", QuestionType::as_str)
    }

    fn push_choice(&mut self, choice: Choice) -> Result<(), ErrorKind> {
        if !self.seen_choices.insert(choice.rendered.clone()) {
            return Err(ErrorKind::DuplicateChoice);
        }
        if choice.correct {
            self.correct_count += 1;
        }
        self.choices.push(choice);
        Ok(())
    }

    /// Pins the question type for a directive that implies it, or checks
    /// that an already-pinned type matches.
    fn pin_type(&mut self, wanted: QuestionType, what: &str) -> Result<(), ErrorKind> {
        match self.question_type {
            None => {
                self.question_type = Some(wanted);
                if !self.choices.is_empty() {
                    return Err(ErrorKind::semantic(format!(
                        "Question type \"{wanted}\" is not compatible with existing choices"
                    )));
                }
                Ok(())
            }
            Some(current) if current == wanted => Ok(()),
            Some(current) => Err(ErrorKind::semantic(format!(
                "Question type \"{current}\" does not support {what}"
            ))),
        }
    }

    /// Pins a response type that may be given only once and that excludes
    /// choices and correct/incorrect feedback.
    fn pin_response_type(&mut self, wanted: QuestionType, what: &str) -> Result<(), ErrorKind> {
        if self.question_type == Some(wanted) {
            return Err(ErrorKind::semantic(format!(
                "Cannot specify {what} multiple times"
            )));
        }
        self.pin_type(wanted, what)?;
        if self.correct_feedback.is_some() || self.incorrect_feedback.is_some() {
            return Err(ErrorKind::semantic(format!(
                "Question type \"{wanted}\" does not support correct/incorrect feedback"
            )));
        }
        Ok(())
    }

    pub(crate) fn add_choice<R: Renderer>(
        &mut self,
        text: &str,
        correct: bool,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        if self.question_type.is_some() {
            return Err(ErrorKind::semantic(format!(
                "Question type \"{}\" does not support multiple choice",
                self.type_name()
            )));
        }
        let choice = Choice::rendered(text, correct, &self.hash, renderer)?;
        self.push_choice(choice)
    }

    pub(crate) fn add_multiple_answer<R: Renderer>(
        &mut self,
        text: &str,
        correct: bool,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        self.pin_type(QuestionType::MultipleAnswers, "multiple answers")?;
        let choice = Choice::rendered(text, correct, &self.hash, renderer)?;
        self.push_choice(choice)
    }

    pub(crate) fn add_short_answer<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &R,
    ) -> Result<(), ErrorKind> {
        self.pin_type(QuestionType::ShortAnswer, "short answer")?;
        let choice = Choice::literal(text, &self.hash, renderer);
        self.push_choice(choice)
    }

    pub(crate) fn set_essay(&mut self) -> Result<(), ErrorKind> {
        self.pin_response_type(QuestionType::Essay, "essay response")
    }

    pub(crate) fn set_upload(&mut self) -> Result<(), ErrorKind> {
        self.pin_response_type(QuestionType::FileUpload, "upload response")
    }

    pub(crate) fn set_numerical(&mut self, text: &str) -> Result<(), ErrorKind> {
        self.pin_response_type(QuestionType::Numerical, "numerical response")?;
        self.numerical = Some(NumericalAnswer::parse(text)?);
        Ok(())
    }

    /// `...` feedback: general feedback right after the prompt, otherwise
    /// feedback for the most recent choice.
    pub(crate) fn add_feedback<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        if matches!(
            self.question_type,
            Some(QuestionType::Essay | QuestionType::FileUpload | QuestionType::Numerical)
        ) {
            return Err(ErrorKind::semantic(
                "Question feedback must immediately follow the question",
            ));
        }
        match self.choices.last_mut() {
            Some(choice) => choice.set_feedback(text, renderer),
            None => {
                if self.feedback.is_some() {
                    return Err(ErrorKind::semantic("Feedback can only be specified once"));
                }
                self.feedback = Some(RichText::render(text, renderer)?);
                Ok(())
            }
        }
    }

    pub(crate) fn add_correct_feedback<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        self.check_outcome_feedback("Correct")?;
        if self.correct_feedback.is_some() {
            return Err(ErrorKind::semantic("Feedback can only be specified once"));
        }
        self.correct_feedback = Some(RichText::render(text, renderer)?);
        Ok(())
    }

    pub(crate) fn add_incorrect_feedback<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        self.check_outcome_feedback("Incorrect")?;
        if self.incorrect_feedback.is_some() {
            return Err(ErrorKind::semantic("Feedback can only be specified once"));
        }
        self.incorrect_feedback = Some(RichText::render(text, renderer)?);
        Ok(())
    }

    fn check_outcome_feedback(&self, label: &str) -> Result<(), ErrorKind> {
        if let Some(t @ (QuestionType::Essay | QuestionType::FileUpload)) = self.question_type {
            return Err(ErrorKind::semantic(format!(
                "Question type \"{t}\" does not support {} feedback",
                label.to_lowercase()
            )));
        }
        if !self.choices.is_empty() || self.question_type == Some(QuestionType::Numerical) {
            return Err(ErrorKind::semantic(format!(
                "{label} feedback can only be specified for questions"
            )));
        }
        Ok(())
    }

    pub(crate) fn set_solution<R: Renderer>(
        &mut self,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), ErrorKind> {
        if self.solution.is_some() {
            return Err(ErrorKind::semantic("Solution can only be specified once"));
        }
        self.solution = Some(RichText::render(text, renderer)?);
        Ok(())
    }

    /// Resolves the question type and checks the per-type invariants.
    pub(crate) fn finish(self) -> Result<Question, ErrorKind> {
        let question_type = match self.question_type {
            None => {
                let question_type = if self.choices.len() == 2
                    && self.choices.iter().all(Choice::is_boolean_text)
                {
                    QuestionType::TrueFalse
                } else {
                    QuestionType::MultipleChoice
                };
                if self.choices.is_empty() {
                    return Err(ErrorKind::semantic("Question must provide choices"));
                }
                if self.choices.len() < 2 {
                    return Err(ErrorKind::semantic(
                        "Question must provide more than one choice",
                    ));
                }
                if self.correct_count < 1 {
                    return Err(ErrorKind::semantic("Question must specify a correct choice"));
                }
                if self.correct_count > 1 {
                    return Err(ErrorKind::semantic(
                        "Question must specify only one correct choice",
                    ));
                }
                question_type
            }
            Some(QuestionType::ShortAnswer) => {
                if self.choices.is_empty() {
                    return Err(ErrorKind::semantic(
                        "Question must provide at least one answer",
                    ));
                }
                QuestionType::ShortAnswer
            }
            Some(QuestionType::MultipleAnswers) => {
                if self.choices.len() < 2 {
                    return Err(ErrorKind::semantic(
                        "Question must provide more than one choice",
                    ));
                }
                if self.correct_count < 1 {
                    return Err(ErrorKind::semantic("Question must specify a correct choice"));
                }
                QuestionType::MultipleAnswers
            }
            Some(other) => other,
        };

        Ok(Question {
            id: self.hash.to_hex(),
            hash: self.hash,
            question_type,
            title_raw: self.title_raw,
            title: self.title,
            raw: self.raw,
            rendered: self.rendered,
            choices: self.choices,
            points: self.points,
            feedback: self.feedback,
            correct_feedback: self.correct_feedback,
            incorrect_feedback: self.incorrect_feedback,
            numerical: self.numerical,
            solution: self.solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlainTextRenderer;
    use pretty_assertions::assert_eq;

    fn builder(text: &str) -> QuestionBuilder {
        QuestionBuilder::new(text, None, None, &mut PlainTextRenderer).unwrap()
    }

    #[test]
    fn infers_multiple_choice() {
        let mut r = PlainTextRenderer;
        let mut q = builder("2+2=?");
        q.add_choice("3", false, &mut r).unwrap();
        q.add_choice("4", true, &mut r).unwrap();
        let q = q.finish().unwrap();
        assert_eq!(q.question_type, QuestionType::MultipleChoice);
        assert_eq!(q.title, "Question");
        assert_eq!(q.points, Points::ONE);
        assert_eq!(q.correct_choices().count(), 1);
    }

    #[test]
    fn infers_true_false() {
        let mut r = PlainTextRenderer;
        let mut q = builder("The sky is blue.");
        q.add_choice("True", true, &mut r).unwrap();
        q.add_choice("false", false, &mut r).unwrap();
        assert_eq!(q.finish().unwrap().question_type, QuestionType::TrueFalse);
    }

    #[test]
    fn choice_ids_are_keyed_by_question() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Pick");
        q.add_choice("a", true, &mut r).unwrap();
        q.add_choice("b", false, &mut r).unwrap();
        let q = q.finish().unwrap();
        let expected = ContentHash::keyed(&ContentHash::of("Pick"), "a").to_hex();
        assert_eq!(q.choices[0].id, expected);
        assert_eq!(q.choices[0].question_id, q.id);
    }

    #[test]
    fn rejects_duplicate_choice() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Pick");
        q.add_choice("a", true, &mut r).unwrap();
        assert!(matches!(
            q.add_choice("a", false, &mut r),
            Err(ErrorKind::DuplicateChoice)
        ));
    }

    #[test]
    fn single_answer_needs_exactly_one_correct() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Pick");
        q.add_choice("a", true, &mut r).unwrap();
        q.add_choice("b", true, &mut r).unwrap();
        let err = q.finish().unwrap_err();
        assert_eq!(err.to_string(), "Question must specify only one correct choice");

        let mut q = builder("Pick");
        q.add_choice("a", false, &mut r).unwrap();
        q.add_choice("b", false, &mut r).unwrap();
        let err = q.finish().unwrap_err();
        assert_eq!(err.to_string(), "Question must specify a correct choice");
    }

    #[test]
    fn question_without_choices_fails() {
        let err = builder("Nothing").finish().unwrap_err();
        assert_eq!(err.to_string(), "Question must provide choices");
    }

    #[test]
    fn multiple_answers_allow_several_correct() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Primes?");
        q.add_multiple_answer("2", true, &mut r).unwrap();
        q.add_multiple_answer("3", true, &mut r).unwrap();
        q.add_multiple_answer("4", false, &mut r).unwrap();
        let q = q.finish().unwrap();
        assert_eq!(q.question_type, QuestionType::MultipleAnswers);
        assert_eq!(q.correct_choices().count(), 2);
    }

    #[test]
    fn mixing_choice_kinds_is_rejected() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Mixed");
        q.add_choice("a", true, &mut r).unwrap();
        let err = q.add_multiple_answer("b", false, &mut r).unwrap_err();
        assert!(err.to_string().contains("not compatible with existing choices"));

        let mut q = builder("Mixed");
        q.add_multiple_answer("a", true, &mut r).unwrap();
        let err = q.add_choice("b", false, &mut r).unwrap_err();
        assert!(err.to_string().contains("does not support multiple choice"));
    }

    #[test]
    fn essay_excludes_outcome_feedback() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Discuss.");
        q.add_correct_feedback("Good", &mut r).unwrap();
        assert!(q.set_essay().is_err());

        let mut q = builder("Discuss.");
        q.set_essay().unwrap();
        assert!(q.set_essay().unwrap_err().to_string().contains("multiple times"));
        assert!(q.add_incorrect_feedback("Bad", &mut r).is_err());
    }

    #[test]
    fn feedback_attaches_to_last_choice() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Pick");
        q.add_feedback("general", &mut r).unwrap();
        q.add_choice("a", true, &mut r).unwrap();
        q.add_feedback("about a", &mut r).unwrap();
        q.add_choice("b", false, &mut r).unwrap();
        let q = q.finish().unwrap();
        assert_eq!(q.feedback.unwrap().raw, "general");
        assert_eq!(q.choices[0].feedback.as_ref().unwrap().raw, "about a");
        assert!(q.choices[1].feedback.is_none());
    }

    #[test]
    fn numerical_sets_range() {
        let mut q = builder("Pi?");
        q.set_numerical("3.14 +- 0.01").unwrap();
        let q = q.finish().unwrap();
        assert_eq!(q.question_type, QuestionType::Numerical);
        assert_eq!(q.numerical.unwrap().exact, Some(3.14));
    }

    #[test]
    fn solution_only_once() {
        let mut r = PlainTextRenderer;
        let mut q = builder("Discuss.");
        q.set_solution("Because.", &mut r).unwrap();
        assert!(q.set_solution("Again.", &mut r).is_err());
    }
}
