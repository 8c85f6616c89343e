use std::collections::HashSet;

use log::debug;

use crate::error::ErrorKind;
use crate::models::{
    GroupBuilder, Points, QuestionBuilder, Quiz, QuizItem, QuizOptions, RichText,
    TextRegionBuilder,
};
use crate::render::Renderer;

use super::classify::DirectiveKind;

/// The entity currently accepting attribute directives.
#[derive(Debug)]
enum Open {
    Question(QuestionBuilder),
    Text(TextRegionBuilder),
}

/// `Title:` and `Points:` waiting for the next question.
#[derive(Debug, Default)]
struct NextQuestion {
    title: Option<String>,
    points: Option<Points>,
}

impl NextQuestion {
    fn is_pending(&self) -> bool {
        self.title.is_some() || self.points.is_some()
    }
}

/// Quiz-level title, description and options.
#[derive(Debug, Default)]
struct QuizMeta {
    title_raw: Option<String>,
    description: Option<RichText>,
    options: QuizOptions,
    options_set: HashSet<DirectiveKind>,
}

/// Single-pass builder state: one directive at a time goes in, a finished
/// [`Quiz`] comes out of [`ParserState::finish`].
pub(crate) struct ParserState<'r, R: Renderer> {
    renderer: &'r mut R,
    meta: QuizMeta,
    items: Vec<QuizItem>,
    open: Option<Open>,
    group: Option<GroupBuilder>,
    next_question: NextQuestion,
    /// Rendered prompts seen so far, for duplicate detection.
    prompts: HashSet<String>,
    /// Length of the flat entry sequence (questions, regions, delimiters).
    entries: usize,
}

fn parse_bool(text: &str) -> Result<bool, ErrorKind> {
    match text {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        _ => Err(ErrorKind::syntax(
            "Expected option value \"true\" or \"false\"",
        )),
    }
}

fn option_name(kind: DirectiveKind) -> &'static str {
    match kind {
        DirectiveKind::ShuffleAnswers => "Shuffle answers",
        DirectiveKind::ShowCorrectAnswers => "Show correct answers",
        DirectiveKind::OneQuestionAtATime => "One question at a time",
        DirectiveKind::CantGoBack => "Can't go back",
        DirectiveKind::AllowedAttempts => "Number of attempts",
        _ => "",
    }
}

impl<'r, R: Renderer> ParserState<'r, R> {
    pub(crate) fn new(renderer: &'r mut R) -> Self {
        Self {
            renderer,
            meta: QuizMeta::default(),
            items: Vec::new(),
            open: None,
            group: None,
            next_question: NextQuestion::default(),
            prompts: HashSet::new(),
            entries: 0,
        }
    }

    fn started(&self) -> bool {
        self.entries > 0
    }

    /// Handles one complete directive.
    pub(crate) fn dispatch(&mut self, kind: DirectiveKind, text: &str) -> Result<(), ErrorKind> {
        debug!("{kind:?}: {text:?}");
        if self.next_question.is_pending()
            && !matches!(
                kind,
                DirectiveKind::Question | DirectiveKind::QuestionTitle | DirectiveKind::QuestionPoints
            )
        {
            return Err(ErrorKind::UnusedQuestionAttributes);
        }

        match kind {
            DirectiveKind::Question => self.start_question(text),
            DirectiveKind::QuestionTitle => self.set_next_title(text),
            DirectiveKind::QuestionPoints => self.set_next_points(text),

            DirectiveKind::ChoiceCorrect | DirectiveKind::ChoiceIncorrect => {
                let correct = kind == DirectiveKind::ChoiceCorrect;
                self.with_question("Cannot have a choice without a question", |q, r| {
                    q.add_choice(text, correct, r)
                })
            }
            DirectiveKind::MultipleAnswerCorrect | DirectiveKind::MultipleAnswerIncorrect => {
                let correct = kind == DirectiveKind::MultipleAnswerCorrect;
                self.with_question("Cannot have a choice without a question", |q, r| {
                    q.add_multiple_answer(text, correct, r)
                })
            }
            DirectiveKind::ShortAnswer => {
                self.with_question("Cannot have an answer without a question", |q, r| {
                    q.add_short_answer(text, r)
                })
            }
            DirectiveKind::Essay => self.with_question(
                "Cannot specify essay response without a question",
                |q, _| q.set_essay(),
            ),
            DirectiveKind::Upload => self.with_question(
                "Cannot specify upload response without a question",
                |q, _| q.set_upload(),
            ),
            DirectiveKind::Numerical => self.with_question(
                "Cannot specify numerical response without a question",
                |q, _| q.set_numerical(text),
            ),
            DirectiveKind::Feedback => self
                .with_question("Feedback must follow a question or choice", |q, r| {
                    q.add_feedback(text, r)
                }),
            DirectiveKind::CorrectFeedback => self
                .with_question("Correct feedback must follow a question", |q, r| {
                    q.add_correct_feedback(text, r)
                }),
            DirectiveKind::IncorrectFeedback => self
                .with_question("Incorrect feedback must follow a question", |q, r| {
                    q.add_incorrect_feedback(text, r)
                }),
            DirectiveKind::Solution => self
                .with_question("Solution must follow a question", |q, r| {
                    q.set_solution(text, r)
                }),

            DirectiveKind::TextTitle => self.set_text_title(text),
            DirectiveKind::Text => self.set_text(text),

            DirectiveKind::QuizTitle => self.set_quiz_title(text),
            DirectiveKind::QuizDescription => self.set_quiz_description(text),
            DirectiveKind::ShuffleAnswers
            | DirectiveKind::ShowCorrectAnswers
            | DirectiveKind::OneQuestionAtATime
            | DirectiveKind::CantGoBack
            | DirectiveKind::AllowedAttempts => self.set_option(kind, text),

            DirectiveKind::StartGroup => self.start_group(),
            DirectiveKind::EndGroup => self.end_group(),
            DirectiveKind::GroupPick => self.with_group(|g| g.set_pick(text)),
            DirectiveKind::GroupSolutionsPick => self.with_group(|g| g.set_solutions_pick(text)),
            DirectiveKind::GroupPointsPerQuestion => {
                self.with_group(|g| g.set_points_per_question(text))
            }

            DirectiveKind::StartCode => Err(ErrorKind::syntax(
                "Code blocks are only allowed when they are executable (\"{.lang .run}\")",
            )),
            DirectiveKind::EndCode => {
                Err(ErrorKind::syntax("Code block end missing code block start"))
            }
        }
    }

    fn with_question(
        &mut self,
        missing: &str,
        f: impl FnOnce(&mut QuestionBuilder, &mut R) -> Result<(), ErrorKind>,
    ) -> Result<(), ErrorKind> {
        match &mut self.open {
            Some(Open::Question(question)) => f(question, &mut *self.renderer),
            _ => Err(ErrorKind::semantic(missing)),
        }
    }

    fn with_group(
        &mut self,
        f: impl FnOnce(&mut GroupBuilder) -> Result<(), ErrorKind>,
    ) -> Result<(), ErrorKind> {
        let Some(group) = &mut self.group else {
            return Err(ErrorKind::semantic(
                "No question group for setting properties",
            ));
        };
        if group.has_members() || self.open.is_some() {
            return Err(ErrorKind::semantic(
                "Question group options must be set at the very start of the group",
            ));
        }
        f(group)
    }

    /// Finalizes whatever entity is open and files it in the quiz or the
    /// current group.
    fn close_open(&mut self) -> Result<(), ErrorKind> {
        match self.open.take() {
            Some(Open::Question(builder)) => {
                let question = builder.finish()?;
                match &mut self.group {
                    Some(group) => group.push(question)?,
                    None => self.items.push(QuizItem::Question(question)),
                }
            }
            Some(Open::Text(builder)) => {
                let region = builder.finish();
                match &mut self.group {
                    Some(group) => group.push_text(region),
                    None => self.items.push(QuizItem::Text(region)),
                }
            }
            None => {}
        }
        Ok(())
    }

    fn start_question(&mut self, text: &str) -> Result<(), ErrorKind> {
        self.close_open()?;
        let NextQuestion { title, points } = std::mem::take(&mut self.next_question);
        let builder = QuestionBuilder::new(text, title, points, &mut *self.renderer)?;
        if !self.prompts.insert(builder.rendered().to_string()) {
            return Err(ErrorKind::DuplicateQuestion);
        }
        self.open = Some(Open::Question(builder));
        self.entries += 1;
        Ok(())
    }

    fn set_next_title(&mut self, text: &str) -> Result<(), ErrorKind> {
        if self.next_question.title.is_some() {
            return Err(ErrorKind::semantic(
                "Title for next question has already been set",
            ));
        }
        if self.next_question.points.is_some() {
            return Err(ErrorKind::semantic(
                "Title for next question must be set before point value",
            ));
        }
        self.next_question.title = Some(text.to_string());
        Ok(())
    }

    fn set_next_points(&mut self, text: &str) -> Result<(), ErrorKind> {
        if self.next_question.points.is_some() {
            return Err(ErrorKind::semantic(
                "Points for next question have already been set",
            ));
        }
        self.next_question.points = Some(Points::parse(text)?);
        Ok(())
    }

    fn set_text_title(&mut self, text: &str) -> Result<(), ErrorKind> {
        self.close_open()?;
        let mut region = TextRegionBuilder::new(self.entries);
        region.set_title(text, &mut *self.renderer)?;
        self.open = Some(Open::Text(region));
        self.entries += 1;
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<(), ErrorKind> {
        if let Some(Open::Text(region)) = &mut self.open
            && !region.has_text()
        {
            return region.set_text(text, &mut *self.renderer);
        }
        self.close_open()?;
        let mut region = TextRegionBuilder::new(self.entries);
        region.set_text(text, &mut *self.renderer)?;
        self.open = Some(Open::Text(region));
        self.entries += 1;
        Ok(())
    }

    fn set_quiz_title(&mut self, text: &str) -> Result<(), ErrorKind> {
        if !self.meta.options_set.is_empty() {
            return Err(ErrorKind::semantic("Must give quiz title before quiz options"));
        }
        if self.meta.title_raw.is_some() {
            return Err(ErrorKind::semantic("Quiz title has already been given"));
        }
        if self.started() {
            return Err(ErrorKind::semantic("Must give quiz title before questions"));
        }
        if self.meta.description.is_some() {
            return Err(ErrorKind::semantic(
                "Must give quiz title before quiz description",
            ));
        }
        self.meta.title_raw = Some(text.to_string());
        Ok(())
    }

    fn set_quiz_description(&mut self, text: &str) -> Result<(), ErrorKind> {
        if !self.meta.options_set.is_empty() {
            return Err(ErrorKind::semantic(
                "Must give quiz description before quiz options",
            ));
        }
        if self.meta.description.is_some() {
            return Err(ErrorKind::semantic("Quiz description has already been given"));
        }
        if self.started() {
            return Err(ErrorKind::semantic(
                "Must give quiz description before questions",
            ));
        }
        self.meta.description = Some(RichText::render(text, &mut *self.renderer)?);
        Ok(())
    }

    fn set_option(&mut self, kind: DirectiveKind, text: &str) -> Result<(), ErrorKind> {
        if self.started() {
            return Err(ErrorKind::semantic("Must give quiz options before questions"));
        }
        if self.meta.options_set.contains(&kind) {
            return Err(ErrorKind::semantic(format!(
                "Quiz option \"{}\" has already been set",
                option_name(kind)
            )));
        }
        let options = &mut self.meta.options;
        match kind {
            DirectiveKind::ShuffleAnswers => options.shuffle_answers = parse_bool(text)?,
            DirectiveKind::ShowCorrectAnswers => options.show_correct_answers = parse_bool(text)?,
            DirectiveKind::OneQuestionAtATime => {
                options.one_question_at_a_time = parse_bool(text)?;
            }
            DirectiveKind::CantGoBack => {
                let value = parse_bool(text)?;
                if value && !options.one_question_at_a_time {
                    return Err(ErrorKind::semantic(
                        "Must set \"One question at a time\" to \"true\" before setting \"Can't go back\"",
                    ));
                }
                options.cant_go_back = value;
            }
            DirectiveKind::AllowedAttempts => {
                options.allowed_attempts = match text.parse::<u32>() {
                    Ok(0) => None,
                    Ok(n) => Some(n),
                    Err(_) => {
                        return Err(ErrorKind::syntax(format!(
                            "Invalid number of attempts \"{text}\"; need a non-negative integer (0 for unlimited)"
                        )));
                    }
                };
            }
            _ => {
                return Err(ErrorKind::syntax(format!("{kind:?} is not a quiz option")));
            }
        }
        self.meta.options_set.insert(kind);
        Ok(())
    }

    fn start_group(&mut self) -> Result<(), ErrorKind> {
        if self.group.is_some() {
            return Err(ErrorKind::semantic("Question groups cannot be nested"));
        }
        self.close_open()?;
        self.group = Some(GroupBuilder::default());
        self.entries += 1;
        Ok(())
    }

    fn end_group(&mut self) -> Result<(), ErrorKind> {
        if self.group.is_none() {
            return Err(ErrorKind::semantic("No question group to end"));
        }
        self.close_open()?;
        if let Some(group) = self.group.take() {
            self.items.push(QuizItem::Group(group.finish()?));
        }
        self.entries += 1;
        Ok(())
    }

    /// Runs the end-of-input checks and assembles the quiz.
    pub(crate) fn finish(mut self) -> Result<Quiz, ErrorKind> {
        if self.next_question.is_pending() {
            return Err(ErrorKind::UnusedQuestionAttributes);
        }
        if self.group.is_some() {
            return Err(ErrorKind::UnclosedGroup);
        }
        self.close_open()?;
        if self.items.is_empty() {
            return Err(ErrorKind::NoQuestions);
        }

        let title = match &self.meta.title_raw {
            Some(raw) => self.renderer.escape(raw),
            None => "Quiz".to_string(),
        };
        let resources = self.renderer.take_resources();
        Ok(Quiz::assemble(
            self.meta.title_raw,
            title,
            self.meta.description,
            self.meta.options,
            self.items,
            resources,
        ))
    }
}
