//! # Quiz parsing
//!
//! A single forward pass over the source lines:
//!
//! 1. `scanner` yields numbered lines and lets executed code blocks splice
//!    their output back in.
//! 2. `classify` decides what each line is from local facts only.
//! 3. `continuation` gathers the wrapped lines of multi-line directives.
//! 4. `state` applies each complete directive to the quiz under
//!    construction and enforces the ordering rules.
//!
//! The first error stops the parse.

pub mod classify;
pub mod code_run;
pub mod continuation;
pub mod scanner;
mod state;

use log::debug;

use crate::error::{ErrorKind, Located, QuizError};
use crate::models::Quiz;
use crate::render::Renderer;

use classify::{
    BLOCK_COMMENT_END, BLOCK_COMMENT_START, DirectiveClassifier, DirectiveKind, LineClass,
};
use code_run::{CodeRunner, RunRequest};
use scanner::{LineScanner, SourceLine};
use state::ParserState;

/// Source name used when none is given.
pub const ANONYMOUS_SOURCE: &str = "<string>";

/// Per-parse settings.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Name used in error messages, usually the file path.
    pub source_name: Option<String>,
    /// Whether `{.lang .run}` code blocks may be executed.
    pub run_code_blocks: bool,
    /// Interpreter for `python` code blocks.
    pub python_executable: Option<String>,
}

impl ParseOptions {
    fn display_source(&self) -> String {
        match &self.source_name {
            Some(name) => format!("\"{name}\""),
            None => ANONYMOUS_SOURCE.to_string(),
        }
    }
}

/// Parses quiz markup into a validated [`Quiz`].
pub fn parse_quiz<R: Renderer>(
    text: &str,
    renderer: &mut R,
    options: &ParseOptions,
) -> Result<Quiz, QuizError> {
    let source = options.display_source();
    let located = |e: Located| QuizError::at(&source, e.line, e.kind);

    let classifier = DirectiveClassifier::get();
    let runner = CodeRunner::new(options.run_code_blocks, options.python_executable.clone());
    let mut scanner = LineScanner::new(text);
    let mut state = ParserState::new(renderer);

    while let Some(line) = scanner.next() {
        let at = |kind: ErrorKind| QuizError::at(&source, line.number, kind);
        match classifier.classify(&line.text) {
            LineClass::Directive(directive) => match directive.kind {
                DirectiveKind::StartCode => {
                    let Some(request) = RunRequest::from_fence(&line.text) else {
                        state.dispatch(directive.kind, &directive.text).map_err(at)?;
                        continue;
                    };
                    let code = code_run::read_fence_body(&mut scanner, &line).map_err(located)?;
                    let output = runner.run(&request, &code).map_err(at)?;
                    let injected: Vec<String> = output.lines().map(str::to_string).collect();
                    debug!("splicing {} lines at line {}", injected.len(), line.number);
                    scanner.splice(line.number, injected);
                }
                kind if kind.is_multi_line() => {
                    let content =
                        continuation::collect(&mut scanner, &line, &directive).map_err(located)?;
                    state.dispatch(kind, &content).map_err(at)?;
                }
                kind => state.dispatch(kind, &directive.text).map_err(at)?,
            },
            LineClass::LineComment => {}
            LineClass::BlockCommentStart => skip_block_comment(&mut scanner, &line).map_err(located)?,
            LineClass::BlockCommentEnd => {
                return Err(at(ErrorKind::syntax(format!(
                    "\"{BLOCK_COMMENT_END}\" without preceding \"{BLOCK_COMMENT_START}\""
                ))));
            }
            LineClass::Unknown => {
                if !line.text.trim().is_empty() {
                    return Err(at(classifier.diagnose(&line.text)));
                }
            }
        }
    }

    let last_line = scanner.source_len();
    state.finish().map_err(|kind| match kind {
        ErrorKind::NoQuestions => QuizError::unlocated(&source, kind),
        kind => QuizError::at(&source, last_line, kind),
    })
}

/// Skips a `COMMENT` ... `END_COMMENT` block. Both markers must stand alone
/// on their lines.
fn skip_block_comment(scanner: &mut LineScanner<'_>, open: &SourceLine) -> Result<(), Located> {
    if open.text.trim() != BLOCK_COMMENT_START {
        return Err(Located::new(
            open.number,
            ErrorKind::TrailingContent(BLOCK_COMMENT_START.to_string()),
        ));
    }
    for line in scanner.by_ref() {
        if line.text.starts_with(BLOCK_COMMENT_END) {
            if line.text.trim() != BLOCK_COMMENT_END {
                return Err(Located::new(
                    line.number,
                    ErrorKind::TrailingContent(BLOCK_COMMENT_END.to_string()),
                ));
            }
            return Ok(());
        }
    }
    Err(Located::new(
        open.number,
        ErrorKind::syntax(format!(
            "\"{BLOCK_COMMENT_START}\" without following \"{BLOCK_COMMENT_END}\""
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, QuizItem};
    use crate::render::PlainTextRenderer;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Quiz, QuizError> {
        parse_quiz(text, &mut PlainTextRenderer, &ParseOptions::default())
    }

    fn parse_err(text: &str) -> (Option<usize>, String) {
        let err = parse(text).unwrap_err();
        (err.line, err.kind.to_string())
    }

    #[test]
    fn parses_minimal_question() {
        let quiz = parse("1. What is 2+2?\n*a) 4\nb) 5\n").unwrap();
        assert_eq!(quiz.title, "Quiz");
        let questions: Vec<_> = quiz.questions().collect();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_type, QuestionType::MultipleChoice);
        assert_eq!(questions[0].choices.len(), 2);
    }

    #[test]
    fn line_comments_are_ignored() {
        let quiz = parse("% note\n1. Q?\n% between\n*a) yes\nb) no").unwrap();
        assert_eq!(quiz.questions().count(), 1);
    }

    #[test]
    fn block_comments_are_skipped() {
        let quiz = parse("COMMENT\n1. Hidden?\n*a) x\nEND_COMMENT\n1. Shown?\n*a) y\nb) z").unwrap();
        let q = quiz.questions().next().unwrap();
        assert_eq!(q.raw, "Shown?");
    }

    #[test]
    fn block_comment_markers_must_stand_alone() {
        assert_eq!(
            parse_err("COMMENT here\n1. Q?"),
            (Some(1), "Unexpected content after \"COMMENT\"".to_string())
        );
        assert_eq!(
            parse_err("COMMENT\nx\nEND_COMMENT x"),
            (Some(3), "Unexpected content after \"END_COMMENT\"".to_string())
        );
    }

    #[test]
    fn unterminated_block_comment_reports_its_start() {
        let (line, msg) = parse_err("1. Q?\n*a) x\nb) y\nCOMMENT\nnever closed");
        assert_eq!(line, Some(4));
        assert!(msg.contains("without following"));
    }

    #[test]
    fn stray_comment_end_is_an_error() {
        let (line, _) = parse_err("1. Q?\nEND_COMMENT");
        assert_eq!(line, Some(2));
    }

    #[test]
    fn unknown_text_is_a_syntax_error() {
        let (line, msg) = parse_err("1. Q?\n*a) x\nb) y\nstray words");
        assert_eq!(line, Some(4));
        assert!(msg.starts_with("Syntax error; unexpected text"));
    }

    #[test]
    fn plain_fence_is_rejected() {
        let (line, msg) = parse_err("1. Q?\n```python\nprint(1)\n```");
        assert_eq!(line, Some(2));
        assert!(msg.contains("executable"));
    }

    #[test]
    fn disabled_code_block_is_an_error() {
        let err = parse("```{.sh .run}\necho '1. Q?'\n```\n").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert_eq!(err.kind.to_string(), code_run::DISABLED_MESSAGE);
    }

    #[test]
    fn source_name_is_quoted() {
        let options = ParseOptions {
            source_name: Some("week1.txt".into()),
            ..Default::default()
        };
        let err = parse_quiz("", &mut PlainTextRenderer, &options).unwrap_err();
        assert_eq!(err.to_string(), "In \"week1.txt\":\nNo questions were found");
    }

    #[test]
    fn text_only_quiz_is_accepted() {
        let quiz = parse("Text: Just reading today.").unwrap();
        assert!(matches!(quiz.items[0], QuizItem::Text(_)));
        assert_eq!(quiz.questions().count(), 0);
    }
}
