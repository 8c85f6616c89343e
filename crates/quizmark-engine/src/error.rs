use std::fmt;

use crate::render::RenderError;

/// What went wrong while handling a single directive or line.
///
/// Variants fall into four families: syntax (the line could not be read as
/// quiz markup), semantic (the markup is well formed but violates a quiz
/// rule), execution (an executable code block failed) and resource (the
/// renderer could not load an external file).
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Missing whitespace after \"{0}\"")]
    MissingWhitespace(String),
    #[error("Missing content after \"{0}\"")]
    MissingContent(String),
    #[error("Unexpected content after \"{0}\"")]
    TrailingContent(String),
    #[error(
        "Syntax error; unexpected text, or incorrect indentation for a wrapped paragraph:\n\"{0}\""
    )]
    UnexpectedText(String),
    #[error("Indentation must be at least 2 spaces or 1 tab here")]
    ShallowIndent,
    #[error("{0}")]
    Syntax(String),

    #[error("Duplicate question")]
    DuplicateQuestion,
    #[error("Duplicate choice for question")]
    DuplicateChoice,
    #[error("Expected question; question title and/or points were set but not used")]
    UnusedQuestionAttributes,
    #[error("Question group never ended")]
    UnclosedGroup,
    #[error("No questions were found")]
    NoQuestions,
    #[error("{0}")]
    Semantic(String),

    #[error("{0}")]
    Execution(String),

    #[error(transparent)]
    Resource(#[from] RenderError),
}

impl ErrorKind {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub(crate) fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    pub(crate) fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

/// An [`ErrorKind`] tagged with the line it belongs to, before the source
/// name is attached.
#[derive(Debug)]
pub(crate) struct Located {
    pub line: usize,
    pub kind: ErrorKind,
}

impl Located {
    pub(crate) fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}

/// A parse failure with the source location it was attributed to.
///
/// The first error aborts the whole parse; no partial quiz is ever returned.
#[derive(Debug)]
pub struct QuizError {
    pub source_name: String,
    pub line: Option<usize>,
    pub kind: ErrorKind,
}

impl QuizError {
    pub(crate) fn at(source_name: &str, line: usize, kind: ErrorKind) -> Self {
        Self {
            source_name: source_name.to_string(),
            line: Some(line),
            kind,
        }
    }

    pub(crate) fn unlocated(source_name: &str, kind: ErrorKind) -> Self {
        Self {
            source_name: source_name.to_string(),
            line: None,
            kind,
        }
    }
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "In {} on line {line}:\n{}", self.source_name, self.kind),
            None => write!(f, "In {}:\n{}", self.source_name, self.kind),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
