use std::sync::LazyLock;

use regex::Regex;

use crate::error::ErrorKind;

/// Every line-start token of the quiz grammar.
///
/// Adding a directive means adding a variant here; the dispatcher matches
/// exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Question,
    ChoiceCorrect,
    ChoiceIncorrect,
    MultipleAnswerCorrect,
    MultipleAnswerIncorrect,
    ShortAnswer,
    Feedback,
    CorrectFeedback,
    IncorrectFeedback,
    Solution,
    Essay,
    Upload,
    Numerical,
    QuestionTitle,
    QuestionPoints,
    TextTitle,
    Text,
    QuizTitle,
    QuizDescription,
    StartGroup,
    EndGroup,
    GroupPick,
    GroupSolutionsPick,
    GroupPointsPerQuestion,
    StartCode,
    EndCode,
    ShuffleAnswers,
    ShowCorrectAnswers,
    OneQuestionAtATime,
    CantGoBack,
    AllowedAttempts,
}

impl DirectiveKind {
    /// All kinds, in match priority order.
    pub const ALL: [DirectiveKind; 31] = [
        DirectiveKind::Question,
        DirectiveKind::ChoiceCorrect,
        DirectiveKind::ChoiceIncorrect,
        DirectiveKind::MultipleAnswerCorrect,
        DirectiveKind::MultipleAnswerIncorrect,
        DirectiveKind::ShortAnswer,
        DirectiveKind::Feedback,
        DirectiveKind::CorrectFeedback,
        DirectiveKind::IncorrectFeedback,
        DirectiveKind::Solution,
        DirectiveKind::Essay,
        DirectiveKind::Upload,
        DirectiveKind::Numerical,
        DirectiveKind::QuestionTitle,
        DirectiveKind::QuestionPoints,
        DirectiveKind::TextTitle,
        DirectiveKind::Text,
        DirectiveKind::QuizTitle,
        DirectiveKind::QuizDescription,
        DirectiveKind::StartGroup,
        DirectiveKind::EndGroup,
        DirectiveKind::GroupPick,
        DirectiveKind::GroupSolutionsPick,
        DirectiveKind::GroupPointsPerQuestion,
        DirectiveKind::StartCode,
        DirectiveKind::EndCode,
        DirectiveKind::ShuffleAnswers,
        DirectiveKind::ShowCorrectAnswers,
        DirectiveKind::OneQuestionAtATime,
        DirectiveKind::CantGoBack,
        DirectiveKind::AllowedAttempts,
    ];

    fn pattern(self) -> &'static str {
        match self {
            DirectiveKind::Question => r"\d+\.",
            DirectiveKind::ChoiceCorrect => r"\*[a-zA-Z]\)",
            DirectiveKind::ChoiceIncorrect => r"[a-zA-Z]\)",
            DirectiveKind::MultipleAnswerCorrect => r"\[\*\]",
            DirectiveKind::MultipleAnswerIncorrect => r"\[ ?\]",
            DirectiveKind::ShortAnswer => r"\*",
            DirectiveKind::Feedback => r"\.\.\.",
            DirectiveKind::CorrectFeedback => r"\+",
            DirectiveKind::IncorrectFeedback => r"\-",
            DirectiveKind::Solution => r"!",
            DirectiveKind::Essay => r"___+",
            DirectiveKind::Upload => r"\^\^\^+",
            DirectiveKind::Numerical => r"=",
            DirectiveKind::QuestionTitle => r"[Tt]itle:",
            DirectiveKind::QuestionPoints => r"[Pp]oints:",
            DirectiveKind::TextTitle => r"[Tt]ext [Tt]itle:",
            DirectiveKind::Text => r"[Tt]ext:",
            DirectiveKind::QuizTitle => r"[Qq]uiz [Tt]itle:",
            DirectiveKind::QuizDescription => r"[Qq]uiz [Dd]escription:",
            DirectiveKind::StartGroup => r"GROUP",
            DirectiveKind::EndGroup => r"END_GROUP",
            DirectiveKind::GroupPick => r"[Pp]ick:",
            DirectiveKind::GroupSolutionsPick => r"[Ss]olutions [Pp]ick:",
            DirectiveKind::GroupPointsPerQuestion => r"[Pp]oints per question:",
            DirectiveKind::StartCode => r"```+\s*[^`\s].*",
            DirectiveKind::EndCode => r"```+",
            DirectiveKind::ShuffleAnswers => r"[Ss]huffle answers:",
            DirectiveKind::ShowCorrectAnswers => r"[Ss]how correct answers:",
            DirectiveKind::OneQuestionAtATime => r"[Oo]ne question at a time:",
            DirectiveKind::CantGoBack => r"[Cc]an't go back:",
            DirectiveKind::AllowedAttempts => r"[Nn]umber of attempts:",
        }
    }

    /// Whether the directive needs content on its own line. The others
    /// consume the whole line, which must otherwise be blank.
    pub fn takes_content(self) -> bool {
        !matches!(
            self,
            DirectiveKind::Essay
                | DirectiveKind::Upload
                | DirectiveKind::StartGroup
                | DirectiveKind::EndGroup
                | DirectiveKind::StartCode
                | DirectiveKind::EndCode
        )
    }

    /// Whether the directive's content is exactly its first line.
    pub fn is_single_line(self) -> bool {
        matches!(
            self,
            DirectiveKind::QuestionPoints
                | DirectiveKind::GroupPick
                | DirectiveKind::GroupSolutionsPick
                | DirectiveKind::GroupPointsPerQuestion
                | DirectiveKind::Numerical
                | DirectiveKind::ShortAnswer
                | DirectiveKind::ShuffleAnswers
                | DirectiveKind::ShowCorrectAnswers
                | DirectiveKind::OneQuestionAtATime
                | DirectiveKind::CantGoBack
                | DirectiveKind::AllowedAttempts
        )
    }

    /// Whether continuation lines may follow the first line.
    pub fn is_multi_line(self) -> bool {
        self.takes_content() && !self.is_single_line()
    }

    /// Whether continuation may span blank-line-separated paragraphs.
    pub fn is_multi_paragraph(self) -> bool {
        self.is_multi_line()
            && !matches!(
                self,
                DirectiveKind::QuestionTitle | DirectiveKind::TextTitle | DirectiveKind::QuizTitle
            )
    }

    /// Label directives (`Text:`, `Quiz description:`...) let the first
    /// continuation line set the indentation; marker directives (`1.`, `a)`)
    /// require continuation to align with the content after the marker.
    pub fn is_label(self) -> bool {
        self.pattern().ends_with(':')
    }
}

/// A line recognized as a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Content after the token, trimmed. Empty for no-content directives.
    pub text: String,
    /// Byte offset in the line where the content starts.
    pub content_start: usize,
}

/// What a single physical line is, in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Directive(Directive),
    LineComment,
    BlockCommentStart,
    BlockCommentEnd,
    /// Anything else; only valid as continuation of a multi-line directive.
    Unknown,
}

pub const LINE_COMMENT: &str = "%";
pub const BLOCK_COMMENT_START: &str = "COMMENT";
pub const BLOCK_COMMENT_END: &str = "END_COMMENT";

struct Rule {
    kind: DirectiveKind,
    start: Regex,
    missing_content: Option<Regex>,
    missing_whitespace: Option<Regex>,
}

impl Rule {
    fn new(kind: DirectiveKind) -> Result<Self, regex::Error> {
        let pat = kind.pattern();
        if kind.takes_content() {
            Ok(Self {
                kind,
                start: Regex::new(&format!(r"^(?:{pat})[ \t]+(\S.*)$"))?,
                missing_content: Some(Regex::new(&format!(r"^(?:{pat})[ \t]*$"))?),
                missing_whitespace: Some(Regex::new(&format!(r"^({pat})\S"))?),
            })
        } else {
            Ok(Self {
                kind,
                start: Regex::new(&format!(r"^(?:{pat})\s*$"))?,
                missing_content: None,
                missing_whitespace: None,
            })
        }
    }
}

/// Matches lines against the fixed, ordered set of directive patterns.
pub struct DirectiveClassifier {
    rules: Vec<Rule>,
}

static CLASSIFIER: LazyLock<DirectiveClassifier> = LazyLock::new(|| {
    DirectiveClassifier::new().expect("directive patterns are valid regular expressions")
});

impl DirectiveClassifier {
    fn new() -> Result<Self, regex::Error> {
        let rules = DirectiveKind::ALL
            .iter()
            .map(|&kind| Rule::new(kind))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The shared classifier; patterns are compiled once per process.
    pub fn get() -> &'static DirectiveClassifier {
        &CLASSIFIER
    }

    /// Classifies a line using local facts only.
    pub fn classify(&self, line: &str) -> LineClass {
        for rule in &self.rules {
            if let Some(caps) = rule.start.captures(line) {
                let (text, content_start) = match caps.get(1) {
                    Some(m) => (m.as_str().trim().to_string(), m.start()),
                    None => (String::new(), line.len()),
                };
                return LineClass::Directive(Directive {
                    kind: rule.kind,
                    text,
                    content_start,
                });
            }
        }
        if line.starts_with(LINE_COMMENT) {
            LineClass::LineComment
        } else if line.starts_with(BLOCK_COMMENT_START) {
            LineClass::BlockCommentStart
        } else if line.starts_with(BLOCK_COMMENT_END) {
            LineClass::BlockCommentEnd
        } else {
            LineClass::Unknown
        }
    }

    /// Explains why a non-blank line outside any continuation is invalid.
    pub fn diagnose(&self, line: &str) -> ErrorKind {
        for rule in &self.rules {
            if rule.missing_content.as_ref().is_some_and(|r| r.is_match(line)) {
                return ErrorKind::MissingContent(line.trim().to_string());
            }
            if let Some(caps) = rule.missing_whitespace.as_ref().and_then(|r| r.captures(line)) {
                let token = caps.get(1).map_or("", |m| m.as_str()).trim();
                return ErrorKind::MissingWhitespace(token.to_string());
            }
        }
        ErrorKind::UnexpectedText(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kind_of(line: &str) -> Option<DirectiveKind> {
        match DirectiveClassifier::get().classify(line) {
            LineClass::Directive(d) => Some(d.kind),
            _ => None,
        }
    }

    #[rstest]
    #[case("1. What?", DirectiveKind::Question)]
    #[case("12.\tWhat?", DirectiveKind::Question)]
    #[case("*a) four", DirectiveKind::ChoiceCorrect)]
    #[case("b) five", DirectiveKind::ChoiceIncorrect)]
    #[case("[*] yes", DirectiveKind::MultipleAnswerCorrect)]
    #[case("[ ] no", DirectiveKind::MultipleAnswerIncorrect)]
    #[case("[] no", DirectiveKind::MultipleAnswerIncorrect)]
    #[case("* answer", DirectiveKind::ShortAnswer)]
    #[case("... feedback", DirectiveKind::Feedback)]
    #[case("+ right", DirectiveKind::CorrectFeedback)]
    #[case("- wrong", DirectiveKind::IncorrectFeedback)]
    #[case("! because", DirectiveKind::Solution)]
    #[case("____", DirectiveKind::Essay)]
    #[case("^^^", DirectiveKind::Upload)]
    #[case("= 5 +- 1", DirectiveKind::Numerical)]
    #[case("Title: Q1", DirectiveKind::QuestionTitle)]
    #[case("points: 2", DirectiveKind::QuestionPoints)]
    #[case("Text title: Part A", DirectiveKind::TextTitle)]
    #[case("Text: Read this", DirectiveKind::Text)]
    #[case("Quiz title: Midterm", DirectiveKind::QuizTitle)]
    #[case("Quiz description: Good luck", DirectiveKind::QuizDescription)]
    #[case("GROUP", DirectiveKind::StartGroup)]
    #[case("END_GROUP  ", DirectiveKind::EndGroup)]
    #[case("pick: 2", DirectiveKind::GroupPick)]
    #[case("Solutions pick: 3", DirectiveKind::GroupSolutionsPick)]
    #[case("Points per question: 2", DirectiveKind::GroupPointsPerQuestion)]
    #[case("```{.python .run}", DirectiveKind::StartCode)]
    #[case("```", DirectiveKind::EndCode)]
    #[case("Shuffle answers: true", DirectiveKind::ShuffleAnswers)]
    #[case("Show correct answers: false", DirectiveKind::ShowCorrectAnswers)]
    #[case("One question at a time: true", DirectiveKind::OneQuestionAtATime)]
    #[case("Can't go back: true", DirectiveKind::CantGoBack)]
    #[case("Number of attempts: 3", DirectiveKind::AllowedAttempts)]
    fn recognizes_directives(#[case] line: &str, #[case] expected: DirectiveKind) {
        assert_eq!(kind_of(line), Some(expected));
    }

    #[test]
    fn extracts_trimmed_content_and_offset() {
        let c = DirectiveClassifier::get().classify("*b)  4  ");
        assert_eq!(
            c,
            LineClass::Directive(Directive {
                kind: DirectiveKind::ChoiceCorrect,
                text: "4".into(),
                content_start: 5,
            })
        );
    }

    #[rstest]
    #[case("% note", LineClass::LineComment)]
    #[case("COMMENT", LineClass::BlockCommentStart)]
    #[case("END_COMMENT", LineClass::BlockCommentEnd)]
    #[case("  indented text", LineClass::Unknown)]
    #[case("", LineClass::Unknown)]
    fn recognizes_non_directives(#[case] line: &str, #[case] expected: LineClass) {
        assert_eq!(DirectiveClassifier::get().classify(line), expected);
    }

    #[test]
    fn no_content_directives_reject_trailing_text() {
        assert_eq!(kind_of("GROUP extra"), None);
        assert_eq!(kind_of("___ essay"), None);
    }

    #[test]
    fn missing_whitespace_is_distinct_from_missing_content() {
        let c = DirectiveClassifier::get();
        assert!(matches!(
            c.diagnose("1.What?"),
            ErrorKind::MissingWhitespace(t) if t == "1."
        ));
        assert!(matches!(
            c.diagnose("1.   "),
            ErrorKind::MissingContent(t) if t == "1."
        ));
        assert!(matches!(
            c.diagnose("*a)"),
            ErrorKind::MissingContent(t) if t == "*a)"
        ));
    }

    #[test]
    fn plain_text_is_unexpected() {
        assert!(matches!(
            DirectiveClassifier::get().diagnose("just words"),
            ErrorKind::UnexpectedText(_)
        ));
    }

    #[test]
    fn continuation_shapes() {
        assert!(DirectiveKind::Question.is_multi_paragraph());
        assert!(!DirectiveKind::QuizTitle.is_multi_paragraph());
        assert!(DirectiveKind::QuizTitle.is_multi_line());
        assert!(!DirectiveKind::Numerical.is_multi_line());
        assert!(!DirectiveKind::Essay.is_multi_line());
        assert!(DirectiveKind::Text.is_label());
        assert!(!DirectiveKind::ChoiceCorrect.is_label());
    }
}
