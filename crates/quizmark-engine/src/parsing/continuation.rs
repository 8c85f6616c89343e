use crate::error::{ErrorKind, Located};

use super::classify::Directive;
use super::scanner::{LineScanner, SourceLine};

/// Columns per tab stop when comparing indentation.
pub const TAB_WIDTH: usize = 4;

/// Smallest indentation a label directive's continuation may use.
pub const MIN_INDENT: usize = 2;

/// Expands tabs to spaces at [`TAB_WIDTH`] stops.
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Reads the continuation of a multi-line directive and returns its full
/// content.
///
/// Continuation lines are blank lines (kept as paragraph breaks when the
/// directive allows several paragraphs) or lines indented at least as deep
/// as the baseline. The first line that breaks this is left in the scanner
/// for the next directive.
pub(crate) fn collect(
    scanner: &mut LineScanner<'_>,
    first: &SourceLine,
    directive: &Directive,
) -> Result<String, Located> {
    let multi_paragraph = directive.kind.is_multi_paragraph();
    let mut indent = if directive.kind.is_label() {
        None
    } else {
        Some(expand_tabs(&first.text[..directive.content_start]).chars().count())
    };
    let mut lines = vec![directive.text.clone()];

    while let Some(next) = scanner.peek() {
        if next.text.trim().is_empty() {
            if !multi_paragraph {
                break;
            }
            scanner.next();
            lines.push(String::new());
            continue;
        }

        let expanded = expand_tabs(&next.text);
        let width = match indent {
            Some(width) => {
                if leading_spaces(&expanded) < width {
                    break;
                }
                width
            }
            None => {
                let width = leading_spaces(&expanded);
                if width == 0 {
                    break;
                }
                if width < MIN_INDENT {
                    return Err(Located::new(next.number, ErrorKind::ShallowIndent));
                }
                indent = Some(width);
                width
            }
        };

        scanner.next();
        lines.push(expanded[width..].trim_end().to_string());
    }

    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::classify::{DirectiveClassifier, LineClass};
    use pretty_assertions::assert_eq;

    /// Collects the first line of `text` as a directive; returns the content
    /// and the next unconsumed line.
    fn run(text: &str) -> (Result<String, Located>, Option<String>) {
        let mut scanner = LineScanner::new(text);
        let first = scanner.next().unwrap();
        let LineClass::Directive(directive) = DirectiveClassifier::get().classify(&first.text)
        else {
            panic!("first line is not a directive");
        };
        let result = collect(&mut scanner, &first, &directive);
        (result, scanner.next().map(|l| l.text))
    }

    #[test]
    fn expands_tabs_to_stops() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tx"), "ab  x");
        assert_eq!(expand_tabs("a)\tb"), "a)  b");
    }

    #[test]
    fn marker_continuation_aligns_with_content() {
        let (text, next) = run("1. First line\n   second line\n*a) yes");
        assert_eq!(text.unwrap(), "First line\nsecond line");
        assert_eq!(next.as_deref(), Some("*a) yes"));
    }

    #[test]
    fn keeps_extra_indentation_beyond_baseline() {
        let (text, _) = run("1. Code:\n\n       let x = 1;");
        assert_eq!(text.unwrap(), "Code:\n\n    let x = 1;");
    }

    #[test]
    fn under_indented_line_ends_continuation() {
        let (text, next) = run("1. Prompt\n  not enough");
        assert_eq!(text.unwrap(), "Prompt");
        assert_eq!(next.as_deref(), Some("  not enough"));
    }

    #[test]
    fn paragraphs_keep_breaks_and_trim_trailing_blanks() {
        let (text, next) = run("1. One\n\n   Two\n\n\na) x");
        assert_eq!(text.unwrap(), "One\n\nTwo");
        assert_eq!(next.as_deref(), Some("a) x"));
    }

    #[test]
    fn titles_stop_at_blank_line() {
        let (text, next) = run("Quiz title: Midterm\n\n  not part of title");
        assert_eq!(text.unwrap(), "Midterm");
        assert_eq!(next.as_deref(), Some(""));
    }

    #[test]
    fn label_baseline_set_by_first_continuation_line() {
        let (text, _) = run("Text: Intro\n    more\n      deeper\n    back");
        assert_eq!(text.unwrap(), "Intro\nmore\n  deeper\nback");
    }

    #[test]
    fn label_continuation_accepts_tabs() {
        let (text, _) = run("Quiz description: A\n\tB");
        assert_eq!(text.unwrap(), "A\nB");
    }

    #[test]
    fn single_space_label_indent_is_an_error() {
        let (result, _) = run("Text: Intro\n more");
        let err = result.unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ErrorKind::ShallowIndent));
    }
}
