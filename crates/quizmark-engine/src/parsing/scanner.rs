/// A physical line together with the source line it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number. Injected lines carry the number of the line
    /// that produced them.
    pub number: usize,
    pub text: String,
}

/// One run of lines the scanner reads from.
#[derive(Debug)]
enum LineSpan<'a> {
    /// Lines of the source text.
    Source { lines: Vec<&'a str>, next: usize },
    /// Lines spliced in at runtime, all attributed to `origin`.
    Injected {
        origin: usize,
        lines: Vec<String>,
        next: usize,
    },
}

impl LineSpan<'_> {
    fn peek(&self) -> Option<SourceLine> {
        match self {
            LineSpan::Source { lines, next } => lines.get(*next).map(|text| SourceLine {
                number: next + 1,
                text: (*text).to_string(),
            }),
            LineSpan::Injected {
                origin,
                lines,
                next,
            } => lines.get(*next).map(|text| SourceLine {
                number: *origin,
                text: text.clone(),
            }),
        }
    }

    fn is_exhausted(&self) -> bool {
        match self {
            LineSpan::Source { lines, next } => *next >= lines.len(),
            LineSpan::Injected { lines, next, .. } => *next >= lines.len(),
        }
    }

    fn advance(&mut self) {
        match self {
            LineSpan::Source { next, .. } | LineSpan::Injected { next, .. } => *next += 1,
        }
    }
}

/// Yields `(line_number, line)` pairs in order, with support for splicing
/// extra lines in ahead of the remaining input.
///
/// The scanner is a stack of spans: the source text at the bottom, any
/// injected runs above it. The topmost non-exhausted span is read first.
/// Splits on `\n`, `\r\n` and a lone `\r`. A final terminator does not
/// start another line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find(['\n', '\r']) {
        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

#[derive(Debug)]
pub struct LineScanner<'a> {
    spans: Vec<LineSpan<'a>>,
    source_len: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = split_lines(text);
        let source_len = lines.len();
        Self {
            spans: vec![LineSpan::Source { lines, next: 0 }],
            source_len,
        }
    }

    /// Number of lines in the source text.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Drops exhausted injected spans so the top of the stack has a line to
    /// offer, if any remain.
    fn settle(&mut self) {
        while self.spans.len() > 1 && self.spans.last().is_some_and(LineSpan::is_exhausted) {
            self.spans.pop();
        }
    }

    pub fn peek(&mut self) -> Option<SourceLine> {
        self.settle();
        self.spans.last().and_then(LineSpan::peek)
    }

    /// Injects `lines` to be read before the rest of the input, each
    /// attributed to line `origin`.
    pub fn splice(&mut self, origin: usize, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        self.spans.push(LineSpan::Injected {
            origin,
            lines,
            next: 0,
        });
    }
}

impl Iterator for LineScanner<'_> {
    type Item = SourceLine;

    fn next(&mut self) -> Option<SourceLine> {
        self.settle();
        let span = self.spans.last_mut()?;
        let line = span.peek()?;
        span.advance();
        Some(line)
    }
}
