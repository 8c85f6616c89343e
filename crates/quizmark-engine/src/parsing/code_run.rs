//! Executable code blocks.
//!
//! A fence whose info string reads `{.lang .run}` (optionally with
//! `executable=...`) is run through an interpreter, and whatever it prints
//! on stdout is read back as quiz markup in place of the block.

use std::io;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::error::{ErrorKind, Located};
use crate::hash::ContentHash;

use super::scanner::{LineScanner, SourceLine};

static RUN_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\{\s*\.(?P<lang>[a-zA-Z](?:[a-zA-Z0-9]+|[._\-]+[a-zA-Z0-9]+)*)\s+\.run(?:\s+executable=(?P<executable>[~\w/.\-]+|"[^\\"']+"))?\s*\}$"#,
    )
    .expect("run info pattern is a valid regular expression")
});

pub const DISABLED_MESSAGE: &str = "Code execution for code blocks is not enabled; use --run-code-blocks, or set run_code_blocks = true in config";

/// What a fence's info string asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub lang: String,
    pub executable: Option<String>,
}

impl RunRequest {
    /// Reads the info string of an opening fence line. `None` means the
    /// fence is not executable.
    pub fn from_fence(line: &str) -> Option<Self> {
        let info = line.trim().trim_start_matches('`').trim();
        let caps = RUN_INFO.captures(info)?;
        Some(Self {
            lang: caps["lang"].to_string(),
            executable: caps
                .name("executable")
                .map(|m| m.as_str().trim_matches('"').to_string()),
        })
    }
}

/// Number of backticks opening a fence line.
fn fence_width(line: &str) -> usize {
    line.trim_start().chars().take_while(|&c| c == '`').count()
}

/// Consumes the body of a fence opened at `open`, up to and including the
/// closing line of exactly as many backticks.
pub(crate) fn read_fence_body(
    scanner: &mut LineScanner<'_>,
    open: &SourceLine,
) -> Result<String, Located> {
    let width = fence_width(&open.text);
    let mut body = Vec::new();
    for line in scanner.by_ref() {
        let stripped = line.text.trim_start();
        if stripped.starts_with('`') && fence_width(stripped) == width {
            if !stripped[width..].trim().is_empty() {
                return Err(Located::new(
                    line.number,
                    ErrorKind::TrailingContent("`".repeat(width)),
                ));
            }
            let mut code = body.join("\n");
            code.push('\n');
            return Ok(code);
        }
        body.push(line.text);
    }
    Err(Located::new(
        open.number,
        ErrorKind::syntax("Code block is missing closing backticks"),
    ))
}

/// Runs code blocks when enabled, using per-language interpreters.
#[derive(Debug, Clone, Default)]
pub struct CodeRunner {
    enabled: bool,
    python: Option<String>,
}

impl CodeRunner {
    pub fn new(enabled: bool, python: Option<String>) -> Self {
        Self { enabled, python }
    }

    /// The command used for `request`: an explicit `executable=` wins, then
    /// the configured Python, then the language name itself.
    pub fn interpreter(&self, request: &RunRequest) -> String {
        if let Some(exe) = &request.executable {
            return shellexpand::tilde(exe).into_owned();
        }
        match request.lang.as_str() {
            "python" => self
                .python
                .as_deref()
                .map(|p| shellexpand::tilde(p).into_owned())
                .unwrap_or_else(|| default_python().to_string()),
            lang => lang.to_string(),
        }
    }

    /// Executes `code` and returns its stdout.
    pub fn run(&self, request: &RunRequest, code: &str) -> Result<String, ErrorKind> {
        if !self.enabled {
            return Err(ErrorKind::execution(DISABLED_MESSAGE));
        }
        let exe = self.interpreter(request);
        info!("Running {} code block with {exe}", request.lang);

        let dir = tempfile::TempDir::new().map_err(|e| {
            ErrorKind::execution(format!("Failed to create temporary directory:\n{e}"))
        })?;
        let hash = ContentHash::of(code).to_hex();
        let path = dir.path().join(format!("{}.code", &hash[..16]));
        std::fs::write(&path, code).map_err(|e| {
            ErrorKind::execution(format!("Failed to write code to temporary file:\n{e}"))
        })?;

        let output = Command::new(&exe)
            .arg(&path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ErrorKind::execution(format!(
                    "Failed to execute code (missing executable \"{exe}\"?):\n{e}"
                )),
                _ => ErrorKind::execution(format!(
                    "Failed to execute code with command \"{exe}\":\n{e}"
                )),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ErrorKind::execution(format!(
                "Code execution resulted in errors:\n{}\n{}\n{}",
                "-".repeat(50),
                stderr.trim_end(),
                "-".repeat(50)
            )));
        }
        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            ErrorKind::execution(format!("Failed to decode output of executed code:\n{e}"))
        })?;
        debug!("code block produced {} lines", stdout.lines().count());
        Ok(stdout)
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("```{.python .run}", "python", None)]
    #[case("```  { .sh .run }", "sh", None)]
    #[case("````{.python3.11 .run}", "python3.11", None)]
    #[case("```{.py .run executable=~/venv/bin/python}", "py", Some("~/venv/bin/python"))]
    #[case(r#"```{.py .run executable="/opt/my python/bin"}"#, "py", Some("/opt/my python/bin"))]
    fn reads_run_requests(
        #[case] line: &str,
        #[case] lang: &str,
        #[case] executable: Option<&str>,
    ) {
        let request = RunRequest::from_fence(line).unwrap();
        assert_eq!(request.lang, lang);
        assert_eq!(request.executable.as_deref(), executable);
    }

    #[rstest]
    #[case("```python")]
    #[case("```{.python}")]
    #[case("```{.python .run extra}")]
    #[case("```{python .run}")]
    fn non_run_fences_are_not_requests(#[case] line: &str) {
        assert_eq!(RunRequest::from_fence(line), None);
    }

    #[test]
    fn python_interpreter_follows_configuration() {
        let request = RunRequest {
            lang: "python".into(),
            executable: None,
        };
        assert_eq!(CodeRunner::new(true, None).interpreter(&request), default_python());
        assert_eq!(
            CodeRunner::new(true, Some("/usr/bin/python3.12".into())).interpreter(&request),
            "/usr/bin/python3.12"
        );
    }

    #[test]
    fn explicit_executable_wins() {
        let request = RunRequest {
            lang: "python".into(),
            executable: Some("pypy3".into()),
        };
        let runner = CodeRunner::new(true, Some("python3".into()));
        assert_eq!(runner.interpreter(&request), "pypy3");
    }

    #[test]
    fn reads_body_up_to_matching_fence() {
        let mut scanner = LineScanner::new("````{.sh .run}\necho a\n```\n````\nafter");
        let open = scanner.next().unwrap();
        let body = read_fence_body(&mut scanner, &open).unwrap();
        assert_eq!(body, "echo a\n```\n");
        assert_eq!(scanner.next().unwrap().text, "after");
    }

    #[test]
    fn unclosed_fence_reports_opening_line() {
        let mut scanner = LineScanner::new("x\n```{.sh .run}\necho a");
        scanner.next();
        let open = scanner.next().unwrap();
        let err = read_fence_body(&mut scanner, &open).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn text_after_closing_fence_is_rejected() {
        let mut scanner = LineScanner::new("```{.sh .run}\necho a\n``` trailing");
        let open = scanner.next().unwrap();
        let err = read_fence_body(&mut scanner, &open).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ErrorKind::TrailingContent(_)));
    }

    #[test]
    fn disabled_runner_refuses() {
        let request = RunRequest {
            lang: "sh".into(),
            executable: None,
        };
        let err = CodeRunner::new(false, None).run(&request, "echo hi\n").unwrap_err();
        assert_eq!(err.to_string(), DISABLED_MESSAGE);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let request = RunRequest {
            lang: "sh".into(),
            executable: None,
        };
        let out = CodeRunner::new(true, None)
            .run(&request, "echo '1. What is 1+1?'\necho '*a) 2'\n")
            .unwrap();
        assert_eq!(out, "1. What is 1+1?\n*a) 2\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_code_reports_stderr() {
        let request = RunRequest {
            lang: "sh".into(),
            executable: None,
        };
        let err = CodeRunner::new(true, None)
            .run(&request, "echo oops >&2\nexit 3\n")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Code execution resulted in errors:"));
        assert!(msg.contains("oops"));
    }

    #[test]
    fn missing_interpreter_is_reported() {
        let request = RunRequest {
            lang: "definitely-not-an-interpreter-xyz".into(),
            executable: None,
        };
        let err = CodeRunner::new(true, None).run(&request, "").unwrap_err();
        assert!(err.to_string().contains("missing executable"));
    }
}
