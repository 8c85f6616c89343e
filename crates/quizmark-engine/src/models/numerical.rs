use std::sync::LazyLock;

use regex::Regex;

use crate::error::ErrorKind;

/// Smallest magnitude an acceptable numerical answer may have; comparisons
/// against values closer to zero are not reliable.
pub const MIN_MAGNITUDE: f64 = 1e-4;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0|[+-]?[1-9](?:[0-9]+|_[0-9]+)*)$").expect("integer pattern is valid")
});

const FORMAT_HINT: &str =
    "Invalid numerical response; need \"[<min>, <max>]\" or \"<number> +- <margin>\" or \"<integer>\"";

/// The accepted range of a numerical question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalAnswer {
    pub min: f64,
    /// The target value, when the answer was given as a value (with or
    /// without margin) rather than a range.
    pub exact: Option<f64>,
    pub max: f64,
}

impl NumericalAnswer {
    /// Parses `[min, max]`, `value +- margin`, `value +- percent%` or a bare integer.
    pub fn parse(text: &str) -> Result<Self, ErrorKind> {
        let text = text.trim();
        let answer = if let Some(inner) = text.strip_prefix('[') {
            Self::parse_range(inner)?
        } else if let Some((value, margin)) = text.split_once("+-") {
            Self::parse_margin(value, margin)?
        } else if INTEGER.is_match(text) {
            let value = text
                .replace('_', "")
                .parse::<i64>()
                .map_err(|_| ErrorKind::syntax(FORMAT_HINT))? as f64;
            Self {
                min: value,
                exact: Some(value),
                max: value,
            }
        } else {
            return Err(ErrorKind::syntax(FORMAT_HINT));
        };

        if answer.min.abs() < MIN_MAGNITUDE || answer.max.abs() < MIN_MAGNITUDE {
            return Err(ErrorKind::semantic(
                "Invalid numerical response; all acceptable values must have a magnitude >= 0.0001",
            ));
        }
        Ok(answer)
    }

    fn parse_range(inner: &str) -> Result<Self, ErrorKind> {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| ErrorKind::syntax(FORMAT_HINT))?;
        let (min, max) = inner
            .split_once(',')
            .ok_or_else(|| ErrorKind::syntax(FORMAT_HINT))?;
        let min = parse_float(min)?;
        let max = parse_float(max)?;
        if min > max {
            return Err(ErrorKind::semantic(
                "Invalid numerical response; need \"[<min>, <max>]\" with min < max",
            ));
        }
        Ok(Self {
            min,
            exact: None,
            max,
        })
    }

    fn parse_margin(value: &str, margin: &str) -> Result<Self, ErrorKind> {
        let margin = margin.trim();
        let (margin, relative) = match margin.strip_suffix('%') {
            Some(m) => (m, true),
            None => (margin, false),
        };
        let value = parse_float(value)?;
        let margin = parse_float(margin)?;
        if margin < 0.0 {
            return Err(ErrorKind::semantic(
                "Invalid numerical response; need \"<number> +- <margin>\" with margin > 0",
            ));
        }
        let delta = if relative {
            value.abs() * (margin / 100.0)
        } else {
            margin
        };
        Ok(Self {
            min: value - delta,
            exact: Some(value),
            max: value + delta,
        })
    }

    /// Formats a bound for export: integers as-is, everything else to four places.
    pub fn format_value(&self, value: f64) -> String {
        let all_whole = [Some(self.min), self.exact, Some(self.max)]
            .into_iter()
            .flatten()
            .all(|v| v.fract() == 0.0);
        if all_whole {
            format!("{value}")
        } else {
            format!("{value:.4}")
        }
    }
}

fn parse_float(text: &str) -> Result<f64, ErrorKind> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ErrorKind::syntax(FORMAT_HINT)),
    }
}
