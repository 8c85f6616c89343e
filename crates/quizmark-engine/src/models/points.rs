use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

use crate::error::ErrorKind;

/// A point value: a positive integer or half-integer.
///
/// Stored as a count of half points so that sums are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Points {
    halves: u64,
}

impl Points {
    pub const ZERO: Points = Points { halves: 0 };
    pub const ONE: Points = Points { halves: 2 };

    pub fn from_whole(n: u64) -> Self {
        Self { halves: n * 2 }
    }

    /// Parses a points value such as `2`, `1.5` or `3.0`.
    pub fn parse(text: &str) -> Result<Self, ErrorKind> {
        let invalid = || {
            ErrorKind::syntax(format!(
                "Invalid points value \"{text}\"; need positive integer or half-integer"
            ))
        };
        let value: f64 = text.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid());
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || doubled > u32::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self {
            halves: doubled as u64,
        })
    }

    pub fn as_f64(self) -> f64 {
        self.halves as f64 / 2.0
    }

    pub fn is_whole(self) -> bool {
        self.halves % 2 == 0
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points {
            halves: self.halves + rhs.halves,
        }
    }
}

impl Mul<usize> for Points {
    type Output = Points;

    fn mul(self, rhs: usize) -> Points {
        Points {
            halves: self.halves * rhs as u64,
        }
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Points>>(iter: I) -> Points {
        iter.fold(Points::ZERO, Add::add)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.halves / 2)
        } else {
            write!(f, "{}.5", self.halves / 2)
        }
    }
}
