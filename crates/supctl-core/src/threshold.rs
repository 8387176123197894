//! Threshold evaluation
//!
//! Pure comparisons of a value against an upper or lower limit. A match yields
//! the value itself; `None` means "no violation" and is skipped by callers.

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the operating band a limit guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    /// Value must stay at or below the limit
    Upper,
    /// Value must stay at or above the limit
    Lower,
}

impl LimitKind {
    /// Both kinds, upper first (evaluation precedence)
    pub const ALL: [LimitKind; 2] = [LimitKind::Upper, LimitKind::Lower];

    /// Compare `x` against `limit` on this side of the band
    pub fn check(self, x: f64, limit: f64) -> Option<f64> {
        match self {
            LimitKind::Upper => exceeds_upper(x, limit),
            LimitKind::Lower => exceeds_lower(x, limit),
        }
    }

    /// Control request name for this kind
    pub fn request_name(self) -> &'static str {
        match self {
            LimitKind::Upper => "upper limit",
            LimitKind::Lower => "lower limit",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Upper => write!(f, "upper"),
            LimitKind::Lower => write!(f, "lower"),
        }
    }
}

/// Returns `Some(x)` when `x > limit`
pub fn exceeds_upper(x: f64, limit: f64) -> Option<f64> {
    (x > limit).then_some(x)
}

/// Returns `Some(x)` when `x < limit`
pub fn exceeds_lower(x: f64, limit: f64) -> Option<f64> {
    (x < limit).then_some(x)
}

/// Coerce a raw cell to a float.
///
/// Blank cells are missing readings and become NaN, which never matches a
/// limit. Anything else that does not parse is a coercion failure.
pub fn coerce(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(f64::NAN);
    }
    trimmed.parse::<f64>().ok()
}

/// Evaluate a whole column, one signal per row.
pub fn evaluate_column<S: AsRef<str>>(
    column: &str,
    values: &[S],
    limit: f64,
    kind: LimitKind,
) -> ScanResult<Vec<Option<f64>>> {
    values
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            let raw = raw.as_ref();
            let x = coerce(raw).ok_or_else(|| ScanError::Coercion {
                column: column.to_string(),
                row,
                raw: raw.to_string(),
            })?;
            Ok(kind.check(x, limit))
        })
        .collect()
}
