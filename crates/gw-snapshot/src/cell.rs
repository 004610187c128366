//! Normalized table values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized table cell.
///
/// Cells that look like plain decimals become numbers, so `75.0` and `75`
/// compare equal. Everything else (grades, `N/A`, codes with leading zeros,
/// digit strings too long for an exact `f64`) stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Finite decimal.
    Number(f64),
    /// Any other value, whitespace-normalized.
    Text(String),
}

impl Cell {
    /// Normalize raw cell text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = normalize_text(raw);
        if looks_numeric(&text)
            && let Ok(value) = text.parse::<f64>()
            && value.is_finite()
        {
            return Self::Number(value);
        }
        Self::Text(text)
    }

    /// Whether the cell holds no text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Trim and collapse whitespace, treating non-breaking spaces as spaces.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Longest digit run an `f64` holds exactly.
const MAX_DIGITS: usize = 15;

/// Optional sign, digits, at most one dot, no leading zero before a digit,
/// at most [`MAX_DIGITS`] digits.
fn looks_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int.is_empty() || !digits(int) || !digits(frac) {
        return false;
    }
    if unsigned.contains('.') && frac.is_empty() {
        return false;
    }
    if int.len() + frac.len() > MAX_DIGITS {
        return false;
    }
    !(int.len() > 1 && int.starts_with('0'))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_numbers_are_normalized() {
        assert_eq!(Cell::parse("75.0"), Cell::parse("75"));
        assert_eq!(Cell::parse(" 8.50 "), Cell::Number(8.5));
        assert_eq!(Cell::parse("-3"), Cell::Number(-3.0));
    }

    #[test]
    fn test_text_passes_through() {
        assert_eq!(Cell::parse("N/A"), Cell::Text("N/A".to_owned()));
        assert_eq!(Cell::parse("B+"), Cell::Text("B+".to_owned()));
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".to_owned()));
        assert_eq!(Cell::parse("1e3"), Cell::Text("1e3".to_owned()));
        assert_eq!(Cell::parse("5."), Cell::Text("5.".to_owned()));
    }

    #[test]
    fn test_leading_zero_stays_text() {
        assert_eq!(Cell::parse("05"), Cell::Text("05".to_owned()));
        assert_eq!(Cell::parse("0.5"), Cell::Number(0.5));
        assert_eq!(Cell::parse("0"), Cell::Number(0.0));
    }

    #[test]
    fn test_long_digit_runs_stay_exact() {
        let a = Cell::parse("12345678901234567891");
        let b = Cell::parse("12345678901234567890");
        assert_eq!(a, Cell::Text("12345678901234567891".to_owned()));
        assert_ne!(a, b);
        assert_eq!(Cell::parse("123456789012345"), Cell::Number(123_456_789_012_345.0));
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            Cell::parse("\u{a0} Data\n   Structures "),
            Cell::Text("Data Structures".to_owned())
        );
        assert!(Cell::parse(" \u{a0} ").is_blank());
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::parse("75.0").to_string(), "75");
        assert_eq!(Cell::parse("82.35").to_string(), "82.35");
        assert_eq!(Cell::parse("RA").to_string(), "RA");
    }

    #[test]
    fn test_serde_untagged() {
        let cells = vec![Cell::Number(75.0), Cell::Text("A".to_owned())];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[75.0,"A"]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }
}
