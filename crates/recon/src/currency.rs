//! Currency parsing for the CDK `Balance` column.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    Empty,
    Invalid(String),
}

impl fmt::Display for CurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty currency value"),
            Self::Invalid(raw) => write!(f, "cannot parse currency value '{raw}'"),
        }
    }
}

impl std::error::Error for CurrencyError {}

/// Parse a currency string such as `$1,234.56`:
/// - Strip `$`, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Anything else left over is an error
///
/// Magnitudes beyond `Decimal::MAX` (about 7.9e28) saturate to
/// `Decimal::MAX` / `Decimal::MIN` so they still compare as positive or
/// negative; fraction digits past 28 significant digits are truncated.
pub fn parse_currency(s: &str) -> Result<Decimal, CurrencyError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CurrencyError::Empty);
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let invalid = || CurrencyError::Invalid(s.to_string());

    let (sign_negative, digits) = match cleaned.as_bytes().first() {
        Some(b'-') if !is_negative => (true, &cleaned[1..]),
        Some(b'+') if !is_negative => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };

    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if digits.chars().any(|c| !(c.is_ascii_digit() || c == '.')) || digits.matches('.').count() > 1 {
        return Err(invalid());
    }

    let value = to_decimal(digits).ok_or_else(invalid)?;
    Ok(if is_negative || sign_negative { -value } else { value })
}

/// Significant digits a `Decimal` can hold.
const MAX_DIGITS: usize = 28;

/// Convert an unsigned `digits[.digits]` string, saturating at
/// `Decimal::MAX` and truncating fraction digits beyond the precision.
fn to_decimal(digits: &str) -> Option<Decimal> {
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let int_part = int_part.trim_start_matches('0');
    if int_part.len() > MAX_DIGITS {
        return Some(Decimal::MAX);
    }

    let frac_len = frac_part.len().min(MAX_DIGITS - int_part.len());
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let text = if frac_len == 0 {
        int_part.to_string()
    } else {
        format!("{int_part}.{}", &frac_part[..frac_len])
    };
    Decimal::from_str(&text).ok()
}

/// CDK balance cell after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Balance {
    #[default]
    Absent,
    Amount { raw: String, value: Decimal },
    /// Present but not a currency amount; fails the balance criterion.
    Invalid(String),
}

impl Balance {
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            None => Self::Absent,
            Some(raw) => match parse_currency(raw) {
                Ok(value) => Self::Amount { raw: raw.to_string(), value },
                Err(_) => Self::Invalid(raw.to_string()),
            },
        }
    }

    /// Amount used by the balance criterion; absent and invalid count as zero.
    pub fn amount_or_zero(&self) -> Decimal {
        match self {
            Self::Amount { value, .. } => *value,
            _ => Decimal::ZERO,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.amount_or_zero() > Decimal::ZERO
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// The cell text as it appeared in the input.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Amount { raw, .. } => Some(raw),
            Self::Invalid(raw) => Some(raw),
        }
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.raw() {
            Some(raw) => serializer.serialize_some(raw),
            None => serializer.serialize_none(),
        }
    }
}
