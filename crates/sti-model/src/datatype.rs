//! Primitive data-type detection for table cells.

use serde::{Deserialize, Serialize};

/// Named entities are short; anything longer is plain text.
const NAMED_ENTITY_MAX_TOKENS: usize = 8;
/// Above this token count a cell is long text.
const SHORT_TEXT_MAX_TOKENS: usize = 15;

/// Detected primitive type of a cell or column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Unknown,
    Number,
    /// Integers forming a strictly increasing `+1` sequence down a column (row indexes).
    OrderedNumber,
    NamedEntity,
    ShortText,
    LongText,
    Empty,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::OrderedNumber)
    }
}

/// Classifies the raw text of one cell.
///
/// [`DataType::OrderedNumber`] is a column-level property and is never
/// returned here; see [`crate::TableBuilder`].
pub fn detect_data_type(text: &str) -> DataType {
    let text = text.trim();
    if text.is_empty() {
        return DataType::Empty;
    }
    if parse_number(text).is_some() {
        return DataType::Number;
    }
    if !text.chars().any(char::is_alphanumeric) {
        return DataType::Unknown;
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > SHORT_TEXT_MAX_TOKENS {
        return DataType::LongText;
    }
    if words.len() <= NAMED_ENTITY_MAX_TOKENS && is_capitalized_phrase(&words) {
        return DataType::NamedEntity;
    }
    DataType::ShortText
}

/// Parses a number, tolerating thousands separators, currency and percent signs.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '$' | '€' | '£' | ' '))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// First word starts with a capital, and at least half of the words that
/// start with a letter do.
fn is_capitalized_phrase(words: &[&str]) -> bool {
    let initials: Vec<char> = words
        .iter()
        .filter_map(|word| word.chars().find(|c| c.is_alphabetic()))
        .collect();
    let Some(first) = initials.first() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let capitalized = initials.iter().filter(|c| c.is_uppercase()).count();
    capitalized * 2 >= initials.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_primitive_types() {
        assert_eq!(detect_data_type(""), DataType::Empty);
        assert_eq!(detect_data_type("   "), DataType::Empty);
        assert_eq!(detect_data_type("1,234.5"), DataType::Number);
        assert_eq!(detect_data_type("-12"), DataType::Number);
        assert_eq!(detect_data_type("45%"), DataType::Number);
        assert_eq!(detect_data_type("Paris"), DataType::NamedEntity);
        assert_eq!(detect_data_type("New York City"), DataType::NamedEntity);
        assert_eq!(detect_data_type("Cathedral of Notre Dame"), DataType::NamedEntity);
        assert_eq!(detect_data_type("red wine"), DataType::ShortText);
        assert_eq!(detect_data_type("--"), DataType::Unknown);
        let long = "word ".repeat(20);
        assert_eq!(detect_data_type(&long), DataType::LongText);
    }

    #[test]
    fn parse_number_rejects_text() {
        assert_eq!(parse_number("$1,000"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
