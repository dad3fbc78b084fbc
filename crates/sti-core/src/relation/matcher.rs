//! Matching of knowledge-base attribute values against cell text.

use chrono::{Datelike, NaiveDate};
use rapidfuzz::distance::jaro_winkler;
use sti_model::{Cell, DataType, datatype::parse_number};
use sti_nlp::{Bow, dice, normalize_text, tokenize};

use crate::config::MatcherConfig;

/// Score given to a date attribute whose year equals a year-only cell.
pub const YEAR_MATCH_SCORE: f64 = 0.8;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
];

/// Decides whether an attribute value describes the content of a cell.
pub trait AttributeValueMatcher: Send + Sync {
    /// Match strength in `(0, 1]`, or `None` when the value does not match.
    fn match_value(&self, attribute_value: &str, cell: &Cell) -> Option<f64>;
}

/// Parses the date formats commonly found in tables and knowledge bases.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // xsd:dateTime values carry a time part after the date.
    let date_part = text.split_once('T').map_or(text, |(date, _)| date);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}

/// Compares numbers, dates and strings according to the cell's data type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedValueMatcher {
    config: MatcherConfig,
}

impl TypedValueMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    fn match_number(&self, value: f64, cell: f64) -> Option<f64> {
        let scale = value.abs().max(cell.abs());
        if scale == 0.0 {
            return Some(1.0);
        }
        let difference = (value - cell).abs() / scale;
        (difference <= self.config.number_tolerance).then_some(1.0 - difference)
    }

    fn match_date(value: &str, cell: &Cell) -> Option<f64> {
        let value = parse_date(value)?;
        if let Some(date) = parse_date(&cell.text) {
            return (date == value).then_some(1.0);
        }
        let year = cell.text.trim();
        (cell.data_type.is_numeric() && year.len() == 4)
            .then(|| year.parse::<i32>().ok())
            .flatten()
            .filter(|year| *year == value.year())
            .map(|_| YEAR_MATCH_SCORE)
    }

    fn match_string(&self, value: &str, cell: &str) -> Option<f64> {
        let value = normalize_text(value);
        let cell = normalize_text(cell);
        if value.is_empty() || cell.is_empty() {
            return None;
        }
        if value == cell {
            return Some(1.0);
        }
        let overlap = dice(
            &Bow::from_tokens(tokenize(&value)),
            &Bow::from_tokens(tokenize(&cell)),
        );
        if overlap >= self.config.min_string_score {
            return Some(overlap);
        }
        let similarity = jaro_winkler::similarity(value.chars(), cell.chars());
        (similarity >= self.config.fuzzy_string_score).then_some(similarity)
    }
}

impl AttributeValueMatcher for TypedValueMatcher {
    fn match_value(&self, attribute_value: &str, cell: &Cell) -> Option<f64> {
        if cell.is_empty() || attribute_value.trim().is_empty() {
            return None;
        }
        if cell.data_type.is_numeric()
            && let (Some(value), Some(number)) = (parse_number(attribute_value), parse_number(&cell.text))
            && let Some(score) = self.match_number(value, number)
        {
            return Some(score);
        }
        if let Some(score) = Self::match_date(attribute_value, cell) {
            return Some(score);
        }
        if matches!(cell.data_type, DataType::Number | DataType::OrderedNumber) {
            return None;
        }
        self.match_string(attribute_value, &cell.text)
    }
}
