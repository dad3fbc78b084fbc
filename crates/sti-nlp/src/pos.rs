//! Closed-class part-of-speech checks.
//!
//! Header texts such as "Born in" or "Used to" end with a preposition or an
//! infinitive marker, which marks a column as describing something about
//! another column rather than naming the row's subject.

use crate::tokenize::tokenize;

const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite", "down",
    "during", "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "per", "since", "through", "throughout", "till", "toward",
    "towards", "under", "until", "upon", "via", "with", "within", "without",
];

const INFINITIVE_MARKER: &str = "to";

/// True if `token` (lowercase) is a preposition or the infinitive marker "to".
pub fn is_preposition_or_infinitive_marker(token: &str) -> bool {
    token == INFINITIVE_MARKER || PREPOSITIONS.contains(&token)
}

/// True if the last token of `text` is a preposition or infinitive marker.
pub fn ends_with_preposition(text: &str) -> bool {
    tokenize(text)
        .last()
        .is_some_and(|token| is_preposition_or_infinitive_marker(token))
}
