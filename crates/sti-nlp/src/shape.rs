//! Surface-shape heuristics over raw cell text.

/// True if the text looks like an acronym or code.
///
/// Matches any of:
/// - no whitespace, mixed letters and digits (`A380`, `ISO9001`)
/// - no whitespace, all capitals, at most 5 characters (`NASA`, `UK`)
/// - exactly one whitespace and all letters capital (`NY C`, `U K`)
pub fn looks_like_acronym(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let whitespace = text.chars().filter(|c| c.is_whitespace()).count();
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    let all_caps = !letters.is_empty() && letters.iter().all(|c| c.is_uppercase());

    if whitespace == 0 {
        if !letters.is_empty() && has_digit {
            return true;
        }
        if all_caps && text.chars().count() <= 5 {
            return true;
        }
        return false;
    }
    whitespace == 1 && all_caps
}

/// Returns the first sentence of a text (up to and excluding the first `. `,
/// `! ` or `? `, or the whole text).
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let bytes = text.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if matches!(byte, b'.' | b'!' | b'?')
            && bytes.get(index + 1).is_none_or(u8::is_ascii_whitespace)
        {
            return &text[..index];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acronym_shapes() {
        assert!(looks_like_acronym("A380"));
        assert!(looks_like_acronym("NASA"));
        assert!(looks_like_acronym("U K"));
        assert!(!looks_like_acronym("UNESCOS"));
        assert!(!looks_like_acronym("Paris"));
        assert!(!looks_like_acronym("New York City"));
        assert!(!looks_like_acronym("New York"));
        assert!(!looks_like_acronym("1990"));
        assert!(!looks_like_acronym(""));
    }

    #[test]
    fn first_sentence_stops_at_terminator() {
        assert_eq!(
            first_sentence("Paris is the capital of France. It has museums."),
            "Paris is the capital of France"
        );
        assert_eq!(first_sentence("No terminator here"), "No terminator here");
        assert_eq!(first_sentence("Version 2.0 released."), "Version 2.0 released");
    }
}
