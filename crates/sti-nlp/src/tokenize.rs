//! Tokenizing helpers.

/// Normalizes text for comparison by lowercasing and collapsing separators.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits text into lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Inserts a space at every lower-to-upper case boundary (`capitalOf` -> `capital Of`).
pub fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut previous: Option<char> = None;
    for ch in text.chars() {
        if let Some(prev) = previous
            && prev.is_lowercase()
            && ch.is_uppercase()
        {
            out.push(' ');
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}

/// Returns the fragment after the last `#`, `/` or `:` of a URI or
/// compact `prefix:Name` identifier.
///
/// Identifiers without a separator are returned unchanged.
pub fn uri_local_name(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['#', '/', ':']) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_punctuation_and_lowercases() {
        assert_eq!(tokenize("Paris, France!"), vec!["paris", "france"]);
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn camel_case_is_split() {
        assert_eq!(split_camel_case("capitalOf"), "capital Of");
        assert_eq!(split_camel_case("birthPlaceName"), "birth Place Name");
        assert_eq!(split_camel_case("URL"), "URL");
    }

    #[test]
    fn local_name_of_uris() {
        assert_eq!(
            uri_local_name("http://dbpedia.org/ontology/capitalOf"),
            "capitalOf"
        );
        assert_eq!(uri_local_name("http://xmlns.com/foaf/0.1#name"), "name");
        assert_eq!(uri_local_name("http://example.org/Country/"), "Country");
        assert_eq!(uri_local_name("dbo:birthPlace"), "birthPlace");
        assert_eq!(uri_local_name("plain"), "plain");
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize_text("  Birth_Place-Name "), "birth place name");
    }
}
