//! Rule-based English lemmatizer.
//!
//! Only inflectional noun and verb endings are handled. The output is used
//! for bag-of-words overlap, so consistency matters more than linguistic
//! accuracy: the same surface form always maps to the same lemma.

use std::collections::BTreeMap;

const IRREGULAR: &[(&str, &str)] = &[
    ("are", "be"),
    ("born", "bear"),
    ("children", "child"),
    ("did", "do"),
    ("done", "do"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("had", "have"),
    ("has", "have"),
    ("is", "be"),
    ("men", "man"),
    ("mice", "mouse"),
    ("people", "person"),
    ("teeth", "tooth"),
    ("was", "be"),
    ("went", "go"),
    ("were", "be"),
    ("women", "woman"),
];

/// Endings that look plural but are part of the lemma.
const KEEP_ENDINGS: &[&str] = &["ss", "us", "is", "ous", "ics"];

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: BTreeMap<String, String>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Lemmatizer {
    pub fn english() -> Self {
        Self {
            exceptions: IRREGULAR
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        }
    }

    /// Registers an additional irregular form.
    pub fn add_exception(&mut self, form: impl Into<String>, lemma: impl Into<String>) {
        self.exceptions.insert(form.into(), lemma.into());
    }

    /// Lemmatizes a single lowercase token.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.exceptions.get(token) {
            return lemma.clone();
        }
        if token.len() <= 3 || !token.chars().all(char::is_alphabetic) {
            return token.to_string();
        }
        if let Some(stem) = token.strip_suffix("ies")
            && stem.len() >= 2
        {
            return format!("{stem}y");
        }
        if let Some(stem) = token.strip_suffix("ied")
            && stem.len() >= 2
        {
            return format!("{stem}y");
        }
        for suffix in ["sses", "xes", "ches", "shes", "zes"] {
            if token.ends_with(suffix) {
                return token[..token.len() - 2].to_string();
            }
        }
        if KEEP_ENDINGS.iter().any(|ending| token.ends_with(ending)) {
            return token.to_string();
        }
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_plurals() {
        let lemma = Lemmatizer::english();
        assert_eq!(lemma.lemmatize("cities"), "city");
        assert_eq!(lemma.lemmatize("countries"), "country");
        assert_eq!(lemma.lemmatize("boxes"), "box");
        assert_eq!(lemma.lemmatize("churches"), "church");
        assert_eq!(lemma.lemmatize("films"), "film");
    }

    #[test]
    fn protected_endings_are_kept() {
        let lemma = Lemmatizer::english();
        assert_eq!(lemma.lemmatize("class"), "class");
        assert_eq!(lemma.lemmatize("status"), "status");
        assert_eq!(lemma.lemmatize("analysis"), "analysis");
        assert_eq!(lemma.lemmatize("famous"), "famous");
    }

    #[test]
    fn irregular_and_short_words() {
        let mut lemma = Lemmatizer::english();
        assert_eq!(lemma.lemmatize("people"), "person");
        assert_eq!(lemma.lemmatize("was"), "be");
        assert_eq!(lemma.lemmatize("bus"), "bus");
        assert_eq!(lemma.lemmatize("1990s"), "1990s");
        lemma.add_exception("data", "datum");
        assert_eq!(lemma.lemmatize("data"), "datum");
    }
}
