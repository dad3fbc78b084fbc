//! Bag-of-words construction from free text and resource identifiers.

use std::path::Path;

use crate::bow::Bow;
use crate::error::NlpError;
use crate::lemma::Lemmatizer;
use crate::stopwords::StopWords;
use crate::tokenize::{split_camel_case, tokenize, uri_local_name};

/// Stop words plus lemmatizer, applied uniformly to every text the scorers compare.
///
/// A processor holds no mutable state and may be shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TextProcessor {
    stopwords: StopWords,
    lemmatizer: Lemmatizer,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::english()
    }
}

impl TextProcessor {
    pub fn new(stopwords: StopWords, lemmatizer: Lemmatizer) -> Self {
        Self {
            stopwords,
            lemmatizer,
        }
    }

    pub fn english() -> Self {
        Self::new(StopWords::english(), Lemmatizer::english())
    }

    /// English resources extended with an optional stop-word file.
    pub fn from_stopword_file(path: Option<&Path>) -> Result<Self, NlpError> {
        let mut stopwords = StopWords::english();
        if let Some(path) = path {
            let added = stopwords.extend_from_file(path)?;
            tracing::debug!(path = %path.display(), added, "loaded stop words");
        }
        Ok(Self::new(stopwords, Lemmatizer::english()))
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn lemmatize(&self, token: &str) -> String {
        self.lemmatizer.lemmatize(token)
    }

    /// Tokens of `text` with stop words and single characters removed, lemmatized.
    pub fn content_tokens(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|token| token.chars().count() > 1 && !self.is_stopword(token))
            .map(|token| self.lemmatize(&token))
            .collect()
    }

    /// Bag of words of free text, each content token weighted 1.0.
    pub fn bag_of_words(&self, text: &str) -> Bow {
        Bow::from_tokens(self.content_tokens(text))
    }

    /// Adds the content tokens of `text` to `bow` with the given weight.
    pub fn add_text(&self, bow: &mut Bow, text: &str, weight: f64) {
        for token in self.content_tokens(text) {
            bow.add(token, weight);
        }
    }

    /// Bag of words of a knowledge-base resource: its label plus the
    /// camel-case-split local name of its identifier.
    pub fn resource_bag_of_words(&self, id: &str, label: &str) -> Bow {
        let mut bow = self.bag_of_words(label);
        let local = split_camel_case(uri_local_name(id));
        for token in self.content_tokens(&local) {
            if !bow.contains(&token) {
                bow.add(token, 1.0);
            }
        }
        bow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_tokens_drop_stopwords_and_lemmatize() {
        let text = TextProcessor::english();
        assert_eq!(
            text.content_tokens("The capital cities of a Country"),
            vec!["capital", "city", "country"]
        );
    }

    #[test]
    fn resource_bow_uses_label_and_local_name() {
        let text = TextProcessor::english();
        let bow = text.resource_bag_of_words("http://dbpedia.org/ontology/capitalOf", "capital");
        assert!(bow.contains("capital"));
        assert!((bow.weight("capital") - 1.0).abs() < 1e-9);
        assert_eq!(bow.len(), 1);

        let bow = text.resource_bag_of_words("http://dbpedia.org/ontology/PopulatedPlace", "");
        assert!(bow.contains("populated"));
        assert!(bow.contains("place"));
    }

    #[test]
    fn weighted_text_is_added() {
        let text = TextProcessor::english();
        let mut bow = Bow::new();
        text.add_text(&mut bow, "Largest cities", 2.0);
        assert!((bow.weight("city") - 2.0).abs() < 1e-9);
        assert!((bow.weight("largest") - 2.0).abs() < 1e-9);
    }
}
