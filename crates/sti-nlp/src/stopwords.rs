//! Stop-word lists.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::NlpError;

const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// A set of lowercase words ignored when building bags of words.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in English list.
    pub fn english() -> Self {
        Self {
            words: ENGLISH.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// Adds words from a file, one per line. Blank lines and `#` comments are skipped.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, NlpError> {
        let contents = fs::read_to_string(path).map_err(|e| NlpError::io(path, e))?;
        Ok(self.extend_from_lines(&contents))
    }

    pub fn extend_from_lines(&mut self, contents: &str) -> usize {
        let before = self.words.len();
        for line in contents.lines() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            self.words.insert(word.to_lowercase());
        }
        self.words.len() - before
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_list_contains_common_words() {
        let stop = StopWords::english();
        assert!(stop.contains("the"));
        assert!(stop.contains("of"));
        assert!(!stop.contains("paris"));
    }

    #[test]
    fn extend_skips_comments_and_blanks() {
        let mut stop = StopWords::empty();
        let added = stop.extend_from_lines("# header\nFoo\n\n  bar  \nfoo\n");
        assert_eq!(added, 2);
        assert!(stop.contains("foo"));
        assert!(stop.contains("bar"));
    }
}
