//! Weighted bag of words and the Dice overlap used by every scorer.

use std::collections::BTreeMap;

/// A bag of words where each word carries an accumulated weight.
///
/// Plain term frequencies are weights of 1.0 per occurrence; context blocks
/// such as a page title add their words with a higher weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bow {
    words: BTreeMap<String, f64>,
}

impl Bow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bow = Self::new();
        for token in tokens {
            bow.add(token, 1.0);
        }
        bow
    }

    pub fn add(&mut self, word: impl Into<String>, weight: f64) {
        *self.words.entry(word.into()).or_insert(0.0) += weight;
    }

    /// Adds every word of `other`, scaling its weight by `factor`.
    pub fn merge(&mut self, other: &Bow, factor: f64) {
        for (word, weight) in &other.words {
            self.add(word.clone(), weight * factor);
        }
    }

    pub fn weight(&self, word: &str) -> f64 {
        self.words.get(word).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Sum of all word weights.
    pub fn total(&self) -> f64 {
        self.words.values().sum()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = (&str, f64)> {
        self.words.iter().map(|(word, weight)| (word.as_str(), *weight))
    }
}

/// Dice overlap of two weighted bags: `2 * Σ min(a_w, b_w) / (Σ a + Σ b)`.
///
/// Returns 0.0 when both bags are empty.
pub fn dice(a: &Bow, b: &Bow) -> f64 {
    let denominator = a.total() + b.total();
    if denominator <= 0.0 {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let overlap: f64 = small
        .words()
        .map(|(word, weight)| weight.min(large.weight(word)))
        .sum();
    2.0 * overlap / denominator
}
