//! Interpreter configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! class_weights = [1.0, 0.5, 0.5, 0.25]
//! entity_weights = [0.5, 0.5, 1.0, 0.25]
//! relation_weights = [1.0, 0.5, 0.5, 0.25]
//! max_iterations = 10
//! relation_domain_consensus = true
//!
//! [stopping_criteria]
//! name = "entropy"
//! params = ["0.0001", "2"]
//!
//! [matcher]
//! min_string_score = 0.5
//! fuzzy_string_score = 0.95
//! number_tolerance = 0.01
//!
//! [nlp]
//! stopwords_file = "stopwords.txt"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StiError};

/// Context weights, written as `[header, column, row, out_of_table]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct ContextWeights {
    pub header: f64,
    pub column: f64,
    pub row: f64,
    pub out_of_table: f64,
}

impl ContextWeights {
    pub const fn new(header: f64, column: f64, row: f64, out_of_table: f64) -> Self {
        Self {
            header,
            column,
            row,
            out_of_table,
        }
    }

    fn is_valid(&self) -> bool {
        [self.header, self.column, self.row, self.out_of_table]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl From<[f64; 4]> for ContextWeights {
    fn from([header, column, row, out_of_table]: [f64; 4]) -> Self {
        Self::new(header, column, row, out_of_table)
    }
}

impl From<ContextWeights> for [f64; 4] {
    fn from(weights: ContextWeights) -> Self {
        [weights.header, weights.column, weights.row, weights.out_of_table]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingCriteriaConfig {
    /// `entropy` or `exhaust`.
    pub name: String,
    pub params: Vec<String>,
}

impl Default for StoppingCriteriaConfig {
    fn default() -> Self {
        Self {
            name: "entropy".to_string(),
            params: vec!["0.0001".to_string(), "2".to_string()],
        }
    }
}

/// Thresholds of the attribute value matcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum token overlap for a string match.
    pub min_string_score: f64,
    /// Minimum Jaro-Winkler similarity for a fuzzy string match.
    pub fuzzy_string_score: f64,
    /// Maximum relative difference for a numeric match.
    pub number_tolerance: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_string_score: 0.5,
            fuzzy_string_score: 0.95,
            number_tolerance: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    /// Extra stop words, one per line, added to the built-in English list.
    pub stopwords_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub class_weights: ContextWeights,
    pub entity_weights: ContextWeights,
    pub relation_weights: ContextWeights,
    pub stopping_criteria: StoppingCriteriaConfig,
    /// Upper bound on UPDATE iterations.
    pub max_iterations: usize,
    /// Revise relation scores by domain consensus after enumeration.
    pub relation_domain_consensus: bool,
    pub matcher: MatcherConfig,
    pub nlp: NlpConfig,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            class_weights: ContextWeights::new(1.0, 0.5, 0.5, 0.25),
            entity_weights: ContextWeights::new(0.5, 0.5, 1.0, 0.25),
            relation_weights: ContextWeights::new(1.0, 0.5, 0.5, 0.25),
            stopping_criteria: StoppingCriteriaConfig::default(),
            max_iterations: 10,
            relation_domain_consensus: true,
            matcher: MatcherConfig::default(),
            nlp: NlpConfig::default(),
        }
    }
}

impl InterpreterConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| StiError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| StiError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| StiError::ConfigToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded interpreter configuration");
        Ok(config)
    }

    /// Checks weights and matcher thresholds. Stopping criteria are checked
    /// when the criteria are built.
    pub fn validate(&self) -> Result<()> {
        for (name, weights) in [
            ("class_weights", &self.class_weights),
            ("entity_weights", &self.entity_weights),
            ("relation_weights", &self.relation_weights),
        ] {
            if !weights.is_valid() {
                return Err(StiError::config(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        let matcher = &self.matcher;
        for (name, value) in [
            ("matcher.min_string_score", matcher.min_string_score),
            ("matcher.fuzzy_string_score", matcher.fuzzy_string_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StiError::config(format!("{name} must be within [0, 1]")));
            }
        }
        if !matcher.number_tolerance.is_finite() || matcher.number_tolerance < 0.0 {
            return Err(StiError::config("matcher.number_tolerance must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = InterpreterConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.entity_weights.row, 1.0);
        assert_eq!(config.stopping_criteria.name, "entropy");
    }

    #[test]
    fn weights_are_read_as_four_element_arrays() {
        let config = InterpreterConfig::from_toml_str(
            "class_weights = [2.0, 1.0, 0.0, 0.5]\nmax_iterations = 3\n\n[stopping_criteria]\nname = \"exhaust\"\nparams = []\n",
        )
        .expect("parse config");
        assert_eq!(config.class_weights, ContextWeights::new(2.0, 1.0, 0.0, 0.5));
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.stopping_criteria.name, "exhaust");
        assert!(config.stopping_criteria.params.is_empty());
    }

    #[test]
    fn negative_weights_are_rejected() {
        let err = InterpreterConfig::from_toml_str("entity_weights = [1.0, -1.0, 0.0, 0.0]")
            .unwrap_err();
        assert!(matches!(err, StiError::Config { .. }));
    }

    #[test]
    fn wrong_arity_is_a_config_error() {
        let err = InterpreterConfig::from_toml_str("class_weights = [1.0, 2.0]").unwrap_err();
        assert!(matches!(err, StiError::Config { .. }));
    }
}
