//! Subject column detection.
//!
//! Candidate columns are named-entity typed (short text as a fallback).
//! Cheap decisive rules run first: a single candidate, or a single candidate
//! without empty cells, wins outright. Otherwise candidates whose header
//! ends in a preposition are dropped and the rest are ranked by
//!
//! ```text
//! score = (uc + 2 * (cm + ws) - emc) / sqrt(df + 1)
//! ```
//!
//! where `uc` is cell and token diversity, `cm` the overlap of the header
//! with the table context, `ws` an optional external corroboration score,
//! `emc` the empty cell count and `df` the distance from the first
//! candidate column. Each feature is divided by its maximum over the
//! candidates first.

use std::collections::BTreeSet;
use std::sync::Arc;

use sti_kb::KbError;
use sti_model::{DataType, Table};
use sti_nlp::{TextProcessor, dice, ends_with_preposition, looks_like_acronym, tokenize};
use tracing::debug;

use crate::error::Result;
use crate::scoring::bags::{header_bow, out_of_table_bow};

/// External evidence that a column holds the table's subject, e.g. from a
/// web search. Scores are expected in `[0, 1]`.
pub trait ColumnCorroborator: Send + Sync {
    fn score(&self, table: &Table, col: usize) -> std::result::Result<f64, KbError>;
}

/// Raw features of one candidate column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFeature {
    pub column: usize,
    pub data_type: DataType,
    pub unique_cell_ratio: f64,
    pub unique_token_ratio: f64,
    pub empty_cells: usize,
    pub is_acronym: bool,
    /// Column distance from the first candidate column.
    pub distance: usize,
    /// The only candidate column that is complete, free of duplicates and
    /// not made of acronyms.
    pub only_without_duplicates: bool,
    pub context_match: f64,
    pub web_score: f64,
}

impl ColumnFeature {
    pub fn diversity(&self) -> f64 {
        self.unique_cell_ratio + self.unique_token_ratio
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectCandidate {
    pub column: usize,
    pub score: f64,
    pub is_acronym: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectDetection {
    /// Best first.
    pub candidates: Vec<SubjectCandidate>,
    /// Features of the scored candidates; empty when a decisive rule applied.
    pub features: Vec<ColumnFeature>,
}

impl SubjectDetection {
    pub fn best(&self) -> Option<usize> {
        self.candidates.first().map(|candidate| candidate.column)
    }
}

/// More than half of the non-empty cells look like acronyms.
fn is_acronym_column(table: &Table, col: usize) -> bool {
    let cells: Vec<&str> = table
        .column(col)
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.text.trim())
        .collect();
    !cells.is_empty() && cells.iter().filter(|text| looks_like_acronym(text)).count() * 2 > cells.len()
}

fn empty_cells(table: &Table, col: usize) -> usize {
    table.column(col).filter(|cell| cell.is_empty()).count()
}

fn has_duplicates(table: &Table, col: usize) -> bool {
    let mut seen = BTreeSet::new();
    table
        .column(col)
        .filter(|cell| !cell.is_empty())
        .any(|cell| !seen.insert(cell.text.trim()))
}

fn max_of(features: &[ColumnFeature], value: impl Fn(&ColumnFeature) -> f64) -> f64 {
    features.iter().map(value).fold(0.0, f64::max)
}

fn normalized(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct SubjectColumnDetector {
    text: Arc<TextProcessor>,
}

impl SubjectColumnDetector {
    pub fn new(text: Arc<TextProcessor>) -> Self {
        Self { text }
    }

    fn single(table: &Table, col: usize) -> SubjectDetection {
        SubjectDetection {
            candidates: vec![SubjectCandidate {
                column: col,
                score: 1.0,
                is_acronym: is_acronym_column(table, col),
            }],
            features: Vec::new(),
        }
    }

    pub fn detect(
        &self,
        table: &Table,
        suggested: Option<usize>,
        ignored: &BTreeSet<usize>,
        corroborator: Option<&dyn ColumnCorroborator>,
    ) -> Result<SubjectDetection> {
        if let Some(col) = suggested
            && col < table.num_cols()
            && !ignored.contains(&col)
        {
            debug!(column = col, "subject column suggested");
            return Ok(Self::single(table, col));
        }

        let of_type = |data_type: DataType| -> Vec<usize> {
            (0..table.num_cols())
                .filter(|col| !ignored.contains(col))
                .filter(|&col| table.header(col).most_frequent_type() == data_type)
                .collect()
        };
        let mut candidates = of_type(DataType::NamedEntity);
        if candidates.is_empty() {
            candidates = of_type(DataType::ShortText);
        }
        match candidates.as_slice() {
            [] => {
                debug!("no subject column candidate");
                return Ok(SubjectDetection::default());
            }
            [only] => return Ok(Self::single(table, *only)),
            _ => {}
        }

        let complete: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&col| empty_cells(table, col) == 0)
            .collect();
        if let [only] = complete.as_slice() {
            debug!(column = only, "only candidate without empty cells");
            return Ok(Self::single(table, *only));
        }

        let first = candidates[0];
        let without_duplicates: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&col| {
                !has_duplicates(table, col)
                    && !is_acronym_column(table, col)
                    && empty_cells(table, col) == 0
            })
            .collect();
        let kept: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&col| !ends_with_preposition(&table.header(col).text))
            .collect();
        if !kept.is_empty() {
            candidates = kept;
        }
        if let [only] = candidates.as_slice() {
            return Ok(Self::single(table, *only));
        }

        let context = out_of_table_bow(&self.text, table);
        let mut features = Vec::with_capacity(candidates.len());
        for &col in &candidates {
            let cells: Vec<&str> = table
                .column(col)
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.text.trim())
                .collect();
            let distinct_cells: BTreeSet<&str> = cells.iter().copied().collect();
            let tokens: Vec<String> = cells.iter().flat_map(|text| tokenize(text)).collect();
            let distinct_tokens: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            let web_score = match corroborator {
                Some(corroborator) => corroborator.score(table, col)?,
                None => 0.0,
            };
            features.push(ColumnFeature {
                column: col,
                data_type: table.header(col).most_frequent_type(),
                unique_cell_ratio: normalized(distinct_cells.len() as f64, cells.len() as f64),
                unique_token_ratio: normalized(distinct_tokens.len() as f64, tokens.len() as f64),
                empty_cells: empty_cells(table, col),
                is_acronym: is_acronym_column(table, col),
                distance: col.abs_diff(first),
                only_without_duplicates: without_duplicates == [col],
                context_match: dice(&header_bow(&self.text, table, col), &context),
                web_score,
            });
        }

        let max_diversity = max_of(&features, ColumnFeature::diversity);
        let max_empty = max_of(&features, |f| f.empty_cells as f64);
        let max_context = max_of(&features, |f| f.context_match);
        let max_web = max_of(&features, |f| f.web_score);
        let mut ranked: Vec<SubjectCandidate> = features
            .iter()
            .map(|feature| {
                let uc = normalized(feature.diversity(), max_diversity);
                let emc = normalized(feature.empty_cells as f64, max_empty);
                let cm = normalized(feature.context_match, max_context);
                let ws = normalized(feature.web_score, max_web);
                let score = (uc + 2.0 * (cm + ws) - emc) / ((feature.distance + 1) as f64).sqrt();
                debug!(
                    column = feature.column,
                    uc,
                    emc,
                    cm,
                    ws,
                    distance = feature.distance,
                    only_without_duplicates = feature.only_without_duplicates,
                    score,
                    "subject column features"
                );
                SubjectCandidate {
                    column: feature.column,
                    score,
                    is_acronym: feature.is_acronym,
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.column.cmp(&b.column))
        });
        Ok(SubjectDetection {
            candidates: ranked,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sti_model::{ContextKind, TableBuilder, TableContext};

    fn detector() -> SubjectColumnDetector {
        SubjectColumnDetector::new(Arc::new(TextProcessor::english()))
    }

    fn detect(table: &Table) -> SubjectDetection {
        detector()
            .detect(table, None, &BTreeSet::new(), None)
            .expect("detect")
    }

    #[test]
    fn sole_named_entity_column_wins() {
        let table = TableBuilder::new("t")
            .headers(["Rank", "Film", "Gross"])
            .row(["1", "Avatar", "2923706026"])
            .row(["2", "Titanic", "2257844554"])
            .build()
            .expect("build table");
        let detection = detect(&table);
        assert_eq!(detection.candidates.len(), 1);
        assert_eq!(detection.best(), Some(1));
        assert_eq!(detection.candidates[0].score, 1.0);
    }

    #[test]
    fn suggestion_is_honoured_unless_ignored() {
        let table = TableBuilder::new("t")
            .headers(["Film", "Director"])
            .row(["Alien", "Ridley Scott"])
            .build()
            .expect("build table");
        let detection = detector()
            .detect(&table, Some(1), &BTreeSet::new(), None)
            .expect("detect");
        assert_eq!(detection.best(), Some(1));
        let detection = detector()
            .detect(&table, Some(1), &BTreeSet::from([1]), None)
            .expect("detect");
        assert_ne!(detection.best(), Some(1));
    }

    #[test]
    fn only_complete_column_wins() {
        let table = TableBuilder::new("t")
            .headers(["Film", "Director"])
            .row(["Alien", ""])
            .row(["Brazil", "Terry Gilliam"])
            .build()
            .expect("build table");
        assert_eq!(detect(&table).best(), Some(0));
    }

    #[test]
    fn preposition_headers_are_dropped() {
        let table = TableBuilder::new("t")
            .headers(["Born in", "Name"])
            .row(["Paris", "Marie Curie"])
            .row(["Ulm", "Albert Einstein"])
            .row(["", ""])
            .build()
            .expect("build table");
        assert_eq!(detect(&table).best(), Some(1));
    }

    #[test]
    fn context_match_breaks_the_tie() {
        let table = TableBuilder::new("t")
            .headers(["Country", "Mountain"])
            .row(["Nepal", "Everest"])
            .row(["Pakistan", "K2 Peak"])
            .row(["", ""])
            .context(TableContext::new("Highest mountains", ContextKind::PageTitle, 1.0))
            .build()
            .expect("build table");
        let detection = detect(&table);
        assert_eq!(detection.best(), Some(1));
        assert_eq!(detection.features.len(), 2);
    }

    #[test]
    fn no_candidate_yields_empty_ranking() {
        let table = TableBuilder::new("t")
            .headers(["Year", "Count"])
            .row(["1990", "3"])
            .row(["1991", "4"])
            .build()
            .expect("build table");
        assert!(detect(&table).candidates.is_empty());
    }

    #[test]
    fn unique_column_flag_requires_complete_cells() {
        let complete = TableBuilder::new("t")
            .headers(["Country", "Mountain"])
            .row(["Nepal", "Everest"])
            .row(["Nepal", "Lhotse"])
            .row(["Pakistan", "Nanga Parbat"])
            .build()
            .expect("build table");
        let flags: Vec<(usize, bool)> = detect(&complete)
            .features
            .iter()
            .map(|f| (f.column, f.only_without_duplicates))
            .collect();
        assert_eq!(flags, vec![(0, false), (1, true)]);

        let gappy = TableBuilder::new("t")
            .headers(["Country", "Mountain"])
            .row(["Nepal", "Everest"])
            .row(["Nepal", "Lhotse"])
            .row(["", ""])
            .build()
            .expect("build table");
        let detection = detect(&gappy);
        assert_eq!(detection.features.len(), 2);
        assert!(detection.features.iter().all(|f| !f.only_without_duplicates));
    }
}
