//! Scored annotation candidates.
//!
//! Each candidate keeps the partial scores it was built from
//! ([`ScoreElements`]) next to the final score derived from them, so a
//! ranking can always be explained.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::resource::{Attribute, Clazz, Entity, Predicate};

/// Named partial scores of a candidate.
pub type ScoreElements = BTreeMap<String, f64>;

/// Anything carrying a final score that can be ranked.
pub trait Ranked {
    fn final_score(&self) -> f64;
}

/// The winning candidates of a sorted array: the prefix tied with the best score.
///
/// All ties are winners. An empty slice has no winners.
pub fn winners<T: Ranked>(sorted: &[T]) -> &[T] {
    let Some(best) = sorted.first().map(Ranked::final_score) else {
        return sorted;
    };
    let end = sorted
        .iter()
        .position(|candidate| candidate.final_score() != best)
        .unwrap_or(sorted.len());
    &sorted[..end]
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Candidate class for a column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderAnnotation {
    pub header_text: String,
    pub clazz: Clazz,
    pub final_score: f64,
    pub score_elements: ScoreElements,
    #[serde(default)]
    pub supporting_rows: BTreeSet<usize>,
}

impl HeaderAnnotation {
    pub fn new(header_text: impl Into<String>, clazz: Clazz) -> Self {
        Self {
            header_text: header_text.into(),
            clazz,
            final_score: 0.0,
            score_elements: ScoreElements::new(),
            supporting_rows: BTreeSet::new(),
        }
    }

    pub fn element(&self, name: &str) -> f64 {
        self.score_elements.get(name).copied().unwrap_or(0.0)
    }

    /// Orders by score descending, then class id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        by_score_desc(self.final_score, other.final_score)
            .then_with(|| self.clazz.id.cmp(&other.clazz.id))
    }
}

impl Ranked for HeaderAnnotation {
    fn final_score(&self) -> f64 {
        self.final_score
    }
}

/// Candidate entity for a content cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAnnotation {
    pub cell_text: String,
    pub entity: Entity,
    pub final_score: f64,
    pub score_elements: ScoreElements,
    /// Set for candidates that only came from a fallback search; they rank
    /// after every direct hit.
    #[serde(default)]
    pub post_processed: bool,
}

impl CellAnnotation {
    pub fn new(
        cell_text: impl Into<String>,
        entity: Entity,
        score_elements: ScoreElements,
        final_score: f64,
    ) -> Self {
        Self {
            cell_text: cell_text.into(),
            entity,
            final_score,
            score_elements,
            post_processed: false,
        }
    }

    /// Orders by `(post_processed ascending, score descending, entity id ascending)`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.post_processed
            .cmp(&other.post_processed)
            .then_with(|| by_score_desc(self.final_score, other.final_score))
            .then_with(|| self.entity.id.cmp(&other.entity.id))
    }
}

impl Ranked for CellAnnotation {
    fn final_score(&self) -> f64 {
        self.final_score
    }
}

/// A relation matched between the subject cell and an object cell of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRelation {
    pub relation: Predicate,
    pub winning_attributes: Vec<Attribute>,
    pub score: f64,
}

impl CellRelation {
    pub fn new(relation: Predicate, winning_attributes: Vec<Attribute>, score: f64) -> Self {
        Self {
            relation,
            winning_attributes,
            score,
        }
    }

    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        by_score_desc(self.score, other.score).then_with(|| self.relation.uri.cmp(&other.relation.uri))
    }

    /// Merges a repeated match of the same relation: keeps the best score and
    /// the union of matched attributes.
    pub fn absorb(&mut self, other: CellRelation) {
        self.score = self.score.max(other.score);
        for attribute in other.winning_attributes {
            if !self.winning_attributes.contains(&attribute) {
                self.winning_attributes.push(attribute);
            }
        }
        self.winning_attributes.sort();
    }
}

impl Ranked for CellRelation {
    fn final_score(&self) -> f64 {
        self.score
    }
}

/// Candidate relation between two columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRelation {
    pub relation: Predicate,
    pub final_score: f64,
    pub score_elements: ScoreElements,
    #[serde(default)]
    pub supporting_rows: BTreeSet<usize>,
}

impl ColumnRelation {
    pub fn new(relation: Predicate) -> Self {
        Self {
            relation,
            final_score: 0.0,
            score_elements: ScoreElements::new(),
            supporting_rows: BTreeSet::new(),
        }
    }

    pub fn element(&self, name: &str) -> f64 {
        self.score_elements.get(name).copied().unwrap_or(0.0)
    }

    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        by_score_desc(self.final_score, other.final_score)
            .then_with(|| self.relation.uri.cmp(&other.relation.uri))
    }
}

impl Ranked for ColumnRelation {
    fn final_score(&self) -> f64 {
        self.final_score
    }
}
