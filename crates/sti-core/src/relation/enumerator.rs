//! Relation enumeration between a subject column and the other columns.
//!
//! For every row the attributes of the subject cell's winning entities are
//! matched against the other cells of the row (cell-level relations).
//! Column-level relations are then voted from the winning cell relations
//! of each column pair.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sti_model::{
    Attribute, Cell, CellPosition, CellRelation, ColumnPair, ColumnRelation, DataType,
    TableAnnotation, scores, winners,
};
use sti_nlp::{TextProcessor, tokenize};
use tracing::{debug, info_span};

use crate::context::PhaseContext;
use crate::error::Result;
use crate::relation::matcher::AttributeValueMatcher;
use crate::scoring::RelationScorer;
use crate::subject::SubjectCandidate;
use crate::update::build_domain_bow;

/// Optional replacement for attribute matching.
///
/// Returning `None` falls back to the attribute value matcher.
pub trait CellRelationClassifier: Send + Sync {
    fn classify(&self, attributes: &[Attribute], cell: &Cell) -> Option<Vec<CellRelation>>;
}

/// Where the subject columns of a relation enumeration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectChoice {
    /// The user fixed the subject columns.
    Forced(Vec<usize>),
    /// The first ranked candidate that produced a relation.
    Ranked(usize),
    /// No candidate produced a relation; chosen by content and annotation strength.
    Fallback(usize),
    /// No candidate at all.
    None,
}

impl SubjectChoice {
    pub fn columns(&self) -> Vec<usize> {
        match self {
            Self::Forced(columns) => columns.clone(),
            Self::Ranked(col) | Self::Fallback(col) => vec![*col],
            Self::None => Vec::new(),
        }
    }
}

pub struct RelationEnumerator {
    text: Arc<TextProcessor>,
    scorer: RelationScorer,
    matcher: Box<dyn AttributeValueMatcher>,
    classifier: Option<Box<dyn CellRelationClassifier>>,
    domain_consensus: bool,
}

impl RelationEnumerator {
    pub fn new(
        text: Arc<TextProcessor>,
        scorer: RelationScorer,
        matcher: Box<dyn AttributeValueMatcher>,
        domain_consensus: bool,
    ) -> Self {
        Self {
            text,
            scorer,
            matcher,
            classifier: None,
            domain_consensus,
        }
    }

    pub fn set_matcher(&mut self, matcher: Box<dyn AttributeValueMatcher>) {
        self.matcher = matcher;
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn CellRelationClassifier>) {
        self.classifier = Some(classifier);
    }

    /// Enumerates relations and settles the subject columns.
    ///
    /// `interpreted` are the columns LEARNING and UPDATE annotated; their
    /// winning entities make up the domain used to revise relation scores.
    pub fn enumerate(
        &mut self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        ranked: &[SubjectCandidate],
        interpreted: &[usize],
    ) -> Result<SubjectChoice> {
        let span = info_span!("relations", table = cx.table.id());
        let _guard = span.enter();

        self.write_forced_relations(cx, annotation);

        let choice = if cx.constraints.subject_columns.is_empty() {
            self.choose_subject(cx, annotation, ranked)?
        } else {
            let columns: Vec<usize> = cx.constraints.subject_columns.iter().copied().collect();
            for &subject in &columns {
                self.enumerate_from(cx, annotation, subject)?;
            }
            SubjectChoice::Forced(columns)
        };
        annotation.set_subject_columns(choice.columns());

        if self.domain_consensus {
            self.revise_by_domain_consensus(cx, annotation, interpreted);
        }
        debug!(
            subject = ?choice,
            pairs = annotation.column_relation_pairs().count(),
            "relation enumeration finished"
        );
        Ok(choice)
    }

    fn choose_subject(
        &mut self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        ranked: &[SubjectCandidate],
    ) -> Result<SubjectChoice> {
        let candidates: Vec<usize> = ranked
            .iter()
            .map(|candidate| candidate.column)
            .filter(|&col| !cx.constraints.is_ignored(col))
            .collect();
        for &subject in &candidates {
            self.enumerate_from(cx, annotation, subject)?;
            if annotation.relation_count_from(subject) > 0 {
                return Ok(SubjectChoice::Ranked(subject));
            }
        }
        Ok(fallback_subject(cx, annotation, &candidates)
            .map_or(SubjectChoice::None, SubjectChoice::Fallback))
    }

    fn write_forced_relations(&self, cx: &PhaseContext<'_>, annotation: &mut TableAnnotation) {
        for forced in &cx.constraints.relations {
            let candidates = forced
                .chosen
                .iter()
                .map(|predicate| {
                    let mut candidate = ColumnRelation::new(predicate.clone());
                    candidate.score_elements.insert(scores::FORCED.to_string(), 1.0);
                    candidate.final_score = self
                        .scorer
                        .compute_final(&mut candidate.score_elements, cx.table.num_rows());
                    candidate
                })
                .collect();
            annotation.set_column_relations(forced.columns, candidates);
        }
    }

    /// Cell-level then column-level relations for one subject column.
    pub fn enumerate_from(
        &mut self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        subject: usize,
    ) -> Result<()> {
        self.generate_cell_relations(cx, annotation, subject)?;
        self.generate_column_relations(cx, annotation, subject);
        Ok(())
    }

    fn is_object_candidate(cx: &PhaseContext<'_>, subject: usize, object: usize) -> bool {
        object != subject
            && !cx.constraints.is_ignored(object)
            && cx.table.header(object).most_frequent_type() != DataType::OrderedNumber
            && cx
                .constraints
                .relation(ColumnPair::new(subject, object))
                .is_none()
    }

    fn generate_cell_relations(
        &self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        subject: usize,
    ) -> Result<()> {
        let objects: Vec<usize> = (0..cx.table.num_cols())
            .filter(|&object| Self::is_object_candidate(cx, subject, object))
            .collect();
        if objects.is_empty() {
            return Ok(());
        }
        for row in 0..cx.table.num_rows() {
            if cx.constraints.skipped_rows.contains(&row) {
                continue;
            }
            let position = CellPosition::new(row, subject);
            let entities: Vec<_> = annotation
                .winning_content_cell_annotations(position)
                .iter()
                .map(|candidate| candidate.entity.clone())
                .collect();
            if entities.is_empty() {
                continue;
            }
            let mut attributes: Vec<Attribute> = Vec::new();
            for entity in &entities {
                if entity.attributes.is_empty() {
                    let found = cx.kb.find_attributes_of_entity(entity)?;
                    for warning in found.warnings {
                        annotation.add_cell_warning(position, warning);
                    }
                    attributes.extend(found.items);
                } else {
                    attributes.extend(entity.attributes.iter().cloned());
                }
            }

            for &object in &objects {
                let cell = cx.table.cell(row, object);
                if cell.is_empty() {
                    continue;
                }
                for relation in self.match_cell(&attributes, cell) {
                    annotation.add_cell_relation(ColumnPair::new(subject, object), row, relation);
                }
            }
        }
        Ok(())
    }

    fn match_cell(&self, attributes: &[Attribute], cell: &Cell) -> Vec<CellRelation> {
        if let Some(classifier) = &self.classifier
            && let Some(relations) = classifier.classify(attributes, cell)
        {
            return relations;
        }
        attributes
            .iter()
            .filter_map(|attribute| {
                self.matcher
                    .match_value(attribute.plain_value(), cell)
                    .map(|score| CellRelation::new(attribute.predicate(), vec![attribute.clone()], score))
            })
            .collect()
    }

    fn generate_column_relations(
        &mut self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        subject: usize,
    ) {
        let pairs: Vec<ColumnPair> = annotation
            .cell_relation_pairs()
            .filter(|pair| pair.subject == subject)
            .filter(|pair| cx.constraints.relation(*pair).is_none())
            .collect();
        let total_rows = cx.table.num_rows();
        for pair in pairs {
            let mut candidates: BTreeMap<String, ColumnRelation> = BTreeMap::new();
            let rows: Vec<usize> = annotation
                .cell_relations(pair)
                .map(|by_row| by_row.keys().copied().collect())
                .unwrap_or_default();
            for row in rows {
                let mut voted = BTreeSet::new();
                for relation in annotation.winning_cell_relations(pair, row) {
                    if !voted.insert(relation.relation.uri.clone()) {
                        continue;
                    }
                    let candidate = candidates
                        .entry(relation.relation.uri.clone())
                        .or_insert_with(|| ColumnRelation::new(relation.relation.clone()));
                    *candidate
                        .score_elements
                        .entry(scores::SUM_CELL_VOTE.to_string())
                        .or_insert(0.0) += 1.0;
                    *candidate
                        .score_elements
                        .entry(scores::SUM_MATCH.to_string())
                        .or_insert(0.0) += relation.score;
                    candidate.supporting_rows.insert(row);
                }
            }
            let mut candidates: Vec<ColumnRelation> = candidates.into_values().collect();
            for candidate in &mut candidates {
                self.scorer.compute_context(candidate, cx.table, pair);
                candidate.final_score =
                    self.scorer.compute_final(&mut candidate.score_elements, total_rows);
            }
            annotation.set_column_relations(pair, candidates);
        }
    }

    fn revise_by_domain_consensus(
        &mut self,
        cx: &PhaseContext<'_>,
        annotation: &mut TableAnnotation,
        interpreted: &[usize],
    ) {
        let domain = build_domain_bow(&self.text, annotation, interpreted);
        if domain.is_empty() {
            return;
        }
        let pairs: Vec<ColumnPair> = annotation
            .column_relation_pairs()
            .filter(|pair| cx.constraints.relation(*pair).is_none())
            .collect();
        let total_rows = cx.table.num_rows();
        for pair in pairs {
            let mut candidates = annotation.column_relations(pair).to_vec();
            for candidate in &mut candidates {
                let dc = self.scorer.domain_consensus(&candidate.relation, &domain);
                candidate
                    .score_elements
                    .insert(scores::DOMAIN_CONSENSUS.to_string(), dc);
                candidate.final_score =
                    self.scorer.compute_final(&mut candidate.score_elements, total_rows);
            }
            annotation.set_column_relations(pair, candidates);
        }
    }
}

/// Picks the candidate maximizing
/// `(Σ winning entity scores + Σ winning relation scores)
///  * (distinct cells + distinct tokens) * non-empty row fraction`.
///
/// Ties keep the earlier candidate.
fn fallback_subject(
    cx: &PhaseContext<'_>,
    annotation: &TableAnnotation,
    candidates: &[usize],
) -> Option<usize> {
    let rows = cx.table.num_rows();
    let mut best: Option<(usize, f64)> = None;
    for &col in candidates {
        let entity_scores: f64 = (0..rows)
            .flat_map(|row| annotation.winning_content_cell_annotations(CellPosition::new(row, col)))
            .map(|candidate| candidate.final_score)
            .sum();
        let relation_scores: f64 = annotation
            .column_relation_pairs()
            .filter(|pair| pair.subject == col)
            .flat_map(|pair| winners(annotation.column_relations(pair)))
            .map(|candidate| candidate.final_score)
            .sum();
        let cells: Vec<&Cell> = cx.table.column(col).filter(|cell| !cell.is_empty()).collect();
        let distinct_cells: BTreeSet<&str> = cells.iter().map(|cell| cell.text.trim()).collect();
        let distinct_tokens: BTreeSet<String> =
            cells.iter().flat_map(|cell| tokenize(&cell.text)).collect();
        let filled = if rows == 0 {
            0.0
        } else {
            cells.len() as f64 / rows as f64
        };
        let score = (entity_scores + relation_scores)
            * (distinct_cells.len() + distinct_tokens.len()) as f64
            * filled;
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((col, score));
        }
    }
    best.map(|(col, _)| col)
}
