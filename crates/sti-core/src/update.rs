//! UPDATE: iterative refinement of classifications and disambiguations.
//!
//! Each iteration builds a domain bag from the descriptions of the winning
//! entities, adds domain consensus to every class candidate, then
//! re-disambiguates each column constrained by its winning classes and
//! recounts the column's votes. The loop ends when the winners no longer
//! change. If that does not happen within the iteration budget, the state
//! from before the last iteration is restored.

use std::collections::BTreeSet;
use std::sync::Arc;

use sti_model::{CellPosition, TableAnnotation};
use sti_nlp::{Bow, TextProcessor, first_sentence};
use tracing::{debug, info_span, warn};

use crate::context::PhaseContext;
use crate::disambiguator::CellDisambiguator;
use crate::error::Result;
use crate::learning::Components;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub iterations: usize,
    /// False when the iteration budget ran out and the previous state was restored.
    pub stable: bool,
}

/// Bag of the first description sentence of every winning entity in `columns`.
pub fn build_domain_bow(text: &TextProcessor, annotation: &TableAnnotation, columns: &[usize]) -> Bow {
    let mut bow = Bow::new();
    for &col in columns {
        for row in 0..annotation.num_rows() {
            for candidate in annotation.winning_content_cell_annotations(CellPosition::new(row, col)) {
                if let Some(description) = candidate.entity.description() {
                    text.add_text(&mut bow, first_sentence(description), 1.0);
                }
            }
        }
    }
    bow
}

fn winning_header_ids(annotation: &TableAnnotation, col: usize) -> BTreeSet<&str> {
    annotation
        .winning_header_annotations(col)
        .iter()
        .map(|candidate| candidate.clazz.id.as_str())
        .collect()
}

fn winning_cell_ids(annotation: &TableAnnotation, position: CellPosition) -> BTreeSet<&str> {
    annotation
        .winning_content_cell_annotations(position)
        .iter()
        .map(|candidate| candidate.entity.id.as_str())
        .collect()
}

/// True when every column keeps the same winning classes and every cell the
/// same winning entities.
pub fn is_stable(previous: &TableAnnotation, current: &TableAnnotation, columns: &[usize]) -> bool {
    columns.iter().all(|&col| {
        winning_header_ids(previous, col) == winning_header_ids(current, col)
            && (0..current.num_rows()).all(|row| {
                let position = CellPosition::new(row, col);
                winning_cell_ids(previous, position) == winning_cell_ids(current, position)
            })
    })
}

#[derive(Debug, Clone)]
pub struct Update {
    text: Arc<TextProcessor>,
    max_iterations: usize,
}

impl Update {
    pub fn new(text: Arc<TextProcessor>, max_iterations: usize) -> Self {
        Self {
            text,
            max_iterations,
        }
    }

    pub fn run(
        &self,
        cx: &PhaseContext<'_>,
        components: &mut Components,
        annotation: &mut TableAnnotation,
        columns: &[usize],
    ) -> Result<UpdateOutcome> {
        let span = info_span!("update", table = cx.table.id());
        let _guard = span.enter();

        if self.max_iterations == 0 {
            return Ok(UpdateOutcome {
                iterations: 0,
                stable: true,
            });
        }
        let classifiable: Vec<usize> = columns
            .iter()
            .copied()
            .filter(|&col| cx.constraints.chosen_classes(col).is_none())
            .collect();

        let mut iteration = 0;
        loop {
            iteration += 1;
            debug!(
                iteration,
                entities = annotation.entity_ids().len(),
                "starting iteration"
            );
            let domain = build_domain_bow(&self.text, annotation, columns);
            components
                .classifier
                .update_clazz_scores_by_dc(annotation, &domain, &classifiable);
            let previous = annotation.clone();

            for &col in columns {
                self.refine_column(cx, components, annotation, col)?;
            }

            if is_stable(&previous, annotation, columns) {
                debug!(iterations = iteration, "winners stable");
                return Ok(UpdateOutcome {
                    iterations: iteration,
                    stable: true,
                });
            }
            if iteration >= self.max_iterations {
                warn!(
                    iterations = iteration,
                    "no stable state within the iteration budget, restoring previous state"
                );
                *annotation = previous;
                return Ok(UpdateOutcome {
                    iterations: iteration,
                    stable: false,
                });
            }
        }
    }

    fn refine_column(
        &self,
        cx: &PhaseContext<'_>,
        components: &mut Components,
        annotation: &mut TableAnnotation,
        col: usize,
    ) -> Result<()> {
        let types: Vec<String> = match cx.constraints.chosen_classes(col) {
            Some(chosen) => chosen.iter().map(|clazz| clazz.id.clone()).collect(),
            None => winning_header_ids(annotation, col)
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        if types.is_empty() {
            return Ok(());
        }
        let skip = cx.skip_rows(col);
        let mut updated = BTreeSet::new();
        for block in components.ranker.rank(cx.table, col, cx.subject_columns) {
            if block.is_too_short() || block.rows.iter().any(|row| skip.contains(row)) {
                continue;
            }
            let block = cx.unforced(&block, col);
            if block.rows.is_empty() {
                continue;
            }
            let result = components
                .disambiguator
                .constrained(cx.kb, cx.table, &block, col, &types)?;
            CellDisambiguator::write_block(annotation, &block, col, &result);
            if !result.candidates.is_empty() {
                updated.extend(block.rows.iter().copied());
            }
        }
        if cx.constraints.chosen_classes(col).is_none() {
            components
                .classifier
                .update_column_clazz(cx.kb, &updated, col, annotation, cx.table, true)?;
        }
        debug!(column = col, rows = updated.len(), "refined column");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sti_model::{Attribute, CellAnnotation, Clazz, Entity, HeaderAnnotation, ScoreElements};

    fn annotated(entity: &str, clazz: &str) -> TableAnnotation {
        let mut annotation = TableAnnotation::new(1, 1);
        annotation.set_content_cell_annotations(
            CellPosition::new(0, 0),
            vec![CellAnnotation::new(
                "x",
                Entity::new(entity, entity).with_attributes(vec![Attribute::new(
                    "http://www.w3.org/2000/01/rdf-schema#comment",
                    "A capital city. It is large.",
                )]),
                ScoreElements::new(),
                1.0,
            )],
        );
        annotation.set_header_annotations(0, vec![HeaderAnnotation::new("h", Clazz::new(clazz, clazz))]);
        annotation
    }

    #[test]
    fn domain_bag_uses_first_sentence_of_descriptions() {
        let text = TextProcessor::english();
        let bow = build_domain_bow(&text, &annotated("ex:Paris", "ex:City"), &[0]);
        assert!(bow.contains("capital"));
        assert!(bow.contains("city"));
        assert!(!bow.contains("large"));
    }

    #[test]
    fn stability_compares_winners() {
        let a = annotated("ex:Paris", "ex:City");
        assert!(is_stable(&a, &a.clone(), &[0]));
        assert!(!is_stable(&a, &annotated("ex:Lyon", "ex:City"), &[0]));
        assert!(!is_stable(&a, &annotated("ex:Paris", "ex:Town"), &[0]));
    }
}
