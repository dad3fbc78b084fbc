//! LEARNING: per-column cold-start classification on a sample of rows,
//! followed by a preliminary disambiguation of the whole column.
//!
//! Sampling walks the ranked row blocks, disambiguates each block without
//! type knowledge and folds the winners into the column's class
//! candidates, until the stopping criteria fire or the blocks run out.
//! The winning classes then constrain the disambiguation of every other
//! block.

use std::collections::BTreeSet;

use sti_model::{CellPosition, HeaderAnnotation, TableAnnotation, scores};
use tracing::{debug, info_span};

use crate::classifier::ColumnClassifier;
use crate::config::StoppingCriteriaConfig;
use crate::context::PhaseContext;
use crate::disambiguator::CellDisambiguator;
use crate::error::Result;
use crate::ranker::{ContentCellRanker, RowBlock};
use crate::stopping::build_stopping_criteria;

/// How cold-start sampling of a column ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningState {
    /// The user chose the classes; nothing was sampled.
    Forced,
    /// The stopping criteria fired.
    Converged,
    /// Every eligible block was sampled.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningOutcome {
    pub column: usize,
    pub state: LearningState,
    pub processed_blocks: usize,
    /// Rows touched by the preliminary disambiguation.
    pub updated_rows: BTreeSet<usize>,
}

/// The mutable parts shared by LEARNING and UPDATE.
pub struct Components {
    pub ranker: Box<dyn ContentCellRanker>,
    pub disambiguator: CellDisambiguator,
    pub classifier: ColumnClassifier,
}

/// Writes user-chosen classes as the column's header annotation.
///
/// Returns `false` when the column has no forced classes.
pub fn write_forced_classification(
    cx: &PhaseContext<'_>,
    classifier: &ColumnClassifier,
    annotation: &mut TableAnnotation,
    col: usize,
) -> bool {
    let Some(chosen) = cx.constraints.chosen_classes(col) else {
        return false;
    };
    let header_text = &cx.table.header(col).text;
    let candidates = chosen
        .iter()
        .map(|clazz| {
            let mut candidate = HeaderAnnotation::new(header_text.clone(), clazz.clone());
            candidate.score_elements.insert(scores::FORCED.to_string(), 1.0);
            candidate.final_score = classifier
                .scorer()
                .compute_final(&mut candidate.score_elements, cx.table.num_rows());
            candidate
        })
        .collect();
    annotation.set_header_annotations(col, candidates);
    true
}

struct Sample {
    state: Vec<HeaderAnnotation>,
    processed: Vec<usize>,
    converged: bool,
}

#[derive(Debug, Clone)]
pub struct Learning {
    stopping: StoppingCriteriaConfig,
}

impl Learning {
    pub fn new(stopping: StoppingCriteriaConfig) -> Self {
        Self { stopping }
    }

    pub fn run(
        &self,
        cx: &PhaseContext<'_>,
        components: &mut Components,
        annotation: &mut TableAnnotation,
        col: usize,
    ) -> Result<LearningOutcome> {
        let span = info_span!("learning", table = cx.table.id(), column = col);
        let _guard = span.enter();

        if write_forced_classification(cx, &components.classifier, annotation, col) {
            debug!("classification forced by constraints");
            return Ok(LearningOutcome {
                column: col,
                state: LearningState::Forced,
                processed_blocks: 0,
                updated_rows: BTreeSet::new(),
            });
        }

        let blocks = components.ranker.rank(cx.table, col, cx.subject_columns);
        let skip = cx.skip_rows(col);
        let eligible = |block: &RowBlock| {
            !block.is_too_short() && !block.rows.iter().any(|row| skip.contains(row))
        };

        let sample = self.cold_start(cx, components, annotation, col, &blocks, &eligible)?;
        let state = if sample.converged {
            LearningState::Converged
        } else {
            LearningState::Exhausted
        };
        annotation.set_header_annotations(col, sample.state);
        debug!(
            blocks = sample.processed.len(),
            state = ?state,
            candidates = annotation.header_annotations(col).len(),
            "cold-start sampling finished"
        );

        let updated_rows = self.preliminary_disambiguation(
            cx,
            components,
            annotation,
            col,
            &blocks,
            &sample.processed,
            &eligible,
        )?;

        Ok(LearningOutcome {
            column: col,
            state,
            processed_blocks: sample.processed.len(),
            updated_rows,
        })
    }

    /// Samples blocks until the stopping criteria fire.
    ///
    /// A block holding a user-disambiguated cell votes with the chosen
    /// entities instead of a knowledge-base lookup.
    fn cold_start(
        &self,
        cx: &PhaseContext<'_>,
        components: &mut Components,
        annotation: &mut TableAnnotation,
        col: usize,
        blocks: &[RowBlock],
        eligible: &dyn Fn(&RowBlock) -> bool,
    ) -> Result<Sample> {
        let mut criteria = build_stopping_criteria(&self.stopping)?;
        let mut sample = Sample {
            state: Vec::new(),
            processed: Vec::new(),
            converged: false,
        };
        let mut total_rows = 0;

        for (index, block) in blocks.iter().enumerate() {
            if !eligible(block) {
                continue;
            }
            let voter = match block.rows.iter().find(|&&row| cx.is_forced_cell(row, col)) {
                Some(&row) => CellPosition::new(row, col),
                None => {
                    let found = cx.kb.find_entity_candidates(&block.text)?;
                    let mut result =
                        components
                            .disambiguator
                            .coldstart(cx.kb, found.items, cx.table, block, col)?;
                    let mut warnings = found.warnings;
                    warnings.append(&mut result.warnings);
                    result.warnings = warnings;
                    CellDisambiguator::write_block(annotation, block, col, &result);
                    CellPosition::new(block.first_row(), col)
                }
            };

            total_rows += block.rows.len();
            sample.processed.push(index);
            sample.state = components.classifier.generate_candidates(
                cx.kb,
                annotation.content_cell_annotations(voter),
                std::mem::take(&mut sample.state),
                cx.table,
                block,
                col,
                total_rows,
            )?;
            if criteria.stop(&sample.state, total_rows) {
                debug!(criteria = criteria.name(), rows = total_rows, "sampling converged");
                sample.converged = true;
                break;
            }
        }
        Ok(sample)
    }

    /// Narrows sampled cells to the winning classes and disambiguates the
    /// remaining blocks constrained by them.
    ///
    /// A sampled block that voted from a user-disambiguated cell was never
    /// looked up, so its other rows are disambiguated here as well.
    #[allow(clippy::too_many_arguments)]
    fn preliminary_disambiguation(
        &self,
        cx: &PhaseContext<'_>,
        components: &mut Components,
        annotation: &mut TableAnnotation,
        col: usize,
        blocks: &[RowBlock],
        processed: &[usize],
        eligible: &dyn Fn(&RowBlock) -> bool,
    ) -> Result<BTreeSet<usize>> {
        let winning: BTreeSet<String> = annotation
            .winning_header_annotations(col)
            .iter()
            .map(|candidate| candidate.clazz.id.clone())
            .collect();
        let mut updated = BTreeSet::new();
        if winning.is_empty() {
            return Ok(updated);
        }
        let types: Vec<String> = winning.iter().cloned().collect();

        for (index, block) in blocks.iter().enumerate() {
            let sampled = processed.contains(&index);
            if !sampled && !eligible(block) {
                continue;
            }
            let unforced = cx.unforced(block, col);
            if unforced.rows.is_empty() {
                continue;
            }
            if sampled && unforced.rows.len() == block.rows.len() {
                for &row in &unforced.rows {
                    let position = CellPosition::new(row, col);
                    let kept = CellDisambiguator::reselect(
                        annotation.content_cell_annotations(position),
                        &winning,
                    );
                    annotation.set_content_cell_annotations(position, kept);
                    updated.insert(row);
                }
                continue;
            }

            let mut result = components
                .disambiguator
                .constrained(cx.kb, cx.table, &unforced, col, &types)?;
            if result.candidates.iter().any(|candidate| candidate.final_score > 0.0) {
                updated.extend(unforced.rows.iter().copied());
            } else {
                result.candidates.clear();
            }
            CellDisambiguator::write_block(annotation, &unforced, col, &result);
        }

        components
            .classifier
            .update_column_clazz(cx.kb, &updated, col, annotation, cx.table, false)?;
        Ok(updated)
    }
}
