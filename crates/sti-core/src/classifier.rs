//! Column classification from cell votes.
//!
//! Each cell whose winning entities carry a type casts one vote for that
//! type, weighted by the winning score. A sampled block of identical cells
//! votes once. Votes accumulate in the `sum_ce` and `sum_cell_vote`
//! elements of the header candidates.

use std::collections::{BTreeMap, BTreeSet};

use sti_kb::KnowledgeBase;
use sti_model::{
    CellAnnotation, CellPosition, Clazz, HeaderAnnotation, Table, TableAnnotation, scores, winners,
};
use sti_nlp::Bow;

use crate::error::Result;
use crate::ranker::RowBlock;
use crate::scoring::ClazzScorer;

#[derive(Debug)]
pub struct ColumnClassifier {
    scorer: ClazzScorer,
}

/// Distinct types of the winning candidates with the winning score.
fn winning_types(candidates: &[CellAnnotation]) -> Option<(f64, BTreeMap<String, Clazz>)> {
    let winning = winners(candidates);
    let score = winning.first()?.final_score;
    let mut types = BTreeMap::new();
    for candidate in winning {
        for clazz in &candidate.entity.types {
            types.entry(clazz.id.clone()).or_insert_with(|| clazz.clone());
        }
    }
    Some((score, types))
}

fn add_vote(candidate: &mut HeaderAnnotation, score: f64) {
    *candidate
        .score_elements
        .entry(scores::SUM_CELL_VOTE.to_string())
        .or_insert(0.0) += 1.0;
    *candidate
        .score_elements
        .entry(scores::SUM_CE.to_string())
        .or_insert(0.0) += score;
}

fn find_or_insert<'c>(
    candidates: &'c mut Vec<HeaderAnnotation>,
    header_text: &str,
    clazz: &Clazz,
) -> &'c mut HeaderAnnotation {
    let index = match candidates.iter().position(|c| c.clazz.id == clazz.id) {
        Some(index) => index,
        None => {
            candidates.push(HeaderAnnotation::new(header_text, clazz.clone()));
            candidates.len() - 1
        }
    };
    &mut candidates[index]
}

impl ColumnClassifier {
    pub fn new(scorer: ClazzScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &ClazzScorer {
        &self.scorer
    }

    /// Folds the block's winning entity types into `state` and re-scores
    /// every candidate against `total_rows` processed rows.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_candidates(
        &mut self,
        kb: &dyn KnowledgeBase,
        block_candidates: &[CellAnnotation],
        mut state: Vec<HeaderAnnotation>,
        table: &Table,
        block: &RowBlock,
        col: usize,
        total_rows: usize,
    ) -> Result<Vec<HeaderAnnotation>> {
        let header_text = table.header(col).text.clone();
        if let Some((score, types)) = winning_types(block_candidates) {
            for clazz in types.values() {
                let candidate = find_or_insert(&mut state, &header_text, clazz);
                add_vote(candidate, score);
                candidate.supporting_rows.extend(block.rows.iter().copied());
            }
        }
        self.score_all(kb, &mut state, table, col, total_rows)?;
        state.sort_by(HeaderAnnotation::rank_cmp);
        Ok(state)
    }

    /// Recounts the votes of `rows` into the column's stored candidates.
    ///
    /// With `reset_sums` every candidate first loses its votes and supporting
    /// rows; otherwise a row that already supports a candidate does not vote
    /// for it again.
    pub fn update_column_clazz(
        &mut self,
        kb: &dyn KnowledgeBase,
        rows: &BTreeSet<usize>,
        col: usize,
        annotation: &mut TableAnnotation,
        table: &Table,
        reset_sums: bool,
    ) -> Result<()> {
        let header_text = table.header(col).text.clone();
        let mut candidates = annotation.header_annotations(col).to_vec();
        if reset_sums {
            for candidate in &mut candidates {
                candidate.score_elements.insert(scores::SUM_CE.to_string(), 0.0);
                candidate
                    .score_elements
                    .insert(scores::SUM_CELL_VOTE.to_string(), 0.0);
                candidate.supporting_rows.clear();
            }
        }
        for &row in rows {
            let cells = annotation.content_cell_annotations(CellPosition::new(row, col));
            let Some((score, types)) = winning_types(cells) else {
                continue;
            };
            for clazz in types.values() {
                let candidate = find_or_insert(&mut candidates, &header_text, clazz);
                if candidate.supporting_rows.insert(row) {
                    add_vote(candidate, score);
                }
            }
        }
        self.score_all(kb, &mut candidates, table, col, table.num_rows())?;
        annotation.set_header_annotations(col, candidates);
        Ok(())
    }

    /// Adds domain consensus to the class candidates of `columns` and re-scores them.
    pub fn update_clazz_scores_by_dc(
        &mut self,
        annotation: &mut TableAnnotation,
        domain: &Bow,
        columns: &[usize],
    ) {
        let total_rows = annotation.num_rows();
        for &col in columns {
            let mut candidates = annotation.header_annotations(col).to_vec();
            if candidates.is_empty() {
                continue;
            }
            for candidate in &mut candidates {
                let dc = self.scorer.domain_consensus(&candidate.clazz, domain);
                candidate
                    .score_elements
                    .insert(scores::DOMAIN_CONSENSUS.to_string(), dc);
                candidate.final_score =
                    self.scorer.compute_final(&mut candidate.score_elements, total_rows);
            }
            annotation.set_header_annotations(col, candidates);
        }
    }

    fn score_all(
        &mut self,
        kb: &dyn KnowledgeBase,
        candidates: &mut [HeaderAnnotation],
        table: &Table,
        col: usize,
        total_rows: usize,
    ) -> Result<()> {
        for candidate in candidates {
            self.scorer.compute_context(candidate, table, col);
            self.scorer.compute_hierarchy(kb, candidate)?;
            candidate.final_score =
                self.scorer.compute_final(&mut candidate.score_elements, total_rows);
        }
        Ok(())
    }
}
