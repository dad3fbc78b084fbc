//! Cell disambiguation: scoring entity candidates of a row block.

use std::collections::BTreeSet;

use sti_kb::KnowledgeBase;
use sti_model::{CellAnnotation, CellPosition, Entity, Table, TableAnnotation};

use crate::error::Result;
use crate::ranker::RowBlock;
use crate::scoring::{BlockContext, EntityScorer};

/// Scored candidates of one block plus the warnings raised while finding them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisambiguationResult {
    /// Sorted best first.
    pub candidates: Vec<CellAnnotation>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CellDisambiguator {
    scorer: EntityScorer,
}

impl CellDisambiguator {
    pub fn new(scorer: EntityScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &EntityScorer {
        &self.scorer
    }

    /// Scores `candidates` for a block with no prior type knowledge.
    ///
    /// Attributes are fetched for candidates that came without any.
    pub fn coldstart(
        &self,
        kb: &dyn KnowledgeBase,
        candidates: Vec<Entity>,
        table: &Table,
        block: &RowBlock,
        col: usize,
    ) -> Result<DisambiguationResult> {
        let context = BlockContext::new(self.scorer.text(), table, col, &block.rows);
        let mut result = DisambiguationResult::default();
        for mut entity in candidates {
            if entity.attributes.is_empty() {
                let found = kb.find_attributes_of_entity(&entity)?;
                result.warnings.extend(found.warnings);
                entity.attributes = found.items;
            }
            let elements = self.scorer.score(&entity, &block.text, &context);
            let final_score = self.scorer.compute_final(&elements, &block.text);
            result
                .candidates
                .push(CellAnnotation::new(block.text.clone(), entity, elements, final_score));
        }
        result.candidates.sort_by(CellAnnotation::rank_cmp);
        tracing::trace!(
            text = %block.text,
            candidates = result.candidates.len(),
            "scored cold-start candidates"
        );
        Ok(result)
    }

    /// Scores candidates restricted to `types`.
    ///
    /// Searches by type first. When that finds nothing, an unfiltered search
    /// is filtered to the types; when that is empty too, the unfiltered hits
    /// are kept but ranked after any direct hit.
    pub fn constrained(
        &self,
        kb: &dyn KnowledgeBase,
        table: &Table,
        block: &RowBlock,
        col: usize,
        types: &[String],
    ) -> Result<DisambiguationResult> {
        let typed = kb.find_entity_candidates_of_types(&block.text, types)?;
        let mut warnings = typed.warnings;
        let mut fallback = false;
        let candidates = if typed.items.is_empty() {
            let unfiltered = kb.find_entity_candidates(&block.text)?;
            warnings.extend(unfiltered.warnings);
            let (matching, other): (Vec<Entity>, Vec<Entity>) = unfiltered
                .items
                .into_iter()
                .partition(|entity| entity.types.iter().any(|clazz| types.contains(&clazz.id)));
            if matching.is_empty() {
                fallback = !other.is_empty();
                other
            } else {
                matching
            }
        } else {
            typed.items
        };

        let mut result = self.coldstart(kb, candidates, table, block, col)?;
        if fallback {
            for candidate in &mut result.candidates {
                candidate.post_processed = true;
            }
        }
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Keeps the candidates having at least one of `types`.
    pub fn reselect(existing: &[CellAnnotation], types: &BTreeSet<String>) -> Vec<CellAnnotation> {
        existing
            .iter()
            .filter(|candidate| {
                candidate
                    .entity
                    .types
                    .iter()
                    .any(|clazz| types.contains(&clazz.id))
            })
            .cloned()
            .collect()
    }

    /// Writes the block's candidates and warnings to every row of the block.
    pub fn write_block(
        annotation: &mut TableAnnotation,
        block: &RowBlock,
        col: usize,
        result: &DisambiguationResult,
    ) {
        for &row in &block.rows {
            let position = CellPosition::new(row, col);
            if !result.candidates.is_empty() {
                annotation.set_content_cell_annotations(position, result.candidates.clone());
            }
            for warning in &result.warnings {
                annotation.add_cell_warning(position, warning.clone());
            }
        }
    }
}
