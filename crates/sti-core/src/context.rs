use std::collections::BTreeSet;

use sti_kb::KnowledgeBase;
use sti_model::{CellPosition, Constraints, Table};

use crate::ranker::RowBlock;

/// Everything a phase reads but never changes during one interpretation.
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    pub kb: &'a dyn KnowledgeBase,
    pub table: &'a Table,
    pub constraints: &'a Constraints,
    pub subject_columns: &'a [usize],
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        kb: &'a dyn KnowledgeBase,
        table: &'a Table,
        constraints: &'a Constraints,
        subject_columns: &'a [usize],
    ) -> Self {
        Self {
            kb,
            table,
            constraints,
            subject_columns,
        }
    }

    /// Rows of `col` that must not be disambiguated: globally skipped rows
    /// and, in a column that is not named-entity typed, every row without a
    /// marked ambiguity.
    pub fn skip_rows(&self, col: usize) -> BTreeSet<usize> {
        let mut skip = self.constraints.skipped_rows.clone();
        if !self.table.is_named_entity_column(col) {
            let ambiguous = self.constraints.ambiguity_rows(col);
            skip.extend((0..self.table.num_rows()).filter(|row| !ambiguous.contains(row)));
        }
        skip
    }

    pub fn is_forced_cell(&self, row: usize, col: usize) -> bool {
        self.constraints
            .disambiguation(CellPosition::new(row, col))
            .is_some()
    }

    pub fn has_forced_cells(&self, block: &RowBlock, col: usize) -> bool {
        block.rows.iter().any(|&row| self.is_forced_cell(row, col))
    }

    /// The block without the rows the user disambiguated.
    pub fn unforced(&self, block: &RowBlock, col: usize) -> RowBlock {
        RowBlock {
            text: block.text.clone(),
            rows: block
                .rows
                .iter()
                .copied()
                .filter(|&row| !self.is_forced_cell(row, col))
                .collect(),
        }
    }
}
