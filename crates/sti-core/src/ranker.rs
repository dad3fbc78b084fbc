//! Ordering of content rows for sampling.
//!
//! Rows are grouped into [`RowBlock`]s of identical cell text so each
//! distinct value is looked up once. A [`ContentCellRanker`] decides the
//! order in which LEARNING samples the blocks.

use std::collections::BTreeMap;

use sti_model::Table;

/// Rows of one column that share the same cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBlock {
    /// Trimmed cell text shared by every row of the block.
    pub text: String,
    /// Ascending row indices.
    pub rows: Vec<usize>,
}

impl RowBlock {
    pub fn first_row(&self) -> usize {
        self.rows.first().copied().unwrap_or_default()
    }

    /// True when the text is too short to be looked up.
    pub fn is_too_short(&self) -> bool {
        self.text.chars().count() < 2
    }
}

/// Strategy for ordering the row blocks of a column.
pub trait ContentCellRanker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every row of `col` in exactly one block, best sample first.
    fn rank(&self, table: &Table, col: usize, subject_columns: &[usize]) -> Vec<RowBlock>;
}

/// Groups the rows of `col` by their trimmed text, blocks in first-row order.
pub fn group_rows(table: &Table, col: usize) -> Vec<RowBlock> {
    let mut by_text: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, cell) in table.column(col).enumerate() {
        by_text.entry(cell.text.trim()).or_default().push(row);
    }
    let mut blocks: Vec<RowBlock> = by_text
        .into_iter()
        .map(|(text, rows)| RowBlock {
            text: text.to_string(),
            rows,
        })
        .collect();
    blocks.sort_by_key(RowBlock::first_row);
    blocks
}

/// Prefers rows with more non-empty cells, then bigger blocks, then earlier rows.
///
/// A non-empty cell in a subject column counts double.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRichnessRanker;

impl ContextRichnessRanker {
    fn richness(table: &Table, block: &RowBlock, subject_columns: &[usize]) -> usize {
        block
            .rows
            .iter()
            .map(|&row| {
                table
                    .row(row)
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(|(col, _)| if subject_columns.contains(&col) { 2 } else { 1 })
                    .sum::<usize>()
            })
            .max()
            .unwrap_or_default()
    }
}

impl ContentCellRanker for ContextRichnessRanker {
    fn name(&self) -> &'static str {
        "context-richness"
    }

    fn rank(&self, table: &Table, col: usize, subject_columns: &[usize]) -> Vec<RowBlock> {
        let mut scored: Vec<(usize, RowBlock)> = group_rows(table, col)
            .into_iter()
            .map(|block| (Self::richness(table, &block, subject_columns), block))
            .collect();
        scored.sort_by(|(richness_a, a), (richness_b, b)| {
            richness_b
                .cmp(richness_a)
                .then_with(|| b.rows.len().cmp(&a.rows.len()))
                .then_with(|| a.first_row().cmp(&b.first_row()))
        });
        scored.into_iter().map(|(_, block)| block).collect()
    }
}
