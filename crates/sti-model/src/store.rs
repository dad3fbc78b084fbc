//! Sparse annotation store for one table.
//!
//! Absent entries read as empty arrays. Every setter sorts and deduplicates
//! its candidates, so readers always see arrays in ranking order and
//! [`winners`] can take the maximal-score prefix.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::annotation::{
    CellAnnotation, CellRelation, ColumnRelation, HeaderAnnotation, winners,
};
use crate::position::{CellPosition, ColumnPair};
use crate::serde_entries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAnnotation {
    rows: usize,
    cols: usize,
    headers: BTreeMap<usize, Vec<HeaderAnnotation>>,
    #[serde(with = "serde_entries")]
    cells: BTreeMap<CellPosition, Vec<CellAnnotation>>,
    #[serde(with = "serde_entries")]
    cell_relations: BTreeMap<ColumnPair, BTreeMap<usize, Vec<CellRelation>>>,
    #[serde(with = "serde_entries")]
    column_relations: BTreeMap<ColumnPair, Vec<ColumnRelation>>,
    header_warnings: BTreeMap<usize, Vec<String>>,
    #[serde(with = "serde_entries")]
    cell_warnings: BTreeMap<CellPosition, Vec<String>>,
    #[serde(with = "serde_entries")]
    relation_warnings: BTreeMap<ColumnPair, Vec<String>>,
    subject_columns: BTreeSet<usize>,
}

impl TableAnnotation {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            headers: BTreeMap::new(),
            cells: BTreeMap::new(),
            cell_relations: BTreeMap::new(),
            column_relations: BTreeMap::new(),
            header_warnings: BTreeMap::new(),
            cell_warnings: BTreeMap::new(),
            relation_warnings: BTreeMap::new(),
            subject_columns: BTreeSet::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    // Header annotations.

    pub fn header_annotations(&self, col: usize) -> &[HeaderAnnotation] {
        self.headers.get(&col).map_or(&[], Vec::as_slice)
    }

    pub fn winning_header_annotations(&self, col: usize) -> &[HeaderAnnotation] {
        winners(self.header_annotations(col))
    }

    /// Replaces a column's class candidates, sorted and deduplicated by
    /// `(header text, class id)`.
    pub fn set_header_annotations(&mut self, col: usize, mut candidates: Vec<HeaderAnnotation>) {
        candidates.sort_by(HeaderAnnotation::rank_cmp);
        let mut seen = BTreeSet::new();
        candidates.retain(|c| seen.insert((c.header_text.clone(), c.clazz.id.clone())));
        if candidates.is_empty() {
            self.headers.remove(&col);
        } else {
            self.headers.insert(col, candidates);
        }
    }

    /// Columns that currently carry class candidates.
    pub fn annotated_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.headers.keys().copied()
    }

    // Content cell annotations.

    pub fn content_cell_annotations(&self, position: CellPosition) -> &[CellAnnotation] {
        self.cells.get(&position).map_or(&[], Vec::as_slice)
    }

    pub fn winning_content_cell_annotations(&self, position: CellPosition) -> &[CellAnnotation] {
        winners(self.content_cell_annotations(position))
    }

    /// Replaces a cell's entity candidates, sorted and deduplicated by
    /// `(cell text, entity id)`.
    pub fn set_content_cell_annotations(
        &mut self,
        position: CellPosition,
        mut candidates: Vec<CellAnnotation>,
    ) {
        candidates.sort_by(CellAnnotation::rank_cmp);
        let mut seen = BTreeSet::new();
        candidates.retain(|c| seen.insert((c.cell_text.clone(), c.entity.id.clone())));
        if candidates.is_empty() {
            self.cells.remove(&position);
        } else {
            self.cells.insert(position, candidates);
        }
    }

    pub fn annotated_cells(&self) -> impl Iterator<Item = CellPosition> + '_ {
        self.cells.keys().copied()
    }

    // Cell-cell relations.

    pub fn cell_relations(&self, columns: ColumnPair) -> Option<&BTreeMap<usize, Vec<CellRelation>>> {
        self.cell_relations.get(&columns)
    }

    pub fn cell_relations_at(&self, columns: ColumnPair, row: usize) -> &[CellRelation] {
        self.cell_relations
            .get(&columns)
            .and_then(|rows| rows.get(&row))
            .map_or(&[], Vec::as_slice)
    }

    pub fn winning_cell_relations(&self, columns: ColumnPair, row: usize) -> &[CellRelation] {
        winners(self.cell_relations_at(columns, row))
    }

    /// Records a relation for one row. A repeated predicate on the same row
    /// keeps the best score and the union of matched attributes.
    pub fn add_cell_relation(&mut self, columns: ColumnPair, row: usize, relation: CellRelation) {
        let relations = self
            .cell_relations
            .entry(columns)
            .or_default()
            .entry(row)
            .or_default();
        match relations
            .iter_mut()
            .find(|existing| existing.relation.uri == relation.relation.uri)
        {
            Some(existing) => existing.absorb(relation),
            None => relations.push(relation),
        }
        relations.sort_by(CellRelation::rank_cmp);
    }

    pub fn cell_relation_pairs(&self) -> impl Iterator<Item = ColumnPair> + '_ {
        self.cell_relations.keys().copied()
    }

    // Column-column relations.

    pub fn column_relations(&self, columns: ColumnPair) -> &[ColumnRelation] {
        self.column_relations.get(&columns).map_or(&[], Vec::as_slice)
    }

    pub fn winning_column_relations(&self, columns: ColumnPair) -> &[ColumnRelation] {
        winners(self.column_relations(columns))
    }

    /// Replaces a pair's relation candidates, sorted and deduplicated by predicate.
    pub fn set_column_relations(&mut self, columns: ColumnPair, mut candidates: Vec<ColumnRelation>) {
        candidates.sort_by(ColumnRelation::rank_cmp);
        let mut seen = BTreeSet::new();
        candidates.retain(|c| seen.insert(c.relation.uri.clone()));
        if candidates.is_empty() {
            self.column_relations.remove(&columns);
        } else {
            self.column_relations.insert(columns, candidates);
        }
    }

    pub fn column_relation_pairs(&self) -> impl Iterator<Item = ColumnPair> + '_ {
        self.column_relations.keys().copied()
    }

    /// Number of column pairs with relation candidates whose subject is `subject`.
    pub fn relation_count_from(&self, subject: usize) -> usize {
        self.column_relations
            .keys()
            .filter(|pair| pair.subject == subject)
            .count()
    }

    // Warnings.

    pub fn add_header_warning(&mut self, col: usize, warning: impl Into<String>) {
        self.header_warnings.entry(col).or_default().push(warning.into());
    }

    pub fn header_warnings(&self, col: usize) -> &[String] {
        self.header_warnings.get(&col).map_or(&[], Vec::as_slice)
    }

    pub fn add_cell_warning(&mut self, position: CellPosition, warning: impl Into<String>) {
        self.cell_warnings
            .entry(position)
            .or_default()
            .push(warning.into());
    }

    pub fn cell_warnings(&self, position: CellPosition) -> &[String] {
        self.cell_warnings.get(&position).map_or(&[], Vec::as_slice)
    }

    pub fn add_relation_warning(&mut self, columns: ColumnPair, warning: impl Into<String>) {
        self.relation_warnings
            .entry(columns)
            .or_default()
            .push(warning.into());
    }

    pub fn relation_warnings(&self, columns: ColumnPair) -> &[String] {
        self.relation_warnings.get(&columns).map_or(&[], Vec::as_slice)
    }

    // Subject columns.

    pub fn subject_columns(&self) -> &BTreeSet<usize> {
        &self.subject_columns
    }

    pub fn set_subject_columns(&mut self, columns: impl IntoIterator<Item = usize>) {
        self.subject_columns = columns.into_iter().collect();
    }

    /// Ids of every entity appearing in any cell candidate array.
    pub fn entity_ids(&self) -> BTreeSet<&str> {
        self.cells
            .values()
            .flatten()
            .map(|candidate| candidate.entity.id.as_str())
            .collect()
    }
}
