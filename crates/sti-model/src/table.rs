//! Immutable table model.
//!
//! A [`Table`] is assembled with [`TableBuilder`], which detects every cell's
//! [`DataType`] and the per-column type support once. After `build` the
//! table is read-only.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::datatype::{DataType, detect_data_type, parse_number};
use crate::error::{ModelError, Result};

/// One content cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    pub data_type: DataType,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.data_type == DataType::Empty
    }
}

/// Header of one column with its data-type support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub text: String,
    /// `(type, supporting row count)`, descending by support; on ties
    /// [`DataType::Empty`] sorts last.
    pub type_candidates: Vec<(DataType, usize)>,
}

impl ColumnHeader {
    /// The type supported by most rows ([`DataType::Unknown`] for an empty column).
    pub fn most_frequent_type(&self) -> DataType {
        self.type_candidates
            .first()
            .map_or(DataType::Unknown, |(data_type, _)| *data_type)
    }
}

/// Where a piece of out-of-table context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    PageTitle,
    Caption,
    ParagraphBefore,
    ParagraphAfter,
    Other,
}

impl ContextKind {
    pub fn is_title_or_caption(self) -> bool {
        matches!(self, Self::PageTitle | Self::Caption)
    }
}

/// Free text surrounding the table, with a relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableContext {
    pub text: String,
    pub kind: ContextKind,
    pub relevance: f64,
}

impl TableContext {
    pub fn new(text: impl Into<String>, kind: ContextKind, relevance: f64) -> Self {
        Self {
            text: text.into(),
            kind,
            relevance,
        }
    }
}

/// A `rows x cols` grid of cells with headers and context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    id: String,
    headers: Vec<ColumnHeader>,
    rows: Vec<Vec<Cell>>,
    /// Ordered by relevance, highest first.
    contexts: Vec<TableContext>,
}

impl Table {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.headers.len()
    }

    /// # Panics
    ///
    /// Panics if `col` is out of range.
    pub fn header(&self, col: usize) -> &ColumnHeader {
        &self.headers[col]
    }

    pub fn headers(&self) -> &[ColumnHeader] {
        &self.headers
    }

    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.rows[row]
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |cells| &cells[col])
    }

    pub fn contexts(&self) -> &[TableContext] {
        &self.contexts
    }

    pub fn is_named_entity_column(&self, col: usize) -> bool {
        self.header(col).most_frequent_type() == DataType::NamedEntity
    }
}

/// Builds a [`Table`] from raw text.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    id: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    contexts: Vec<TableContext>,
}

impl TableBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    #[must_use]
    pub fn context(mut self, context: TableContext) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn build(self) -> Result<Table> {
        let columns = self.headers.len();
        if columns == 0 {
            return Err(ModelError::NoColumns);
        }
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, raw) in self.rows.into_iter().enumerate() {
            if raw.len() != columns {
                return Err(ModelError::RaggedRow {
                    row: index,
                    expected: columns,
                    found: raw.len(),
                });
            }
            rows.push(
                raw.into_iter()
                    .map(|text| {
                        let data_type = detect_data_type(&text);
                        Cell { text, data_type }
                    })
                    .collect::<Vec<_>>(),
            );
        }

        for col in 0..columns {
            if is_ordered_number_column(&rows, col) {
                for cells in &mut rows {
                    if cells[col].data_type == DataType::Number {
                        cells[col].data_type = DataType::OrderedNumber;
                    }
                }
            }
        }

        let headers = self
            .headers
            .into_iter()
            .enumerate()
            .map(|(col, text)| ColumnHeader {
                text,
                type_candidates: type_candidates(&rows, col),
            })
            .collect();

        let mut contexts = self.contexts;
        contexts.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(Ordering::Equal));

        Ok(Table {
            id: self.id,
            headers,
            rows,
            contexts,
        })
    }
}

fn type_candidates(rows: &[Vec<Cell>], col: usize) -> Vec<(DataType, usize)> {
    let mut counts: BTreeMap<DataType, usize> = BTreeMap::new();
    for cells in rows {
        *counts.entry(cells[col].data_type).or_insert(0) += 1;
    }
    let mut candidates: Vec<(DataType, usize)> = counts.into_iter().collect();
    candidates.sort_by(|(type_a, count_a), (type_b, count_b)| {
        count_b
            .cmp(count_a)
            .then_with(|| (*type_a == DataType::Empty).cmp(&(*type_b == DataType::Empty)))
            .then_with(|| type_a.cmp(type_b))
    });
    candidates
}

/// All non-empty cells are integers increasing by exactly one, at least two of them.
fn is_ordered_number_column(rows: &[Vec<Cell>], col: usize) -> bool {
    let mut previous: Option<f64> = None;
    let mut seen = 0usize;
    for cells in rows {
        let cell = &cells[col];
        match cell.data_type {
            DataType::Empty => continue,
            DataType::Number => {}
            _ => return false,
        }
        let Some(value) = parse_number(&cell.text) else {
            return false;
        };
        if value.fract() != 0.0 {
            return false;
        }
        if let Some(prev) = previous
            && value - prev != 1.0
        {
            return false;
        }
        previous = Some(value);
        seen += 1;
    }
    seen >= 2
}
