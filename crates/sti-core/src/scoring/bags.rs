//! Context bags of words drawn from a table.

use sti_model::{Entity, Table};
use sti_nlp::{Bow, TextProcessor, split_camel_case, uri_local_name};

/// Number of non-title, non-caption context blocks that contribute.
pub const MAX_OTHER_CONTEXTS: usize = 10;

/// Weight of page titles and captions in the out-of-table bag.
pub const TITLE_CAPTION_WEIGHT: f64 = 2.0;

pub fn header_bow(text: &TextProcessor, table: &Table, col: usize) -> Bow {
    text.bag_of_words(&table.header(col).text)
}

/// Content of column `col`, leaving out `exclude_rows`.
pub fn column_bow(text: &TextProcessor, table: &Table, col: usize, exclude_rows: &[usize]) -> Bow {
    let mut bow = Bow::new();
    for (row, cell) in table.column(col).enumerate() {
        if cell.is_empty() || exclude_rows.contains(&row) {
            continue;
        }
        text.add_text(&mut bow, &cell.text, 1.0);
    }
    bow
}

/// Content of `rows`, leaving out column `exclude_col`.
pub fn row_bow(text: &TextProcessor, table: &Table, rows: &[usize], exclude_col: usize) -> Bow {
    let mut bow = Bow::new();
    for &row in rows {
        for (col, cell) in table.row(row).iter().enumerate() {
            if col == exclude_col || cell.is_empty() {
                continue;
            }
            text.add_text(&mut bow, &cell.text, 1.0);
        }
    }
    bow
}

/// Out-of-table context: titles and captions doubled, plus the most relevant
/// other blocks.
pub fn out_of_table_bow(text: &TextProcessor, table: &Table) -> Bow {
    let mut bow = Bow::new();
    let mut others = 0;
    for context in table.contexts() {
        if context.kind.is_title_or_caption() {
            text.add_text(&mut bow, &context.text, TITLE_CAPTION_WEIGHT);
        } else if others < MAX_OTHER_CONTEXTS {
            text.add_text(&mut bow, &context.text, 1.0);
            others += 1;
        }
    }
    bow
}

/// What a knowledge base says about an entity: its attribute values, with
/// resource values reduced to their local names.
pub fn entity_bow(text: &TextProcessor, entity: &Entity) -> Bow {
    let mut bow = Bow::new();
    for attribute in &entity.attributes {
        let value = attribute.plain_value();
        if value.starts_with("http://") || value.starts_with("https://") {
            text.add_text(&mut bow, &split_camel_case(uri_local_name(value)), 1.0);
        } else {
            text.add_text(&mut bow, value, 1.0);
        }
    }
    bow
}

/// The four context bags of one row block.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    pub header: Bow,
    pub column: Bow,
    pub row: Bow,
    pub out_of_table: Bow,
}

impl BlockContext {
    pub fn new(text: &TextProcessor, table: &Table, col: usize, rows: &[usize]) -> Self {
        Self {
            header: header_bow(text, table, col),
            column: column_bow(text, table, col, rows),
            row: row_bow(text, table, rows, col),
            out_of_table: out_of_table_bow(text, table),
        }
    }
}
