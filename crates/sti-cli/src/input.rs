//! Loading tables, constraints and configuration from disk.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use sti_core::InterpreterConfig;
use sti_model::{Constraints, ContextKind, Table, TableAnnotation, TableBuilder, TableContext};
use tracing::debug;

/// Out-of-table text supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct TableText {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub paragraphs: Vec<String>,
}

impl TableText {
    fn contexts(&self) -> Vec<TableContext> {
        let mut contexts = Vec::new();
        if let Some(title) = &self.title {
            contexts.push(TableContext::new(title.clone(), ContextKind::PageTitle, 1.0));
        }
        if let Some(caption) = &self.caption {
            contexts.push(TableContext::new(caption.clone(), ContextKind::Caption, 1.0));
        }
        contexts.extend(
            self.paragraphs
                .iter()
                .map(|text| TableContext::new(text.clone(), ContextKind::Other, 0.5)),
        );
        contexts
    }
}

/// Reads a CSV whose first record holds the column headers.
///
/// Short records are padded with empty cells; long records are rejected.
pub fn read_table<R: Read>(reader: R, id: &str, text: &TableText) -> Result<Table> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = csv
        .headers()
        .context("read CSV header")?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    let columns = headers.len();
    let mut builder = TableBuilder::new(id).headers(headers);
    for (index, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("read CSV record {}", index + 1))?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.len() < columns {
            cells.resize(columns, String::new());
        }
        builder.push_row(cells);
    }
    for context in text.contexts() {
        builder = builder.context(context);
    }
    let table = builder.build().with_context(|| format!("build table '{id}'"))?;
    debug!(
        table = id,
        rows = table.num_rows(),
        cols = table.num_cols(),
        "loaded table"
    );
    Ok(table)
}

pub fn read_table_file(path: &Path, text: &TableText) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let id = path
        .file_stem()
        .map_or_else(|| "table".to_string(), |stem| stem.to_string_lossy().into_owned());
    read_table(file, &id, text).with_context(|| format!("read {}", path.display()))
}

pub fn read_constraints(path: Option<&Path>) -> Result<Constraints> {
    let Some(path) = path else {
        return Ok(Constraints::default());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse constraints {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<InterpreterConfig> {
    match path {
        Some(path) => InterpreterConfig::from_toml_file(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(InterpreterConfig::default()),
    }
}

/// Writes the annotation as pretty JSON to `path`, or stdout when absent.
pub fn write_annotation(annotation: &TableAnnotation, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(annotation).context("serialize annotation")?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("write annotation")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_records_are_padded() {
        let csv = "City,Country\nParis,France\nLyon\n";
        let table = read_table(csv.as_bytes(), "cities", &TableText::default()).expect("read table");
        assert_eq!(table.num_rows(), 2);
        assert!(table.cell(1, 1).is_empty());
    }

    #[test]
    fn title_and_caption_become_context() {
        let text = TableText {
            title: Some("European capitals".to_string()),
            caption: None,
            paragraphs: vec!["Cities by population.".to_string()],
        };
        let table = read_table("City\nParis\n".as_bytes(), "t", &text).expect("read table");
        assert_eq!(table.contexts().len(), 2);
        assert!(
            table
                .contexts()
                .iter()
                .any(|context| context.kind == ContextKind::PageTitle)
        );
    }
}
