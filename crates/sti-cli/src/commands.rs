use std::time::Instant;

use anyhow::{Context, Result};
use sti_cli::input::{
    TableText, load_config, read_constraints, read_table_file, write_annotation,
};
use sti_core::{InterpretationReport, Interpreter, SubjectDetection};
use sti_kb::InMemoryKnowledgeBase;
use sti_model::Table;
use tracing::{info, info_span};

use crate::cli::{AnnotateArgs, DetectArgs, TableArgs};

fn table_text(args: &TableArgs) -> TableText {
    TableText {
        title: args.title.clone(),
        caption: args.caption.clone(),
        paragraphs: args.paragraphs.clone(),
    }
}

pub fn run_annotate(args: &AnnotateArgs) -> Result<(Table, InterpretationReport)> {
    let table = read_table_file(&args.table.table, &table_text(&args.table))?;
    let span = info_span!("annotate", table = table.id());
    let _guard = span.enter();

    let constraints = read_constraints(args.table.constraints.as_deref())?;
    let config = load_config(args.table.config.as_deref())?;
    let kb = InMemoryKnowledgeBase::from_json_file(&args.kb)
        .with_context(|| format!("load knowledge base {}", args.kb.display()))?;
    let mut interpreter = Interpreter::new(config).context("build interpreter")?;

    let started = Instant::now();
    let report = interpreter
        .interpret_with_report(&kb, &table, &constraints)
        .context("interpret table")?;
    info!(
        kb_calls = kb.call_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "annotation complete"
    );

    if !args.summary_only {
        write_annotation(&report.annotation, args.output.as_deref())?;
    }
    Ok((table, report))
}

pub fn run_detect(args: &DetectArgs) -> Result<(Table, SubjectDetection)> {
    let table = read_table_file(&args.table.table, &table_text(&args.table))?;
    let constraints = read_constraints(args.table.constraints.as_deref())?;
    let config = load_config(args.table.config.as_deref())?;
    constraints
        .validate(table.num_rows(), table.num_cols())
        .context("validate constraints")?;
    let detection = Interpreter::new(config)
        .context("build interpreter")?
        .detect_subject(&table, &constraints)
        .context("detect subject column")?;
    Ok((table, detection))
}
