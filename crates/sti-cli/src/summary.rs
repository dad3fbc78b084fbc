use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table as TextTable};
use sti_core::{InterpretationReport, LearningState, SubjectChoice, SubjectDetection};
use sti_model::{CellPosition, ColumnPair, Table, winners};

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn dim_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::DarkGrey)
}

fn score_cell(score: f64) -> Cell {
    Cell::new(format!("{score:.3}")).set_alignment(CellAlignment::Right)
}

fn styled(headers: &[&str]) -> TextTable {
    let mut table = TextTable::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|text| header_cell(text)).collect::<Vec<_>>());
    table
}

fn state_label(state: LearningState) -> &'static str {
    match state {
        LearningState::Forced => "forced",
        LearningState::Converged => "converged",
        LearningState::Exhausted => "exhausted",
    }
}

/// One row per column: winning classes, annotated cells and LEARNING state.
pub fn render_columns(table: &Table, report: &InterpretationReport) -> String {
    let annotation = &report.annotation;
    let mut text = styled(&["#", "Header", "Class", "Score", "Cells", "LEARNING"]);
    for col in 0..table.num_cols() {
        let header = table.header(col).text.as_str();
        let header = if annotation.subject_columns().contains(&col) {
            Cell::new(format!("{header} (subject)")).fg(Color::Cyan)
        } else {
            Cell::new(header)
        };
        let classes = annotation.winning_header_annotations(col);
        let (class_cell, score) = match classes.first() {
            Some(first) => (
                Cell::new(
                    classes
                        .iter()
                        .map(|candidate| candidate.clazz.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                score_cell(first.final_score),
            ),
            None => (dim_cell("-"), dim_cell("-")),
        };
        let annotated = (0..table.num_rows())
            .filter(|&row| {
                !annotation
                    .content_cell_annotations(CellPosition::new(row, col))
                    .is_empty()
            })
            .count();
        let learning = report
            .learning
            .iter()
            .find(|outcome| outcome.column == col)
            .map_or_else(
                || {
                    if report.literal_columns.contains(&col) {
                        dim_cell("literal")
                    } else {
                        dim_cell("-")
                    }
                },
                |outcome| Cell::new(state_label(outcome.state)),
            );
        text.add_row(vec![
            Cell::new(col),
            header,
            class_cell,
            score,
            Cell::new(format!("{annotated}/{}", table.num_rows())),
            learning,
        ]);
    }
    text.to_string()
}

/// One row per related column pair with its winning relations.
pub fn render_relations(table: &Table, report: &InterpretationReport) -> Option<String> {
    let annotation = &report.annotation;
    let pairs: Vec<ColumnPair> = annotation.column_relation_pairs().collect();
    if pairs.is_empty() {
        return None;
    }
    let mut text = styled(&["Subject", "Object", "Relation", "Score", "Rows"]);
    for pair in pairs {
        let relations = winners(annotation.column_relations(pair));
        let Some(first) = relations.first() else {
            continue;
        };
        text.add_row(vec![
            Cell::new(&table.header(pair.subject).text),
            Cell::new(&table.header(pair.object).text),
            Cell::new(
                relations
                    .iter()
                    .map(|candidate| candidate.relation.uri.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            score_cell(first.final_score),
            Cell::new(first.supporting_rows.len()),
        ]);
    }
    Some(text.to_string())
}

pub fn subject_line(report: &InterpretationReport) -> String {
    match &report.subject {
        SubjectChoice::Forced(columns) => format!("Subject columns (forced): {columns:?}"),
        SubjectChoice::Ranked(col) => format!("Subject column: {col}"),
        SubjectChoice::Fallback(col) => format!("Subject column (fallback): {col}"),
        SubjectChoice::None => "Subject column: none".to_string(),
    }
}

pub fn update_line(report: &InterpretationReport) -> String {
    let state = if report.update.stable {
        "stable"
    } else {
        "iteration budget exhausted"
    };
    format!("UPDATE: {} iteration(s), {state}", report.update.iterations)
}

pub fn render_subject_ranking(table: &Table, detection: &SubjectDetection) -> String {
    let mut text = styled(&["Rank", "#", "Header", "Score", "Acronyms"]);
    for (rank, candidate) in detection.candidates.iter().enumerate() {
        text.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(candidate.column),
            Cell::new(&table.header(candidate.column).text),
            score_cell(candidate.score),
            Cell::new(if candidate.is_acronym { "yes" } else { "no" }),
        ]);
    }
    text.to_string()
}
