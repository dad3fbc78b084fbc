//! The interpretation pipeline.
//!
//! ```text
//! validate -> detect subject -> LEARNING (per column) -> UPDATE
//!          -> relation enumeration -> literal column typing
//! ```
//!
//! Every phase reads the table and the (augmented) constraints and writes
//! into one [`TableAnnotation`]. A failure in any phase aborts the whole
//! interpretation; partial annotations are never returned.

use std::sync::Arc;
use std::time::Instant;

use sti_kb::KnowledgeBase;
use sti_model::{CellAnnotation, CellPosition, Constraints, Table, TableAnnotation, scores};
use sti_nlp::TextProcessor;
use tracing::{info, info_span};

use crate::classifier::ColumnClassifier;
use crate::config::InterpreterConfig;
use crate::context::PhaseContext;
use crate::disambiguator::CellDisambiguator;
use crate::error::{Phase, Result, StiError};
use crate::learning::{Components, Learning, LearningOutcome};
use crate::literal::LiteralColumnTagger;
use crate::ranker::{ContentCellRanker, ContextRichnessRanker};
use crate::relation::{
    AttributeValueMatcher, CellRelationClassifier, RelationEnumerator, SubjectChoice,
    TypedValueMatcher,
};
use crate::scoring::{ClazzScorer, EntityScorer, RelationScorer};
use crate::stopping::build_stopping_criteria;
use crate::subject::{ColumnCorroborator, SubjectColumnDetector, SubjectDetection};
use crate::update::{Update, UpdateOutcome};

/// Everything an interpretation produced, beyond the annotation itself.
#[derive(Debug, Clone)]
pub struct InterpretationReport {
    pub annotation: TableAnnotation,
    pub detection: SubjectDetection,
    pub subject: SubjectChoice,
    /// Columns LEARNING and UPDATE worked on.
    pub interpreted_columns: Vec<usize>,
    pub learning: Vec<LearningOutcome>,
    pub update: UpdateOutcome,
    /// Columns typed by their relation to the subject.
    pub literal_columns: Vec<usize>,
}

/// Copy of `constraints` in which every non-empty cell of a column with
/// forced classes, but not named-entity typed, is marked ambiguous.
pub fn augment_constraints(table: &Table, constraints: &Constraints) -> Constraints {
    let mut augmented = constraints.clone();
    for forced in &constraints.classifications {
        let col = forced.column;
        if forced.chosen.is_empty() || table.is_named_entity_column(col) {
            continue;
        }
        for (row, cell) in table.column(col).enumerate() {
            if !cell.is_empty() {
                augmented.ambiguities.insert(CellPosition::new(row, col));
            }
        }
    }
    augmented
}

/// Columns to classify and disambiguate, in ascending order.
pub fn interpreted_columns(table: &Table, constraints: &Constraints) -> Vec<usize> {
    (0..table.num_cols())
        .filter(|&col| !constraints.is_ignored(col))
        .filter(|&col| !constraints.is_classification_suppressed(col))
        .filter(|&col| {
            table.is_named_entity_column(col)
                || constraints.chosen_classes(col).is_some()
                || constraints.has_ambiguities_in(col)
        })
        .collect()
}

fn in_phase<T>(table: &Table, phase: Phase, result: Result<T>) -> Result<T> {
    result.map_err(|source| StiError::interpretation(table.id(), phase, source))
}

pub struct Interpreter {
    config: InterpreterConfig,
    detector: SubjectColumnDetector,
    corroborator: Option<Box<dyn ColumnCorroborator>>,
    learning: Learning,
    update: Update,
    components: Components,
    relations: RelationEnumerator,
    literal: LiteralColumnTagger,
}

impl Interpreter {
    /// Builds an interpreter, failing on an invalid configuration or an
    /// unreadable stop-word file.
    pub fn new(config: InterpreterConfig) -> Result<Self> {
        config.validate()?;
        build_stopping_criteria(&config.stopping_criteria)?;
        let text = Arc::new(TextProcessor::from_stopword_file(
            config.nlp.stopwords_file.as_deref(),
        )?);
        Ok(Self::assemble(config, text))
    }

    fn assemble(config: InterpreterConfig, text: Arc<TextProcessor>) -> Self {
        let components = Components {
            ranker: Box::new(ContextRichnessRanker),
            disambiguator: CellDisambiguator::new(EntityScorer::new(
                Arc::clone(&text),
                config.entity_weights,
            )),
            classifier: ColumnClassifier::new(ClazzScorer::new(
                Arc::clone(&text),
                config.class_weights,
            )),
        };
        let relations = RelationEnumerator::new(
            Arc::clone(&text),
            RelationScorer::new(Arc::clone(&text), config.relation_weights),
            Box::new(TypedValueMatcher::new(config.matcher)),
            config.relation_domain_consensus,
        );
        Self {
            detector: SubjectColumnDetector::new(Arc::clone(&text)),
            corroborator: None,
            learning: Learning::new(config.stopping_criteria.clone()),
            update: Update::new(text, config.max_iterations),
            components,
            relations,
            literal: LiteralColumnTagger,
            config,
        }
    }

    #[must_use]
    pub fn with_ranker(mut self, ranker: Box<dyn ContentCellRanker>) -> Self {
        self.components.ranker = ranker;
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Box<dyn AttributeValueMatcher>) -> Self {
        self.relations.set_matcher(matcher);
        self
    }

    #[must_use]
    pub fn with_relation_classifier(mut self, classifier: Box<dyn CellRelationClassifier>) -> Self {
        self.relations.set_classifier(classifier);
        self
    }

    #[must_use]
    pub fn with_corroborator(mut self, corroborator: Box<dyn ColumnCorroborator>) -> Self {
        self.corroborator = Some(corroborator);
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Ranks subject column candidates without interpreting the table.
    pub fn detect_subject(&self, table: &Table, constraints: &Constraints) -> Result<SubjectDetection> {
        let suggested = constraints.subject_columns.iter().next().copied();
        self.detector.detect(
            table,
            suggested,
            &constraints.ignored_columns,
            self.corroborator.as_deref(),
        )
    }

    pub fn interpret(
        &mut self,
        kb: &dyn KnowledgeBase,
        table: &Table,
        constraints: &Constraints,
    ) -> Result<TableAnnotation> {
        self.interpret_with_report(kb, table, constraints)
            .map(|report| report.annotation)
    }

    pub fn interpret_with_report(
        &mut self,
        kb: &dyn KnowledgeBase,
        table: &Table,
        constraints: &Constraints,
    ) -> Result<InterpretationReport> {
        let span = info_span!("interpret", table = table.id());
        let _guard = span.enter();
        let started = Instant::now();

        constraints.validate(table.num_rows(), table.num_cols())?;
        info!(
            rows = table.num_rows(),
            cols = table.num_cols(),
            "interpreting table"
        );

        let detection = in_phase(
            table,
            Phase::SubjectDetection,
            self.detect_subject(table, constraints),
        )?;
        let subject_columns: Vec<usize> = if constraints.subject_columns.is_empty() {
            detection.best().into_iter().collect()
        } else {
            constraints.subject_columns.iter().copied().collect()
        };

        let constraints = augment_constraints(table, constraints);
        let cx = PhaseContext::new(kb, table, &constraints, &subject_columns);
        let mut annotation = TableAnnotation::new(table.num_rows(), table.num_cols());
        self.write_forced_disambiguations(&cx, &mut annotation);

        let columns = interpreted_columns(table, &constraints);
        let mut learning = Vec::with_capacity(columns.len());
        for &col in &columns {
            let outcome = in_phase(
                table,
                Phase::Learning,
                self.learning
                    .run(&cx, &mut self.components, &mut annotation, col),
            )?;
            learning.push(outcome);
        }

        let update = in_phase(
            table,
            Phase::Update,
            self.update
                .run(&cx, &mut self.components, &mut annotation, &columns),
        )?;

        let subject = in_phase(
            table,
            Phase::RelationEnumeration,
            self.relations
                .enumerate(&cx, &mut annotation, &detection.candidates, &columns),
        )?;

        let literal_columns = self.literal.annotate(table, &constraints, &mut annotation);

        info!(
            subject = ?subject.columns(),
            columns = columns.len(),
            iterations = update.iterations,
            stable = update.stable,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "interpretation finished"
        );
        Ok(InterpretationReport {
            annotation,
            detection,
            subject,
            interpreted_columns: columns,
            learning,
            update,
            literal_columns,
        })
    }

    fn write_forced_disambiguations(&self, cx: &PhaseContext<'_>, annotation: &mut TableAnnotation) {
        let scorer = self.components.disambiguator.scorer();
        for forced in &cx.constraints.disambiguations {
            let position = forced.position;
            let text = cx.table.cell(position.row, position.col).text.trim();
            let candidates = forced
                .chosen
                .iter()
                .map(|entity| {
                    let mut elements = sti_model::ScoreElements::new();
                    elements.insert(scores::FORCED.to_string(), 1.0);
                    let final_score = scorer.compute_final(&elements, text);
                    CellAnnotation::new(text, entity.clone(), elements, final_score)
                })
                .collect();
            annotation.set_content_cell_annotations(position, candidates);
        }
    }
}
