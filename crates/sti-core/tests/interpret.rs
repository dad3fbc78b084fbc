//! End-to-end interpretation against an in-memory knowledge base.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use sti_core::scoring::{ClazzScorer, EntityScorer, RelationScorer};
use sti_core::{
    InterpretationReport, Interpreter, InterpreterConfig, LearningState, Phase, StiError,
    StoppingCriteriaConfig, SubjectChoice,
};
use sti_kb::{InMemoryKnowledgeBase, KbCall, KbError, KnowledgeBase, Lookup};
use sti_model::{
    Attribute, CellPosition, Clazz, ColumnPair, Constraints, Entity, ForcedClassification,
    ForcedDisambiguation, Table, TableBuilder, scores,
};
use sti_nlp::TextProcessor;

fn city(id: &str, label: &str, country: &str) -> Entity {
    Entity::new(id, label)
        .with_types(vec![Clazz::new("ex:City", "City")])
        .with_attributes(vec![
            Attribute::new("ex:capitalOf", country),
            Attribute::new(
                "http://www.w3.org/2000/01/rdf-schema#comment",
                format!("{label} is the capital city of {country}. It is large."),
            ),
        ])
}

fn cities_kb() -> InMemoryKnowledgeBase {
    InMemoryKnowledgeBase::from_entities(vec![
        city("ex:Paris", "Paris", "France"),
        city("ex:Berlin", "Berlin", "Germany"),
        city("ex:Rome", "Rome", "Italy"),
        Entity::new("ex:Paris_Hilton", "Paris Hilton")
            .with_types(vec![Clazz::new("ex:Person", "Person")]),
    ])
    .with_parent("ex:City", "ex:Place")
}

fn cities() -> Table {
    TableBuilder::new("capitals")
        .headers(["City", "Country"])
        .row(["Paris", "France"])
        .row(["Berlin", "Germany"])
        .row(["Rome", "Italy"])
        .build()
        .expect("build table")
}

fn interpreter() -> Interpreter {
    Interpreter::new(InterpreterConfig::default()).expect("default config is valid")
}

fn interpret(kb: &InMemoryKnowledgeBase, table: &Table, constraints: &Constraints) -> InterpretationReport {
    interpreter()
        .interpret_with_report(kb, table, constraints)
        .expect("interpretation")
}

#[test]
fn capital_cities_relate_to_unknown_countries() {
    let report = interpret(&cities_kb(), &cities(), &Constraints::default());
    let annotation = &report.annotation;

    assert_eq!(report.subject, SubjectChoice::Ranked(0));
    assert!(annotation.subject_columns().contains(&0));
    assert_eq!(annotation.winning_header_annotations(0)[0].clazz.id, "ex:City");
    for (row, id) in ["ex:Paris", "ex:Berlin", "ex:Rome"].into_iter().enumerate() {
        let winners = annotation.winning_content_cell_annotations(CellPosition::new(row, 0));
        assert_eq!(winners[0].entity.id, id);
    }

    let relation = &annotation.winning_column_relations(ColumnPair::new(0, 1))[0];
    assert_eq!(relation.relation.uri, "ex:capitalOf");
    assert_eq!(relation.supporting_rows.len(), 3);
    assert!((relation.element(scores::MATCH) - 1.0).abs() < 1e-9);

    // No country is in the knowledge base, so the column is typed by its relation.
    assert_eq!(report.literal_columns, vec![1]);
    let header = &annotation.header_annotations(1)[0];
    assert_eq!(header.clazz.id, "ex:capitalOf");
    assert!((header.final_score - relation.final_score).abs() < 1e-9);
}

#[test]
fn interpretation_is_deterministic() {
    let first = interpret(&cities_kb(), &cities(), &Constraints::default());
    let second = interpret(&cities_kb(), &cities(), &Constraints::default());
    assert_eq!(first.annotation, second.annotation);
    assert_eq!(first.subject, second.subject);
}

#[test]
fn final_scores_are_recomputable_from_elements() {
    let table = cities();
    let report = interpret(&cities_kb(), &table, &Constraints::default());
    let annotation = &report.annotation;
    let config = InterpreterConfig::default();
    let text = Arc::new(TextProcessor::english());
    let entity_scorer = EntityScorer::new(Arc::clone(&text), config.entity_weights);
    let clazz_scorer = ClazzScorer::new(Arc::clone(&text), config.class_weights);
    let relation_scorer = RelationScorer::new(text, config.relation_weights);

    for position in annotation.annotated_cells() {
        for candidate in annotation.content_cell_annotations(position) {
            let expected = entity_scorer.compute_final(&candidate.score_elements, &candidate.cell_text);
            assert!((candidate.final_score - expected).abs() < 1e-9, "{position:?}");
        }
    }
    for col in annotation.annotated_columns() {
        if report.literal_columns.contains(&col) {
            continue;
        }
        for candidate in annotation.header_annotations(col) {
            let mut elements = candidate.score_elements.clone();
            let expected = clazz_scorer.compute_final(&mut elements, table.num_rows());
            assert!((candidate.final_score - expected).abs() < 1e-9, "column {col}");
        }
    }
    for pair in annotation.column_relation_pairs() {
        for candidate in annotation.column_relations(pair) {
            let mut elements = candidate.score_elements.clone();
            let expected = relation_scorer.compute_final(&mut elements, table.num_rows());
            assert!((candidate.final_score - expected).abs() < 1e-9, "{pair:?}");
        }
    }
}

#[test]
fn sole_named_entity_column_is_the_subject() {
    let kb = InMemoryKnowledgeBase::from_entities(vec![
        Entity::new("ex:Avatar", "Avatar")
            .with_types(vec![Clazz::new("ex:Film", "Film")])
            .with_attributes(vec![Attribute::new("ex:gross", "2923706026")]),
        Entity::new("ex:Titanic", "Titanic")
            .with_types(vec![Clazz::new("ex:Film", "Film")])
            .with_attributes(vec![Attribute::new("ex:gross", "2257844554")]),
    ]);
    let table = TableBuilder::new("films")
        .headers(["Rank", "Film", "Gross"])
        .row(["1", "Avatar", "2,923,706,026"])
        .row(["2", "Titanic", "2,257,844,554"])
        .build()
        .expect("build table");

    let report = interpret(&kb, &table, &Constraints::default());
    assert_eq!(report.detection.best(), Some(1));
    assert_eq!(report.subject, SubjectChoice::Ranked(1));
    assert_eq!(report.interpreted_columns, vec![1]);
    let relation = &report.annotation.winning_column_relations(ColumnPair::new(1, 2))[0];
    assert_eq!(relation.relation.uri, "ex:gross");
}

#[test]
fn unrelated_table_falls_back_to_the_strongest_column() {
    let kb = InMemoryKnowledgeBase::from_entities(vec![
        Entity::new("ex:Alien", "Alien").with_types(vec![Clazz::new("ex:Film", "Film")]),
        Entity::new("ex:Brazil", "Brazil").with_types(vec![Clazz::new("ex:Film", "Film")]),
    ]);
    let table = TableBuilder::new("films")
        .headers(["Film", "Director"])
        .row(["Alien", "Ridley Scott"])
        .row(["Brazil", "Terry Gilliam"])
        .build()
        .expect("build table");

    let report = interpret(&kb, &table, &Constraints::default());
    assert_eq!(report.subject, SubjectChoice::Fallback(0));
    assert!(report.annotation.subject_columns().contains(&0));
    assert_eq!(report.annotation.column_relation_pairs().count(), 0);
}

#[test]
fn forced_classification_skips_unconstrained_lookups() {
    let kb = cities_kb();
    let constraints = Constraints {
        ignored_columns: [1].into(),
        classifications: vec![ForcedClassification {
            column: 0,
            chosen: vec![Clazz::new("ex:City", "City")],
        }],
        ..Constraints::default()
    };
    let report = interpret(&kb, &cities(), &constraints);

    assert_eq!(report.learning[0].state, LearningState::Forced);
    assert!(
        kb.calls()
            .iter()
            .all(|call| !matches!(call, KbCall::Search { .. })),
        "{:?}",
        kb.calls()
    );
    let header = &report.annotation.header_annotations(0)[0];
    assert_eq!(header.clazz.id, "ex:City");
    assert_eq!(header.element(scores::FORCED), 1.0);
    let rome = report
        .annotation
        .winning_content_cell_annotations(CellPosition::new(2, 0));
    assert_eq!(rome[0].entity.id, "ex:Rome");
}

#[test]
fn forced_disambiguation_survives_refinement() {
    let constraints = Constraints {
        disambiguations: vec![ForcedDisambiguation {
            position: CellPosition::new(0, 0),
            chosen: vec![Entity::new("ex:Paris_Hilton", "Paris Hilton")],
        }],
        ..Constraints::default()
    };
    let report = interpret(&cities_kb(), &cities(), &constraints);
    let paris = report
        .annotation
        .winning_content_cell_annotations(CellPosition::new(0, 0));
    assert_eq!(paris.len(), 1);
    assert_eq!(paris[0].entity.id, "ex:Paris_Hilton");
    assert_eq!(paris[0].score_elements[scores::FORCED], 1.0);
}

#[test]
fn forced_subject_is_kept() {
    let constraints = Constraints {
        subject_columns: [0].into(),
        ..Constraints::default()
    };
    let report = interpret(&cities_kb(), &cities(), &constraints);
    assert_eq!(report.subject, SubjectChoice::Forced(vec![0]));
}

#[test]
fn update_respects_the_iteration_budget() {
    for max_iterations in [0, 1, 3] {
        let config = InterpreterConfig {
            max_iterations,
            ..InterpreterConfig::default()
        };
        let report = Interpreter::new(config)
            .expect("valid config")
            .interpret_with_report(&cities_kb(), &cities(), &Constraints::default())
            .expect("interpretation");
        assert!(report.update.iterations <= max_iterations);
        if max_iterations == 0 {
            assert!(report.update.stable);
        }
    }
}

fn exhaustive(max_iterations: usize) -> InterpreterConfig {
    InterpreterConfig {
        stopping_criteria: StoppingCriteriaConfig {
            name: "exhaust".to_string(),
            params: Vec::new(),
        },
        max_iterations,
        ..InterpreterConfig::default()
    }
}

/// Typed searches alternate between two copies of each hit, `<id>#0` and
/// `<id>#1`, so constrained disambiguation never settles.
struct FlipFloppingKb {
    inner: InMemoryKnowledgeBase,
    typed_calls: RefCell<BTreeMap<String, usize>>,
}

impl FlipFloppingKb {
    fn new(inner: InMemoryKnowledgeBase) -> Self {
        Self {
            inner,
            typed_calls: RefCell::new(BTreeMap::new()),
        }
    }
}

impl KnowledgeBase for FlipFloppingKb {
    fn find_entity_candidates(&self, text: &str) -> Result<Lookup<Vec<Entity>>, KbError> {
        self.inner.find_entity_candidates(text)
    }

    fn find_entity_candidates_of_types(
        &self,
        text: &str,
        types: &[String],
    ) -> Result<Lookup<Vec<Entity>>, KbError> {
        let mut calls = self.typed_calls.borrow_mut();
        let count = calls.entry(text.to_string()).or_insert(0);
        let flip = *count % 2;
        *count += 1;
        let mut found = self.inner.find_entity_candidates_of_types(text, types)?;
        for entity in &mut found.items {
            entity.id = format!("{}#{flip}", entity.id);
        }
        Ok(found)
    }

    fn find_attributes_of_entity(&self, entity: &Entity) -> Result<Lookup<Vec<Attribute>>, KbError> {
        self.inner.find_attributes_of_entity(entity)
    }

    fn find_parent_clazz(&self, clazz_id: &str) -> Result<Option<String>, KbError> {
        self.inner.find_parent_clazz(clazz_id)
    }
}

#[test]
fn unstable_update_restores_the_state_before_the_last_iteration() {
    let kb = FlipFloppingKb::new(cities_kb());
    let report = Interpreter::new(exhaustive(3))
        .expect("valid config")
        .interpret_with_report(&kb, &cities(), &Constraints::default())
        .expect("interpretation");

    assert!(!report.update.stable);
    assert_eq!(report.update.iterations, 3);
    // Iterations pick #0, #1, #0; the last one is rolled back.
    for (row, id) in ["ex:Paris#1", "ex:Berlin#1", "ex:Rome#1"].into_iter().enumerate() {
        let winners = report
            .annotation
            .winning_content_cell_annotations(CellPosition::new(row, 0));
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].entity.id, id);
    }
    assert_eq!(report.annotation.winning_header_annotations(0)[0].clazz.id, "ex:City");
}

#[test]
fn rows_sharing_a_block_with_a_forced_cell_are_disambiguated() {
    let table = TableBuilder::new("capitals")
        .headers(["City", "Country"])
        .row(["Paris", "France"])
        .row(["Paris", "Texas"])
        .row(["Berlin", "Germany"])
        .row(["Rome", "Italy"])
        .build()
        .expect("build table");
    let constraints = Constraints {
        disambiguations: vec![ForcedDisambiguation {
            position: CellPosition::new(0, 0),
            chosen: vec![city("ex:Paris", "Paris", "France")],
        }],
        ..Constraints::default()
    };
    let report = Interpreter::new(exhaustive(0))
        .expect("valid config")
        .interpret_with_report(&cities_kb(), &table, &constraints)
        .expect("interpretation");

    let forced = report
        .annotation
        .winning_content_cell_annotations(CellPosition::new(0, 0));
    assert_eq!(forced[0].score_elements[scores::FORCED], 1.0);
    let twin = report
        .annotation
        .winning_content_cell_annotations(CellPosition::new(1, 0));
    assert_eq!(twin.len(), 1);
    assert_eq!(twin[0].entity.id, "ex:Paris");
    assert!(!twin[0].score_elements.contains_key(scores::FORCED));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn update_iterations_log_the_entity_count() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        interpret(&cities_kb(), &cities(), &Constraints::default());
    });

    let output = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf-8");
    assert!(output.contains("starting iteration"));
    assert!(output.contains("iteration=1 entities="));
}

#[test]
fn failing_lookup_reports_the_phase() {
    let kb = cities_kb().failing_on("Paris");
    let error = interpreter()
        .interpret(&kb, &cities(), &Constraints::default())
        .expect_err("lookup fails");
    match error {
        StiError::Interpretation { table, phase, .. } => {
            assert_eq!(table, "capitals");
            assert_eq!(phase, Phase::Learning);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn invalid_constraints_are_rejected_before_any_lookup() {
    let kb = cities_kb();
    let constraints = Constraints {
        subject_columns: [5].into(),
        ..Constraints::default()
    };
    let error = interpreter()
        .interpret(&kb, &cities(), &constraints)
        .expect_err("column out of range");
    assert!(matches!(error, StiError::InvalidConstraint(_)));
    assert_eq!(kb.call_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_table_interprets_without_a_knowledge_base(
        rows in proptest::collection::vec(("[A-Z][a-z]{2,6}", "[A-Z][a-z]{2,6}|[0-9]{1,4}"), 1..5)
    ) {
        let mut builder = TableBuilder::new("random").headers(["Left", "Right"]);
        for (left, right) in &rows {
            builder = builder.row([left.as_str(), right.as_str()]);
        }
        let table = builder.build().expect("build table");
        let report = interpreter()
            .interpret_with_report(&InMemoryKnowledgeBase::default(), &table, &Constraints::default())
            .expect("interpretation");
        prop_assert!(report.annotation.subject_columns().iter().all(|&col| col < 2));
        prop_assert!(report.update.iterations <= InterpreterConfig::default().max_iterations);
        prop_assert_eq!(report.annotation.column_relation_pairs().count(), 0);
    }
}
