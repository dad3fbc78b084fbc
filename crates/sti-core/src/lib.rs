//! Semantic table interpretation.
//!
//! Given a [`Table`](sti_model::Table), a [`KnowledgeBase`](sti_kb::KnowledgeBase)
//! and optional user [`Constraints`](sti_model::Constraints), the
//! [`Interpreter`] finds the subject column, classifies columns,
//! disambiguates cells against knowledge-base entities and enumerates the
//! binary relations between the subject and the other columns.
//!
//! # Example
//!
//! ```
//! use sti_core::{Interpreter, InterpreterConfig};
//! use sti_kb::InMemoryKnowledgeBase;
//! use sti_model::{Constraints, TableBuilder};
//!
//! let table = TableBuilder::new("films")
//!     .headers(["Film", "Year"])
//!     .row(["Alien", "1979"])
//!     .build()
//!     .unwrap();
//! let kb = InMemoryKnowledgeBase::default();
//! let mut interpreter = Interpreter::new(InterpreterConfig::default()).unwrap();
//! let annotation = interpreter.interpret(&kb, &table, &Constraints::default()).unwrap();
//! assert!(annotation.subject_columns().contains(&0));
//! ```

#![deny(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod context;
pub mod disambiguator;
pub mod error;
pub mod interpreter;
pub mod learning;
pub mod literal;
pub mod ranker;
pub mod relation;
pub mod scoring;
pub mod stopping;
pub mod subject;
pub mod update;

pub use config::{
    ContextWeights, InterpreterConfig, MatcherConfig, NlpConfig, StoppingCriteriaConfig,
};
pub use error::{Phase, Result, StiError};
pub use interpreter::{InterpretationReport, Interpreter};
pub use learning::{LearningOutcome, LearningState};
pub use ranker::{ContentCellRanker, ContextRichnessRanker, RowBlock};
pub use relation::{
    AttributeValueMatcher, CellRelationClassifier, SubjectChoice, TypedValueMatcher,
};
pub use stopping::{EntropyConvergence, Exhaust, StoppingCriteria, build_stopping_criteria};
pub use subject::{
    ColumnCorroborator, ColumnFeature, SubjectCandidate, SubjectColumnDetector, SubjectDetection,
};
pub use update::UpdateOutcome;
