use std::fmt;
use std::path::PathBuf;

use sti_kb::KbError;
use sti_model::ModelError;
use sti_nlp::NlpError;

/// Stage of an interpretation, used to label wrapped failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SubjectDetection,
    Learning,
    Update,
    RelationEnumeration,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SubjectDetection => "subject column detection",
            Self::Learning => "LEARNING",
            Self::Update => "UPDATE",
            Self::RelationEnumeration => "relation enumeration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StiError {
    #[error(transparent)]
    KnowledgeBase(#[from] KbError),

    #[error("invalid constraints: {0}")]
    InvalidConstraint(#[from] ModelError),

    #[error(transparent)]
    Nlp(#[from] NlpError),

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    ConfigToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown stopping criteria '{name}'")]
    UnknownStoppingCriteria { name: String },

    #[error("invalid parameter '{value}' for stopping criteria '{name}'")]
    StoppingCriteriaParam { name: String, value: String },

    #[error("interpretation of table '{table}' failed during {phase}: {source}")]
    Interpretation {
        table: String,
        phase: Phase,
        #[source]
        source: Box<StiError>,
    },
}

impl StiError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn interpretation(table: &str, phase: Phase, source: StiError) -> Self {
        Self::Interpretation {
            table: table.to_string(),
            phase,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, StiError>;
