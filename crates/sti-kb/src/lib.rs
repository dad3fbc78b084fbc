#![deny(unsafe_code)]

//! Knowledge-base access as seen by the interpretation engine.
//!
//! The engine only depends on the [`KnowledgeBase`] trait. Errors are
//! propagated to the caller; the engine never retries a lookup.

pub mod error;
pub mod memory;

pub use error::KbError;
pub use memory::{InMemoryKnowledgeBase, KbCall, KbFixture};

use sti_model::{Attribute, Entity};

/// Result of a lookup plus any warnings the knowledge base raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup<T> {
    pub items: T,
    pub warnings: Vec<String>,
}

impl<T> Lookup<T> {
    pub fn new(items: T) -> Self {
        Self {
            items,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Blocking lookups against an external knowledge base.
pub trait KnowledgeBase {
    /// Entities whose label matches `text`.
    fn find_entity_candidates(&self, text: &str) -> Result<Lookup<Vec<Entity>>, KbError>;

    /// Entities whose label matches `text` and that have at least one of `types`.
    fn find_entity_candidates_of_types(
        &self,
        text: &str,
        types: &[String],
    ) -> Result<Lookup<Vec<Entity>>, KbError>;

    /// Attributes of an entity.
    fn find_attributes_of_entity(&self, entity: &Entity) -> Result<Lookup<Vec<Attribute>>, KbError>;

    /// Direct parent of a class, if any.
    fn find_parent_clazz(&self, clazz_id: &str) -> Result<Option<String>, KbError>;
}
