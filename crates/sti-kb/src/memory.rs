//! In-memory knowledge base backed by a JSON fixture.
//!
//! Label matching is case- and separator-insensitive: a candidate matches
//! when its normalized label equals the normalized query, or when every
//! query token occurs in the label. Every call is recorded so callers can
//! assert which lookups were made.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "entities": [
//!     {"id": "ex:Paris", "label": "Paris",
//!      "types": [{"id": "ex:City", "label": "City"}],
//!      "attributes": [{"relation_uri": "ex:capitalOf", "value": "France"}]}
//!   ],
//!   "parents": {"ex:City": "ex:Place"},
//!   "lazy_attributes": false
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sti_model::{Attribute, Entity};
use sti_nlp::{normalize_text, tokenize};

use crate::error::KbError;
use crate::{KnowledgeBase, Lookup};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbFixture {
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// `class id -> parent class id`.
    #[serde(default)]
    pub parents: BTreeMap<String, String>,
    /// When set, searches return entities without attributes, which must
    /// then be fetched with `find_attributes_of_entity`.
    #[serde(default)]
    pub lazy_attributes: bool,
}

/// One recorded lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KbCall {
    Search { text: String },
    SearchOfTypes { text: String, types: Vec<String> },
    Attributes { entity: String },
    Parent { clazz: String },
}

#[derive(Debug, Default)]
pub struct InMemoryKnowledgeBase {
    fixture: KbFixture,
    failing_queries: BTreeSet<String>,
    calls: Mutex<Vec<KbCall>>,
}

impl InMemoryKnowledgeBase {
    pub fn new(fixture: KbFixture) -> Self {
        Self {
            fixture,
            failing_queries: BTreeSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self::new(KbFixture {
            entities,
            ..KbFixture::default()
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KbError> {
        let contents = fs::read_to_string(path).map_err(|source| KbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: KbFixture = serde_json::from_str(&contents).map_err(|source| KbError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            entities = fixture.entities.len(),
            "loaded knowledge base fixture"
        );
        Ok(Self::new(fixture))
    }

    #[must_use]
    pub fn with_parent(mut self, clazz: impl Into<String>, parent: impl Into<String>) -> Self {
        self.fixture.parents.insert(clazz.into(), parent.into());
        self
    }

    #[must_use]
    pub fn with_lazy_attributes(mut self, lazy: bool) -> Self {
        self.fixture.lazy_attributes = lazy;
        self
    }

    /// Searches for `text` fail with a proxy error.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing_queries.insert(normalize_text(&text.into()));
        self
    }

    pub fn calls(&self) -> Vec<KbCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: KbCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn search(&self, text: &str, types: Option<&[String]>) -> Result<Lookup<Vec<Entity>>, KbError> {
        let query = normalize_text(text);
        if self.failing_queries.contains(&query) {
            return Err(KbError::proxy(format!("search for '{text}' failed")));
        }
        let query_tokens = tokenize(&query);
        if query_tokens.is_empty() {
            return Ok(Lookup::new(Vec::new()).with_warning(format!("empty query '{text}'")));
        }
        let mut found: Vec<Entity> = self
            .fixture
            .entities
            .iter()
            .filter(|entity| label_matches(&entity.label, &query, &query_tokens))
            .filter(|entity| {
                types.is_none_or(|types| {
                    entity
                        .types
                        .iter()
                        .any(|clazz| types.iter().any(|t| t == &clazz.id))
                })
            })
            .map(|entity| {
                let mut entity = entity.clone();
                if self.fixture.lazy_attributes {
                    entity.attributes.clear();
                }
                entity
            })
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Lookup::new(found))
    }
}

fn label_matches(label: &str, query: &str, query_tokens: &[String]) -> bool {
    let label = normalize_text(label);
    if label == query {
        return true;
    }
    let label_tokens = tokenize(&label);
    query_tokens.iter().all(|token| label_tokens.contains(token))
}

impl KnowledgeBase for InMemoryKnowledgeBase {
    fn find_entity_candidates(&self, text: &str) -> Result<Lookup<Vec<Entity>>, KbError> {
        self.record(KbCall::Search {
            text: text.to_string(),
        });
        self.search(text, None)
    }

    fn find_entity_candidates_of_types(
        &self,
        text: &str,
        types: &[String],
    ) -> Result<Lookup<Vec<Entity>>, KbError> {
        self.record(KbCall::SearchOfTypes {
            text: text.to_string(),
            types: types.to_vec(),
        });
        self.search(text, Some(types))
    }

    fn find_attributes_of_entity(&self, entity: &Entity) -> Result<Lookup<Vec<Attribute>>, KbError> {
        self.record(KbCall::Attributes {
            entity: entity.id.clone(),
        });
        let attributes = self
            .fixture
            .entities
            .iter()
            .find(|candidate| candidate.id == entity.id)
            .map(|candidate| candidate.attributes.clone());
        Ok(match attributes {
            Some(attributes) => Lookup::new(attributes),
            None => Lookup::new(Vec::new()).with_warning(format!("unknown entity {}", entity.id)),
        })
    }

    fn find_parent_clazz(&self, clazz_id: &str) -> Result<Option<String>, KbError> {
        self.record(KbCall::Parent {
            clazz: clazz_id.to_string(),
        });
        Ok(self.fixture.parents.get(clazz_id).cloned())
    }
}
