//! Knowledge-base resources referenced by annotations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Relation local names whose values hold an entity's free-text description.
const DESCRIPTION_RELATIONS: &[&str] = &["comment", "description", "abstract"];

/// A class (type) of the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Clazz {
    pub id: String,
    pub label: String,
}

impl Clazz {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A predicate (property) of the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub uri: String,
    pub label: String,
}

impl Predicate {
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
        }
    }
}

/// One `(relation, value)` fact about an entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub relation_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_label: Option<String>,
    pub value: String,
}

impl Attribute {
    pub fn new(relation_uri: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            relation_uri: relation_uri.into(),
            relation_label: None,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.relation_label = Some(label.into());
        self
    }

    /// Relation label, falling back to the relation URI's local name.
    pub fn label(&self) -> &str {
        self.relation_label
            .as_deref()
            .unwrap_or_else(|| local_name(&self.relation_uri))
    }

    /// Value with any `^^datatype` literal suffix removed.
    pub fn plain_value(&self) -> &str {
        match self.value.find("^^") {
            Some(index) => self.value[..index].trim_matches('"'),
            None => self.value.as_str(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::new(self.relation_uri.clone(), self.label())
    }
}

/// An entity candidate for a cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub types: Vec<Clazz>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            types: Vec::new(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_types(mut self, types: Vec<Clazz>) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn type_ids(&self) -> BTreeSet<&str> {
        self.types.iter().map(|clazz| clazz.id.as_str()).collect()
    }

    /// The first attribute that carries a free-text description.
    pub fn description(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                DESCRIPTION_RELATIONS
                    .iter()
                    .any(|name| local_name(&attribute.relation_uri).eq_ignore_ascii_case(name))
            })
            .map(Attribute::plain_value)
    }
}

fn local_name(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['#', '/', ':']) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_literal_suffix_is_stripped() {
        let attribute = Attribute::new("ex:population", "\"2148000\"^^xsd:integer");
        assert_eq!(attribute.plain_value(), "2148000");
        let attribute = Attribute::new("ex:name", "Paris");
        assert_eq!(attribute.plain_value(), "Paris");
    }

    #[test]
    fn attribute_label_falls_back_to_local_name() {
        let attribute = Attribute::new("http://dbpedia.org/ontology/capitalOf", "France");
        assert_eq!(attribute.label(), "capitalOf");
        assert_eq!(attribute.with_label("capital of").label(), "capital of");
    }

    #[test]
    fn description_is_found_by_relation_name() {
        let entity = Entity::new("ex:Paris", "Paris").with_attributes(vec![
            Attribute::new("ex:country", "France"),
            Attribute::new("http://www.w3.org/2000/01/rdf-schema#comment", "Capital city."),
        ]);
        assert_eq!(entity.description(), Some("Capital city."));
        assert_eq!(Entity::new("ex:x", "x").description(), None);
    }
}
