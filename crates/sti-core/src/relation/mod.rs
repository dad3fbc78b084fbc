//! Relation enumeration and attribute value matching.

pub mod enumerator;
pub mod matcher;

pub use enumerator::{CellRelationClassifier, RelationEnumerator, SubjectChoice};
pub use matcher::{AttributeValueMatcher, TypedValueMatcher, parse_date};
