#![deny(unsafe_code)]

pub mod annotation;
pub mod constraints;
pub mod datatype;
pub mod error;
pub mod position;
pub mod resource;
pub mod scores;
mod serde_entries;
pub mod store;
pub mod table;

pub use annotation::{
    CellAnnotation, CellRelation, ColumnRelation, HeaderAnnotation, Ranked, ScoreElements,
    winners,
};
pub use constraints::{Constraints, ForcedClassification, ForcedDisambiguation, ForcedRelation};
pub use datatype::{DataType, detect_data_type};
pub use error::{ModelError, Result};
pub use position::{CellPosition, ColumnPair};
pub use resource::{Attribute, Clazz, Entity, Predicate};
pub use store::TableAnnotation;
pub use table::{Cell, ColumnHeader, ContextKind, Table, TableBuilder, TableContext};
