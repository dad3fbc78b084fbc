//! User-supplied constraints on an interpretation.
//!
//! Constraints are read-only input. The engine may derive an augmented copy
//! but never mutates the caller's value.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::position::{CellPosition, ColumnPair};
use crate::resource::{Clazz, Entity, Predicate};

/// Classes chosen for a column. An empty `chosen` list means the column
/// must stay unclassified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedClassification {
    pub column: usize,
    #[serde(default)]
    pub chosen: Vec<Clazz>,
}

/// Entities chosen for a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedDisambiguation {
    pub position: CellPosition,
    #[serde(default)]
    pub chosen: Vec<Entity>,
}

/// Predicates chosen for a column pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedRelation {
    pub columns: ColumnPair,
    #[serde(default)]
    pub chosen: Vec<Predicate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Subject column override. Several columns enable multi-subject mode.
    #[serde(default)]
    pub subject_columns: BTreeSet<usize>,
    #[serde(default)]
    pub ignored_columns: BTreeSet<usize>,
    #[serde(default)]
    pub classifications: Vec<ForcedClassification>,
    #[serde(default)]
    pub disambiguations: Vec<ForcedDisambiguation>,
    #[serde(default)]
    pub relations: Vec<ForcedRelation>,
    /// Cells that must be disambiguated even when their column is not
    /// named-entity typed.
    #[serde(default)]
    pub ambiguities: BTreeSet<CellPosition>,
    /// Rows excluded from disambiguation in every column.
    #[serde(default)]
    pub skipped_rows: BTreeSet<usize>,
}

impl Constraints {
    pub fn is_ignored(&self, col: usize) -> bool {
        self.ignored_columns.contains(&col)
    }

    pub fn classification(&self, col: usize) -> Option<&ForcedClassification> {
        self.classifications.iter().find(|c| c.column == col)
    }

    /// Chosen classes of a column when the user forced a non-empty classification.
    pub fn chosen_classes(&self, col: usize) -> Option<&[Clazz]> {
        self.classification(col)
            .filter(|c| !c.chosen.is_empty())
            .map(|c| c.chosen.as_slice())
    }

    /// True when the user forced the column to stay unclassified.
    pub fn is_classification_suppressed(&self, col: usize) -> bool {
        self.classification(col).is_some_and(|c| c.chosen.is_empty())
    }

    pub fn disambiguation(&self, position: CellPosition) -> Option<&ForcedDisambiguation> {
        self.disambiguations.iter().find(|d| d.position == position)
    }

    pub fn relation(&self, columns: ColumnPair) -> Option<&ForcedRelation> {
        self.relations.iter().find(|r| r.columns == columns)
    }

    /// Forced relations whose subject is `subject`.
    pub fn relations_from(&self, subject: usize) -> impl Iterator<Item = &ForcedRelation> {
        self.relations
            .iter()
            .filter(move |r| r.columns.subject == subject)
    }

    pub fn ambiguity_rows(&self, col: usize) -> BTreeSet<usize> {
        self.ambiguities
            .iter()
            .filter(|p| p.col == col)
            .map(|p| p.row)
            .collect()
    }

    pub fn has_ambiguities_in(&self, col: usize) -> bool {
        self.ambiguities.iter().any(|p| p.col == col)
    }

    /// Rejects positions outside a `rows x cols` table.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        let check_col = |what: &'static str, column: usize| -> Result<()> {
            if column >= cols {
                Err(ModelError::ColumnOutOfRange {
                    what,
                    column,
                    columns: cols,
                })
            } else {
                Ok(())
            }
        };
        let check_cell = |what: &'static str, position: CellPosition| -> Result<()> {
            check_col(what, position.col)?;
            if position.row >= rows {
                Err(ModelError::RowOutOfRange {
                    what,
                    row: position.row,
                    rows,
                })
            } else {
                Ok(())
            }
        };

        for &col in &self.subject_columns {
            check_col("subject column", col)?;
        }
        for &col in &self.ignored_columns {
            check_col("ignored column", col)?;
        }
        for classification in &self.classifications {
            check_col("classification", classification.column)?;
        }
        for disambiguation in &self.disambiguations {
            check_cell("disambiguation", disambiguation.position)?;
        }
        for relation in &self.relations {
            check_col("relation", relation.columns.subject)?;
            check_col("relation", relation.columns.object)?;
            if relation.columns.subject == relation.columns.object {
                return Err(ModelError::SelfRelation {
                    what: "relation",
                    column: relation.columns.subject,
                });
            }
        }
        for &position in &self.ambiguities {
            check_cell("ambiguity", position)?;
        }
        for &row in &self.skipped_rows {
            if row >= rows {
                return Err(ModelError::RowOutOfRange {
                    what: "skipped row",
                    row,
                    rows,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_classification_suppresses_column() {
        let constraints = Constraints {
            classifications: vec![
                ForcedClassification {
                    column: 1,
                    chosen: vec![],
                },
                ForcedClassification {
                    column: 2,
                    chosen: vec![Clazz::new("ex:City", "City")],
                },
            ],
            ..Constraints::default()
        };
        assert!(constraints.is_classification_suppressed(1));
        assert!(constraints.chosen_classes(1).is_none());
        assert_eq!(constraints.chosen_classes(2).map(<[Clazz]>::len), Some(1));
        assert!(!constraints.is_classification_suppressed(2));
    }

    #[test]
    fn validate_rejects_out_of_range_positions() {
        let constraints = Constraints {
            ambiguities: [CellPosition::new(5, 0)].into_iter().collect(),
            ..Constraints::default()
        };
        assert_eq!(
            constraints.validate(3, 2),
            Err(ModelError::RowOutOfRange {
                what: "ambiguity",
                row: 5,
                rows: 3
            })
        );

        let constraints = Constraints {
            relations: vec![ForcedRelation {
                columns: ColumnPair::new(1, 1),
                chosen: vec![],
            }],
            ..Constraints::default()
        };
        assert!(matches!(
            constraints.validate(3, 2),
            Err(ModelError::SelfRelation { column: 1, .. })
        ));
        assert!(Constraints::default().validate(0, 1).is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let constraints: Constraints =
            serde_json::from_str(r#"{"ignored_columns": [2]}"#).expect("parse constraints");
        assert!(constraints.is_ignored(2));
        assert!(constraints.classifications.is_empty());
    }
}
