//! Types literal columns by the relation that links them to the subject.

use std::collections::BTreeMap;

use sti_model::{Clazz, Constraints, HeaderAnnotation, Table, TableAnnotation, scores};

/// Annotates object columns that carry literals (or unclassified named
/// entities) with their relations, so every related column has a header
/// annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralColumnTagger;

impl LiteralColumnTagger {
    /// Returns the columns that received a header annotation.
    pub fn annotate(
        &self,
        table: &Table,
        constraints: &Constraints,
        annotation: &mut TableAnnotation,
    ) -> Vec<usize> {
        let mut by_column: BTreeMap<usize, Vec<HeaderAnnotation>> = BTreeMap::new();
        let pairs: Vec<_> = annotation.column_relation_pairs().collect();
        for pair in pairs {
            let object = pair.object;
            if constraints.classification(object).is_some() {
                continue;
            }
            let eligible = !table.is_named_entity_column(object)
                || annotation.header_annotations(object).is_empty();
            if !eligible {
                continue;
            }
            let header_text = &table.header(object).text;
            let candidates = by_column.entry(object).or_default();
            for relation in annotation.column_relations(pair) {
                let mut candidate = HeaderAnnotation::new(
                    header_text.clone(),
                    Clazz::new(relation.relation.uri.clone(), relation.relation.label.clone()),
                );
                candidate
                    .score_elements
                    .insert(scores::RELATION.to_string(), relation.final_score);
                candidate.final_score = relation.final_score;
                candidate.supporting_rows = relation.supporting_rows.clone();
                candidates.push(candidate);
            }
        }

        let columns: Vec<usize> = by_column.keys().copied().collect();
        for (col, candidates) in by_column {
            tracing::debug!(column = col, candidates = candidates.len(), "typed literal column");
            annotation.set_header_annotations(col, candidates);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sti_model::{ColumnPair, ColumnRelation, ForcedClassification, Predicate, TableBuilder};

    fn table() -> Table {
        TableBuilder::new("t")
            .headers(["City", "Population", "Country"])
            .row(["Paris", "2148000", "France"])
            .build()
            .expect("build table")
    }

    fn relation(uri: &str, score: f64) -> ColumnRelation {
        let mut relation = ColumnRelation::new(Predicate::new(uri, uri.trim_start_matches("ex:")));
        relation.final_score = score;
        relation
    }

    #[test]
    fn literal_columns_take_their_relation() {
        let table = table();
        let mut annotation = TableAnnotation::new(1, 3);
        annotation.set_column_relations(ColumnPair::new(0, 1), vec![relation("ex:population", 1.5)]);
        let typed = LiteralColumnTagger.annotate(&table, &Constraints::default(), &mut annotation);
        assert_eq!(typed, vec![1]);
        let header = &annotation.header_annotations(1)[0];
        assert_eq!(header.clazz.id, "ex:population");
        assert_eq!(header.final_score, 1.5);
        assert_eq!(header.element(scores::RELATION), 1.5);
    }

    #[test]
    fn classified_entity_columns_are_left_alone() {
        let table = table();
        let mut annotation = TableAnnotation::new(1, 3);
        annotation.set_header_annotations(
            2,
            vec![HeaderAnnotation::new("Country", Clazz::new("ex:Country", "Country"))],
        );
        annotation.set_column_relations(ColumnPair::new(0, 2), vec![relation("ex:country", 1.0)]);
        let typed = LiteralColumnTagger.annotate(&table, &Constraints::default(), &mut annotation);
        assert!(typed.is_empty());
        assert_eq!(annotation.header_annotations(2)[0].clazz.id, "ex:Country");
    }

    #[test]
    fn forced_columns_are_left_alone() {
        let table = table();
        let mut annotation = TableAnnotation::new(1, 3);
        annotation.set_column_relations(ColumnPair::new(0, 1), vec![relation("ex:population", 1.0)]);
        let constraints = Constraints {
            classifications: vec![ForcedClassification {
                column: 1,
                chosen: Vec::new(),
            }],
            ..Constraints::default()
        };
        assert!(LiteralColumnTagger.annotate(&table, &constraints, &mut annotation).is_empty());
        assert!(annotation.header_annotations(1).is_empty());
    }
}
