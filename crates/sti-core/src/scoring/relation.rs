use std::collections::HashMap;
use std::sync::Arc;

use sti_model::{ColumnPair, ColumnRelation, Predicate, ScoreElements, Table, scores};
use sti_nlp::{Bow, TextProcessor, dice};

use crate::config::ContextWeights;
use crate::scoring::bags::{column_bow, header_bow, out_of_table_bow};
use crate::scoring::{domain_consensus, normalize_votes};

/// Scores relation candidates between a subject and an object column.
///
/// `final = match + weighted(header, column, out_of_table) + dc + forced`
/// with `match = sum_match / total_rows`. Context is taken from the object
/// column.
#[derive(Debug)]
pub struct RelationScorer {
    text: Arc<TextProcessor>,
    weights: ContextWeights,
    bags: HashMap<String, Bow>,
}

impl RelationScorer {
    pub fn new(text: Arc<TextProcessor>, weights: ContextWeights) -> Self {
        Self {
            text,
            weights,
            bags: HashMap::new(),
        }
    }

    fn predicate_bow(&mut self, predicate: &Predicate) -> &Bow {
        let text = &self.text;
        self.bags
            .entry(predicate.uri.clone())
            .or_insert_with(|| text.resource_bag_of_words(&predicate.uri, &predicate.label))
    }

    pub fn compute_context(&mut self, candidate: &mut ColumnRelation, table: &Table, pair: ColumnPair) {
        if candidate.score_elements.contains_key(scores::CTX_HEADER) {
            return;
        }
        let header = header_bow(&self.text, table, pair.object);
        let column = column_bow(&self.text, table, pair.object, &[]);
        let out = out_of_table_bow(&self.text, table);
        let bow = self.predicate_bow(&candidate.relation).clone();
        let elements = &mut candidate.score_elements;
        elements.insert(scores::CTX_HEADER.to_string(), dice(&bow, &header));
        elements.insert(scores::CTX_COLUMN.to_string(), dice(&bow, &column));
        elements.insert(scores::CTX_OUT.to_string(), dice(&bow, &out));
    }

    pub fn domain_consensus(&mut self, predicate: &Predicate, domain: &Bow) -> f64 {
        domain_consensus(self.predicate_bow(predicate), domain)
    }

    /// Writes the `match` element and returns the final score.
    pub fn compute_final(&self, elements: &mut ScoreElements, total_rows: usize) -> f64 {
        let get = |elements: &ScoreElements, name: &str| elements.get(name).copied().unwrap_or(0.0);
        let matched = normalize_votes(
            get(elements, scores::SUM_MATCH),
            get(elements, scores::SUM_CELL_VOTE),
            total_rows,
        );
        elements.insert(scores::MATCH.to_string(), matched);
        matched
            + self.weights.header * get(elements, scores::CTX_HEADER)
            + self.weights.column * get(elements, scores::CTX_COLUMN)
            + self.weights.out_of_table * get(elements, scores::CTX_OUT)
            + get(elements, scores::DOMAIN_CONSENSUS)
            + get(elements, scores::FORCED)
    }
}
