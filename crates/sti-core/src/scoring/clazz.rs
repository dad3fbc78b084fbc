use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use sti_kb::KnowledgeBase;
use sti_model::{Clazz, HeaderAnnotation, ScoreElements, Table, scores};
use sti_nlp::{Bow, TextProcessor, dice};

use crate::config::ContextWeights;
use crate::error::Result;
use crate::scoring::bags::{column_bow, header_bow, out_of_table_bow};
use crate::scoring::{domain_consensus, normalize_votes};

/// Bonus per level of depth in the class hierarchy.
pub const HIERARCHY_STEP: f64 = 0.02;

/// Scores class candidates of a column header.
///
/// `final = ce + weighted(header, column, out_of_table) + hierarchy + dc + forced`
/// with `ce = sum_ce / total_rows` once the class received a vote. Row
/// context does not apply to classes.
///
/// Hierarchy depths and class bags are memoized for the lifetime of the
/// scorer.
#[derive(Debug)]
pub struct ClazzScorer {
    text: Arc<TextProcessor>,
    weights: ContextWeights,
    depths: HashMap<String, usize>,
    bags: HashMap<String, Bow>,
}

impl ClazzScorer {
    pub fn new(text: Arc<TextProcessor>, weights: ContextWeights) -> Self {
        Self {
            text,
            weights,
            depths: HashMap::new(),
            bags: HashMap::new(),
        }
    }

    fn clazz_bow(&mut self, clazz: &Clazz) -> &Bow {
        let text = &self.text;
        self.bags
            .entry(clazz.id.clone())
            .or_insert_with(|| text.resource_bag_of_words(&clazz.id, &clazz.label))
    }

    /// Adds header, column and out-of-table context unless already present.
    pub fn compute_context(&mut self, candidate: &mut HeaderAnnotation, table: &Table, col: usize) {
        if candidate.score_elements.contains_key(scores::CTX_HEADER) {
            return;
        }
        let header = header_bow(&self.text, table, col);
        let column = column_bow(&self.text, table, col, &[]);
        let out = out_of_table_bow(&self.text, table);
        let bow = self.clazz_bow(&candidate.clazz).clone();
        let elements = &mut candidate.score_elements;
        elements.insert(scores::CTX_HEADER.to_string(), dice(&bow, &header));
        elements.insert(scores::CTX_COLUMN.to_string(), dice(&bow, &column));
        elements.insert(scores::CTX_OUT.to_string(), dice(&bow, &out));
    }

    /// Adds the hierarchy bonus unless already present.
    pub fn compute_hierarchy(
        &mut self,
        kb: &dyn KnowledgeBase,
        candidate: &mut HeaderAnnotation,
    ) -> Result<()> {
        if candidate.score_elements.contains_key(scores::HIERARCHY) {
            return Ok(());
        }
        let depth = self.depth(kb, &candidate.clazz.id)?;
        candidate
            .score_elements
            .insert(scores::HIERARCHY.to_string(), HIERARCHY_STEP * depth as f64);
        Ok(())
    }

    /// Number of ancestors of `clazz_id`. A cyclic hierarchy has depth 0.
    pub fn depth(&mut self, kb: &dyn KnowledgeBase, clazz_id: &str) -> Result<usize> {
        if let Some(depth) = self.depths.get(clazz_id) {
            return Ok(*depth);
        }
        let mut visited = BTreeSet::from([clazz_id.to_string()]);
        let mut current = clazz_id.to_string();
        let mut depth = 0;
        while let Some(parent) = kb.find_parent_clazz(&current)? {
            if !visited.insert(parent.clone()) {
                tracing::warn!(clazz = clazz_id, at = %parent, "cyclic class hierarchy");
                depth = 0;
                break;
            }
            depth += 1;
            current = parent;
        }
        self.depths.insert(clazz_id.to_string(), depth);
        Ok(depth)
    }

    /// Domain consensus of a class against the domain bag.
    pub fn domain_consensus(&mut self, clazz: &Clazz, domain: &Bow) -> f64 {
        domain_consensus(self.clazz_bow(clazz), domain)
    }

    /// Writes the `ce` element and returns the final score.
    pub fn compute_final(&self, elements: &mut ScoreElements, total_rows: usize) -> f64 {
        let get = |elements: &ScoreElements, name: &str| elements.get(name).copied().unwrap_or(0.0);
        let ce = normalize_votes(
            get(elements, scores::SUM_CE),
            get(elements, scores::SUM_CELL_VOTE),
            total_rows,
        );
        elements.insert(scores::CE.to_string(), ce);
        ce + self.weights.header * get(elements, scores::CTX_HEADER)
            + self.weights.column * get(elements, scores::CTX_COLUMN)
            + self.weights.out_of_table * get(elements, scores::CTX_OUT)
            + get(elements, scores::HIERARCHY)
            + get(elements, scores::DOMAIN_CONSENSUS)
            + get(elements, scores::FORCED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sti_kb::InMemoryKnowledgeBase;

    fn scorer() -> ClazzScorer {
        ClazzScorer::new(
            Arc::new(TextProcessor::english()),
            ContextWeights::new(1.0, 0.5, 0.5, 0.25),
        )
    }

    #[test]
    fn depth_is_memoized() {
        let kb = InMemoryKnowledgeBase::default()
            .with_parent("ex:City", "ex:Settlement")
            .with_parent("ex:Settlement", "ex:Place");
        let mut scorer = scorer();
        assert_eq!(scorer.depth(&kb, "ex:City").expect("depth"), 2);
        let calls = kb.call_count();
        assert_eq!(scorer.depth(&kb, "ex:City").expect("depth"), 2);
        assert_eq!(kb.call_count(), calls);
    }

    #[test]
    fn cyclic_hierarchy_has_depth_zero() {
        let kb = InMemoryKnowledgeBase::default()
            .with_parent("ex:A", "ex:B")
            .with_parent("ex:B", "ex:A");
        assert_eq!(scorer().depth(&kb, "ex:A").expect("depth"), 0);
    }

    #[test]
    fn final_score_follows_the_formula() {
        let scorer = scorer();
        let mut elements = ScoreElements::new();
        elements.insert(scores::SUM_CE.to_string(), 3.0);
        elements.insert(scores::SUM_CELL_VOTE.to_string(), 4.0);
        elements.insert(scores::CTX_HEADER.to_string(), 0.5);
        elements.insert(scores::CTX_COLUMN.to_string(), 0.2);
        elements.insert(scores::CTX_OUT.to_string(), 0.4);
        elements.insert(scores::HIERARCHY.to_string(), 0.04);
        elements.insert(scores::DOMAIN_CONSENSUS.to_string(), 0.3);
        let expected = 3.0 / 6.0 + 0.5 + 0.5 * 0.2 + 0.25 * 0.4 + 0.04 + 0.3;
        let actual = scorer.compute_final(&mut elements, 6);
        assert!((actual - expected).abs() < 1e-9);
        assert!((elements[scores::CE] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_votes_means_no_ce() {
        let scorer = scorer();
        let mut elements = ScoreElements::new();
        elements.insert(scores::FORCED.to_string(), 1.0);
        assert_eq!(scorer.compute_final(&mut elements, 10), 1.0);
        assert_eq!(elements[scores::CE], 0.0);
    }

    #[test]
    fn header_context_prefers_matching_class() {
        let table = sti_model::TableBuilder::new("t")
            .headers(["City"])
            .row(["Paris"])
            .build()
            .expect("build table");
        let mut scorer = scorer();
        let mut city = HeaderAnnotation::new("City", Clazz::new("ex:City", "city"));
        let mut person = HeaderAnnotation::new("City", Clazz::new("ex:Person", "person"));
        scorer.compute_context(&mut city, &table, 0);
        scorer.compute_context(&mut person, &table, 0);
        assert_eq!(city.element(scores::CTX_HEADER), 1.0);
        assert_eq!(person.element(scores::CTX_HEADER), 0.0);
    }
}
