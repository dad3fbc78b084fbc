use std::sync::Arc;

use sti_model::{Entity, ScoreElements, scores};
use sti_nlp::{Bow, TextProcessor, dice, tokenize};

use crate::config::ContextWeights;
use crate::scoring::bags::{BlockContext, entity_bow};

/// Scores an entity candidate against the cell text and its context.
///
/// `final = sqrt(1 / tokens(cell)) * context + name_match + forced`, where
/// `context` is the weighted sum of the row, column, header and
/// out-of-table overlaps.
#[derive(Debug, Clone)]
pub struct EntityScorer {
    text: Arc<TextProcessor>,
    weights: ContextWeights,
}

impl EntityScorer {
    pub fn new(text: Arc<TextProcessor>, weights: ContextWeights) -> Self {
        Self { text, weights }
    }

    pub fn text(&self) -> &TextProcessor {
        &self.text
    }

    /// Partial scores of `entity` for a cell reading `cell_text`.
    pub fn score(&self, entity: &Entity, cell_text: &str, context: &BlockContext) -> ScoreElements {
        let knowledge = entity_bow(&self.text, entity);
        let mut elements = ScoreElements::new();
        elements.insert(scores::NAME_MATCH.to_string(), name_match(cell_text, &entity.label));
        elements.insert(scores::CTX_ROW.to_string(), dice(&knowledge, &context.row));
        elements.insert(scores::CTX_COLUMN.to_string(), dice(&knowledge, &context.column));
        elements.insert(scores::CTX_HEADER.to_string(), dice(&knowledge, &context.header));
        elements.insert(
            scores::CTX_OUT.to_string(),
            dice(&knowledge, &context.out_of_table),
        );
        elements
    }

    pub fn compute_final(&self, elements: &ScoreElements, cell_text: &str) -> f64 {
        let get = |name: &str| elements.get(name).copied().unwrap_or(0.0);
        let tokens = tokenize(cell_text).len().max(1);
        let context = self.weights.row * get(scores::CTX_ROW)
            + self.weights.column * get(scores::CTX_COLUMN)
            + self.weights.header * get(scores::CTX_HEADER)
            + self.weights.out_of_table * get(scores::CTX_OUT);
        (1.0 / tokens as f64).sqrt() * context + get(scores::NAME_MATCH) + get(scores::FORCED)
    }
}

/// Square root of the token overlap between a cell and an entity label.
/// Stop words are kept: a label made only of them still has to match.
fn name_match(cell_text: &str, label: &str) -> f64 {
    let cell = Bow::from_tokens(tokenize(cell_text));
    let label = Bow::from_tokens(tokenize(label));
    dice(&cell, &label).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sti_model::Attribute;

    fn scorer() -> EntityScorer {
        EntityScorer::new(
            Arc::new(TextProcessor::english()),
            ContextWeights::new(0.5, 0.5, 1.0, 0.25),
        )
    }

    #[test]
    fn exact_label_gives_full_name_match() {
        let scorer = scorer();
        let entity = Entity::new("ex:The_Who", "The Who");
        let elements = scorer.score(&entity, "the who", &BlockContext::default());
        assert_eq!(elements[scores::NAME_MATCH], 1.0);
        assert_eq!(scorer.compute_final(&elements, "the who"), 1.0);
    }

    #[test]
    fn final_score_follows_the_formula() {
        let scorer = scorer();
        let mut elements = ScoreElements::new();
        elements.insert(scores::NAME_MATCH.to_string(), 0.5);
        elements.insert(scores::CTX_ROW.to_string(), 0.4);
        elements.insert(scores::CTX_COLUMN.to_string(), 0.2);
        elements.insert(scores::CTX_HEADER.to_string(), 0.1);
        elements.insert(scores::CTX_OUT.to_string(), 0.8);
        let context = 1.0 * 0.4 + 0.5 * 0.2 + 0.5 * 0.1 + 0.25 * 0.8;
        let expected = (1.0f64 / 4.0).sqrt() * context + 0.5;
        let actual = scorer.compute_final(&elements, "new york city hall");
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn row_context_rewards_related_attributes() {
        let scorer = scorer();
        let text = TextProcessor::english();
        let context = BlockContext {
            row: text.bag_of_words("France"),
            ..BlockContext::default()
        };
        let city = Entity::new("ex:Paris", "Paris")
            .with_attributes(vec![Attribute::new("ex:country", "France")]);
        let person = Entity::new("ex:Paris_Hilton", "Paris Hilton");
        let city_score = scorer.compute_final(&scorer.score(&city, "Paris", &context), "Paris");
        let person_score =
            scorer.compute_final(&scorer.score(&person, "Paris", &context), "Paris");
        assert!(city_score > person_score);
    }
}
