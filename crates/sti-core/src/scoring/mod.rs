//! Scorers for entity, class and relation candidates.
//!
//! Every scorer fills a candidate's score elements and derives the final
//! score from them alone, so a stored annotation can always be re-scored.

pub mod bags;
pub mod clazz;
pub mod entity;
pub mod relation;

pub use bags::BlockContext;
pub use clazz::ClazzScorer;
pub use entity::EntityScorer;
pub use relation::RelationScorer;

use sti_nlp::{Bow, dice};

/// Weight of the domain consensus overlap.
pub const DOMAIN_CONSENSUS_WEIGHT: f64 = 2.0;

/// Average vote strength over the table, zero until a first vote.
pub fn normalize_votes(sum: f64, votes: f64, total_rows: usize) -> f64 {
    if votes > 0.0 && total_rows > 0 {
        sum / total_rows as f64
    } else {
        0.0
    }
}

/// `2 * sqrt(dice(resource, domain))`.
pub fn domain_consensus(resource: &Bow, domain: &Bow) -> f64 {
    DOMAIN_CONSENSUS_WEIGHT * dice(resource, domain).sqrt()
}
