//! Names of the partial scores stored in every candidate's score elements.

/// Name overlap between cell text and entity label.
pub const NAME_MATCH: &str = "name_match";
/// Overlap with the other cells of the candidate's row(s).
pub const CTX_ROW: &str = "ctx_row";
/// Overlap with the other cells of the candidate's column.
pub const CTX_COLUMN: &str = "ctx_column";
/// Overlap with the column header text.
pub const CTX_HEADER: &str = "ctx_header";
/// Overlap with out-of-table context (title, caption, paragraphs).
pub const CTX_OUT: &str = "ctx_out";

/// Sum of winning entity scores voting for a class.
pub const SUM_CE: &str = "sum_ce";
/// Number of cell votes for a class or relation.
pub const SUM_CELL_VOTE: &str = "sum_cell_vote";
/// Normalized concept-instance score, `sum_ce / rows`.
pub const CE: &str = "ce";
/// Class depth bonus.
pub const HIERARCHY: &str = "hierarchy";
/// Domain consensus score.
pub const DOMAIN_CONSENSUS: &str = "dc";

/// Sum of attribute match scores voting for a relation.
pub const SUM_MATCH: &str = "sum_match";
/// Normalized relation match score, `sum_match / rows`.
pub const MATCH: &str = "match";

/// Score of a user-forced annotation.
pub const FORCED: &str = "forced";
/// Score copied from the relation that typed a literal column.
pub const RELATION: &str = "relation";
