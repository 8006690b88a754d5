use rust_decimal::Decimal;
use sqlx::FromRow;

/// Rating aggregate over a kitchen's live reviews.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReviewStats {
    pub review_count: i64,
    /// Rounded to two decimals; `None` when the kitchen has no reviews.
    pub average_rating: Option<Decimal>,
}
