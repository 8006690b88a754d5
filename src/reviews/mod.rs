//! Review rating aggregates consumed by kitchen statistics.

pub mod memory;
pub mod repo;
pub mod repo_types;

pub use repo::{PgReviewStore, ReviewStore};
