//! Query filtering for quick pick item lists.
//!
//! Filtering is a stable sub-sequence selection: matching items keep their
//! original relative order and are never re-ranked by match score. Lists that
//! grow while a query is active are filtered incrementally, appending new
//! matches after the existing ones.

mod engine;
mod item;

pub use engine::{FilterOptions, ItemFilter, MatchMode};
pub use item::Filterable;

#[cfg(test)]
mod tests;
