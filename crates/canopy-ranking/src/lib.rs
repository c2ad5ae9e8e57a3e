//! Ranking persistence and the per-city re-ranking session.
//!
//! [`RankingRepository`] maps a (city, action type) pair to its stored
//! ranking and reads or writes it through any [`ObjectStore`].
//! [`RankingCoordinator`] owns the list being edited, applies reorder
//! operations and commits the result with at most one save in flight per
//! storage key.
//!
//! [`ObjectStore`]: canopy_core::store::ObjectStore

mod coordinator;
mod repository;

pub mod error;

pub use coordinator::{
  Divergence, Phase, RankedActionList, RankingCoordinator, RankingSnapshot,
};
pub use error::{Error, Result};
pub use repository::{RankingRepository, StoredRanking};
