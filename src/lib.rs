//! # Farmsight
//!
//! A batch pipeline that turns raw minor-league per-game records into a
//! single ranked list of prospects, normalized for competitive context
//! (league run environment, age relative to peers, position) and translated
//! toward expected major-league equivalence.
//!
//! ## Example
//!
//! ```rust,no_run
//! use farmsight::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(CsvStore::new("snapshot/"));
//! let pipeline = ProspectPipeline::new(PipelineConfig::default(), store);
//!
//! let ranking_store = RankingStore::new("rankings/");
//! let (run, path) = pipeline.run_and_promote(&ranking_store).unwrap();
//! println!("promoted {} prospects to {}", run.ranking.len(), path.display());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod factors;
pub mod features;
pub mod model;
pub mod ranking;
pub mod record;
pub mod scoring;
pub mod store;
pub mod translation;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::PipelineConfig;
    pub use crate::engine::{PipelineRun, ProspectPipeline};
    pub use crate::error::{FarmsightError, Result};
    pub use crate::model::regressor::ModelArtifact;
    pub use crate::ranking::{Ranking, RankingEntry, RankingStore};
    pub use crate::record::{PlayerInfo, RawGameRecord};
    pub use crate::store::{CsvStore, InMemoryStore, RecordStore};
    pub use crate::types::{Level, PlayerId, PlayerRole, PositionGroup, Season};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lib_compile() {
        // Smoke test to ensure library compiles
        let _ = config::PipelineConfig::default();
    }
}
