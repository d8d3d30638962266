//! Competitive-context factor tables
//!
//! League and position factor tables are fully recomputed from the snapshot
//! on every run; the age curves are pure functions of configuration.

pub mod age_curve;
pub mod league;
pub mod position;

pub use age_curve::{AgeCurve, AgeModel, LevelVsAge};
pub use league::{AgeDistribution, LeagueFactor, LeagueFactorCalculator};
pub use position::{PositionFactor, PositionFactorCalculator};
