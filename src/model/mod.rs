//! Predictive regression stage
//!
//! One tree-ensemble regressor per target metric, trained on players with
//! both a MiLB and an MLB track record, then applied to every prospect.
//! Fitting and scoring are separate operations joined by a versioned,
//! serialized model artifact.

pub mod regressor;
pub mod training;

pub use regressor::{FittedTarget, ModelArtifact, PredictiveRegressor, TargetDiagnostics};
pub use training::{TrainingSet, TrainingTable};

use crate::record::MlbOutcome;
use crate::types::PlayerRole;
use serde::{Deserialize, Serialize};

/// A regression target metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    WrcPlus,
    Woba,
    Ops,
    Fip,
}

impl TargetMetric {
    pub const ALL: [TargetMetric; 4] = [
        TargetMetric::WrcPlus,
        TargetMetric::Woba,
        TargetMetric::Ops,
        TargetMetric::Fip,
    ];

    /// Key used in predicted-metric maps and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TargetMetric::WrcPlus => "wrc_plus",
            TargetMetric::Woba => "woba",
            TargetMetric::Ops => "ops",
            TargetMetric::Fip => "fip",
        }
    }

    /// Which population the target is fitted on
    pub fn role(&self) -> PlayerRole {
        match self {
            TargetMetric::Fip => PlayerRole::Pitcher,
            _ => PlayerRole::Hitter,
        }
    }

    /// The realized value of this metric in an MLB outcome row
    pub fn outcome_value(&self, outcome: &MlbOutcome) -> f64 {
        match self {
            TargetMetric::WrcPlus => outcome.wrc_plus,
            TargetMetric::Woba => outcome.woba,
            TargetMetric::Ops => outcome.ops,
            TargetMetric::Fip => outcome.fip,
        }
    }
}
