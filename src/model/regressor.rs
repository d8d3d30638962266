//! Per-target random-forest regression
//!
//! `fit` trains one forest per target metric and packages them into a
//! versioned artifact; `predict` loads fitted forests and applies them to
//! every prospect's feature vector. A target that fails to fit is logged
//! and recorded, never allowed to abort the others.

use crate::config::TrainingConfig;
use crate::error::{FarmsightError, Result};
use crate::features::{FeatureSet, HitterFeatureVector, PitcherFeatureVector};
use crate::model::training::{split_holdout, TrainingSet};
use crate::model::TargetMetric;
use crate::types::{PlayerId, PlayerRole};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use uuid::Uuid;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Forests cannot fit on fewer examples than this
const MIN_TRAINING_EXAMPLES: usize = 10;

/// Fit diagnostics for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDiagnostics {
    pub target: TargetMetric,
    pub train_examples: usize,
    pub validation_examples: usize,
    pub r2_train: f64,
    /// None when the holdout split is disabled or empty
    pub r2_validation: Option<f64>,
}

/// A fitted forest for one target metric
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedTarget {
    pub target: TargetMetric,
    pub columns: Vec<String>,
    pub diagnostics: TargetDiagnostics,
    model: Forest,
}

/// A target that failed to fit in this run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetFailure {
    pub target: TargetMetric,
    pub error: String,
}

/// Versioned, persistable bundle of fitted models
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: Uuid,
    pub created_at: DateTime<Utc>,
    pub training: TrainingConfig,
    pub targets: Vec<FittedTarget>,
    pub failures: Vec<TargetFailure>,
}

impl ModelArtifact {
    pub fn target(&self, target: TargetMetric) -> Option<&FittedTarget> {
        self.targets.iter().find(|t| t.target == target)
    }

    /// Serialize to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        log::info!(
            "Saved model artifact {} to {}",
            self.version,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load a previously saved artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        Ok(artifact)
    }
}

/// Predicted metric values per player
pub type Predictions = HashMap<PlayerId, BTreeMap<String, f64>>;

/// Trains and applies the per-target forests
#[derive(Debug, Clone)]
pub struct PredictiveRegressor {
    config: TrainingConfig,
}

impl PredictiveRegressor {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fit every target metric. An empty training set is pipeline-fatal;
    /// a single target failing is not.
    pub fn fit(&self, set: &TrainingSet) -> Result<ModelArtifact> {
        if set.is_empty() {
            return Err(FarmsightError::TrainingError(
                "training set is empty: no players meet both the MiLB and MLB sample thresholds"
                    .to_string(),
            ));
        }

        let mut targets = Vec::new();
        let mut failures = Vec::new();
        for target in TargetMetric::ALL {
            match self.fit_target(set, target) {
                Ok(fitted) => {
                    log::info!(
                        "Fitted {} on {} examples (r2_train={:.3}, r2_validation={})",
                        target.name(),
                        fitted.diagnostics.train_examples,
                        fitted.diagnostics.r2_train,
                        fitted
                            .diagnostics
                            .r2_validation
                            .map_or("n/a".to_string(), |r2| format!("{:.3}", r2)),
                    );
                    targets.push(fitted);
                }
                Err(e) => {
                    log::error!("Fitting {} failed: {}; other targets proceed", target.name(), e);
                    failures.push(TargetFailure {
                        target,
                        error: e.to_string(),
                    });
                }
            }
        }

        if targets.is_empty() {
            return Err(FarmsightError::TrainingError(
                "every target metric failed to fit".to_string(),
            ));
        }

        Ok(ModelArtifact {
            version: Uuid::new_v4(),
            created_at: Utc::now(),
            training: self.config,
            targets,
            failures,
        })
    }

    fn fit_target(&self, set: &TrainingSet, target: TargetMetric) -> Result<FittedTarget> {
        let table = set.table(target.role());
        let y = table.targets.get(&target).ok_or_else(|| {
            FarmsightError::TrainingError(format!("no target column for {}", target.name()))
        })?;

        let (train_rows, train_y, val_rows, val_y) =
            split_holdout(&table.rows, y, self.config.validation_every);
        if train_rows.len() < MIN_TRAINING_EXAMPLES {
            return Err(FarmsightError::TrainingError(format!(
                "{} has {} training examples, need at least {}",
                target.name(),
                train_rows.len(),
                MIN_TRAINING_EXAMPLES
            )));
        }

        let x = DenseMatrix::from_2d_vec(&train_rows);
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.config.n_trees.into())
            .with_max_depth(self.config.max_depth)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_seed(self.config.seed);
        let model = Forest::fit(&x, &train_y, params).map_err(|e| {
            FarmsightError::TrainingError(format!("{} forest fit failed: {}", target.name(), e))
        })?;

        let train_pred = model.predict(&x).map_err(|e| {
            FarmsightError::TrainingError(format!("{} train predict failed: {}", target.name(), e))
        })?;
        let r2_train = r_squared(&train_y, &train_pred);

        let r2_validation = if val_rows.is_empty() {
            None
        } else {
            let val_x = DenseMatrix::from_2d_vec(&val_rows);
            let val_pred = model.predict(&val_x).map_err(|e| {
                FarmsightError::TrainingError(format!(
                    "{} validation predict failed: {}",
                    target.name(),
                    e
                ))
            })?;
            Some(r_squared(&val_y, &val_pred))
        };

        let columns = match target.role() {
            PlayerRole::Hitter => HitterFeatureVector::column_names(),
            PlayerRole::Pitcher => PitcherFeatureVector::column_names(),
        };

        Ok(FittedTarget {
            target,
            columns,
            diagnostics: TargetDiagnostics {
                target,
                train_examples: train_rows.len(),
                validation_examples: val_rows.len(),
                r2_train,
                r2_validation,
            },
            model,
        })
    }

    /// Apply the fitted models to every prospect. Targets missing from the
    /// artifact are simply absent from the predicted metrics.
    pub fn predict(artifact: &ModelArtifact, features: &FeatureSet) -> Result<Predictions> {
        let mut predictions: Predictions = HashMap::new();

        let hitter_rows: Vec<Vec<f64>> = features.hitters.iter().map(|v| v.to_row()).collect();
        let pitcher_rows: Vec<Vec<f64>> = features.pitchers.iter().map(|v| v.to_row()).collect();

        for fitted in &artifact.targets {
            let (rows, ids): (&[Vec<f64>], Vec<PlayerId>) = match fitted.target.role() {
                PlayerRole::Hitter => (
                    &hitter_rows,
                    features.hitters.iter().map(|v| v.player_id).collect(),
                ),
                PlayerRole::Pitcher => (
                    &pitcher_rows,
                    features.pitchers.iter().map(|v| v.player_id).collect(),
                ),
            };
            if rows.is_empty() {
                continue;
            }
            if rows[0].len() != fitted.columns.len() {
                log::error!(
                    "Feature width {} does not match model {} ({} columns); skipping target",
                    rows[0].len(),
                    fitted.target.name(),
                    fitted.columns.len()
                );
                continue;
            }

            let x = DenseMatrix::from_2d_vec(&rows.to_vec());
            let values = fitted.model.predict(&x).map_err(|e| {
                FarmsightError::TrainingError(format!(
                    "{} inference failed: {}",
                    fitted.target.name(),
                    e
                ))
            })?;

            for (player_id, value) in ids.into_iter().zip(values) {
                predictions
                    .entry(player_id)
                    .or_default()
                    .insert(fitted.target.name().to_string(), value);
            }
        }

        Ok(predictions)
    }
}

/// Coefficient of determination; a degenerate target column scores 0.0
fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum();
    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::HitterLevelBlock;
    use crate::types::Level;
    use approx::assert_relative_eq;

    fn hitter_vector(player_id: PlayerId, ops: f64) -> HitterFeatureVector {
        let mut block = HitterLevelBlock::default();
        block.pa = 400.0;
        block.ops = ops;
        block.ops_vs_league = ops / 0.720;
        HitterFeatureVector {
            player_id,
            levels: [block, HitterLevelBlock::default(), HitterLevelBlock::default(), HitterLevelBlock::default()],
            total_pa: 400.0,
            highest_level_ordinal: 5.0,
            highest_level: Some(Level::TripleA),
            weighted_cross_level: ops / 2.0,
            mean_ops_vs_league: ops / 0.720,
            age_at_highest: Some(22.0),
            age_vs_league_at_highest: -1.0,
        }
    }

    fn training_features(n: usize) -> FeatureSet {
        FeatureSet {
            hitters: (0..n)
                .map(|i| hitter_vector(i as PlayerId + 1, 0.600 + 0.01 * i as f64))
                .collect(),
            pitchers: vec![],
        }
    }

    fn training_set_from(features: &FeatureSet) -> TrainingSet {
        use crate::model::training::build_training_set;
        use crate::record::MlbOutcome;

        let outcomes: HashMap<_, _> = features
            .hitters
            .iter()
            .map(|v| {
                let ops = v.levels[0].ops;
                (
                    v.player_id,
                    MlbOutcome {
                        player_id: v.player_id,
                        pa: 400,
                        ab: 360,
                        outs_pitched: 0,
                        // Outcomes track the MiLB rate linearly, so the
                        // forest has a clean relationship to learn
                        wrc_plus: 100.0 * ops,
                        woba: 0.4 * ops,
                        ops: 0.9 * ops,
                        era: 0.0,
                        fip: 0.0,
                    },
                )
            })
            .collect();

        build_training_set(features, &outcomes, &TrainingConfig::default())
    }

    #[test]
    fn test_fit_produces_hitter_targets_and_records_pitcher_failures() {
        let features = training_features(40);
        let set = training_set_from(&features);
        let regressor = PredictiveRegressor::new(TrainingConfig::default());

        let artifact = regressor.fit(&set).unwrap();
        assert!(artifact.target(TargetMetric::WrcPlus).is_some());
        assert!(artifact.target(TargetMetric::Ops).is_some());
        // No pitcher examples at all: FIP fails in isolation
        assert!(artifact.target(TargetMetric::Fip).is_none());
        assert!(artifact
            .failures
            .iter()
            .any(|f| f.target == TargetMetric::Fip));
    }

    #[test]
    fn test_empty_training_set_is_fatal() {
        let regressor = PredictiveRegressor::new(TrainingConfig::default());
        assert!(regressor.fit(&TrainingSet::default()).is_err());
    }

    #[test]
    fn test_predictions_cover_every_prospect() {
        let features = training_features(40);
        let set = training_set_from(&features);
        let regressor = PredictiveRegressor::new(TrainingConfig::default());
        let artifact = regressor.fit(&set).unwrap();

        // Score a wider pool than was trained on, including a player with
        // no MLB history
        let mut pool = training_features(40);
        pool.hitters.push(hitter_vector(999, 0.850));

        let predictions = PredictiveRegressor::predict(&artifact, &pool).unwrap();
        assert_eq!(predictions.len(), 41);
        let rookie = &predictions[&999];
        assert!(rookie.contains_key("wrc_plus"));
        assert!(rookie.contains_key("woba"));
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let features = training_features(40);
        let set = training_set_from(&features);
        let regressor = PredictiveRegressor::new(TrainingConfig::default());

        let a = regressor.fit(&set).unwrap();
        let b = regressor.fit(&set).unwrap();
        let pred_a = PredictiveRegressor::predict(&a, &features).unwrap();
        let pred_b = PredictiveRegressor::predict(&b, &features).unwrap();

        for (player_id, metrics) in &pred_a {
            for (name, value) in metrics {
                assert_relative_eq!(*value, pred_b[player_id][name]);
            }
        }
    }

    #[test]
    fn test_diagnostics_report_holdout() {
        let features = training_features(50);
        let set = training_set_from(&features);
        let regressor = PredictiveRegressor::new(TrainingConfig::default());
        let artifact = regressor.fit(&set).unwrap();

        let diag = &artifact.target(TargetMetric::WrcPlus).unwrap().diagnostics;
        assert_eq!(diag.train_examples + diag.validation_examples, 50);
        assert!(diag.validation_examples > 0);
        assert!(diag.r2_validation.is_some());
        assert!(diag.r2_train > 0.0);
    }

    #[test]
    fn test_r_squared_degenerate_target_is_zero() {
        assert_eq!(r_squared(&[2.0, 2.0, 2.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(r_squared(&[], &[]), 0.0);
    }
}
