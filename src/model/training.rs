//! Training-set assembly
//!
//! A player becomes a training example only with both a sufficient MiLB
//! sample (feature side) and a sufficient MLB sample (outcome side). That
//! population is self-selected (players who reached the majors and stayed),
//! so the fitted relationships carry survivorship bias; a documented
//! limitation, deliberately left uncorrected.

use crate::config::TrainingConfig;
use crate::features::FeatureSet;
use crate::model::TargetMetric;
use crate::record::MlbOutcome;
use crate::types::{PlayerId, PlayerRole};
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Feature rows and aligned target columns for one role's population
#[derive(Debug, Clone, Default)]
pub struct TrainingTable {
    pub player_ids: Vec<PlayerId>,
    pub rows: Vec<Vec<f64>>,
    pub targets: BTreeMap<TargetMetric, Vec<f64>>,
}

impl TrainingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The assembled training populations for both roles
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub hitters: TrainingTable,
    pub pitchers: TrainingTable,
}

impl TrainingSet {
    pub fn is_empty(&self) -> bool {
        self.hitters.is_empty() && self.pitchers.is_empty()
    }

    pub fn table(&self, role: PlayerRole) -> &TrainingTable {
        match role {
            PlayerRole::Hitter => &self.hitters,
            PlayerRole::Pitcher => &self.pitchers,
        }
    }
}

/// Assemble training tables from feature vectors and realized MLB outcomes
pub fn build_training_set(
    features: &FeatureSet,
    outcomes: &HashMap<PlayerId, MlbOutcome>,
    config: &TrainingConfig,
) -> TrainingSet {
    let mut hitters = TrainingTable::default();
    for target in TargetMetric::ALL {
        if target.role() == PlayerRole::Hitter {
            hitters.targets.insert(target, Vec::new());
        }
    }
    // Feature vectors are sorted by player id, so example order is stable
    for vector in &features.hitters {
        let Some(outcome) = outcomes.get(&vector.player_id) else {
            continue;
        };
        if vector.total_pa < f64::from(config.min_milb_pa) || outcome.pa < config.min_mlb_pa {
            continue;
        }
        hitters.player_ids.push(vector.player_id);
        hitters.rows.push(vector.to_row());
        for (target, values) in hitters.targets.iter_mut() {
            values.push(target.outcome_value(outcome));
        }
    }

    let mut pitchers = TrainingTable::default();
    for target in TargetMetric::ALL {
        if target.role() == PlayerRole::Pitcher {
            pitchers.targets.insert(target, Vec::new());
        }
    }
    let min_milb_ip = f64::from(config.min_milb_outs) / 3.0;
    for vector in &features.pitchers {
        let Some(outcome) = outcomes.get(&vector.player_id) else {
            continue;
        };
        if vector.total_ip < min_milb_ip || outcome.outs_pitched < config.min_mlb_outs {
            continue;
        }
        pitchers.player_ids.push(vector.player_id);
        pitchers.rows.push(vector.to_row());
        for (target, values) in pitchers.targets.iter_mut() {
            values.push(target.outcome_value(outcome));
        }
    }

    log::info!(
        "Training set: {} hitter examples, {} pitcher examples",
        hitters.len(),
        pitchers.len()
    );

    TrainingSet { hitters, pitchers }
}

/// Deterministic train/validation split: every k-th example is held out.
/// Returns (train_rows, train_y, validation_rows, validation_y).
pub fn split_holdout(
    rows: &[Vec<f64>],
    y: &[f64],
    validation_every: usize,
) -> (Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>, Vec<f64>) {
    let mut train_rows = Vec::new();
    let mut train_y = Vec::new();
    let mut val_rows = Vec::new();
    let mut val_y = Vec::new();

    for (idx, (row, target)) in rows.iter().zip(y.iter()).enumerate() {
        if validation_every > 0 && idx % validation_every == 0 {
            val_rows.push(row.clone());
            val_y.push(*target);
        } else {
            train_rows.push(row.clone());
            train_y.push(*target);
        }
    }

    (train_rows, train_y, val_rows, val_y)
}
