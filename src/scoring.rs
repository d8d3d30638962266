//! Composite scoring
//!
//! Merges predicted metrics with age, level, position-sample and reliability
//! context into one cross-type score. Hitters and pitchers land on the same
//! 0-100+-centered scale so a single ranked pool can hold both.

use crate::config::{EligibilityConfig, ScoringConfig};
use crate::factors::age_curve::AgeModel;
use crate::features::{HitterFeatureVector, PitcherFeatureVector};
use crate::model::regressor::Predictions;
use crate::record::{MlbOutcome, StatcastSummary};
use crate::translation::TranslationModel;
use crate::types::{PlayerId, PlayerRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiplicative components behind one composite score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub base_score: f64,
    pub combined_age_factor: f64,
    pub level_quality_factor: f64,
    pub sample_reliability_factor: f64,
    pub advanced_metric_bonus: f64,
    pub performance_quality: f64,
}

/// One scored candidate prospect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredProspect {
    pub player_id: PlayerId,
    pub role: PlayerRole,
    pub composite_score: f64,
    pub predicted_metrics: BTreeMap<String, f64>,
    pub components: ScoreComponents,
}

/// Everything known about one candidate at scoring time
pub struct Candidate<'a> {
    pub current_age: Option<f64>,
    pub mlb: Option<&'a MlbOutcome>,
    pub statcast: Option<&'a StatcastSummary>,
}

/// Applies the composite-score formula to candidate prospects
pub struct CompositeScorer<'a> {
    config: &'a ScoringConfig,
    eligibility: &'a EligibilityConfig,
    age_model: &'a AgeModel,
    translation: &'a TranslationModel,
}

impl<'a> CompositeScorer<'a> {
    pub fn new(
        config: &'a ScoringConfig,
        eligibility: &'a EligibilityConfig,
        age_model: &'a AgeModel,
        translation: &'a TranslationModel,
    ) -> Self {
        Self {
            config,
            eligibility,
            age_model,
            translation,
        }
    }

    fn reliability(&self, sample: f64, reference: f64) -> f64 {
        (sample / reference).clamp(0.5, 1.0)
    }

    fn combined_age_factor(
        &self,
        role: PlayerRole,
        current_age: Option<f64>,
        age_at_highest: Option<f64>,
        age_vs_league_at_highest: f64,
    ) -> f64 {
        let curve = match current_age {
            Some(age) => self.age_model.curve(role).multiplier(age),
            None => 1.0,
        };
        // The level-vs-age credit is measured at the level actually played
        let league_mean = age_at_highest.map(|age| age - age_vs_league_at_highest);
        let level_vs_age = match age_at_highest {
            Some(age) => self.age_model.level_vs_age().multiplier(age, league_mean),
            None => 1.0,
        };
        curve * level_vs_age
    }

    /// Score a hitter, or None when the candidate gates exclude them
    pub fn score_hitter(
        &self,
        vector: &HitterFeatureVector,
        predicted: Option<&BTreeMap<String, f64>>,
        candidate: &Candidate,
    ) -> Option<ScoredProspect> {
        if let Some(age) = candidate.current_age {
            if self.age_model.curve(PlayerRole::Hitter).past_cutoff(age) {
                return None;
            }
        }
        if vector.total_pa < f64::from(self.eligibility.min_milb_pa) {
            return None;
        }
        if candidate.mlb.map_or(0, |o| o.ab) >= self.eligibility.max_mlb_ab {
            return None;
        }
        let highest = vector.highest_level?;

        // Translation from the highest level played supplements (never
        // overrides) the regressor's view
        let top_block = highest
            .pivot_index()
            .map(|idx| vector.levels[idx])
            .unwrap_or_default();
        let translated = self.translation.translate_hitter(
            top_block.obp,
            top_block.slg,
            highest,
            candidate.statcast,
        );

        let mut metrics = predicted.cloned().unwrap_or_default();
        metrics.insert("translated_ops".to_string(), translated.ops);
        metrics.insert("translated_wrc_plus".to_string(), translated.wrc_plus);

        // Base blend over whichever targets fitted this run, renormalized;
        // translated estimates stand in for wRC+/OPS when those are absent
        let mut weighted = 0.0;
        let mut weight = 0.0;
        let wrc = metrics.get("wrc_plus").copied().unwrap_or(translated.wrc_plus);
        weighted += self.config.wrc_plus_weight * wrc;
        weight += self.config.wrc_plus_weight;
        let ops = metrics.get("ops").copied().unwrap_or(translated.ops);
        weighted += self.config.ops_weight * ops * 100.0;
        weight += self.config.ops_weight;
        if let Some(woba) = metrics.get("woba") {
            weighted += self.config.woba_weight * woba * 200.0;
            weight += self.config.woba_weight;
        }
        let base_score = weighted / weight;

        let combined_age_factor = self.combined_age_factor(
            PlayerRole::Hitter,
            candidate.current_age,
            vector.age_at_highest,
            vector.age_vs_league_at_highest,
        );
        let level_quality_factor = self.config.level_quality(highest);
        let sample_reliability_factor =
            self.reliability(vector.total_pa, self.config.reliability_reference_pa);
        let advanced_metric_bonus = self.translation.advanced_multiplier(candidate.statcast);
        let performance_quality = (vector.mean_ops_vs_league - 1.0).clamp(-0.5, 0.5);

        let composite_score = base_score
            * combined_age_factor
            * level_quality_factor
            * sample_reliability_factor
            * advanced_metric_bonus
            * (1.0 + performance_quality * self.config.performance_quality_weight);

        Some(ScoredProspect {
            player_id: vector.player_id,
            role: PlayerRole::Hitter,
            composite_score,
            predicted_metrics: metrics,
            components: ScoreComponents {
                base_score,
                combined_age_factor,
                level_quality_factor,
                sample_reliability_factor,
                advanced_metric_bonus,
                performance_quality,
            },
        })
    }

    /// Score a pitcher, or None when the candidate gates exclude them
    pub fn score_pitcher(
        &self,
        vector: &PitcherFeatureVector,
        predicted: Option<&BTreeMap<String, f64>>,
        candidate: &Candidate,
    ) -> Option<ScoredProspect> {
        if let Some(age) = candidate.current_age {
            if self.age_model.curve(PlayerRole::Pitcher).past_cutoff(age) {
                return None;
            }
        }
        let min_ip = f64::from(self.eligibility.min_milb_outs) / 3.0;
        if vector.total_ip < min_ip {
            return None;
        }
        if candidate.mlb.map_or(0, |o| o.outs_pitched) >= self.eligibility.max_mlb_outs {
            return None;
        }
        let highest = vector.highest_level?;

        let top_block = highest
            .pivot_index()
            .map(|idx| vector.levels[idx])
            .unwrap_or_default();
        let translated =
            self.translation
                .translate_pitcher(top_block.fip, top_block.k_minus_bb_pct, highest);

        let mut metrics = predicted.cloned().unwrap_or_default();
        metrics.insert("translated_fip".to_string(), translated.fip);
        metrics.insert("translated_era".to_string(), translated.era);
        if !metrics.contains_key("era") {
            // ERA tracks predicted FIP with the configured gap
            if let Some(fip) = metrics.get("fip").copied() {
                metrics.insert(
                    "era".to_string(),
                    fip + self.translation.config().era_fip_gap,
                );
            }
        }

        let fip = metrics.get("fip").copied().unwrap_or(translated.fip);
        let base_score = self.config.pitcher_base_center
            + (self.config.pitcher_reference_fip - fip) * self.config.pitcher_fip_scale;
        let base_score = base_score.max(0.0);

        let combined_age_factor = self.combined_age_factor(
            PlayerRole::Pitcher,
            candidate.current_age,
            vector.age_at_highest,
            vector.age_vs_league_at_highest,
        );
        let level_quality_factor = self.config.level_quality(highest);
        let sample_reliability_factor = self.reliability(
            vector.total_ip * 3.0,
            self.config.reliability_reference_outs,
        );
        // Batted-ball boosts are a hitter concern; pitcher dominance is
        // already credited through the K-BB% translation steps
        let advanced_metric_bonus = 1.0;
        let performance_quality = (vector.mean_fip_vs_league - 1.0).clamp(-0.5, 0.5);

        let composite_score = base_score
            * combined_age_factor
            * level_quality_factor
            * sample_reliability_factor
            * advanced_metric_bonus
            * (1.0 + performance_quality * self.config.performance_quality_weight);

        Some(ScoredProspect {
            player_id: vector.player_id,
            role: PlayerRole::Pitcher,
            composite_score,
            predicted_metrics: metrics,
            components: ScoreComponents {
                base_score,
                combined_age_factor,
                level_quality_factor,
                sample_reliability_factor,
                advanced_metric_bonus,
                performance_quality,
            },
        })
    }
}

/// Per-player context tables consumed by `score_all`
pub struct ScoringInputs<'a> {
    pub predictions: &'a Predictions,
    /// Current age (at the as-of date) where the birth date is known
    pub current_ages: &'a hashbrown::HashMap<PlayerId, f64>,
    pub mlb_outcomes: &'a hashbrown::HashMap<PlayerId, MlbOutcome>,
    pub statcast: &'a hashbrown::HashMap<PlayerId, StatcastSummary>,
}

impl ScoringInputs<'_> {
    fn candidate(&self, player_id: PlayerId) -> Candidate<'_> {
        Candidate {
            current_age: self.current_ages.get(&player_id).copied(),
            mlb: self.mlb_outcomes.get(&player_id),
            statcast: self.statcast.get(&player_id),
        }
    }
}

/// Score every candidate in a feature set. Two-way players keep whichever
/// of their two evaluations scores higher.
pub fn score_all(
    scorer: &CompositeScorer,
    features: &crate::features::FeatureSet,
    inputs: &ScoringInputs,
) -> Vec<ScoredProspect> {
    let mut best: BTreeMap<PlayerId, ScoredProspect> = BTreeMap::new();
    let mut keep_better = |scored: ScoredProspect| match best.get(&scored.player_id) {
        Some(existing) if existing.composite_score >= scored.composite_score => {}
        _ => {
            best.insert(scored.player_id, scored);
        }
    };

    for vector in &features.hitters {
        let candidate = inputs.candidate(vector.player_id);
        let predicted = inputs.predictions.get(&vector.player_id);
        if let Some(scored) = scorer.score_hitter(vector, predicted, &candidate) {
            keep_better(scored);
        }
    }
    for vector in &features.pitchers {
        let candidate = inputs.candidate(vector.player_id);
        let predicted = inputs.predictions.get(&vector.player_id);
        if let Some(scored) = scorer.score_pitcher(vector, predicted, &candidate) {
            keep_better(scored);
        }
    }

    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgeConfig, EligibilityConfig, ScoringConfig, TranslationConfig};
    use crate::features::{FeatureSet, HitterLevelBlock, PitcherLevelBlock};
    use crate::types::Level;
    use hashbrown::HashMap;

    fn hitter_vector(player_id: PlayerId, total_pa: f64) -> HitterFeatureVector {
        let mut block = HitterLevelBlock::default();
        block.pa = total_pa;
        block.obp = 0.350;
        block.slg = 0.450;
        block.ops = 0.800;
        block.ops_vs_league = 1.1;
        HitterFeatureVector {
            player_id,
            levels: [
                HitterLevelBlock::default(),
                block,
                HitterLevelBlock::default(),
                HitterLevelBlock::default(),
            ],
            total_pa,
            highest_level_ordinal: 4.0,
            highest_level: Some(Level::DoubleA),
            weighted_cross_level: 0.33,
            mean_ops_vs_league: 1.1,
            age_at_highest: Some(21.0),
            age_vs_league_at_highest: -1.5,
        }
    }

    fn pitcher_vector(player_id: PlayerId, total_ip: f64) -> PitcherFeatureVector {
        let mut block = PitcherLevelBlock::default();
        block.ip = total_ip;
        block.fip = 3.60;
        block.k_minus_bb_pct = 0.16;
        block.fip_vs_league = 1.1;
        PitcherFeatureVector {
            player_id,
            levels: [
                PitcherLevelBlock::default(),
                block,
                PitcherLevelBlock::default(),
                PitcherLevelBlock::default(),
            ],
            total_ip,
            highest_level_ordinal: 4.0,
            highest_level: Some(Level::DoubleA),
            weighted_cross_level: 0.33,
            mean_fip_vs_league: 1.1,
            age_at_highest: Some(22.0),
            age_vs_league_at_highest: -1.0,
        }
    }

    struct Fixture {
        scoring: ScoringConfig,
        eligibility: EligibilityConfig,
        age_model: AgeModel,
        translation: TranslationModel,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scoring: ScoringConfig::default(),
                eligibility: EligibilityConfig::default(),
                age_model: AgeModel::new(&AgeConfig::default()),
                translation: TranslationModel::new(TranslationConfig::default()),
            }
        }

        fn scorer(&self) -> CompositeScorer<'_> {
            CompositeScorer::new(
                &self.scoring,
                &self.eligibility,
                &self.age_model,
                &self.translation,
            )
        }
    }

    fn predicted_hitter() -> BTreeMap<String, f64> {
        let mut m = BTreeMap::new();
        m.insert("wrc_plus".to_string(), 110.0);
        m.insert("ops".to_string(), 0.780);
        m.insert("woba".to_string(), 0.335);
        m
    }

    fn candidate(age: Option<f64>) -> Candidate<'static> {
        Candidate {
            current_age: age,
            mlb: None,
            statcast: None,
        }
    }

    #[test]
    fn test_base_score_matches_blend() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let vector = hitter_vector(1, 400.0);
        let scored = scorer
            .score_hitter(&vector, Some(&predicted_hitter()), &candidate(Some(21.0)))
            .unwrap();

        let expected = 0.4 * 110.0 + 0.3 * 0.780 * 100.0 + 0.3 * 0.335 * 200.0;
        assert!((scored.components.base_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_younger_identical_player_scores_higher() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let vector = hitter_vector(1, 400.0);
        let predicted = predicted_hitter();

        let young = scorer
            .score_hitter(&vector, Some(&predicted), &candidate(Some(21.0)))
            .unwrap();
        let old = scorer
            .score_hitter(&vector, Some(&predicted), &candidate(Some(25.0)))
            .unwrap();

        assert!(young.components.combined_age_factor > old.components.combined_age_factor);
        assert!(young.composite_score > old.composite_score);
    }

    #[test]
    fn test_past_cutoff_is_excluded_entirely() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let vector = hitter_vector(1, 400.0);
        assert!(scorer
            .score_hitter(&vector, Some(&predicted_hitter()), &candidate(Some(35.0)))
            .is_none());
    }

    #[test]
    fn test_thin_milb_sample_is_excluded() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let vector = hitter_vector(1, 49.0);
        assert!(scorer
            .score_hitter(&vector, Some(&predicted_hitter()), &candidate(Some(21.0)))
            .is_none());
    }

    #[test]
    fn test_mlb_veteran_is_excluded() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let vector = hitter_vector(1, 400.0);
        let mlb = MlbOutcome {
            player_id: 1,
            pa: 200,
            ab: 180,
            outs_pitched: 0,
            wrc_plus: 95.0,
            woba: 0.310,
            ops: 0.700,
            era: 0.0,
            fip: 0.0,
        };
        let c = Candidate {
            current_age: Some(24.0),
            mlb: Some(&mlb),
            statcast: None,
        };
        assert!(scorer
            .score_hitter(&vector, Some(&predicted_hitter()), &c)
            .is_none());
    }

    #[test]
    fn test_reliability_clamps_to_half() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let thin = scorer
            .score_hitter(&hitter_vector(1, 60.0), Some(&predicted_hitter()), &candidate(Some(21.0)))
            .unwrap();
        let full = scorer
            .score_hitter(&hitter_vector(2, 800.0), Some(&predicted_hitter()), &candidate(Some(21.0)))
            .unwrap();

        assert_eq!(thin.components.sample_reliability_factor, 0.5);
        assert_eq!(full.components.sample_reliability_factor, 1.0);
    }

    #[test]
    fn test_hitters_and_pitchers_on_comparable_scales() {
        let f = Fixture::new();
        let scorer = f.scorer();

        let hitter = scorer
            .score_hitter(&hitter_vector(1, 400.0), Some(&predicted_hitter()), &candidate(Some(21.5)))
            .unwrap();

        let mut pitcher_predicted = BTreeMap::new();
        pitcher_predicted.insert("fip".to_string(), 3.90);
        let pitcher = scorer
            .score_pitcher(&pitcher_vector(2, 130.0), Some(&pitcher_predicted), &candidate(Some(22.5)))
            .unwrap();

        // Both scores live on the same order of magnitude
        let ratio = hitter.composite_score / pitcher.composite_score;
        assert!(ratio > 0.4 && ratio < 2.5, "ratio = {}", ratio);
    }

    #[test]
    fn test_missing_predictions_fall_back_to_translation() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let scored = scorer
            .score_hitter(&hitter_vector(1, 400.0), None, &candidate(Some(21.0)))
            .unwrap();

        assert!(scored.components.base_score > 0.0);
        assert!(scored.predicted_metrics.contains_key("translated_ops"));
        assert!(!scored.predicted_metrics.contains_key("woba"));
    }

    #[test]
    fn test_two_way_player_appears_once() {
        let f = Fixture::new();
        let scorer = f.scorer();
        let features = FeatureSet {
            hitters: vec![hitter_vector(7, 400.0)],
            pitchers: vec![pitcher_vector(7, 130.0)],
        };
        let predictions = Predictions::default();
        let ages: HashMap<PlayerId, f64> = [(7, 21.5)].into();
        let mlb = HashMap::new();
        let statcast = HashMap::new();
        let inputs = ScoringInputs {
            predictions: &predictions,
            current_ages: &ages,
            mlb_outcomes: &mlb,
            statcast: &statcast,
        };

        let scored = score_all(&scorer, &features, &inputs);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].player_id, 7);
    }
}
