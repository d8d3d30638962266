//! Level-to-MLB translation
//!
//! Fixed per-level multiplicative factors approximate the fraction of MiLB
//! production retained at the majors. Hitters get an additional step-function
//! boost from advanced batted-ball data; pitchers translate through FIP.
//! Every translated metric is clamped to plausible bounds.

use crate::config::{StatcastStep, TranslationConfig};
use crate::record::StatcastSummary;
use crate::types::Level;
use serde::{Deserialize, Serialize};

/// Translated MLB-equivalent hitting metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TranslatedHitter {
    pub ops: f64,
    pub obp: f64,
    pub slg: f64,
    /// wRC+ estimate anchored to the MLB reference OPS
    pub wrc_plus: f64,
    /// The advanced-metric multiplier that was applied
    pub advanced_multiplier: f64,
}

/// Translated MLB-equivalent pitching metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TranslatedPitcher {
    pub fip: f64,
    pub era: f64,
}

/// Applies the configured translation factors and step functions
#[derive(Debug, Clone)]
pub struct TranslationModel {
    config: TranslationConfig,
}

/// Product of the bonuses for every threshold the value crosses
fn step_multiplier(steps: &[StatcastStep], value: f64) -> f64 {
    steps
        .iter()
        .filter(|step| value >= step.threshold)
        .map(|step| step.bonus)
        .product()
}

/// Product of the bonuses for every threshold the value stays under
fn inverse_step_multiplier(steps: &[StatcastStep], value: f64) -> f64 {
    steps
        .iter()
        .filter(|step| value <= step.threshold)
        .map(|step| step.bonus)
        .product()
}

impl TranslationModel {
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Multiplier earned from advanced batted-ball data. No data is neutral.
    pub fn advanced_multiplier(&self, statcast: Option<&StatcastSummary>) -> f64 {
        match statcast {
            Some(s) => {
                step_multiplier(&self.config.exit_velocity_steps, s.exit_velocity)
                    * step_multiplier(&self.config.hard_hit_steps, s.hard_hit_pct)
                    * step_multiplier(&self.config.barrel_steps, s.barrel_pct)
            }
            None => 1.0,
        }
    }

    /// Translate a hitter's slash rates at a level toward MLB equivalence
    pub fn translate_hitter(
        &self,
        obp: f64,
        slg: f64,
        level: Level,
        statcast: Option<&StatcastSummary>,
    ) -> TranslatedHitter {
        let level_factor = self.config.level_factor(level);
        let advanced = self.advanced_multiplier(statcast);

        let obp = (obp * level_factor * advanced).clamp(0.0, 0.600);
        let slg = (slg * level_factor * advanced).clamp(0.0, 0.900);
        let ops = (obp + slg).clamp(self.config.ops_min, self.config.ops_max);
        let wrc_plus = (100.0 * ops / self.config.mlb_reference_ops)
            .clamp(self.config.wrc_plus_min, self.config.wrc_plus_max);

        TranslatedHitter {
            ops,
            obp,
            slg,
            wrc_plus,
            advanced_multiplier: advanced,
        }
    }

    /// Translate a pitcher's raw MiLB FIP toward an MLB-equivalent FIP/ERA
    pub fn translate_pitcher(
        &self,
        raw_fip: f64,
        k_minus_bb_pct: f64,
        level: Level,
    ) -> TranslatedPitcher {
        let level_factor = self.config.level_factor(level);

        // Dividing by the retention factor inflates FIP; lower levels
        // project to worse MLB run prevention.
        let mut fip = if level_factor > 0.0 {
            raw_fip / level_factor
        } else {
            raw_fip
        };
        // Command/dominance and raw quality gates each shave the projection
        fip *= step_multiplier(&self.config.k_minus_bb_steps, k_minus_bb_pct);
        fip *= inverse_step_multiplier(&self.config.fip_quality_steps, raw_fip);
        let fip = fip.clamp(self.config.fip_min, self.config.fip_max);
        let era = (fip + self.config.era_fip_gap).clamp(self.config.fip_min, self.config.fip_max);

        TranslatedPitcher { fip, era }
    }
}
