//! Age-expectation curves
//!
//! Two independent adjustments: the absolute age curve (how much development
//! runway an age implies, peaking at a configured optimal age) and the
//! level-vs-age adjustment (how young a player is for the level they are
//! actually playing at). They combine multiplicatively.

use crate::config::{AgeConfig, AgeCurveParams};
use crate::types::PlayerRole;

/// Parametrized age→multiplier curve
#[derive(Debug, Clone, Copy)]
pub struct AgeCurve {
    params: AgeCurveParams,
}

impl AgeCurve {
    pub fn new(params: AgeCurveParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AgeCurveParams {
        &self.params
    }

    /// True when the player is past the hard cutoff and must be excluded
    /// from all output (not merely penalized).
    pub fn past_cutoff(&self, age: f64) -> bool {
        age > self.params.hard_cutoff_age
    }

    /// Developmental multiplier for an age.
    ///
    /// Gaussian-style decay about the optimal age keeps the curve unimodal;
    /// ages below the young-bonus threshold earn extra credit on top.
    pub fn multiplier(&self, age: f64) -> f64 {
        let distance = age - self.params.optimal_age;
        let base = (-self.params.age_sensitivity * distance * distance).exp();

        if age < self.params.young_bonus_threshold {
            base * self.params.young_bonus_multiplier
        } else {
            base
        }
    }
}

/// Adjustment for being young (or old) relative to the league at a level
#[derive(Debug, Clone, Copy)]
pub struct LevelVsAge {
    per_year: f64,
    floor: f64,
    ceiling: f64,
}

impl LevelVsAge {
    pub fn new(config: &AgeConfig) -> Self {
        Self {
            per_year: config.level_vs_age_per_year,
            floor: config.level_vs_age_floor,
            ceiling: config.level_vs_age_ceiling,
        }
    }

    /// Multiplier rewarding players younger than their level's average age.
    /// Unknown league age context is neutral.
    pub fn multiplier(&self, player_age: f64, league_mean_age: Option<f64>) -> f64 {
        match league_mean_age {
            Some(league_age) => {
                let years_young = league_age - player_age;
                (1.0 + years_young * self.per_year).clamp(self.floor, self.ceiling)
            }
            None => 1.0,
        }
    }
}

/// Both age adjustments for both roles, built once per run from config
#[derive(Debug, Clone, Copy)]
pub struct AgeModel {
    hitter: AgeCurve,
    pitcher: AgeCurve,
    level_vs_age: LevelVsAge,
}

impl AgeModel {
    pub fn new(config: &AgeConfig) -> Self {
        Self {
            hitter: AgeCurve::new(config.hitter),
            pitcher: AgeCurve::new(config.pitcher),
            level_vs_age: LevelVsAge::new(config),
        }
    }

    pub fn curve(&self, role: PlayerRole) -> &AgeCurve {
        match role {
            PlayerRole::Hitter => &self.hitter,
            PlayerRole::Pitcher => &self.pitcher,
        }
    }

    pub fn level_vs_age(&self) -> &LevelVsAge {
        &self.level_vs_age
    }

    /// Combined multiplicative age factor. Unknown player age is neutral.
    pub fn combined_factor(
        &self,
        role: PlayerRole,
        player_age: Option<f64>,
        league_mean_age: Option<f64>,
    ) -> f64 {
        match player_age {
            Some(age) => {
                self.curve(role).multiplier(age)
                    * self.level_vs_age.multiplier(age, league_mean_age)
            }
            None => 1.0,
        }
    }
}
