//! Pipeline configuration
//!
//! Every calibration knob the pipeline uses lives here as a named value with
//! a `Default` carrying the tuned constants. Components receive their config
//! by injection; nothing reads tuning values from inline literals.

use crate::types::Level;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters of one age-expectation curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgeCurveParams {
    /// Age at which developmental expectation peaks
    pub optimal_age: f64,
    /// Decay steepness away from the optimal age
    pub age_sensitivity: f64,
    /// Players older than this are excluded from output entirely
    pub hard_cutoff_age: f64,
    /// Ages below this earn the young bonus
    pub young_bonus_threshold: f64,
    /// Multiplier applied below the young-bonus threshold
    pub young_bonus_multiplier: f64,
}

impl AgeCurveParams {
    /// Hitter curve: earlier peak, steeper decay
    pub fn hitter() -> Self {
        Self {
            optimal_age: 21.5,
            age_sensitivity: 0.15,
            hard_cutoff_age: 26.5,
            young_bonus_threshold: 20.0,
            young_bonus_multiplier: 1.10,
        }
    }

    /// Pitcher curve: later peak, gentler decay, smaller young bonus
    pub fn pitcher() -> Self {
        Self {
            optimal_age: 22.5,
            age_sensitivity: 0.10,
            hard_cutoff_age: 27.0,
            young_bonus_threshold: 21.0,
            young_bonus_multiplier: 1.06,
        }
    }
}

/// Hitter and pitcher age curves plus the level-vs-age adjustment
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeConfig {
    pub hitter: AgeCurveParams,
    pub pitcher: AgeCurveParams,
    /// Rate adjustment per year of age relative to the league (a player one
    /// year younger than the league gets rates credited by this fraction)
    pub rate_adjust_per_year: f64,
    /// Multiplier gained per year younger than the league average at the level
    pub level_vs_age_per_year: f64,
    /// Bounds on the level-vs-age multiplier
    pub level_vs_age_floor: f64,
    pub level_vs_age_ceiling: f64,
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            hitter: AgeCurveParams::hitter(),
            pitcher: AgeCurveParams::pitcher(),
            rate_adjust_per_year: 0.02,
            level_vs_age_per_year: 0.05,
            level_vs_age_floor: 0.80,
            level_vs_age_ceiling: 1.30,
        }
    }
}

/// One threshold crossing of the advanced-metric step function
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatcastStep {
    pub threshold: f64,
    pub bonus: f64,
}

/// MiLB-to-MLB translation factors and step functions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Fraction of production retained at MLB, per level
    pub aaa_factor: f64,
    pub aa_factor: f64,
    pub high_a_factor: f64,
    pub single_a_factor: f64,
    pub rookie_factor: f64,
    /// Exit-velocity threshold steps (mph)
    pub exit_velocity_steps: Vec<StatcastStep>,
    /// Hard-hit rate threshold steps (0..1)
    pub hard_hit_steps: Vec<StatcastStep>,
    /// Barrel rate threshold steps (0..1)
    pub barrel_steps: Vec<StatcastStep>,
    /// FIP constant aligning FIP with league ERA
    pub fip_constant: f64,
    /// Expected gap between a pitcher's ERA and FIP
    pub era_fip_gap: f64,
    /// K-BB% steps adjusting predicted pitching (multiplier on FIP, <1 helps)
    pub k_minus_bb_steps: Vec<StatcastStep>,
    /// Raw-FIP quality gates: predicted FIP shrinks when raw FIP beats these
    pub fip_quality_steps: Vec<StatcastStep>,
    /// League-average MLB OPS anchoring the wRC+ estimate
    pub mlb_reference_ops: f64,
    /// Plausibility clamps for translated metrics
    pub wrc_plus_min: f64,
    pub wrc_plus_max: f64,
    pub ops_min: f64,
    pub ops_max: f64,
    pub fip_min: f64,
    pub fip_max: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            aaa_factor: 0.91,
            aa_factor: 0.815,
            high_a_factor: 0.71,
            single_a_factor: 0.61,
            rookie_factor: 0.50,
            exit_velocity_steps: vec![
                StatcastStep { threshold: 90.0, bonus: 1.05 },
                StatcastStep { threshold: 93.0, bonus: 1.05 },
            ],
            hard_hit_steps: vec![StatcastStep { threshold: 0.40, bonus: 1.07 }],
            barrel_steps: vec![StatcastStep { threshold: 0.10, bonus: 1.10 }],
            fip_constant: 3.20,
            era_fip_gap: 0.30,
            k_minus_bb_steps: vec![
                StatcastStep { threshold: 0.15, bonus: 0.95 },
                StatcastStep { threshold: 0.22, bonus: 0.95 },
            ],
            fip_quality_steps: vec![StatcastStep { threshold: 3.50, bonus: 0.96 }],
            mlb_reference_ops: 0.730,
            wrc_plus_min: 40.0,
            wrc_plus_max: 160.0,
            ops_min: 0.300,
            ops_max: 1.400,
            fip_min: 1.50,
            fip_max: 9.00,
        }
    }
}

impl TranslationConfig {
    /// Translation factor for a level
    pub fn level_factor(&self, level: Level) -> f64 {
        match level {
            Level::TripleA => self.aaa_factor,
            Level::DoubleA => self.aa_factor,
            Level::HighA => self.high_a_factor,
            Level::SingleA => self.single_a_factor,
            Level::Rookie => self.rookie_factor,
        }
    }
}

/// Training-set membership thresholds and forest hyperparameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Minimum MiLB plate appearances for a hitter training example
    pub min_milb_pa: u32,
    /// Minimum MLB plate appearances establishing a hitter outcome
    pub min_mlb_pa: u32,
    /// Minimum MiLB outs pitched for a pitcher training example
    pub min_milb_outs: u32,
    /// Minimum MLB outs pitched establishing a pitcher outcome
    pub min_mlb_outs: u32,
    /// Every k-th example is held out for validation (0 disables the split)
    pub validation_every: usize,
    pub n_trees: u16,
    pub max_depth: u16,
    pub min_samples_leaf: usize,
    /// Fixed seed keeping fits reproducible
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_milb_pa: 400,
            min_mlb_pa: 200,
            min_milb_outs: 360,  // 120 IP
            min_mlb_outs: 240,   // 80 IP
            validation_every: 5, // 20% held out
            n_trees: 200,
            max_depth: 8,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Candidate-pool gates for the final ranking
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Rookie-status ceiling: at or above this many MLB at-bats a hitter
    /// is no longer a prospect
    pub max_mlb_ab: u32,
    /// Rookie-status ceiling for pitchers, in outs (50 IP)
    pub max_mlb_outs: u32,
    /// Minimum MiLB plate appearances to be ranked
    pub min_milb_pa: u32,
    /// Minimum MiLB outs pitched to be ranked (20 IP)
    pub min_milb_outs: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            max_mlb_ab: 130,
            max_mlb_outs: 150,
            min_milb_pa: 50,
            min_milb_outs: 60,
        }
    }
}

/// Composite-score blend weights and shape factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Hitter base blend: wRC+, OPS (x100) and wOBA (x200) weights
    pub wrc_plus_weight: f64,
    pub ops_weight: f64,
    pub woba_weight: f64,
    /// Pitcher base: center + scale mapping predicted FIP onto the
    /// hitter-comparable 0-100+ scale
    pub pitcher_reference_fip: f64,
    pub pitcher_base_center: f64,
    pub pitcher_fip_scale: f64,
    /// Level-quality multiplier by highest level reached
    pub aaa_quality: f64,
    pub aa_quality: f64,
    pub high_a_quality: f64,
    pub single_a_quality: f64,
    pub rookie_quality: f64,
    /// Sample size at which reliability saturates (PA for hitters)
    pub reliability_reference_pa: f64,
    /// Sample size at which reliability saturates (outs for pitchers)
    pub reliability_reference_outs: f64,
    /// Weight on the performance-quality term
    pub performance_quality_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            wrc_plus_weight: 0.4,
            ops_weight: 0.3,
            woba_weight: 0.3,
            pitcher_reference_fip: 4.20,
            pitcher_base_center: 82.0,
            pitcher_fip_scale: 35.0,
            aaa_quality: 1.15,
            aa_quality: 1.08,
            high_a_quality: 1.00,
            single_a_quality: 0.95,
            rookie_quality: 0.90,
            reliability_reference_pa: 400.0,
            reliability_reference_outs: 360.0,
            performance_quality_weight: 0.25,
        }
    }
}

impl ScoringConfig {
    /// Level-quality factor for the highest level a player reached
    pub fn level_quality(&self, level: Level) -> f64 {
        match level {
            Level::TripleA => self.aaa_quality,
            Level::DoubleA => self.aa_quality,
            Level::HighA => self.high_a_quality,
            Level::SingleA => self.single_a_quality,
            Level::Rookie => self.rookie_quality,
        }
    }
}

/// Retry policy for bulk store reads
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

/// Minimum cohort plate appearances for a position factor row
pub const POSITION_COHORT_MIN_PA: u32 = 50;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub age: AgeConfig,
    pub translation: TranslationConfig,
    pub training: TrainingConfig,
    pub eligibility: EligibilityConfig,
    pub scoring: ScoringConfig,
    pub store: StoreConfig,
    /// Reference date for current ages. None derives the day after the
    /// latest game date in the snapshot, keeping frozen snapshots
    /// reproducible.
    pub as_of: Option<NaiveDate>,
}
