//! Context feature engineering
//!
//! Joins raw records with the factor tables and age curves, aggregates to
//! per-(player, level) rows and pivots into the wide per-player vectors the
//! regressor and scorer consume.

pub mod context;
pub mod vector;

pub use context::{ContextBuilder, HitterContextRow, PitcherContextRow, SeasonLevelLine};
pub use vector::{
    HitterFeatureVector, HitterLevelBlock, PitcherFeatureVector, PitcherLevelBlock,
};

use crate::config::PipelineConfig;
use crate::factors::age_curve::AgeModel;
use crate::factors::{LeagueFactor, PositionFactor};
use crate::record::{PlayerInfo, RawGameRecord};
use crate::types::{Level, PlayerId, PositionGroup, Season};
use hashbrown::HashMap;
use rayon::prelude::*;

/// All feature vectors for one run
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub hitters: Vec<HitterFeatureVector>,
    pub pitchers: Vec<PitcherFeatureVector>,
}

impl FeatureSet {
    pub fn hitter(&self, player_id: PlayerId) -> Option<&HitterFeatureVector> {
        self.hitters.iter().find(|v| v.player_id == player_id)
    }

    pub fn pitcher(&self, player_id: PlayerId) -> Option<&PitcherFeatureVector> {
        self.pitchers.iter().find(|v| v.player_id == player_id)
    }
}

/// Builds the full feature set for a snapshot
pub struct ContextFeatureEngine<'a> {
    config: &'a PipelineConfig,
    age_model: AgeModel,
}

impl<'a> ContextFeatureEngine<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            age_model: AgeModel::new(&config.age),
        }
    }

    /// Derive context rows for every player-season-level line and pivot
    /// them into one wide vector per player per role. Players with both
    /// batting and pitching lines get a vector of each kind.
    pub fn build(
        &self,
        games: &[RawGameRecord],
        players: &HashMap<PlayerId, PlayerInfo>,
        league: &HashMap<(Season, Level), LeagueFactor>,
        position: &HashMap<(Season, Level, PositionGroup), PositionFactor>,
    ) -> FeatureSet {
        let lines = context::aggregate_season_levels(games, players);
        let builder = ContextBuilder {
            league,
            position,
            age_model: &self.age_model,
            age_config: &self.config.age,
            translation: &self.config.translation,
        };

        // Lines are independent; derive both row kinds in parallel
        let rows: Vec<(Option<HitterContextRow>, Option<PitcherContextRow>)> = lines
            .par_iter()
            .map(|line| {
                let group = players
                    .get(&line.player_id)
                    .and_then(|p| PositionGroup::from_label(&p.position));
                (builder.hitter_row(line, group), builder.pitcher_row(line))
            })
            .collect();

        let mut hitter_rows: Vec<HitterContextRow> = Vec::new();
        let mut pitcher_rows: Vec<PitcherContextRow> = Vec::new();
        for (hitter, pitcher) in rows {
            if let Some(row) = hitter {
                hitter_rows.push(row);
            }
            if let Some(row) = pitcher {
                pitcher_rows.push(row);
            }
        }

        let mut by_hitter: HashMap<PlayerId, Vec<&HitterContextRow>> = HashMap::new();
        for row in &hitter_rows {
            by_hitter.entry(row.player_id).or_default().push(row);
        }
        let mut by_pitcher: HashMap<PlayerId, Vec<&PitcherContextRow>> = HashMap::new();
        for row in &pitcher_rows {
            by_pitcher.entry(row.player_id).or_default().push(row);
        }

        let mut hitter_ids: Vec<PlayerId> = by_hitter.keys().copied().collect();
        hitter_ids.sort_unstable();
        let mut pitcher_ids: Vec<PlayerId> = by_pitcher.keys().copied().collect();
        pitcher_ids.sort_unstable();

        let hitters: Vec<HitterFeatureVector> = hitter_ids
            .par_iter()
            .map(|id| vector::pivot_hitter(*id, &by_hitter[id]))
            .collect();
        let pitchers: Vec<PitcherFeatureVector> = pitcher_ids
            .par_iter()
            .map(|id| vector::pivot_pitcher(*id, &by_pitcher[id]))
            .collect();

        log::info!(
            "Built feature vectors for {} hitters and {} pitchers from {} season-level lines",
            hitters.len(),
            pitchers.len(),
            lines.len()
        );

        FeatureSet { hitters, pitchers }
    }
}
