//! Position factor calculation
//!
//! Same shape as the league table, restricted to a position-group cohort.
//! Pitchers never enter this table; they are evaluated on pitching-specific
//! features. Cohorts under the reliability floor are dropped entirely, and
//! downstream code treats a missing cohort as a neutral 1.0 adjustment.

use crate::config::POSITION_COHORT_MIN_PA;
use crate::record::{BattingLine, PlayerInfo, RawGameRecord};
use crate::types::{Level, PlayerId, PositionGroup, Season};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Aggregate batting rates for one (season, level, position-group) cohort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionFactor {
    pub season: Season,
    pub level: Level,
    pub group: PositionGroup,
    pub total_pa: u64,
    pub total_ab: u64,
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub iso: f64,
    pub bb_pct: f64,
    pub k_pct: f64,
    pub hr_pct: f64,
    pub sb_pct: f64,
    pub sb_success_pct: f64,
}

/// Computes the position factor table from raw game records
#[derive(Debug, Clone, Default)]
pub struct PositionFactorCalculator;

impl PositionFactorCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute cohort rows, dropping any cohort under the PA floor.
    ///
    /// The position group comes from the per-game label, falling back to the
    /// player's canonical position when the game label doesn't map.
    pub fn calculate(
        &self,
        games: &[RawGameRecord],
        players: &HashMap<PlayerId, PlayerInfo>,
    ) -> HashMap<(Season, Level, PositionGroup), PositionFactor> {
        let mut groups: HashMap<(Season, Level, PositionGroup), Vec<&BattingLine>> = HashMap::new();

        for record in games {
            let Some(line) = &record.batting else {
                continue;
            };
            if PositionGroup::is_pitcher_label(&record.position) {
                continue;
            }
            let group = PositionGroup::from_label(&record.position).or_else(|| {
                players
                    .get(&record.player_id)
                    .and_then(|p| PositionGroup::from_label(&p.position))
            });
            let Some(group) = group else {
                log::debug!(
                    "Player {} has unmapped position '{}'; skipping for position factors",
                    record.player_id,
                    record.position
                );
                continue;
            };

            groups
                .entry((record.season, record.level, group))
                .or_default()
                .push(line);
        }

        let groups: Vec<((Season, Level, PositionGroup), Vec<&BattingLine>)> =
            groups.into_iter().collect();
        groups
            .into_par_iter()
            .filter_map(|((season, level, group), lines)| {
                let mut totals = BattingLine::default();
                for line in lines {
                    totals.add(line);
                }
                if totals.pa < POSITION_COHORT_MIN_PA {
                    return None;
                }
                Some((
                    (season, level, group),
                    PositionFactor {
                        season,
                        level,
                        group,
                        total_pa: u64::from(totals.pa),
                        total_ab: u64::from(totals.ab),
                        avg: totals.avg(),
                        obp: totals.obp(),
                        slg: totals.slg(),
                        ops: totals.ops(),
                        iso: totals.iso(),
                        bb_pct: totals.bb_pct(),
                        k_pct: totals.k_pct(),
                        hr_pct: totals.hr_pct(),
                        sb_pct: totals.sb_pct(),
                        sb_success_pct: totals.sb_success_pct(),
                    },
                ))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }
}
