//! League factor calculation
//!
//! One factor row per (season, level): the run environment a prospect's raw
//! line is measured against. Performance aggregates include every player;
//! the age distribution only includes players with a known birth date.

use crate::record::{age_between, BattingLine, PitchingLine, PlayerInfo, RawGameRecord};
use crate::types::{safe_div, Level, PlayerId, Season};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Age distribution of a league cohort (players with known birth dates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeDistribution {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p75: f64,
    /// Number of players contributing ages
    pub players: usize,
}

impl AgeDistribution {
    /// Build from one age per player. Returns None for an empty cohort.
    pub fn from_ages(mut ages: Vec<f64>) -> Option<Self> {
        if ages.is_empty() {
            return None;
        }
        let data = Data::new(ages.clone());
        let mean = data.mean().unwrap_or(0.0);
        let std_dev = data.std_dev().unwrap_or(0.0);

        ages.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            mean,
            median: percentile_sorted(&ages, 0.50),
            std_dev,
            p25: percentile_sorted(&ages, 0.25),
            p75: percentile_sorted(&ages, 0.75),
            players: ages.len(),
        })
    }
}

/// Nearest-rank percentile over a pre-sorted slice
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx]
}

/// Aggregate run environment for one (season, level)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueFactor {
    pub season: Season,
    pub level: Level,
    // Batting environment
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
    // Pitching environment
    pub total_outs: u64,
    pub era: f64,
    pub fip: f64,
    pub whip: f64,
    pub k9: f64,
    pub bb9: f64,
    // Age context
    pub ages: Option<AgeDistribution>,
}

/// Computes the league factor table from raw game records
#[derive(Debug, Clone)]
pub struct LeagueFactorCalculator {
    fip_constant: f64,
}

impl LeagueFactorCalculator {
    pub fn new(fip_constant: f64) -> Self {
        Self { fip_constant }
    }

    /// Compute one factor row per (season, level) present in the records.
    /// Groups are independent, so they are computed in parallel.
    pub fn calculate(
        &self,
        games: &[RawGameRecord],
        players: &HashMap<PlayerId, PlayerInfo>,
    ) -> HashMap<(Season, Level), LeagueFactor> {
        let mut groups: HashMap<(Season, Level), Vec<&RawGameRecord>> = HashMap::new();
        for record in games {
            groups
                .entry((record.season, record.level))
                .or_default()
                .push(record);
        }

        let groups: Vec<((Season, Level), Vec<&RawGameRecord>)> = groups.into_iter().collect();
        groups
            .par_iter()
            .map(|(key, records)| (*key, self.calculate_group(key.0, key.1, records, players)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    fn calculate_group(
        &self,
        season: Season,
        level: Level,
        records: &[&RawGameRecord],
        players: &HashMap<PlayerId, PlayerInfo>,
    ) -> LeagueFactor {
        let mut batting = BattingLine::default();
        let mut pitching = PitchingLine::default();
        // Per-player collected game-date ages; averaged before entering
        // the distribution so heavy schedules don't dominate it.
        let mut player_ages: HashMap<PlayerId, (f64, u32)> = HashMap::new();

        for record in records {
            if let Some(line) = &record.batting {
                batting.add(line);
            }
            if let Some(line) = &record.pitching {
                pitching.add(line);
            }
            if let Some(birth) = players.get(&record.player_id).and_then(|p| p.birth_date) {
                let age = age_between(birth, record.game_date);
                let entry = player_ages.entry(record.player_id).or_insert((0.0, 0));
                entry.0 += age;
                entry.1 += 1;
            }
        }

        let mut ages: Vec<f64> = player_ages
            .values()
            .map(|(sum, n)| sum / f64::from(*n))
            .collect();
        // Deterministic distribution input regardless of map iteration order
        ages.sort_by(|a, b| a.total_cmp(b));

        let ip = pitching.ip();
        let fip_core = safe_div(
            13.0 * pitching.hr as f64 + 3.0 * pitching.bb as f64 - 2.0 * pitching.k as f64,
            ip,
        );
        let fip = if ip > 0.0 { fip_core + self.fip_constant } else { 0.0 };

        LeagueFactor {
            season,
            level,
            total_pa: u64::from(batting.pa),
            total_ab: u64::from(batting.ab),
            avg: batting.avg(),
            obp: batting.obp(),
            slg: batting.slg(),
            ops: batting.ops(),
            iso: batting.iso(),
            bb_pct: batting.bb_pct(),
            k_pct: batting.k_pct(),
            hr_pct: batting.hr_pct(),
            sb_pct: batting.sb_pct(),
            sb_success_pct: batting.sb_success_pct(),
            total_outs: u64::from(pitching.outs),
            era: pitching.era(),
            fip,
            whip: pitching.whip(),
            k9: pitching.k9(),
            bb9: pitching.bb9(),
            ages: AgeDistribution::from_ages(ages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BattingLine;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn game(player_id: PlayerId, h: u32, ab: u32) -> RawGameRecord {
        RawGameRecord {
            player_id,
            season: 2024,
            level: Level::DoubleA,
            position: "SS".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            batting: Some(BattingLine {
                pa: ab,
                ab,
                h,
                ..Default::default()
            }),
            pitching: None,
        }
    }

    fn player(player_id: PlayerId, birth: Option<(i32, u32, u32)>) -> PlayerInfo {
        PlayerInfo {
            player_id,
            name: format!("Player {}", player_id),
            birth_date: birth.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            position: "SS".to_string(),
        }
    }

    #[test]
    fn test_league_avg_is_sum_of_hits_over_sum_of_abs() {
        let games = vec![game(1, 2, 4), game(1, 0, 4), game(2, 3, 5)];
        let players: HashMap<_, _> = [(1, player(1, None)), (2, player(2, None))].into();

        let table = LeagueFactorCalculator::new(3.20).calculate(&games, &players);
        let factor = &table[&(2024, Level::DoubleA)];

        assert_eq!(factor.total_ab, 13);
        assert_relative_eq!(factor.avg, 5.0 / 13.0);
    }

    #[test]
    fn test_zero_ab_group_produces_zero_rates() {
        let games = vec![RawGameRecord {
            player_id: 1,
            season: 2024,
            level: Level::SingleA,
            position: "RHP".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            batting: None,
            pitching: Some(PitchingLine {
                outs: 9,
                er: 1,
                k: 4,
                ..Default::default()
            }),
        }];
        let players = HashMap::new();

        let table = LeagueFactorCalculator::new(3.20).calculate(&games, &players);
        let factor = &table[&(2024, Level::SingleA)];

        assert_eq!(factor.total_ab, 0);
        assert_eq!(factor.avg, 0.0);
        assert_eq!(factor.ops, 0.0);
        assert!(!factor.slg.is_nan());
        assert!(factor.k9 > 0.0);
    }

    #[test]
    fn test_age_distribution_skips_unknown_birth_dates() {
        let games = vec![game(1, 1, 4), game(2, 1, 4), game(3, 1, 4)];
        let players: HashMap<_, _> = [
            (1, player(1, Some((2003, 1, 1)))),
            (2, player(2, Some((2001, 1, 1)))),
            (3, player(3, None)),
        ]
        .into();

        let table = LeagueFactorCalculator::new(3.20).calculate(&games, &players);
        let factor = &table[&(2024, Level::DoubleA)];

        let ages = factor.ages.unwrap();
        assert_eq!(ages.players, 2);
        // Performance aggregates still count all three players
        assert_eq!(factor.total_ab, 12);
        assert!(ages.mean > 21.0 && ages.mean < 24.0);
    }

    #[test]
    fn test_no_known_ages_yields_none() {
        let games = vec![game(1, 1, 4)];
        let players: HashMap<_, _> = [(1, player(1, None))].into();

        let table = LeagueFactorCalculator::new(3.20).calculate(&games, &players);
        assert!(table[&(2024, Level::DoubleA)].ages.is_none());
    }

    #[test]
    fn test_seasons_and_levels_partition() {
        let mut games = vec![game(1, 2, 4)];
        games.push(RawGameRecord {
            season: 2023,
            ..game(1, 1, 4)
        });
        games.push(RawGameRecord {
            level: Level::TripleA,
            ..game(2, 1, 4)
        });
        let players = HashMap::new();

        let table = LeagueFactorCalculator::new(3.20).calculate(&games, &players);
        assert_eq!(table.len(), 3);
        assert!(table.contains_key(&(2023, Level::DoubleA)));
        assert!(table.contains_key(&(2024, Level::TripleA)));
    }

    #[test]
    fn test_percentiles_of_sorted_ages() {
        let dist = AgeDistribution::from_ages(vec![19.0, 20.0, 21.0, 22.0, 23.0]).unwrap();
        assert_relative_eq!(dist.median, 21.0);
        assert_relative_eq!(dist.p25, 20.0);
        assert_relative_eq!(dist.p75, 22.0);
    }
}
