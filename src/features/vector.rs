//! Wide per-player feature vectors
//!
//! Context rows aggregate to one row per (player, level), mean for
//! rate-like features and sum for counting stats, then pivot into a fixed
//! four-slot array over AAA/AA/A+/A, zero-filled for unplayed levels.
//! Flattening order is fixed so regression matrices are reproducible.

use crate::features::context::{HitterContextRow, PitcherContextRow};
use crate::types::{Level, PlayerId};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Per-level feature block for a hitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitterLevelBlock {
    pub pa: f64,
    pub ab: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub iso: f64,
    pub bb_pct: f64,
    pub k_pct: f64,
    pub hr_pct: f64,
    pub ops_vs_league: f64,
    pub iso_vs_league: f64,
    pub bb_pct_vs_league: f64,
    pub k_pct_vs_league: f64,
    pub hr_pct_vs_league: f64,
    pub ops_vs_position: f64,
    pub age_vs_league_avg: f64,
    pub age_adjusted_ops: f64,
    pub fully_adjusted_ops: f64,
}

impl HitterLevelBlock {
    pub const WIDTH: usize = 18;

    const COLUMNS: [&'static str; Self::WIDTH] = [
        "pa",
        "ab",
        "obp",
        "slg",
        "ops",
        "iso",
        "bb_pct",
        "k_pct",
        "hr_pct",
        "ops_vs_league",
        "iso_vs_league",
        "bb_pct_vs_league",
        "k_pct_vs_league",
        "hr_pct_vs_league",
        "ops_vs_position",
        "age_vs_league_avg",
        "age_adjusted_ops",
        "fully_adjusted_ops",
    ];

    fn write_into(&self, row: &mut Vec<f64>) {
        row.extend_from_slice(&[
            self.pa,
            self.ab,
            self.obp,
            self.slg,
            self.ops,
            self.iso,
            self.bb_pct,
            self.k_pct,
            self.hr_pct,
            self.ops_vs_league,
            self.iso_vs_league,
            self.bb_pct_vs_league,
            self.k_pct_vs_league,
            self.hr_pct_vs_league,
            self.ops_vs_position,
            self.age_vs_league_avg,
            self.age_adjusted_ops,
            self.fully_adjusted_ops,
        ]);
    }
}

/// Per-level feature block for a pitcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherLevelBlock {
    pub ip: f64,
    pub era: f64,
    pub fip: f64,
    pub whip: f64,
    pub k9: f64,
    pub bb9: f64,
    pub hr9: f64,
    pub k_minus_bb_pct: f64,
    pub fip_vs_league: f64,
    pub k9_vs_league: f64,
    pub age_vs_league_avg: f64,
    pub age_adjusted_fip: f64,
    pub fully_adjusted_fip: f64,
}

impl PitcherLevelBlock {
    pub const WIDTH: usize = 13;

    const COLUMNS: [&'static str; Self::WIDTH] = [
        "ip",
        "era",
        "fip",
        "whip",
        "k9",
        "bb9",
        "hr9",
        "k_minus_bb_pct",
        "fip_vs_league",
        "k9_vs_league",
        "age_vs_league_avg",
        "age_adjusted_fip",
        "fully_adjusted_fip",
    ];

    fn write_into(&self, row: &mut Vec<f64>) {
        row.extend_from_slice(&[
            self.ip,
            self.era,
            self.fip,
            self.whip,
            self.k9,
            self.bb9,
            self.hr9,
            self.k_minus_bb_pct,
            self.fip_vs_league,
            self.k9_vs_league,
            self.age_vs_league_avg,
            self.age_adjusted_fip,
            self.fully_adjusted_fip,
        ]);
    }
}

/// Wide feature vector for one hitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitterFeatureVector {
    pub player_id: PlayerId,
    /// One block per pivoted level, in `Level::PIVOTED` order
    pub levels: [HitterLevelBlock; 4],
    /// Plate appearances across every level, Rookie ball included
    pub total_pa: f64,
    /// Ordinal of the highest level reached (0 = none)
    pub highest_level_ordinal: f64,
    pub highest_level: Option<Level>,
    /// 4/3/2/1-weighted ops_vs_league across pivoted levels, over 10
    pub weighted_cross_level: f64,
    /// PA-weighted ops_vs_league across all levels (performance quality)
    pub mean_ops_vs_league: f64,
    /// Age context at the highest level, for scoring-time adjustments
    pub age_at_highest: Option<f64>,
    pub age_vs_league_at_highest: f64,
}

impl HitterFeatureVector {
    /// Flatten into a regression row; order matches `column_names`
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::width());
        for block in &self.levels {
            block.write_into(&mut row);
        }
        row.push(self.total_pa);
        row.push(self.highest_level_ordinal);
        row.push(self.weighted_cross_level);
        row
    }

    pub fn width() -> usize {
        HitterLevelBlock::WIDTH * 4 + 3
    }

    pub fn column_names() -> Vec<String> {
        let mut names = Vec::with_capacity(Self::width());
        for level in Level::PIVOTED {
            for column in HitterLevelBlock::COLUMNS {
                names.push(format!("{}_{}", column, level.suffix()));
            }
        }
        names.push("total_pa".to_string());
        names.push("highest_level".to_string());
        names.push("weighted_cross_level".to_string());
        names
    }
}

/// Wide feature vector for one pitcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitcherFeatureVector {
    pub player_id: PlayerId,
    pub levels: [PitcherLevelBlock; 4],
    /// Innings pitched across every level, Rookie ball included
    pub total_ip: f64,
    pub highest_level_ordinal: f64,
    pub highest_level: Option<Level>,
    /// 4/3/2/1-weighted fip_vs_league across pivoted levels, over 10
    pub weighted_cross_level: f64,
    /// IP-weighted fip_vs_league across all levels (performance quality)
    pub mean_fip_vs_league: f64,
    pub age_at_highest: Option<f64>,
    pub age_vs_league_at_highest: f64,
}

impl PitcherFeatureVector {
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::width());
        for block in &self.levels {
            block.write_into(&mut row);
        }
        row.push(self.total_ip);
        row.push(self.highest_level_ordinal);
        row.push(self.weighted_cross_level);
        row
    }

    pub fn width() -> usize {
        PitcherLevelBlock::WIDTH * 4 + 3
    }

    pub fn column_names() -> Vec<String> {
        let mut names = Vec::with_capacity(Self::width());
        for level in Level::PIVOTED {
            for column in PitcherLevelBlock::COLUMNS {
                names.push(format!("{}_{}", column, level.suffix()));
            }
        }
        names.push("total_ip".to_string());
        names.push("highest_level".to_string());
        names.push("weighted_cross_level".to_string());
        names
    }
}

/// Pivot a player's hitter context rows into the wide vector
pub fn pivot_hitter(player_id: PlayerId, rows: &[&HitterContextRow]) -> HitterFeatureVector {
    // Aggregate rows to one entry per level: sums for counts, means for rates
    let mut per_level: HashMap<Level, (HitterLevelBlock, u32)> = HashMap::new();
    let mut total_pa = 0.0;
    let mut weighted_ops_vs_league = 0.0;
    let mut highest: Option<&HitterContextRow> = None;

    for &row in rows {
        total_pa += f64::from(row.pa);
        weighted_ops_vs_league += f64::from(row.pa) * row.ops_vs_league;

        let better = match highest {
            Some(h) => row.level > h.level || (row.level == h.level && row.season > h.season),
            None => true,
        };
        if better {
            highest = Some(row);
        }

        let (block, n) = per_level
            .entry(row.level)
            .or_insert((HitterLevelBlock::default(), 0));
        block.pa += f64::from(row.pa);
        block.ab += f64::from(row.ab);
        block.obp += row.obp;
        block.slg += row.slg;
        block.ops += row.ops;
        block.iso += row.iso;
        block.bb_pct += row.bb_pct;
        block.k_pct += row.k_pct;
        block.hr_pct += row.hr_pct;
        block.ops_vs_league += row.ops_vs_league;
        block.iso_vs_league += row.iso_vs_league;
        block.bb_pct_vs_league += row.bb_pct_vs_league;
        block.k_pct_vs_league += row.k_pct_vs_league;
        block.hr_pct_vs_league += row.hr_pct_vs_league;
        block.ops_vs_position += row.ops_vs_position;
        block.age_vs_league_avg += row.age_vs_league_avg;
        block.age_adjusted_ops += row.age_adjusted_ops;
        block.fully_adjusted_ops += row.fully_adjusted_ops;
        *n += 1;
    }

    let mut levels = [HitterLevelBlock::default(); 4];
    let mut weighted_cross_level = 0.0;
    // Fixed iteration order keeps float accumulation reproducible
    for level in Level::PIVOTED {
        let Some((mut block, n)) = per_level.remove(&level) else {
            continue;
        };
        let n = f64::from(n);
        // Counting stats stay summed; everything else becomes a mean
        block.obp /= n;
        block.slg /= n;
        block.ops /= n;
        block.iso /= n;
        block.bb_pct /= n;
        block.k_pct /= n;
        block.hr_pct /= n;
        block.ops_vs_league /= n;
        block.iso_vs_league /= n;
        block.bb_pct_vs_league /= n;
        block.k_pct_vs_league /= n;
        block.hr_pct_vs_league /= n;
        block.ops_vs_position /= n;
        block.age_vs_league_avg /= n;
        block.age_adjusted_ops /= n;
        block.fully_adjusted_ops /= n;

        weighted_cross_level += level.cross_level_weight() * block.ops_vs_league;
        if let Some(idx) = level.pivot_index() {
            levels[idx] = block;
        }
    }

    HitterFeatureVector {
        player_id,
        levels,
        total_pa,
        highest_level_ordinal: highest.map_or(0.0, |r| f64::from(r.level.ordinal())),
        highest_level: highest.map(|r| r.level),
        weighted_cross_level: weighted_cross_level / 10.0,
        mean_ops_vs_league: if total_pa > 0.0 {
            weighted_ops_vs_league / total_pa
        } else {
            1.0
        },
        age_at_highest: highest.and_then(|r| r.age),
        age_vs_league_at_highest: highest.map_or(0.0, |r| r.age_vs_league_avg),
    }
}

/// Pivot a player's pitcher context rows into the wide vector
pub fn pivot_pitcher(player_id: PlayerId, rows: &[&PitcherContextRow]) -> PitcherFeatureVector {
    let mut per_level: HashMap<Level, (PitcherLevelBlock, u32)> = HashMap::new();
    let mut total_ip = 0.0;
    let mut weighted_fip_vs_league = 0.0;
    let mut highest: Option<&PitcherContextRow> = None;

    for &row in rows {
        total_ip += row.ip;
        weighted_fip_vs_league += row.ip * row.fip_vs_league;

        let better = match highest {
            Some(h) => row.level > h.level || (row.level == h.level && row.season > h.season),
            None => true,
        };
        if better {
            highest = Some(row);
        }

        let (block, n) = per_level
            .entry(row.level)
            .or_insert((PitcherLevelBlock::default(), 0));
        block.ip += row.ip;
        block.era += row.era;
        block.fip += row.fip;
        block.whip += row.whip;
        block.k9 += row.k9;
        block.bb9 += row.bb9;
        block.hr9 += row.hr9;
        block.k_minus_bb_pct += row.k_minus_bb_pct;
        block.fip_vs_league += row.fip_vs_league;
        block.k9_vs_league += row.k9_vs_league;
        block.age_vs_league_avg += row.age_vs_league_avg;
        block.age_adjusted_fip += row.age_adjusted_fip;
        block.fully_adjusted_fip += row.fully_adjusted_fip;
        *n += 1;
    }

    let mut levels = [PitcherLevelBlock::default(); 4];
    let mut weighted_cross_level = 0.0;
    // Fixed iteration order keeps float accumulation reproducible
    for level in Level::PIVOTED {
        let Some((mut block, n)) = per_level.remove(&level) else {
            continue;
        };
        let n = f64::from(n);
        block.era /= n;
        block.fip /= n;
        block.whip /= n;
        block.k9 /= n;
        block.bb9 /= n;
        block.hr9 /= n;
        block.k_minus_bb_pct /= n;
        block.fip_vs_league /= n;
        block.k9_vs_league /= n;
        block.age_vs_league_avg /= n;
        block.age_adjusted_fip /= n;
        block.fully_adjusted_fip /= n;

        weighted_cross_level += level.cross_level_weight() * block.fip_vs_league;
        if let Some(idx) = level.pivot_index() {
            levels[idx] = block;
        }
    }

    PitcherFeatureVector {
        player_id,
        levels,
        total_ip,
        highest_level_ordinal: highest.map_or(0.0, |r| f64::from(r.level.ordinal())),
        highest_level: highest.map(|r| r.level),
        weighted_cross_level: weighted_cross_level / 10.0,
        mean_fip_vs_league: if total_ip > 0.0 {
            weighted_fip_vs_league / total_ip
        } else {
            1.0
        },
        age_at_highest: highest.and_then(|r| r.age),
        age_vs_league_at_highest: highest.map_or(0.0, |r| r.age_vs_league_avg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: Level, season: u16, pa: u32, ops: f64, ops_vs_league: f64) -> HitterContextRow {
        HitterContextRow {
            player_id: 1,
            season,
            level,
            pa,
            ab: pa,
            obp: ops * 0.45,
            slg: ops * 0.55,
            ops,
            iso: 0.150,
            bb_pct: 0.10,
            k_pct: 0.20,
            hr_pct: 0.03,
            ops_vs_league,
            iso_vs_league: 1.0,
            bb_pct_vs_league: 1.0,
            k_pct_vs_league: 1.0,
            hr_pct_vs_league: 1.0,
            ops_vs_position: 1.0,
            age: Some(21.0),
            age_vs_league_avg: -1.5,
            age_adjusted_ops: ops * 1.03,
            fully_adjusted_ops: ops * 0.8,
        }
    }

    #[test]
    fn test_unplayed_levels_are_zero_filled() {
        let r = row(Level::DoubleA, 2024, 200, 0.800, 1.1);
        let vector = pivot_hitter(1, &[&r]);

        // AA slot populated, everything else zeroed
        assert!(vector.levels[1].pa > 0.0);
        assert_eq!(vector.levels[0], HitterLevelBlock::default());
        assert_eq!(vector.levels[2], HitterLevelBlock::default());
        assert_eq!(vector.levels[3], HitterLevelBlock::default());
    }

    #[test]
    fn test_counts_sum_and_rates_average_across_seasons() {
        let a = row(Level::DoubleA, 2023, 100, 0.700, 1.0);
        let b = row(Level::DoubleA, 2024, 300, 0.900, 1.2);
        let vector = pivot_hitter(1, &[&a, &b]);

        let block = &vector.levels[1];
        assert_eq!(block.pa, 400.0);
        assert!((block.ops - 0.800).abs() < 1e-9);
        assert!((block.ops_vs_league - 1.1).abs() < 1e-9);
        // PA-weighted mean leans toward the larger 2024 sample
        assert!(vector.mean_ops_vs_league > 1.1);
    }

    #[test]
    fn test_highest_level_and_cross_level_weighting() {
        let a = row(Level::SingleA, 2023, 200, 0.750, 1.2);
        let aa = row(Level::DoubleA, 2024, 150, 0.720, 1.05);
        let vector = pivot_hitter(1, &[&a, &aa]);

        assert_eq!(vector.highest_level, Some(Level::DoubleA));
        assert_eq!(vector.highest_level_ordinal, 4.0);
        let expected = (1.0 * 1.2 + 3.0 * 1.05) / 10.0;
        assert!((vector.weighted_cross_level - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rookie_rows_count_in_totals_but_not_blocks() {
        let rookie = row(Level::Rookie, 2023, 80, 0.900, 1.4);
        let a = row(Level::SingleA, 2024, 120, 0.780, 1.1);
        let vector = pivot_hitter(1, &[&rookie, &a]);

        assert_eq!(vector.total_pa, 200.0);
        // Only the A block carries features
        let populated: usize = vector
            .levels
            .iter()
            .filter(|b| **b != HitterLevelBlock::default())
            .count();
        assert_eq!(populated, 1);
    }

    #[test]
    fn test_row_width_matches_column_names() {
        let r = row(Level::TripleA, 2024, 100, 0.850, 1.15);
        let vector = pivot_hitter(1, &[&r]);
        assert_eq!(vector.to_row().len(), HitterFeatureVector::width());
        assert_eq!(
            HitterFeatureVector::column_names().len(),
            HitterFeatureVector::width()
        );
        assert_eq!(
            PitcherFeatureVector::column_names().len(),
            PitcherFeatureVector::width()
        );
    }
}
