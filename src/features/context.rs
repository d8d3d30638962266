//! Per (player, season, level) context rows
//!
//! Raw per-game records aggregate to one stat line per player-season-level,
//! then join the league/position factor tables and the age curves to derive
//! ratio and adjusted features.

use crate::config::{AgeConfig, TranslationConfig};
use crate::factors::age_curve::AgeModel;
use crate::factors::{LeagueFactor, PositionFactor};
use crate::record::{age_between, BattingLine, PitchingLine, PlayerInfo, RawGameRecord};
use crate::types::{safe_div, safe_ratio, Level, PlayerId, PlayerRole, PositionGroup, Season};
use hashbrown::HashMap;

/// Aggregated stat line for one player at one season and level
#[derive(Debug, Clone)]
pub struct SeasonLevelLine {
    pub player_id: PlayerId,
    pub season: Season,
    pub level: Level,
    pub batting: Option<BattingLine>,
    pub pitching: Option<PitchingLine>,
    pub games: u32,
    /// Mean age across this player's game dates, None without a birth date
    pub age: Option<f64>,
}

/// Collapse per-game records into per (player, season, level) lines.
/// Output is sorted by (player, season, level) so downstream iteration
/// order never depends on map internals.
pub fn aggregate_season_levels(
    games: &[RawGameRecord],
    players: &HashMap<PlayerId, PlayerInfo>,
) -> Vec<SeasonLevelLine> {
    struct Acc {
        batting: Option<BattingLine>,
        pitching: Option<PitchingLine>,
        games: u32,
        age_sum: f64,
        age_n: u32,
    }

    let mut acc: HashMap<(PlayerId, Season, Level), Acc> = HashMap::new();
    for record in games {
        let entry = acc
            .entry((record.player_id, record.season, record.level))
            .or_insert(Acc {
                batting: None,
                pitching: None,
                games: 0,
                age_sum: 0.0,
                age_n: 0,
            });
        entry.games += 1;
        if let Some(line) = &record.batting {
            entry.batting.get_or_insert_with(BattingLine::default).add(line);
        }
        if let Some(line) = &record.pitching {
            entry
                .pitching
                .get_or_insert_with(PitchingLine::default)
                .add(line);
        }
        if let Some(birth) = players.get(&record.player_id).and_then(|p| p.birth_date) {
            entry.age_sum += age_between(birth, record.game_date);
            entry.age_n += 1;
        }
    }

    let mut lines: Vec<SeasonLevelLine> = acc
        .into_iter()
        .map(|((player_id, season, level), a)| SeasonLevelLine {
            player_id,
            season,
            level,
            batting: a.batting,
            pitching: a.pitching,
            games: a.games,
            age: (a.age_n > 0).then(|| a.age_sum / f64::from(a.age_n)),
        })
        .collect();
    lines.sort_by_key(|l| (l.player_id, l.season, l.level));
    lines
}

/// Context features for one hitter season at one level
#[derive(Debug, Clone)]
pub struct HitterContextRow {
    pub player_id: PlayerId,
    pub season: Season,
    pub level: Level,
    pub pa: u32,
    pub ab: u32,
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
    pub age: Option<f64>,
    pub age_vs_league_avg: f64,
    pub age_adjusted_ops: f64,
    pub fully_adjusted_ops: f64,
}

/// Context features for one pitcher season at one level
#[derive(Debug, Clone)]
pub struct PitcherContextRow {
    pub player_id: PlayerId,
    pub season: Season,
    pub level: Level,
    pub outs: u32,
    pub ip: f64,
    pub era: f64,
    pub fip: f64,
    pub whip: f64,
    pub k9: f64,
    pub bb9: f64,
    pub hr9: f64,
    pub k_minus_bb_pct: f64,
    /// League FIP over player FIP: above 1.0 means better than the league
    pub fip_vs_league: f64,
    pub k9_vs_league: f64,
    pub age: Option<f64>,
    pub age_vs_league_avg: f64,
    pub age_adjusted_fip: f64,
    /// Level-translated FIP credited for age; lower is better
    pub fully_adjusted_fip: f64,
}

/// Derives context rows by joining lines with the factor tables
pub struct ContextBuilder<'a> {
    pub league: &'a HashMap<(Season, Level), LeagueFactor>,
    pub position: &'a HashMap<(Season, Level, PositionGroup), PositionFactor>,
    pub age_model: &'a AgeModel,
    pub age_config: &'a AgeConfig,
    pub translation: &'a TranslationConfig,
}

impl<'a> ContextBuilder<'a> {
    fn league_for(&self, season: Season, level: Level) -> Option<&LeagueFactor> {
        self.league.get(&(season, level))
    }

    /// Position-relative multiplier: league OPS over cohort OPS, so scarce
    /// offensive positions earn credit. Missing cohort is neutral.
    fn position_adjustment(
        &self,
        season: Season,
        level: Level,
        group: Option<PositionGroup>,
    ) -> f64 {
        let Some(group) = group else {
            return 1.0;
        };
        let Some(league) = self.league_for(season, level) else {
            return 1.0;
        };
        match self.position.get(&(season, level, group)) {
            Some(cohort) if cohort.ops > 0.0 => safe_ratio(league.ops, cohort.ops),
            _ => 1.0,
        }
    }

    /// Build the hitter context row for one season-level line
    pub fn hitter_row(
        &self,
        line: &SeasonLevelLine,
        group: Option<PositionGroup>,
    ) -> Option<HitterContextRow> {
        let batting = line.batting.as_ref()?;
        if batting.pa == 0 {
            return None;
        }

        let league = self.league_for(line.season, line.level);
        let league_mean_age = league.and_then(|l| l.ages.map(|a| a.mean));
        let obp = batting.obp();
        let slg = batting.slg();
        let ops = batting.ops();
        let iso = batting.iso();
        let bb_pct = batting.bb_pct();
        let k_pct = batting.k_pct();
        let hr_pct = batting.hr_pct();

        let (ops_vs_league, iso_vs_league, bb_vs, k_vs, hr_vs) = match league {
            Some(l) => (
                safe_ratio(ops, l.ops),
                safe_ratio(iso, l.iso),
                safe_ratio(bb_pct, l.bb_pct),
                safe_ratio(k_pct, l.k_pct),
                safe_ratio(hr_pct, l.hr_pct),
            ),
            None => (1.0, 1.0, 1.0, 1.0, 1.0),
        };

        let position_factor = self.position_adjustment(line.season, line.level, group);
        let ops_vs_position = match (group, league) {
            (Some(g), Some(_)) => match self.position.get(&(line.season, line.level, g)) {
                Some(cohort) => safe_ratio(ops, cohort.ops),
                None => 1.0,
            },
            _ => 1.0,
        };

        let age_vs_league_avg = match (line.age, league_mean_age) {
            (Some(age), Some(league_age)) => age - league_age,
            _ => 0.0,
        };
        let age_adjusted_ops =
            ops * (1.0 + age_vs_league_avg * -self.age_config.rate_adjust_per_year);

        let age_factor =
            self.age_model
                .combined_factor(PlayerRole::Hitter, line.age, league_mean_age);
        let level_factor = self.translation.level_factor(line.level);
        let fully_adjusted_ops = ops * level_factor * age_factor * position_factor;

        Some(HitterContextRow {
            player_id: line.player_id,
            season: line.season,
            level: line.level,
            pa: batting.pa,
            ab: batting.ab,
            obp,
            slg,
            ops,
            iso,
            bb_pct,
            k_pct,
            hr_pct,
            ops_vs_league,
            iso_vs_league,
            bb_pct_vs_league: bb_vs,
            k_pct_vs_league: k_vs,
            hr_pct_vs_league: hr_vs,
            ops_vs_position,
            age: line.age,
            age_vs_league_avg,
            age_adjusted_ops,
            fully_adjusted_ops,
        })
    }

    /// Build the pitcher context row for one season-level line
    pub fn pitcher_row(&self, line: &SeasonLevelLine) -> Option<PitcherContextRow> {
        let pitching = line.pitching.as_ref()?;
        if pitching.outs == 0 {
            return None;
        }

        let league = self.league_for(line.season, line.level);
        let league_mean_age = league.and_then(|l| l.ages.map(|a| a.mean));
        let ip = pitching.ip();
        let fip_core = safe_div(
            13.0 * pitching.hr as f64 + 3.0 * pitching.bb as f64 - 2.0 * pitching.k as f64,
            ip,
        );
        let fip = fip_core + self.translation.fip_constant;

        let (fip_vs_league, k9_vs_league) = match league {
            Some(l) => (safe_ratio(l.fip, fip.max(0.1)), safe_ratio(pitching.k9(), l.k9)),
            None => (1.0, 1.0),
        };

        let age_vs_league_avg = match (line.age, league_mean_age) {
            (Some(age), Some(league_age)) => age - league_age,
            _ => 0.0,
        };
        // FIP runs the other way: younger than the league shrinks it
        let age_adjusted_fip =
            fip * (1.0 + age_vs_league_avg * self.age_config.rate_adjust_per_year);

        let age_factor =
            self.age_model
                .combined_factor(PlayerRole::Pitcher, line.age, league_mean_age);
        let level_factor = self.translation.level_factor(line.level);
        let fully_adjusted_fip = safe_div(safe_div(fip, level_factor), age_factor);

        Some(PitcherContextRow {
            player_id: line.player_id,
            season: line.season,
            level: line.level,
            outs: pitching.outs,
            ip,
            era: pitching.era(),
            fip,
            whip: pitching.whip(),
            k9: pitching.k9(),
            bb9: pitching.bb9(),
            hr9: pitching.hr9(),
            k_minus_bb_pct: pitching.k_minus_bb_pct(),
            fip_vs_league,
            k9_vs_league,
            age: line.age,
            age_vs_league_avg,
            age_adjusted_fip,
            fully_adjusted_fip,
        })
    }
}
