//! CSV snapshot backend for the record store
//!
//! Reads a directory of CSV files exported from the raw record store:
//! `games.csv`, `players.csv`, `mlb_outcomes.csv` and (optionally)
//! `statcast.csv`. Rows deserialize into loose boundary structs and are
//! mapped field-by-field into the typed records.

use crate::error::{FarmsightError, Result};
use crate::record::{
    BattingLine, MlbOutcome, PitchingLine, PlayerInfo, RawGameRecord, StatcastSummary,
};
use crate::store::RecordStore;
use crate::types::{Level, PlayerId, Season};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Record store backed by a directory of CSV snapshot files
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_rows<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.path(file);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| {
                FarmsightError::StoreError(format!("cannot open {}: {}", path.display(), e))
            })?;

        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

/// Boundary row for `games.csv`. Hitting and pitching columns are both
/// optional; a row carries one side or the other (two-way players produce
/// separate rows).
#[derive(Debug, Deserialize)]
struct GameRow {
    player_id: PlayerId,
    season: Season,
    level: String,
    position: String,
    game_date: String,
    pa: Option<u32>,
    ab: Option<u32>,
    h: Option<u32>,
    doubles: Option<u32>,
    triples: Option<u32>,
    hr: Option<u32>,
    bb: Option<u32>,
    so: Option<u32>,
    sb: Option<u32>,
    cs: Option<u32>,
    hbp: Option<u32>,
    sf: Option<u32>,
    outs: Option<u32>,
    er: Option<u32>,
    h_allowed: Option<u32>,
    hr_allowed: Option<u32>,
    bb_allowed: Option<u32>,
    k: Option<u32>,
    hbp_allowed: Option<u32>,
}

fn parse_date(raw: &str, context: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| FarmsightError::ParseError(format!("bad date '{}' in {}: {}", raw, context, e)))
}

fn map_game_row(row: GameRow) -> Result<RawGameRecord> {
    let level: Level = row.level.parse()?;
    let game_date = parse_date(&row.game_date, "games.csv")?;

    let batting = row.pa.map(|pa| BattingLine {
        pa,
        ab: row.ab.unwrap_or(0),
        h: row.h.unwrap_or(0),
        doubles: row.doubles.unwrap_or(0),
        triples: row.triples.unwrap_or(0),
        hr: row.hr.unwrap_or(0),
        bb: row.bb.unwrap_or(0),
        so: row.so.unwrap_or(0),
        sb: row.sb.unwrap_or(0),
        cs: row.cs.unwrap_or(0),
        hbp: row.hbp.unwrap_or(0),
        sf: row.sf.unwrap_or(0),
    });

    let pitching = row.outs.map(|outs| PitchingLine {
        outs,
        er: row.er.unwrap_or(0),
        h: row.h_allowed.unwrap_or(0),
        hr: row.hr_allowed.unwrap_or(0),
        bb: row.bb_allowed.unwrap_or(0),
        k: row.k.unwrap_or(0),
        hbp: row.hbp_allowed.unwrap_or(0),
    });

    if batting.is_none() && pitching.is_none() {
        return Err(FarmsightError::ParseError(format!(
            "game row for player {} on {} has neither a batting nor a pitching line",
            row.player_id, row.game_date
        )));
    }

    Ok(RawGameRecord {
        player_id: row.player_id,
        season: row.season,
        level,
        position: row.position,
        game_date,
        batting,
        pitching,
    })
}

/// Boundary row for `players.csv`
#[derive(Debug, Deserialize)]
struct PlayerRow {
    player_id: PlayerId,
    name: String,
    birth_date: Option<String>,
    position: String,
}

fn map_player_row(row: PlayerRow) -> Result<PlayerInfo> {
    let birth_date = match row.birth_date.as_deref() {
        Some(raw) if !raw.is_empty() => Some(parse_date(raw, "players.csv")?),
        _ => None,
    };
    Ok(PlayerInfo {
        player_id: row.player_id,
        name: row.name,
        birth_date,
        position: row.position,
    })
}

/// Boundary row for `mlb_outcomes.csv`
#[derive(Debug, Deserialize)]
struct OutcomeRow {
    player_id: PlayerId,
    pa: u32,
    ab: u32,
    outs_pitched: u32,
    wrc_plus: f64,
    woba: f64,
    ops: f64,
    era: f64,
    fip: f64,
}

/// Boundary row for `statcast.csv`
#[derive(Debug, Deserialize)]
struct StatcastRow {
    player_id: PlayerId,
    exit_velocity: f64,
    hard_hit_pct: f64,
    barrel_pct: f64,
}

impl RecordStore for CsvStore {
    fn load_games(&self) -> Result<Vec<RawGameRecord>> {
        let rows: Vec<GameRow> = self.read_rows("games.csv")?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_game_row(row)?);
        }
        log::info!("Loaded {} game records from {}", records.len(), self.dir.display());
        Ok(records)
    }

    fn load_players(&self) -> Result<Vec<PlayerInfo>> {
        let rows: Vec<PlayerRow> = self.read_rows("players.csv")?;
        let mut players = Vec::with_capacity(rows.len());
        for row in rows {
            players.push(map_player_row(row)?);
        }
        Ok(players)
    }

    fn load_mlb_outcomes(&self) -> Result<Vec<MlbOutcome>> {
        let rows: Vec<OutcomeRow> = self.read_rows("mlb_outcomes.csv")?;
        Ok(rows
            .into_iter()
            .map(|row| MlbOutcome {
                player_id: row.player_id,
                pa: row.pa,
                ab: row.ab,
                outs_pitched: row.outs_pitched,
                wrc_plus: row.wrc_plus,
                woba: row.woba,
                ops: row.ops,
                era: row.era,
                fip: row.fip,
            })
            .collect())
    }

    fn load_statcast(&self) -> Result<Vec<StatcastSummary>> {
        // Statcast-class tracking only exists at some affiliates; a missing
        // file means "no advanced data", not a broken snapshot.
        if !self.path("statcast.csv").exists() {
            return Ok(Vec::new());
        }
        let rows: Vec<StatcastRow> = self.read_rows("statcast.csv")?;
        Ok(rows
            .into_iter()
            .map(|row| StatcastSummary {
                player_id: row.player_id,
                exit_velocity: row.exit_velocity,
                hard_hit_pct: row.hard_hit_pct,
                barrel_pct: row.barrel_pct,
            })
            .collect())
    }
}
