//! Raw record types consumed from the record store
//!
//! One `RawGameRecord` per player-game. Records are an immutable, append-only
//! source of truth; the pipeline only ever reads them.

use crate::types::{safe_div, Level, PlayerId, Season};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Counting stats for one game of hitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingLine {
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub doubles: u32,
    pub triples: u32,
    pub hr: u32,
    pub bb: u32,
    pub so: u32,
    pub sb: u32,
    pub cs: u32,
    pub hbp: u32,
    pub sf: u32,
}

impl BattingLine {
    /// Total bases (hits weighted by extra bases)
    pub fn total_bases(&self) -> u32 {
        self.h + self.doubles + 2 * self.triples + 3 * self.hr
    }

    /// Accumulate another line into this one
    pub fn add(&mut self, other: &BattingLine) {
        self.pa += other.pa;
        self.ab += other.ab;
        self.h += other.h;
        self.doubles += other.doubles;
        self.triples += other.triples;
        self.hr += other.hr;
        self.bb += other.bb;
        self.so += other.so;
        self.sb += other.sb;
        self.cs += other.cs;
        self.hbp += other.hbp;
        self.sf += other.sf;
    }

    pub fn avg(&self) -> f64 {
        safe_div(self.h as f64, self.ab as f64)
    }

    pub fn obp(&self) -> f64 {
        safe_div(
            (self.h + self.bb + self.hbp) as f64,
            (self.ab + self.bb + self.hbp + self.sf) as f64,
        )
    }

    pub fn slg(&self) -> f64 {
        safe_div(self.total_bases() as f64, self.ab as f64)
    }

    pub fn ops(&self) -> f64 {
        self.obp() + self.slg()
    }

    pub fn iso(&self) -> f64 {
        self.slg() - self.avg()
    }

    pub fn bb_pct(&self) -> f64 {
        safe_div(self.bb as f64, self.pa as f64)
    }

    pub fn k_pct(&self) -> f64 {
        safe_div(self.so as f64, self.pa as f64)
    }

    pub fn hr_pct(&self) -> f64 {
        safe_div(self.hr as f64, self.pa as f64)
    }

    pub fn sb_pct(&self) -> f64 {
        safe_div(self.sb as f64, self.pa as f64)
    }

    pub fn sb_success_pct(&self) -> f64 {
        safe_div(self.sb as f64, (self.sb + self.cs) as f64)
    }
}

/// Counting stats for one game of pitching. Innings are stored as outs
/// recorded so the x.1/x.2 thirds notation never reaches arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchingLine {
    pub outs: u32,
    pub er: u32,
    pub h: u32,
    pub hr: u32,
    pub bb: u32,
    pub k: u32,
    pub hbp: u32,
}

impl PitchingLine {
    /// Innings pitched as a fraction
    pub fn ip(&self) -> f64 {
        self.outs as f64 / 3.0
    }

    /// Accumulate another line into this one
    pub fn add(&mut self, other: &PitchingLine) {
        self.outs += other.outs;
        self.er += other.er;
        self.h += other.h;
        self.hr += other.hr;
        self.bb += other.bb;
        self.k += other.k;
        self.hbp += other.hbp;
    }

    pub fn era(&self) -> f64 {
        safe_div(self.er as f64 * 9.0, self.ip())
    }

    pub fn whip(&self) -> f64 {
        safe_div((self.bb + self.h) as f64, self.ip())
    }

    pub fn k9(&self) -> f64 {
        safe_div(self.k as f64 * 9.0, self.ip())
    }

    pub fn bb9(&self) -> f64 {
        safe_div(self.bb as f64 * 9.0, self.ip())
    }

    pub fn hr9(&self) -> f64 {
        safe_div(self.hr as f64 * 9.0, self.ip())
    }

    /// Approximate batters faced from the recorded components
    pub fn batters_faced(&self) -> u32 {
        self.outs + self.h + self.bb + self.hbp
    }

    pub fn k_pct(&self) -> f64 {
        safe_div(self.k as f64, self.batters_faced() as f64)
    }

    pub fn bb_pct(&self) -> f64 {
        safe_div(self.bb as f64, self.batters_faced() as f64)
    }

    /// K% minus BB%, the control/dominance differential
    pub fn k_minus_bb_pct(&self) -> f64 {
        self.k_pct() - self.bb_pct()
    }
}

/// One row per player-game from the raw record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGameRecord {
    pub player_id: PlayerId,
    pub season: Season,
    pub level: Level,
    /// Raw position label as recorded ("SS", "CF", "RHP", ...)
    pub position: String,
    pub game_date: NaiveDate,
    pub batting: Option<BattingLine>,
    pub pitching: Option<PitchingLine>,
}

/// Player reference row (birth date and canonical position)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub position: String,
}

impl PlayerInfo {
    /// Age in years at a given date, None when the birth date is unknown
    pub fn age_at(&self, date: NaiveDate) -> Option<f64> {
        self.birth_date.map(|b| age_between(b, date))
    }
}

/// Age in fractional years between a birth date and a reference date
pub fn age_between(birth: NaiveDate, at: NaiveDate) -> f64 {
    (at - birth).num_days() as f64 / 365.25
}

/// Optional advanced batted-ball measurements for a player
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatcastSummary {
    pub player_id: PlayerId,
    /// Average exit velocity (mph)
    pub exit_velocity: f64,
    /// Share of batted balls at 95+ mph, 0..1
    pub hard_hit_pct: f64,
    /// Barrels per batted-ball event, 0..1
    pub barrel_pct: f64,
}

/// Realized MLB sample and outcomes for a player, used to assemble the
/// training set. Players without MLB time simply have no row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlbOutcome {
    pub player_id: PlayerId,
    pub pa: u32,
    pub ab: u32,
    pub outs_pitched: u32,
    pub wrc_plus: f64,
    pub woba: f64,
    pub ops: f64,
    pub era: f64,
    pub fip: f64,
}

impl MlbOutcome {
    pub fn ip(&self) -> f64 {
        self.outs_pitched as f64 / 3.0
    }
}
