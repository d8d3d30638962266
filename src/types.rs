//! Core types shared across the pipeline

use crate::error::{FarmsightError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique player identifier (as assigned by the raw record store)
pub type PlayerId = u64;

/// Season year, e.g. 2024
pub type Season = u16;

/// Minor-league classification levels, ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Rookie,
    SingleA,
    HighA,
    DoubleA,
    TripleA,
}

impl Level {
    /// Ordinal rank of the level, ascending (Rookie = 1, AAA = 5).
    /// Zero is reserved for "no level played".
    pub fn ordinal(&self) -> u8 {
        match self {
            Level::Rookie => 1,
            Level::SingleA => 2,
            Level::HighA => 3,
            Level::DoubleA => 4,
            Level::TripleA => 5,
        }
    }

    /// Levels that get their own column block in the wide feature vector,
    /// highest first. Rookie ball contributes to totals only.
    pub const PIVOTED: [Level; 4] = [
        Level::TripleA,
        Level::DoubleA,
        Level::HighA,
        Level::SingleA,
    ];

    /// Cross-level aggregation weight (AAA 4, AA 3, A+ 2, A 1, Rookie 0)
    pub fn cross_level_weight(&self) -> f64 {
        match self {
            Level::TripleA => 4.0,
            Level::DoubleA => 3.0,
            Level::HighA => 2.0,
            Level::SingleA => 1.0,
            Level::Rookie => 0.0,
        }
    }

    /// Index into the fixed four-slot pivot array, None for Rookie
    pub fn pivot_index(&self) -> Option<usize> {
        match self {
            Level::TripleA => Some(0),
            Level::DoubleA => Some(1),
            Level::HighA => Some(2),
            Level::SingleA => Some(3),
            Level::Rookie => None,
        }
    }

    /// Short column-safe suffix used in feature names
    pub fn suffix(&self) -> &'static str {
        match self {
            Level::Rookie => "rk",
            Level::SingleA => "a",
            Level::HighA => "a_plus",
            Level::DoubleA => "aa",
            Level::TripleA => "aaa",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Rookie => "Rookie",
            Level::SingleA => "A",
            Level::HighA => "A+",
            Level::DoubleA => "AA",
            Level::TripleA => "AAA",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Level {
    type Err = FarmsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "AAA" => Ok(Level::TripleA),
            "AA" => Ok(Level::DoubleA),
            "A+" | "High-A" | "HighA" => Ok(Level::HighA),
            "A" | "Low-A" | "A-" => Ok(Level::SingleA),
            "R" | "Rk" | "Rookie" | "CPX" => Ok(Level::Rookie),
            other => Err(FarmsightError::ParseError(format!(
                "unknown level: {}",
                other
            ))),
        }
    }
}

/// Defensive position groups used by the position factor table.
/// Pitchers are handled on pitching-specific features and never map here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    Catcher,
    Infield,
    Outfield,
    DesignatedHitter,
    TwoWay,
}

impl PositionGroup {
    /// Map a raw position label to its group. Returns None for pitchers
    /// and unrecognized labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "C" => Some(PositionGroup::Catcher),
            "1B" | "2B" | "3B" | "SS" | "IF" | "INF" => Some(PositionGroup::Infield),
            "LF" | "CF" | "RF" | "OF" => Some(PositionGroup::Outfield),
            "DH" => Some(PositionGroup::DesignatedHitter),
            "TWP" | "TWO-WAY" => Some(PositionGroup::TwoWay),
            _ => None,
        }
    }

    /// True when the raw label denotes a pitcher
    pub fn is_pitcher_label(label: &str) -> bool {
        matches!(
            label.trim().to_ascii_uppercase().as_str(),
            "P" | "SP" | "RP" | "LHP" | "RHP"
        )
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionGroup::Catcher => "C",
            PositionGroup::Infield => "IF",
            PositionGroup::Outfield => "OF",
            PositionGroup::DesignatedHitter => "DH",
            PositionGroup::TwoWay => "TWP",
        };
        write!(f, "{}", s)
    }
}

/// Role a player is evaluated under. Two-way players are evaluated as both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    Hitter,
    Pitcher,
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerRole::Hitter => write!(f, "hitter"),
            PlayerRole::Pitcher => write!(f, "pitcher"),
        }
    }
}

/// Divide with a guarded denominator: zero (or negative) denominators
/// yield 0.0 rather than NaN or a panic.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Ratio against a reference rate; a degenerate reference is neutral (1.0)
pub fn safe_ratio(value: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        value / reference
    } else {
        1.0
    }
}
