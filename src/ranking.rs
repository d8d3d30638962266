//! Final ranking and atomic promotion
//!
//! Scored prospects sort into a strict total order (composite score
//! descending, player id ascending on ties) and receive dense integer ranks
//! from 1. The ranking artifact is written under a fresh version and only
//! becomes "current" through an atomic pointer swap, so consumers never see
//! a partial ranking.

use crate::error::{FarmsightError, Result};
use crate::scoring::ScoredProspect;
use crate::types::{PlayerId, PlayerRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One row of the promoted ranking artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub role: PlayerRole,
    pub composite_score: f64,
    pub predicted_metrics: BTreeMap<String, f64>,
}

/// A complete, versioned ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub version: Uuid,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<RankingEntry>,
}

impl Ranking {
    /// Order scored prospects and assign ranks
    pub fn from_scored(mut scored: Vec<ScoredProspect>) -> Self {
        scored.sort_by(|a, b| {
            b.composite_score
                .total_cmp(&a.composite_score)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        let entries = scored
            .into_iter()
            .enumerate()
            .map(|(idx, prospect)| RankingEntry {
                rank: idx as u32 + 1,
                player_id: prospect.player_id,
                role: prospect.role,
                composite_score: prospect.composite_score,
                predicted_metrics: prospect.predicted_metrics,
            })
            .collect();

        Self {
            version: Uuid::new_v4(),
            generated_at: Utc::now(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const CURRENT_POINTER: &str = "CURRENT";

/// Directory of versioned ranking artifacts plus the current pointer
#[derive(Debug, Clone)]
pub struct RankingStore {
    dir: PathBuf,
}

impl RankingStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn artifact_name(version: Uuid) -> String {
        format!("ranking-{}.json", version)
    }

    /// Write the ranking under its version, then atomically swap the
    /// current pointer. The previous artifact stays valid until the swap.
    pub fn promote(&self, ranking: &Ranking) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let artifact_path = self.dir.join(Self::artifact_name(ranking.version));
        let tmp_path = artifact_path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            serde_json::to_writer_pretty(&mut file, ranking)?;
            file.flush()?;
        }
        fs::rename(&tmp_path, &artifact_path)?;

        let pointer_tmp = self.dir.join(format!("{}.tmp", CURRENT_POINTER));
        fs::write(&pointer_tmp, Self::artifact_name(ranking.version))?;
        fs::rename(&pointer_tmp, self.dir.join(CURRENT_POINTER))?;

        log::info!(
            "Promoted ranking {} ({} prospects) at {}",
            ranking.version,
            ranking.len(),
            artifact_path.display()
        );
        Ok(artifact_path)
    }

    /// Path of the currently promoted artifact, if any
    pub fn current_path(&self) -> Option<PathBuf> {
        let name = fs::read_to_string(self.dir.join(CURRENT_POINTER)).ok()?;
        let path = self.dir.join(name.trim());
        path.exists().then_some(path)
    }

    /// Load the currently promoted ranking
    pub fn load_current(&self) -> Result<Ranking> {
        let path = self.current_path().ok_or_else(|| {
            FarmsightError::RankingError(format!(
                "no promoted ranking under {}",
                self.dir.display()
            ))
        })?;
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
