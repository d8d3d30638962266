//! Record store access
//!
//! The raw record store is an external collaborator; the pipeline only sees
//! it through the `RecordStore` trait. Bulk reads are the one stage of the
//! pipeline allowed to block, and the only one retried on transient failure.

pub mod csv_store;

pub use csv_store::CsvStore;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::record::{MlbOutcome, PlayerInfo, RawGameRecord, StatcastSummary};
use crate::types::PlayerId;
use hashbrown::HashMap;
use std::time::Duration;

/// Read access to one snapshot of the raw record store
pub trait RecordStore: Send + Sync {
    /// All per-game records in the snapshot
    fn load_games(&self) -> Result<Vec<RawGameRecord>>;

    /// Player reference rows (birth dates, canonical positions)
    fn load_players(&self) -> Result<Vec<PlayerInfo>>;

    /// Realized MLB outcomes for players that have them
    fn load_mlb_outcomes(&self) -> Result<Vec<MlbOutcome>>;

    /// Advanced batted-ball summaries where available
    fn load_statcast(&self) -> Result<Vec<StatcastSummary>>;
}

/// A fully loaded, indexed snapshot of the store
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub games: Vec<RawGameRecord>,
    pub players: HashMap<PlayerId, PlayerInfo>,
    pub mlb_outcomes: HashMap<PlayerId, MlbOutcome>,
    pub statcast: HashMap<PlayerId, StatcastSummary>,
}

impl Snapshot {
    /// Load every table through the store trait, retrying each bulk read
    /// with bounded exponential backoff.
    pub fn load(store: &dyn RecordStore, config: &StoreConfig) -> Result<Self> {
        let games = with_retry(config, "games", || store.load_games())?;
        let players = with_retry(config, "players", || store.load_players())?;
        let outcomes = with_retry(config, "mlb_outcomes", || store.load_mlb_outcomes())?;
        let statcast = with_retry(config, "statcast", || store.load_statcast())?;

        Ok(Self {
            games,
            players: players.into_iter().map(|p| (p.player_id, p)).collect(),
            mlb_outcomes: outcomes.into_iter().map(|o| (o.player_id, o)).collect(),
            statcast: statcast.into_iter().map(|s| (s.player_id, s)).collect(),
        })
    }
}

/// Retry a bulk read with bounded exponential backoff
fn with_retry<T, F>(config: &StoreConfig, table: &str, mut read: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match read() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries => {
                attempt += 1;
                let delay = config.retry_delay_ms * u64::from(attempt);
                log::warn!(
                    "Loading {} failed (attempt {}/{}): {}; retrying in {}ms",
                    table,
                    attempt,
                    config.max_retries,
                    e,
                    delay
                );
                std::thread::sleep(Duration::from_millis(delay));
            }
            Err(e) => return Err(e),
        }
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    games: Vec<RawGameRecord>,
    players: Vec<PlayerInfo>,
    mlb_outcomes: Vec<MlbOutcome>,
    statcast: Vec<StatcastSummary>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_game(&mut self, record: RawGameRecord) {
        self.games.push(record);
    }

    pub fn add_player(&mut self, player: PlayerInfo) {
        self.players.push(player);
    }

    pub fn add_mlb_outcome(&mut self, outcome: MlbOutcome) {
        self.mlb_outcomes.push(outcome);
    }

    pub fn add_statcast(&mut self, summary: StatcastSummary) {
        self.statcast.push(summary);
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

impl RecordStore for InMemoryStore {
    fn load_games(&self) -> Result<Vec<RawGameRecord>> {
        Ok(self.games.clone())
    }

    fn load_players(&self) -> Result<Vec<PlayerInfo>> {
        Ok(self.players.clone())
    }

    fn load_mlb_outcomes(&self) -> Result<Vec<MlbOutcome>> {
        Ok(self.mlb_outcomes.clone())
    }

    fn load_statcast(&self) -> Result<Vec<StatcastSummary>> {
        Ok(self.statcast.clone())
    }
}
