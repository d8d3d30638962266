//! Pipeline driver
//!
//! Runs the batch DAG: snapshot → factor tables → context features →
//! (fit) → predict → score → rank. All per-run state lives in an explicit
//! `RunContext` that is dropped when the run ends; nothing carries over
//! between runs. Fitting and scoring are independent entry points joined
//! by the model artifact.

use crate::config::PipelineConfig;
use crate::error::{FarmsightError, Result};
use crate::factors::age_curve::AgeModel;
use crate::factors::{LeagueFactor, LeagueFactorCalculator, PositionFactor, PositionFactorCalculator};
use crate::features::{ContextFeatureEngine, FeatureSet};
use crate::model::regressor::{ModelArtifact, PredictiveRegressor};
use crate::model::training::build_training_set;
use crate::ranking::{Ranking, RankingStore};
use crate::record::age_between;
use crate::scoring::{score_all, CompositeScorer, ScoringInputs};
use crate::store::{RecordStore, Snapshot};
use crate::translation::TranslationModel;
use crate::types::{Level, PlayerId, PositionGroup, Season};
use chrono::{Duration, NaiveDate};
use hashbrown::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-run derived state: the factor tables and feature vectors for one
/// snapshot. Scoped to a single run and discarded at its end.
pub struct RunContext {
    pub as_of: NaiveDate,
    pub league: HashMap<(Season, Level), LeagueFactor>,
    pub position: HashMap<(Season, Level, PositionGroup), PositionFactor>,
    pub features: FeatureSet,
    pub current_ages: HashMap<PlayerId, f64>,
}

/// The output of a full pipeline run
pub struct PipelineRun {
    pub artifact: ModelArtifact,
    pub ranking: Ranking,
}

/// Batch prospect-evaluation pipeline
pub struct ProspectPipeline {
    config: PipelineConfig,
    store: Arc<dyn RecordStore>,
}

impl ProspectPipeline {
    pub fn new(config: PipelineConfig, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a snapshot and derive all per-run state
    fn build_context(&self, snapshot: &Snapshot) -> Result<RunContext> {
        if snapshot.games.is_empty() {
            return Err(FarmsightError::StoreError(
                "snapshot contains no game records".to_string(),
            ));
        }

        // The as-of date anchors current ages; deriving it from the
        // snapshot keeps reruns over frozen data reproducible.
        let as_of = match self.config.as_of {
            Some(date) => date,
            None => {
                let latest = snapshot
                    .games
                    .iter()
                    .map(|g| g.game_date)
                    .max()
                    .expect("non-empty snapshot");
                latest + Duration::days(1)
            }
        };

        log::info!(
            "Computing factor tables over {} game records (as of {})",
            snapshot.games.len(),
            as_of
        );
        let league = LeagueFactorCalculator::new(self.config.translation.fip_constant)
            .calculate(&snapshot.games, &snapshot.players);
        let position =
            PositionFactorCalculator::new().calculate(&snapshot.games, &snapshot.players);
        log::info!(
            "League table: {} (season, level) rows; position table: {} cohorts",
            league.len(),
            position.len()
        );

        let features = ContextFeatureEngine::new(&self.config).build(
            &snapshot.games,
            &snapshot.players,
            &league,
            &position,
        );

        let current_ages = snapshot
            .players
            .values()
            .filter_map(|p| p.birth_date.map(|b| (p.player_id, age_between(b, as_of))))
            .collect();

        Ok(RunContext {
            as_of,
            league,
            position,
            features,
            current_ages,
        })
    }

    /// Offline fit: assemble the training set and produce a model artifact
    pub fn fit(&self) -> Result<ModelArtifact> {
        let snapshot = Snapshot::load(self.store.as_ref(), &self.config.store)?;
        let context = self.build_context(&snapshot)?;
        self.fit_in_context(&snapshot, &context)
    }

    fn fit_in_context(&self, snapshot: &Snapshot, context: &RunContext) -> Result<ModelArtifact> {
        let training_set = build_training_set(
            &context.features,
            &snapshot.mlb_outcomes,
            &self.config.training,
        );
        PredictiveRegressor::new(self.config.training).fit(&training_set)
    }

    /// Score every prospect with a previously fitted artifact
    pub fn score_with(&self, artifact: &ModelArtifact) -> Result<Ranking> {
        let snapshot = Snapshot::load(self.store.as_ref(), &self.config.store)?;
        let context = self.build_context(&snapshot)?;
        self.score_in_context(&snapshot, &context, artifact)
    }

    fn score_in_context(
        &self,
        snapshot: &Snapshot,
        context: &RunContext,
        artifact: &ModelArtifact,
    ) -> Result<Ranking> {
        let predictions = PredictiveRegressor::predict(artifact, &context.features)?;

        let age_model = AgeModel::new(&self.config.age);
        let translation = TranslationModel::new(self.config.translation.clone());
        let scorer = CompositeScorer::new(
            &self.config.scoring,
            &self.config.eligibility,
            &age_model,
            &translation,
        );
        let inputs = ScoringInputs {
            predictions: &predictions,
            current_ages: &context.current_ages,
            mlb_outcomes: &snapshot.mlb_outcomes,
            statcast: &snapshot.statcast,
        };
        let scored = score_all(&scorer, &context.features, &inputs);
        log::info!("Scored {} eligible prospects", scored.len());

        Ok(Ranking::from_scored(scored))
    }

    /// Full run: fit and score against the same snapshot
    pub fn run(&self) -> Result<PipelineRun> {
        let snapshot = Snapshot::load(self.store.as_ref(), &self.config.store)?;
        let context = self.build_context(&snapshot)?;
        let artifact = self.fit_in_context(&snapshot, &context)?;
        let ranking = self.score_in_context(&snapshot, &context, &artifact)?;
        Ok(PipelineRun { artifact, ranking })
    }

    /// Full run followed by atomic promotion of the ranking. Any failure
    /// before the promotion leaves the previous artifact untouched.
    pub fn run_and_promote(&self, ranking_store: &RankingStore) -> Result<(PipelineRun, PathBuf)> {
        let run = self.run()?;
        let path = ranking_store.promote(&run.ranking)?;
        Ok((run, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BattingLine, MlbOutcome, PlayerInfo, RawGameRecord};
    use crate::store::InMemoryStore;
    use chrono::NaiveDate;

    fn add_hitter_season(store: &mut InMemoryStore, id: u64, birth_year: i32, h: u32) {
        store.add_player(PlayerInfo {
            player_id: id,
            name: format!("Player {}", id),
            birth_date: NaiveDate::from_ymd_opt(birth_year, 1, 1),
            position: "SS".to_string(),
        });
        store.add_game(RawGameRecord {
            player_id: id,
            season: 2024,
            level: Level::DoubleA,
            position: "SS".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            batting: Some(BattingLine {
                pa: 450,
                ab: 400,
                h,
                doubles: 20,
                triples: 2,
                hr: 10,
                bb: 40,
                so: 90,
                sb: 10,
                cs: 3,
                hbp: 5,
                sf: 5,
            }),
            pitching: None,
        });
    }

    fn store_with_games() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        // Graduated players carry the MiLB-to-MLB relationship the
        // regressor learns from; their MLB time disqualifies them from
        // the prospect pool itself.
        for id in 1..=30u64 {
            add_hitter_season(&mut store, id, 1999, 100 + id as u32);
            store.add_mlb_outcome(MlbOutcome {
                player_id: id,
                pa: 300,
                ab: 270,
                outs_pitched: 0,
                wrc_plus: 90.0 + id as f64,
                woba: 0.300 + 0.001 * id as f64,
                ops: 0.700 + 0.002 * id as f64,
                era: 0.0,
                fip: 0.0,
            });
        }
        // Current prospects: no MLB record yet
        for id in 101..=110u64 {
            add_hitter_season(&mut store, id, 2003, 95 + (id as u32 % 7) * 5);
        }
        store
    }

    #[test]
    fn test_as_of_derives_from_latest_game_date() {
        let pipeline = ProspectPipeline::new(
            PipelineConfig::default(),
            Arc::new(store_with_games()),
        );
        let snapshot = Snapshot::load(pipeline.store.as_ref(), &pipeline.config.store).unwrap();
        let context = pipeline.build_context(&snapshot).unwrap();
        assert_eq!(context.as_of, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
    }

    #[test]
    fn test_empty_snapshot_is_fatal() {
        let pipeline =
            ProspectPipeline::new(PipelineConfig::default(), Arc::new(InMemoryStore::new()));
        assert!(pipeline.run().is_err());
    }

    #[test]
    fn test_full_run_produces_ranking() {
        let pipeline = ProspectPipeline::new(
            PipelineConfig::default(),
            Arc::new(store_with_games()),
        );
        let run = pipeline.run().unwrap();
        // Graduated players are excluded (MLB at-bats and age); the ten
        // current prospects rank
        assert_eq!(run.ranking.len(), 10);
        assert!(run.artifact.targets.len() >= 2);
        let ranks: Vec<u32> = run.ranking.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<u32>>());
        assert!(run
            .ranking
            .entries
            .iter()
            .all(|e| e.player_id >= 101));
    }
}
