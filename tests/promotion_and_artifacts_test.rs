//! Promotion atomicity and model-artifact lifecycle tests

use chrono::NaiveDate;
use farmsight::config::PipelineConfig;
use farmsight::engine::ProspectPipeline;
use farmsight::model::regressor::ModelArtifact;
use farmsight::ranking::RankingStore;
use farmsight::record::{BattingLine, MlbOutcome, PlayerInfo, RawGameRecord};
use farmsight::store::InMemoryStore;
use farmsight::types::Level;
use std::sync::Arc;
use tempfile::TempDir;

fn populated_store() -> InMemoryStore {
    let mut store = InMemoryStore::new();
    for i in 0..30u64 {
        let id = 9000 + i;
        store.add_player(PlayerInfo {
            player_id: id,
            name: format!("Graduate {}", i),
            birth_date: NaiveDate::from_ymd_opt(1999, 3, 1),
            position: "SS".to_string(),
        });
        store.add_game(RawGameRecord {
            player_id: id,
            season: 2024,
            level: Level::TripleA,
            position: "SS".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            batting: Some(BattingLine {
                pa: 450,
                ab: 410,
                h: 95 + i as u32 * 2,
                doubles: 22,
                triples: 1,
                hr: 12,
                bb: 35,
                so: 100,
                sb: 8,
                cs: 4,
                hbp: 3,
                sf: 2,
            }),
            pitching: None,
        });
        store.add_mlb_outcome(MlbOutcome {
            player_id: id,
            pa: 400,
            ab: 370,
            outs_pitched: 0,
            wrc_plus: 75.0 + 1.5 * i as f64,
            woba: 0.290 + 0.002 * i as f64,
            ops: 0.660 + 0.004 * i as f64,
            era: 0.0,
            fip: 0.0,
        });
    }
    for i in 0..15u64 {
        let id = 100 + i;
        store.add_player(PlayerInfo {
            player_id: id,
            name: format!("Prospect {}", i),
            birth_date: NaiveDate::from_ymd_opt(2003, 5, 1),
            position: "CF".to_string(),
        });
        store.add_game(RawGameRecord {
            player_id: id,
            season: 2024,
            level: Level::DoubleA,
            position: "CF".to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            batting: Some(BattingLine {
                pa: 420,
                ab: 380,
                h: 90 + (i as u32 % 9) * 4,
                doubles: 18,
                triples: 3,
                hr: 9,
                bb: 35,
                so: 85,
                sb: 15,
                cs: 5,
                hbp: 3,
                sf: 2,
            }),
            pitching: None,
        });
    }
    store
}

#[test]
fn failed_run_leaves_previous_ranking_promoted() {
    let dir = TempDir::new().unwrap();
    let ranking_store = RankingStore::new(dir.path());

    // First run promotes a good ranking
    let pipeline =
        ProspectPipeline::new(PipelineConfig::default(), Arc::new(populated_store()));
    let (run, _) = pipeline.run_and_promote(&ranking_store).unwrap();
    let promoted_version = run.ranking.version;

    // Second run against a broken (empty) store fails before promotion
    let broken =
        ProspectPipeline::new(PipelineConfig::default(), Arc::new(InMemoryStore::new()));
    assert!(broken.run_and_promote(&ranking_store).is_err());

    // Consumers still see the first ranking, complete and untouched
    let current = ranking_store.load_current().unwrap();
    assert_eq!(current.version, promoted_version);
    assert_eq!(current.len(), run.ranking.len());
}

#[test]
fn model_artifact_roundtrips_and_scores_independently() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(populated_store());

    // Offline fit, persisted
    let pipeline = ProspectPipeline::new(PipelineConfig::default(), store.clone());
    let artifact = pipeline.fit().unwrap();
    let path = dir.path().join("model.json");
    artifact.save(&path).unwrap();

    // A separate scoring pass loads the artifact and ranks
    let loaded = ModelArtifact::load(&path).unwrap();
    assert_eq!(loaded.version, artifact.version);
    assert_eq!(loaded.targets.len(), artifact.targets.len());

    let scoring_pipeline = ProspectPipeline::new(PipelineConfig::default(), store);
    let ranking = scoring_pipeline.score_with(&loaded).unwrap();
    assert_eq!(ranking.len(), 15);
    assert_eq!(ranking.entries[0].rank, 1);
}

#[test]
fn artifact_diagnostics_include_holdout_r2() {
    let pipeline =
        ProspectPipeline::new(PipelineConfig::default(), Arc::new(populated_store()));
    let artifact = pipeline.fit().unwrap();

    for target in &artifact.targets {
        let d = &target.diagnostics;
        assert!(d.train_examples >= 10);
        assert!(d.validation_examples > 0);
        assert!(d.r2_validation.is_some());
    }
    // Pitcher target has no examples in this snapshot and fails in isolation
    assert!(!artifact.failures.is_empty());
}
