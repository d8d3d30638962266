//! farmsight CLI - thin wrapper over the pipeline stages
//!
//! ## Example Usage
//!
//! ```bash
//! # Fit models and persist the artifact
//! farmsight fit --data-dir snapshot/ --model-out models/latest.json
//!
//! # Score with an existing artifact and promote a new ranking
//! farmsight score --data-dir snapshot/ --model models/latest.json --out-dir rankings/
//!
//! # Fit, score and promote in one pass
//! farmsight run --data-dir snapshot/ --out-dir rankings/
//!
//! # Inspect the league factor tables
//! farmsight factors --data-dir snapshot/
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use farmsight::config::PipelineConfig;
use farmsight::engine::ProspectPipeline;
use farmsight::factors::LeagueFactorCalculator;
use farmsight::model::regressor::ModelArtifact;
use farmsight::ranking::RankingStore;
use farmsight::store::{CsvStore, Snapshot};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// farmsight: minor-league prospect evaluation pipeline
#[derive(Parser)]
#[command(name = "farmsight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Context-normalized MiLB prospect ranking", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the per-target regressors and persist a versioned model artifact
    Fit {
        /// Directory of CSV snapshot files
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Where to write the model artifact
        #[arg(short, long, default_value = "model.json")]
        model_out: PathBuf,
    },
    /// Score all prospects with an existing model artifact
    Score {
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Previously fitted model artifact
        #[arg(short, long)]
        model: PathBuf,
        /// Ranking output directory
        #[arg(short, long, default_value = "rankings")]
        out_dir: PathBuf,
        /// Print the top N prospects
        #[arg(short, long, default_value_t = 25)]
        top: usize,
    },
    /// Fit, score and promote in a single pass
    Run {
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long, default_value = "rankings")]
        out_dir: PathBuf,
        #[arg(short, long, default_value_t = 25)]
        top: usize,
    },
    /// Print the league factor tables for a snapshot
    Factors {
        #[arg(short, long)]
        data_dir: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn pipeline(config: PipelineConfig, data_dir: &PathBuf) -> ProspectPipeline {
    ProspectPipeline::new(config, Arc::new(CsvStore::new(data_dir)))
}

fn print_top(ranking: &farmsight::ranking::Ranking, top: usize) {
    println!("{}", "Rank  Player      Role     Score".bold());
    for entry in ranking.entries.iter().take(top) {
        println!(
            "{:>4}  {:<10}  {:<7}  {:>7.2}",
            entry.rank,
            entry.player_id,
            entry.role.to_string(),
            entry.composite_score
        );
    }
    if ranking.len() > top {
        println!("... {} more", ranking.len() - top);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Fit {
            data_dir,
            model_out,
        } => {
            let artifact = pipeline(config, &data_dir).fit()?;
            artifact.save(&model_out)?;
            println!(
                "{} model {} ({} targets, {} failures)",
                "Fitted".green().bold(),
                artifact.version,
                artifact.targets.len(),
                artifact.failures.len()
            );
            for target in &artifact.targets {
                let d = &target.diagnostics;
                println!(
                    "  {:<10} r2_train={:.3} r2_validation={}",
                    target.target.name(),
                    d.r2_train,
                    d.r2_validation
                        .map_or("n/a".to_string(), |r2| format!("{:.3}", r2))
                );
            }
        }
        Commands::Score {
            data_dir,
            model,
            out_dir,
            top,
        } => {
            let artifact = ModelArtifact::load(&model)?;
            let ranking = pipeline(config, &data_dir).score_with(&artifact)?;
            let path = RankingStore::new(&out_dir).promote(&ranking)?;
            println!(
                "{} ranking {} ({} prospects) -> {}",
                "Promoted".green().bold(),
                ranking.version,
                ranking.len(),
                path.display()
            );
            print_top(&ranking, top);
        }
        Commands::Run {
            data_dir,
            out_dir,
            top,
        } => {
            let (run, path) =
                pipeline(config, &data_dir).run_and_promote(&RankingStore::new(&out_dir))?;
            println!(
                "{} ranking {} ({} prospects) -> {}",
                "Promoted".green().bold(),
                run.ranking.version,
                run.ranking.len(),
                path.display()
            );
            print_top(&run.ranking, top);
        }
        Commands::Factors { data_dir } => {
            let store = CsvStore::new(&data_dir);
            let snapshot = Snapshot::load(&store, &config.store)?;
            let table = LeagueFactorCalculator::new(config.translation.fip_constant)
                .calculate(&snapshot.games, &snapshot.players);

            let mut keys: Vec<_> = table.keys().copied().collect();
            keys.sort();
            println!(
                "{}",
                "Season  Level  PA      AVG    OBP    SLG    OPS    AgeMean".bold()
            );
            for key in keys {
                let f = &table[&key];
                println!(
                    "{:>6}  {:<5}  {:>6}  {:.3}  {:.3}  {:.3}  {:.3}  {}",
                    f.season,
                    f.level.to_string(),
                    f.total_pa,
                    f.avg,
                    f.obp,
                    f.slg,
                    f.ops,
                    f.ages
                        .map_or("n/a".to_string(), |a| format!("{:.1}", a.mean))
                );
            }
        }
    }

    Ok(())
}
