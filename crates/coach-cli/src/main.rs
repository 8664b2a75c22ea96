//! Coach CLI - rating-aware engine analysis from the command line.
//!
//! Every command prints a JSON document on stdout. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coach_engine::{
    clamp_to_bucket, fallback_hint, resolve_profile, Coach, CoachConfig, DifficultyProfile,
    MoveSelector, PositionAnalysis, Reply,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Rating-aware chess engine analysis")]
struct Cli {
    /// Path to the configuration file (defaults to ./coach.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a position at the strength matching a rating
    Analyze {
        /// Position in FEN
        #[arg(long)]
        fen: String,
        /// Player rating
        #[arg(long, default_value = "1200", allow_hyphen_values = true)]
        rating: i32,
    },
    /// Choose the engine's reply for a player of the given rating
    Reply {
        /// Position in FEN
        #[arg(long)]
        fen: String,
        /// Player rating
        #[arg(long, default_value = "1200", allow_hyphen_values = true)]
        rating: i32,
        /// Seed for reproducible move selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the difficulty profile used for a rating
    Profile {
        /// Player rating
        #[arg(long, allow_hyphen_values = true)]
        rating: i32,
    },
}

#[derive(Serialize)]
struct AnalyzeOutput {
    bucket: u32,
    hint: String,
    analysis: PositionAnalysis,
}

#[derive(Serialize)]
struct ReplyOutput {
    bucket: u32,
    #[serde(flatten)]
    reply: Reply,
}

#[derive(Serialize)]
struct ProfileOutput {
    rating: i32,
    bucket: u32,
    profile: DifficultyProfile,
}

fn load_config(path: Option<&PathBuf>) -> Result<CoachConfig, coach_engine::ConfigError> {
    match path {
        Some(path) => CoachConfig::load_from(path),
        None => CoachConfig::load(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Profile { rating } => {
            let bucket = clamp_to_bucket(rating);
            print_json(&ProfileOutput {
                rating,
                bucket,
                profile: resolve_profile(bucket),
            })
        }
        Commands::Analyze { fen, rating } => {
            let coach = Coach::new(load_config(cli.config.as_ref())?);
            let bucket = clamp_to_bucket(rating);
            let analysis = coach.analyze_position(&fen, rating).await?;
            print_json(&AnalyzeOutput {
                bucket,
                hint: fallback_hint(&analysis, bucket),
                analysis,
            })
        }
        Commands::Reply { fen, rating, seed } => {
            let coach = Coach::new(load_config(cli.config.as_ref())?);
            let mut selector = match seed {
                Some(seed) => MoveSelector::seeded(seed),
                None => MoveSelector::from_entropy(),
            };
            tracing::info!(rating, ?seed, "choosing reply");
            let reply = coach.choose_reply_with(&fen, rating, &mut selector).await?;
            print_json(&ReplyOutput {
                bucket: clamp_to_bucket(rating),
                reply,
            })
        }
    }
}
