//! Engine orchestration for a chess coach.
//!
//! Drives a UCI engine (Stockfish by default) as a subprocess to analyze
//! positions and pick human-like replies for a player's rating.
//!
//! # Overview
//!
//! - [`EngineProcess`] - One engine subprocess with a bounded UCI handshake
//! - [`DifficultyProfile`] - Search budget and candidate pools per rating bucket
//! - [`MoveSelector`] - Weighted choice among the engine's ranked lines
//! - [`AnalysisSession`] - Spawn, configure, search, and always tear down
//! - [`Coach`] - Entry point: analysis, replies, turns, hints and explanations
//!
//! Move legality is delegated to a [`RulesOracle`] and hint text to a
//! [`HintGenerator`], both supplied by the host.
//!
//! # Example
//!
//! ```ignore
//! use coach_engine::{Coach, CoachConfig};
//!
//! let coach = Coach::new(CoachConfig::load()?);
//! let reply = coach.choose_reply(fen, 1200).await?;
//! println!("Engine plays {:?}", reply.mv);
//! ```

pub mod analysis;
pub mod config;
pub mod difficulty;
pub mod hints;
pub mod oracle;
pub mod process;
pub mod selector;
pub mod session;
pub mod turn;

pub use analysis::PositionAnalysis;
pub use config::{CoachConfig, ConfigError, EngineConfig, SearchTimeoutPolicy};
pub use difficulty::{
    clamp_to_bucket, profile_for_rating, resolve_profile, DifficultyProfile, SearchBudget,
};
pub use hints::{
    explanation_or_fallback, fallback_explanation, fallback_hint, fallback_summary,
    hint_or_fallback, post_game_summary, HintError, HintGenerator,
};
pub use oracle::{validate_reply, GameStatus, InvalidReplyMove, RulesOracle, Side};
pub use process::{EngineError, EngineProcess, SearchDeadline};
pub use selector::MoveSelector;
pub use session::{AnalysisSession, Coach, Reply, SessionError, SessionState};
pub use turn::{CandidateMove, Evaluation, LiveHint, MoveExplanation, TurnError, TurnOutcome};
