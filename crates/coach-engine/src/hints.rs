//! Coaching text: hints, move explanations and post-game summaries.
//!
//! Natural-language text comes from an external generator behind
//! [`HintGenerator`]. Whenever it is missing, fails, or returns nothing, a
//! deterministic fallback builds the text from the analysis alone.

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::PositionAnalysis;

/// Errors reported by a hint generator.
#[derive(Error, Debug)]
pub enum HintError {
    /// The backing service is not configured or not reachable.
    #[error("Hint service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with an error.
    #[error("Hint generation failed: {0}")]
    Failed(String),
}

/// Turns an analysis into advice for a player of the given rating bucket.
///
/// Implementations must accept analyses without any lines (terminal positions).
/// Only [`generate`](Self::generate) is required; generators that cannot
/// explain moves or summarize games report [`HintError::Unavailable`].
#[async_trait]
pub trait HintGenerator: Send + Sync {
    async fn generate(&self, analysis: &PositionAnalysis, bucket: u32) -> Result<String, HintError>;

    /// Explain why `mv` is good or bad in the analyzed position.
    async fn explain(
        &self,
        analysis: &PositionAnalysis,
        mv: &str,
        bucket: u32,
    ) -> Result<String, HintError> {
        let _ = (analysis, mv, bucket);
        Err(HintError::Unavailable("move explanations not supported".to_string()))
    }

    /// Summarize a finished game given as PGN or a move list.
    async fn summarize(&self, game: &str, bucket: u32) -> Result<String, HintError> {
        let _ = (game, bucket);
        Err(HintError::Unavailable("game summaries not supported".to_string()))
    }
}

fn usable(result: Result<String, HintError>, kind: &'static str) -> Option<String> {
    match result {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            tracing::warn!(kind, "generator returned empty text");
            None
        }
        Err(e) => {
            tracing::warn!(kind, error = %e, "generator failed");
            None
        }
    }
}

/// Ask `generator` for a hint, falling back to [`fallback_hint`].
pub async fn hint_or_fallback(
    generator: Option<&dyn HintGenerator>,
    analysis: &PositionAnalysis,
    bucket: u32,
) -> String {
    if let Some(generator) = generator {
        if let Some(hint) = usable(generator.generate(analysis, bucket).await, "hint") {
            return hint;
        }
    }
    fallback_hint(analysis, bucket)
}

/// Ask `generator` to explain `mv`, falling back to [`fallback_explanation`].
pub async fn explanation_or_fallback(
    generator: Option<&dyn HintGenerator>,
    analysis: &PositionAnalysis,
    mv: Option<&str>,
    bucket: u32,
) -> String {
    if let (Some(generator), Some(mv)) = (generator, mv) {
        if let Some(text) = usable(generator.explain(analysis, mv, bucket).await, "explanation") {
            return text;
        }
    }
    fallback_explanation(analysis, mv, bucket)
}

/// Summary and practice tips for a finished game.
///
/// `game` is PGN or a move list; it is only read by the generator.
pub async fn post_game_summary(
    generator: Option<&dyn HintGenerator>,
    game: &str,
    bucket: u32,
) -> String {
    if let Some(generator) = generator {
        if let Some(text) = usable(generator.summarize(game, bucket).await, "summary") {
            return text;
        }
    }
    fallback_summary(bucket)
}

fn advice(bucket: u32) -> &'static str {
    if bucket <= 800 {
        "Before every move, check what your opponent is threatening and make sure none of your pieces are left unprotected."
    } else if bucket <= 1400 {
        "After it, look for forcing replies first: checks, captures, and threats like forks and pins."
    } else {
        "Compare it with the alternatives concretely and work out your opponent's strongest answer."
    }
}

fn suggested_move(analysis: &PositionAnalysis) -> Option<&str> {
    analysis
        .best_move
        .as_deref()
        .or_else(|| analysis.best_line().and_then(|l| l.first_move()))
}

/// Deterministic hint built from the engine's analysis. Never empty.
pub fn fallback_hint(analysis: &PositionAnalysis, bucket: u32) -> String {
    let Some(mv) = suggested_move(analysis) else {
        return "No move to suggest: the game is over in this position.".to_string();
    };

    let mut hint = format!("Consider {}. {}", mv, advice(bucket));

    let follow_up: Vec<&str> = analysis
        .best_line()
        .map(|l| l.pv.iter().skip(1).take(2).map(String::as_str).collect())
        .unwrap_or_default();
    if !follow_up.is_empty() {
        hint.push_str(&format!(" Likely continuation: {}.", follow_up.join(", ")));
    }
    hint
}

/// Deterministic explanation of `mv` based on where the engine ranks it.
pub fn fallback_explanation(analysis: &PositionAnalysis, mv: Option<&str>, bucket: u32) -> String {
    let Some(mv) = mv else {
        return "No move to explain: the game is over in this position.".to_string();
    };

    let rank = analysis
        .lines
        .iter()
        .position(|l| l.first_move() == Some(mv));
    let verdict = match (rank, suggested_move(analysis)) {
        (Some(0), _) => format!("{} is the engine's first choice here.", mv),
        (Some(i), _) => format!(
            "{} is a reasonable option, ranked {} among the engine's candidates.",
            mv,
            i + 1
        ),
        (None, Some(best)) if best != mv => format!(
            "{} is not among the engine's top candidates; it prefers {}.",
            mv, best
        ),
        (None, _) => format!("{} is the engine's suggestion.", mv),
    };
    format!("{} {}", verdict, advice(bucket))
}

/// Template summary with three practice tips for the bucket. Never empty.
pub fn fallback_summary(bucket: u32) -> String {
    let tips = if bucket <= 800 {
        [
            "Before each move, list every check and capture for both sides",
            "Develop knights and bishops before bringing out the queen",
            "Practise the basic king and queen checkmate",
        ]
    } else if bucket <= 1400 {
        [
            "Solve a few tactical puzzles every day",
            "Go back to the moments where you missed a fork or pin",
            "Practise simple king and pawn endgames",
        ]
    } else {
        [
            "Find the turning point of the game and work out a better plan there",
            "Check your opening choices against the main lines",
            "Study rook endgames until the key positions are automatic",
        ]
    };
    format!(
        "Game review: go over the opening, the critical middlegame moments and any pieces lost along the way. Tips: 1) {}; 2) {}; 3) {}.",
        tips[0], tips[1], tips[2]
    )
}
