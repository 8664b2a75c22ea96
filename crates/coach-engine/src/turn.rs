//! A full player turn: validate the player's move, answer it, and coach.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uci::Score;

use crate::analysis::PositionAnalysis;
use crate::difficulty::clamp_to_bucket;
use crate::hints::{explanation_or_fallback, hint_or_fallback, HintGenerator};
use crate::oracle::{validate_reply, GameStatus, RulesOracle, Side};
use crate::selector::MoveSelector;
use crate::session::{Coach, Reply, SessionError};

/// Reasons a turn cannot be played.
#[derive(Error, Debug)]
pub enum TurnError {
    /// The game was already decided before the move.
    #[error("Game is already over: {0:?}")]
    GameOver(GameStatus),
    /// The player's move is not legal in the position.
    #[error("Illegal move {mv} in {position}")]
    IllegalMove { position: String, mv: String },
    /// The engine session behind the reply failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Number of candidates reported in [`TurnOutcome::top_moves`].
pub const TOP_MOVES: usize = 3;

/// A score from White's side and from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub white: Score,
    pub player: Score,
}

impl Evaluation {
    /// Evaluation of a White-perspective score for a player of colour `player`.
    pub fn new(white: Score, player: Side) -> Self {
        let for_player = match player {
            Side::White => white,
            Side::Black => white.negated(),
        };
        Self {
            white,
            player: for_player,
        }
    }
}

/// One of the engine's top candidates in the analyzed position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMove {
    pub mv: String,
    pub evaluation: Evaluation,
}

/// Everything that happened during one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub position_before: String,
    /// Colour the player moves with, taken from `position_before`.
    pub player: Side,
    pub player_move: String,
    pub position_after: String,
    /// Engine reply; `None` when the game ended on the player's move, the
    /// engine found no move, or its move was rejected.
    pub reply: Option<String>,
    pub position_after_reply: Option<String>,
    /// Status of the latest position.
    pub status: GameStatus,
    /// Side that delivered checkmate, if the game ended that way.
    pub winner: Option<Side>,
    /// Rank-1 evaluation of the position the engine replied in.
    pub evaluation: Option<Evaluation>,
    /// Rank-1 principal variation from that position.
    pub pv: Vec<String>,
    /// Up to [`TOP_MOVES`] candidates with their evaluations.
    pub top_moves: Vec<CandidateMove>,
    /// Coaching hint drawn from the reply analysis.
    pub hint: Option<String>,
    pub analysis: Option<PositionAnalysis>,
}

/// A move and what the coach has to say about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveExplanation {
    /// The explained move; the engine's best move when none was given.
    pub mv: Option<String>,
    pub explanation: String,
    pub analysis: PositionAnalysis,
}

/// The move the engine would play here and a hint about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveHint {
    pub reply: Reply,
    pub hint: String,
}

impl Coach {
    /// Play `player_move` from `position` and answer at the strength of `rating`.
    ///
    /// # Errors
    ///
    /// - [`TurnError::GameOver`] if `position` is already decided
    /// - [`TurnError::IllegalMove`] if the oracle rejects `player_move`
    /// - [`TurnError::Session`] if the engine session fails
    pub async fn play_turn<O>(
        &self,
        position: &str,
        player_move: &str,
        rating: i32,
        oracle: &O,
        hints: Option<&dyn HintGenerator>,
    ) -> Result<TurnOutcome, TurnError>
    where
        O: RulesOracle + ?Sized,
    {
        let mut selector = MoveSelector::from_entropy();
        self.play_turn_with(position, player_move, rating, oracle, hints, &mut selector)
            .await
    }

    /// [`play_turn`](Self::play_turn) with a caller-supplied selector.
    pub async fn play_turn_with<O, R>(
        &self,
        position: &str,
        player_move: &str,
        rating: i32,
        oracle: &O,
        hints: Option<&dyn HintGenerator>,
        selector: &mut MoveSelector<R>,
    ) -> Result<TurnOutcome, TurnError>
    where
        O: RulesOracle + ?Sized,
        R: Rng,
    {
        let status = oracle.status(position);
        if status.is_over() {
            return Err(TurnError::GameOver(status));
        }

        let illegal = || TurnError::IllegalMove {
            position: position.to_string(),
            mv: player_move.to_string(),
        };
        if !oracle.is_legal(position, player_move) {
            return Err(illegal());
        }
        let position_after = oracle.apply(position, player_move).ok_or_else(illegal)?;

        let player = oracle.side_to_move(position);
        let status = oracle.status(&position_after);
        let mut outcome = TurnOutcome {
            position_before: position.to_string(),
            player,
            player_move: player_move.to_string(),
            position_after: position_after.clone(),
            reply: None,
            position_after_reply: None,
            status,
            winner: winner(oracle, &position_after, status),
            evaluation: None,
            pv: Vec::new(),
            top_moves: Vec::new(),
            hint: None,
            analysis: None,
        };
        if status.is_over() {
            tracing::info!(?status, winner = ?outcome.winner, "game decided by player move");
            return Ok(outcome);
        }

        let Reply { mv, analysis } = self
            .choose_reply_with(&position_after, rating, selector)
            .await?;

        if let Some(mv) = mv {
            match validate_reply(oracle, &position_after, &mv) {
                Ok(next) => {
                    outcome.status = oracle.status(&next);
                    outcome.winner = winner(oracle, &next, outcome.status);
                    outcome.reply = Some(mv);
                    outcome.position_after_reply = Some(next);
                }
                Err(e) => tracing::warn!(error = %e, "discarding engine reply"),
            }
        }

        if let Some(best) = analysis.best_line() {
            outcome.evaluation = Some(Evaluation::new(best.score, player));
            outcome.pv = best.pv.clone();
        }
        outcome.top_moves = analysis
            .lines
            .iter()
            .filter_map(|line| {
                line.first_move().map(|mv| CandidateMove {
                    mv: mv.to_string(),
                    evaluation: Evaluation::new(line.score, player),
                })
            })
            .take(TOP_MOVES)
            .collect();

        let bucket = clamp_to_bucket(rating);
        outcome.hint = Some(hint_or_fallback(hints, &analysis, bucket).await);
        outcome.analysis = Some(analysis);
        Ok(outcome)
    }

    /// Explain `mv` in `position`, or the engine's best move when `mv` is `None`.
    pub async fn explain_move(
        &self,
        position: &str,
        mv: Option<&str>,
        rating: i32,
        hints: Option<&dyn HintGenerator>,
    ) -> Result<MoveExplanation, SessionError> {
        let analysis = self.analyze_position(position, rating).await?;
        let mv = mv.map(str::to_string).or_else(|| analysis.best_move.clone());
        let explanation =
            explanation_or_fallback(hints, &analysis, mv.as_deref(), clamp_to_bucket(rating)).await;
        Ok(MoveExplanation {
            mv,
            explanation,
            analysis,
        })
    }

    /// The reply the engine would choose in `position`, with a hint about it.
    pub async fn live_hint(
        &self,
        position: &str,
        rating: i32,
        hints: Option<&dyn HintGenerator>,
    ) -> Result<LiveHint, SessionError> {
        let mut selector = MoveSelector::from_entropy();
        self.live_hint_with(position, rating, hints, &mut selector)
            .await
    }

    /// [`live_hint`](Self::live_hint) with a caller-supplied selector.
    pub async fn live_hint_with<R: Rng>(
        &self,
        position: &str,
        rating: i32,
        hints: Option<&dyn HintGenerator>,
        selector: &mut MoveSelector<R>,
    ) -> Result<LiveHint, SessionError> {
        let reply = self.choose_reply_with(position, rating, selector).await?;
        let hint = hint_or_fallback(hints, &reply.analysis, clamp_to_bucket(rating)).await;
        Ok(LiveHint { reply, hint })
    }
}

/// The checkmating side: the opponent of the side left to move.
fn winner<O>(oracle: &O, position: &str, status: GameStatus) -> Option<Side>
where
    O: RulesOracle + ?Sized,
{
    (status == GameStatus::Checkmate).then(|| oracle.side_to_move(position).opponent())
}
