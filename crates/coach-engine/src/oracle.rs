//! Contract for the chess-rules collaborator.
//!
//! Move legality and game-outcome detection are supplied by the host; this
//! crate only depends on the [`RulesOracle`] trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Outcome classification of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoves,
    ThreefoldRepetition,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// Move legality and game-state queries over FEN positions.
pub trait RulesOracle {
    /// Whether `mv` (coordinate notation) is legal in `position`.
    fn is_legal(&self, position: &str, mv: &str) -> bool;
    /// Position after playing `mv`, or `None` if it cannot be applied.
    fn apply(&self, position: &str, mv: &str) -> Option<String>;
    /// Terminal-state classification of `position`.
    fn status(&self, position: &str) -> GameStatus;
    fn side_to_move(&self, position: &str) -> Side;
}

/// An engine reply the rules oracle rejected.
///
/// Happens when the oracle's and the engine's view of a position disagree,
/// typically because the input position was malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Engine reply {mv} is not legal in {position}")]
pub struct InvalidReplyMove {
    pub position: String,
    pub mv: String,
}

/// Check an engine reply and return the position after it.
pub fn validate_reply<O>(oracle: &O, position: &str, mv: &str) -> Result<String, InvalidReplyMove>
where
    O: RulesOracle + ?Sized,
{
    let invalid = || InvalidReplyMove {
        position: position.to_string(),
        mv: mv.to_string(),
    };
    if !oracle.is_legal(position, mv) {
        return Err(invalid());
    }
    oracle.apply(position, mv).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Knows exactly one legal move.
    struct OneMove;

    impl RulesOracle for OneMove {
        fn is_legal(&self, _position: &str, mv: &str) -> bool {
            mv == "e2e4"
        }

        fn apply(&self, _position: &str, mv: &str) -> Option<String> {
            (mv == "e2e4").then(|| "after-e2e4".to_string())
        }

        fn status(&self, _position: &str) -> GameStatus {
            GameStatus::Ongoing
        }

        fn side_to_move(&self, _position: &str) -> Side {
            Side::White
        }
    }

    #[test]
    fn validate_accepts_legal_reply() {
        assert_eq!(validate_reply(&OneMove, "start", "e2e4").unwrap(), "after-e2e4");
    }

    #[test]
    fn validate_rejects_illegal_reply() {
        let err = validate_reply(&OneMove, "start", "e2e5").unwrap_err();
        assert_eq!(err.mv, "e2e5");
        assert_eq!(err.to_string(), "Engine reply e2e5 is not legal in start");
    }

    #[test]
    fn opponent_swaps_sides() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.opponent(), Side::White);
    }

    #[test]
    fn only_ongoing_is_not_over() {
        assert!(!GameStatus::Ongoing.is_over());
        for status in [
            GameStatus::Checkmate,
            GameStatus::Stalemate,
            GameStatus::InsufficientMaterial,
            GameStatus::FiftyMoves,
            GameStatus::ThreefoldRepetition,
        ] {
            assert!(status.is_over());
        }
    }
}
