//! Structured result of analyzing one position.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uci::EngineLine;

/// The result of analyzing one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAnalysis {
    /// The position that was analyzed, in FEN.
    pub position: String,
    /// Candidate lines ordered by rank, best first. Scores are from White's
    /// point of view.
    pub lines: Vec<EngineLine>,
    /// The engine's own top choice, before any human-likeness adjustment.
    pub best_move: Option<String>,
}

impl PositionAnalysis {
    /// Build an analysis from the latest report per rank.
    ///
    /// Engines score from the side to move; when the FEN has black to move
    /// the scores are negated so they read from White's side.
    pub fn from_ranked(
        position: impl Into<String>,
        lines: BTreeMap<u32, EngineLine>,
        best_move: Option<String>,
    ) -> Self {
        let position = position.into();
        let flip = black_to_move(&position);
        let lines = lines
            .into_values()
            .map(|mut line| {
                if flip {
                    line.score = line.score.negated();
                }
                line
            })
            .collect();
        Self {
            position,
            lines,
            best_move,
        }
    }

    /// The rank-1 line, if any was reported.
    pub fn best_line(&self) -> Option<&EngineLine> {
        self.lines.first()
    }

    /// True when the engine reported no move at all.
    pub fn is_terminal(&self) -> bool {
        self.best_move.is_none() && self.lines.is_empty()
    }
}

/// Whether the FEN's active-colour field is `b`.
fn black_to_move(fen: &str) -> bool {
    fen.split_whitespace().nth(1) == Some("b")
}
