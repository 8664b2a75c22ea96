//! UCI info line types.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N plies; the sign tells which side delivers it.
    Mate(i32),
}

impl Score {
    /// The same score seen from the other side.
    pub fn negated(self) -> Score {
        match self {
            Score::Cp(cp) => Score::Cp(cp.saturating_neg()),
            Score::Mate(m) => Score::Mate(m.saturating_neg()),
        }
    }
}

/// One candidate continuation reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLine {
    /// 1-based `multipv` slot. Only stable within one search.
    pub rank: u32,
    /// Principal variation in coordinate notation, immediate move first.
    pub pv: Vec<String>,
    /// Evaluation of this line.
    pub score: Score,
    /// Depth at which this line was reported.
    pub depth: u32,
}

impl EngineLine {
    /// Centipawn score, if this line is not a mate score.
    pub fn centipawns(&self) -> Option<i32> {
        match self.score {
            Score::Cp(cp) => Some(cp),
            Score::Mate(_) => None,
        }
    }

    /// Mate distance, if this line is a mate score.
    pub fn mate(&self) -> Option<i32> {
        match self.score {
            Score::Mate(m) => Some(m),
            Score::Cp(_) => None,
        }
    }

    /// First move of the principal variation.
    pub fn first_move(&self) -> Option<&str> {
        self.pv.first().map(String::as_str)
    }

    /// Format as a UCI info line.
    pub fn to_uci(&self) -> String {
        let score = match self.score {
            Score::Cp(cp) => format!("cp {}", cp),
            Score::Mate(m) => format!("mate {}", m),
        };
        let mut line = format!(
            "info depth {} multipv {} score {} pv",
            self.depth, self.rank, score
        );
        for mv in &self.pv {
            line.push(' ');
            line.push_str(mv);
        }
        line
    }
}

/// Decode an analysis `info` line.
///
/// Only lines starting with `info` that carry both a `score` and a `pv` token are
/// analysis lines. `depth` defaults to 0 and `multipv` to 1 when missing or
/// malformed. A score whose value does not parse leaves the line without a score,
/// so it is not reported at all.
pub fn decode_info_line(raw: &str) -> Option<EngineLine> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.first() != Some(&"info") {
        return None;
    }
    let pv_idx = parts.iter().position(|&t| t == "pv")?;
    let score_idx = parts.iter().position(|&t| t == "score")?;

    let int_after = |key: &str| -> Option<&str> {
        let i = parts.iter().position(|&t| t == key)?;
        parts.get(i + 1).copied()
    };

    let depth = int_after("depth")
        .and_then(|d| d.parse::<u32>().ok())
        .unwrap_or(0);
    let rank = int_after("multipv")
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|&r| r > 0)
        .unwrap_or(1);

    let value = parts.get(score_idx + 2).and_then(|v| v.parse::<i32>().ok());
    let score = match (parts.get(score_idx + 1).copied(), value) {
        (Some("cp"), Some(cp)) => Score::Cp(cp),
        (Some("mate"), Some(m)) => Score::Mate(m),
        _ => return None,
    };

    let pv = parts[pv_idx + 1..].iter().map(|s| s.to_string()).collect();

    Some(EngineLine {
        rank,
        pv,
        score,
        depth,
    })
}

/// Builder for constructing [`EngineLine`]s.
#[derive(Debug, Clone)]
pub struct InfoBuilder {
    line: EngineLine,
}

impl Default for InfoBuilder {
    fn default() -> Self {
        Self {
            line: EngineLine {
                rank: 1,
                pv: Vec::new(),
                score: Score::Cp(0),
                depth: 0,
            },
        }
    }
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank(mut self, rank: u32) -> Self {
        self.line.rank = rank;
        self
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.line.depth = d;
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.line.score = Score::Cp(cp);
        self
    }

    pub fn score_mate(mut self, plies: i32) -> Self {
        self.line.score = Score::Mate(plies);
        self
    }

    pub fn pv<S: Into<String>>(mut self, moves: impl IntoIterator<Item = S>) -> Self {
        self.line.pv = moves.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> EngineLine {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_centipawn_line() {
        let line = decode_info_line("info depth 12 multipv 1 score cp 34 pv e2e4 e7e5 g1f3").unwrap();

        assert_eq!(line.rank, 1);
        assert_eq!(line.centipawns(), Some(34));
        assert_eq!(line.mate(), None);
        assert_eq!(line.depth, 12);
        assert_eq!(line.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn decode_mate_line() {
        let line = decode_info_line("info depth 18 multipv 2 score mate -3 pv e2e4").unwrap();

        assert_eq!(line.rank, 2);
        assert_eq!(line.mate(), Some(-3));
        assert_eq!(line.centipawns(), None);
    }

    #[test]
    fn decode_stockfish_line_with_extra_fields() {
        let raw = "info depth 20 seldepth 27 multipv 3 score cp 18 upperbound nodes 1234567 \
                   nps 987654 hashfull 312 tbhits 0 time 1250 pv d2d4 g8f6 c2c4";
        let line = decode_info_line(raw).unwrap();

        assert_eq!(line.rank, 3);
        assert_eq!(line.depth, 20);
        assert_eq!(line.score, Score::Cp(18));
        assert_eq!(line.pv, vec!["d2d4", "g8f6", "c2c4"]);
    }

    #[test]
    fn missing_depth_and_multipv_use_defaults() {
        let line = decode_info_line("info score cp 5 pv g1f3").unwrap();
        assert_eq!(line.depth, 0);
        assert_eq!(line.rank, 1);
    }

    #[test]
    fn malformed_numbers_are_treated_as_absent() {
        let line = decode_info_line("info depth x multipv ? score cp 7 pv e2e4").unwrap();
        assert_eq!(line.depth, 0);
        assert_eq!(line.rank, 1);
        assert_eq!(line.centipawns(), Some(7));
    }

    #[test]
    fn unparseable_score_is_not_an_analysis_line() {
        assert!(decode_info_line("info depth 4 score cp abc pv e2e4").is_none());
        assert!(decode_info_line("info depth 4 score wdl 500 pv e2e4").is_none());
    }

    #[test]
    fn lines_without_score_or_pv_are_skipped() {
        assert!(decode_info_line("info depth 15 nodes 50000 pv e2e4").is_none());
        assert!(decode_info_line("info depth 5 score cp 0 nodes 1000").is_none());
        assert!(decode_info_line("info string NNUE evaluation enabled").is_none());
        assert!(decode_info_line("bestmove e2e4").is_none());
    }

    #[test]
    fn empty_pv_is_kept() {
        let line = decode_info_line("info depth 1 score mate 0 pv").unwrap();
        assert!(line.pv.is_empty());
        assert_eq!(line.first_move(), None);
    }

    #[test]
    fn builder_encodes_info_line() {
        let line = InfoBuilder::new()
            .depth(10)
            .rank(2)
            .score_cp(35)
            .pv(["e2e4", "e7e5"])
            .build();

        assert_eq!(line.to_uci(), "info depth 10 multipv 2 score cp 35 pv e2e4 e7e5");
    }

    #[test]
    fn negated_flips_both_score_kinds() {
        assert_eq!(Score::Cp(35).negated(), Score::Cp(-35));
        assert_eq!(Score::Mate(-3).negated(), Score::Mate(3));
        assert_eq!(Score::Mate(0).negated(), Score::Mate(0));
        assert_eq!(Score::Cp(i32::MIN).negated(), Score::Cp(i32::MAX));
    }

    fn coordinate_move() -> impl Strategy<Value = String> {
        "[a-h][1-8][a-h][1-8][qrbn]?"
    }

    proptest! {
        #[test]
        fn info_line_round_trips(
            depth in 0u32..128,
            rank in 1u32..=500,
            mate in any::<bool>(),
            value in any::<i32>(),
            pv in prop::collection::vec(coordinate_move(), 0..12),
        ) {
            let builder = InfoBuilder::new().depth(depth).rank(rank).pv(pv.clone());
            let line = if mate { builder.score_mate(value) } else { builder.score_cp(value) }.build();

            let decoded = decode_info_line(&line.to_uci()).unwrap();

            prop_assert_eq!(decoded.rank, rank);
            prop_assert_eq!(decoded.depth, depth);
            prop_assert_eq!(&decoded.pv, &pv);
            prop_assert_eq!(decoded.mate().is_some(), mate);
            prop_assert_eq!(decoded.centipawns().is_some(), !mate);
            prop_assert_eq!(decoded.score, line.score);
        }
    }
}
