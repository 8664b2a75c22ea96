//! UCI (Universal Chess Interface) protocol codec.
//!
//! This crate translates between structured commands/analysis and the engine's
//! line-oriented text protocol. It holds no state beyond a single call.
//!
//! # Commands sent to the engine
//!
//! - `uci` / `uciok` - Handshake
//! - `isready` / `readyok` - Synchronization
//! - `setoption name <name> value <value>` - Configure the engine
//! - `position fen <fen>` - Set position
//! - `go movetime <ms>` / `go depth <d>` - Start search
//! - `stop` / `quit`
//!
//! # Lines read from the engine
//!
//! - `info ... multipv <n> score cp|mate <v> ... pv <moves>` - decoded into [`EngineLine`]
//! - `bestmove <move> [ponder <move>]` - decoded into [`BestMove`]
//!
//! Decoding is best-effort: engines emit many auxiliary lines, and anything that
//! does not look like analysis is reported as "not this kind of line" rather than
//! as an error.

mod command;
mod info;

pub use command::{start_search, GuiCommand, SearchLimit};
pub use info::{decode_info_line, EngineLine, InfoBuilder, Score};

use serde::{Deserialize, Serialize};

/// Token acknowledging the `uci` handshake.
pub const UCI_OK: &str = "uciok";
/// Token acknowledging an `isready` check.
pub const READY_OK: &str = "readyok";

/// Final line of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMove {
    /// The chosen move, or `None` when the position has no legal moves.
    pub mv: Option<String>,
    /// Move the engine expects in reply, if reported.
    pub ponder: Option<String>,
}

/// Decode a `bestmove` line.
///
/// Returns `None` if the line is not a `bestmove` line at all. A `bestmove`
/// without a move token (or with the `(none)` / `0000` placeholders engines use
/// for "no legal move") decodes to a [`BestMove`] whose `mv` is `None`.
pub fn decode_best_move(raw: &str) -> Option<BestMove> {
    let mut parts = raw.split_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }

    let mv = parts.next().filter(|m| !is_null_move(m)).map(str::to_string);
    let ponder = match parts.next() {
        Some("ponder") => parts.next().filter(|m| !is_null_move(m)).map(str::to_string),
        _ => None,
    };

    Some(BestMove { mv, ponder })
}

fn is_null_move(token: &str) -> bool {
    matches!(token, "(none)" | "0000")
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification (`id name ...` / `id author ...`).
    Id { key: String, value: String },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// A decodable analysis line.
    Info(EngineLine),
    /// Search finished.
    BestMove(BestMove),
    /// Anything else: option declarations, `info string`, `info currmove`, noise.
    Other(String),
}

impl EngineMessage {
    /// Classify a raw line of engine output.
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim();
        if let Some(best) = decode_best_move(line) {
            return EngineMessage::BestMove(best);
        }
        if let Some(info) = decode_info_line(line) {
            return EngineMessage::Info(info);
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(UCI_OK), None, None) => EngineMessage::UciOk,
            (Some(READY_OK), None, None) => EngineMessage::ReadyOk,
            (Some("id"), Some(key), Some(value)) => EngineMessage::Id {
                key: key.to_string(),
                value: value.trim().to_string(),
            },
            _ => EngineMessage::Other(line.to_string()),
        }
    }
}
