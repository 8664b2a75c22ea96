//! UCI command encoding.

use serde::{Deserialize, Serialize};

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Set an engine option. No acknowledgement is expected.
    SetOption { name: String, value: String },
    /// Set up a position from FEN.
    Position { fen: String },
    /// Start calculating.
    Go(SearchLimit),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
}

/// How long the engine should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLimit {
    /// Search to this depth in plies.
    Depth(u32),
    /// Search for exactly this time in milliseconds.
    MoveTime(u64),
}

impl SearchLimit {
    /// Pick the limit to send, preferring depth when both are available.
    pub fn prefer_depth(depth: Option<u32>, movetime_ms: u64) -> Self {
        match depth {
            Some(d) => SearchLimit::Depth(d),
            None => SearchLimit::MoveTime(movetime_ms),
        }
    }
}

impl GuiCommand {
    /// Build a `setoption` command from any displayable value.
    pub fn set_option(name: impl Into<String>, value: impl ToString) -> Self {
        GuiCommand::SetOption {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// Format as a single protocol line (without trailing newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            GuiCommand::Position { fen } => format!("position fen {}", fen),
            GuiCommand::Go(SearchLimit::Depth(d)) => format!("go depth {}", d),
            GuiCommand::Go(SearchLimit::MoveTime(ms)) => format!("go movetime {}", ms),
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

/// The two commands that start a search on `fen`.
pub fn start_search(fen: &str, limit: SearchLimit) -> [GuiCommand; 2] {
    [
        GuiCommand::Position {
            fen: fen.to_string(),
        },
        GuiCommand::Go(limit),
    ]
}
