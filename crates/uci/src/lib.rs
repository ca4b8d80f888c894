//! UCI (Universal Chess Interface) protocol, GUI side.
//!
//! This crate formats the commands a GUI sends to an engine and parses the
//! messages the engine sends back. It performs no I/O; process handling lives
//! in `chess-analysis`.
//!
//! # Commands sent to the engine
//!
//! - `uci` / `isready` - Handshake and synchronization
//! - `setoption name <name> value <value>` - Configure the engine
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go [movetime <ms>] [depth <d>]` - Start search
//! - `stop` / `quit`
//!
//! # Messages read from the engine
//!
//! - `id name <name>`, `uciok`, `readyok`
//! - `info ...` - Search progress, see [`EngineInfo`]
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, Score, ScoreBound};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum UciError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id { name: Option<String>, author: Option<String> },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Search finished. `mv` is `None` when the engine reports `(none)` or
    /// the null move `0000`, i.e. the position has no legal moves.
    BestMove { mv: Option<String>, ponder: Option<String> },
    /// Anything else (`option`, `copyprotection`, banner text, ...).
    Other(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    pub fn parse(line: &str) -> Result<Self, UciError> {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("uciok") => Ok(EngineMessage::UciOk),
            Some("readyok") => Ok(EngineMessage::ReadyOk),
            Some("id") => match parts.next() {
                Some("name") => Ok(EngineMessage::Id {
                    name: Some(rest_after(line, "name")),
                    author: None,
                }),
                Some("author") => Ok(EngineMessage::Id {
                    name: None,
                    author: Some(rest_after(line, "author")),
                }),
                _ => Ok(EngineMessage::Other(line.to_string())),
            },
            Some("info") => EngineInfo::parse(line)
                .map(EngineMessage::Info)
                .ok_or_else(|| UciError::ParseError(line.to_string())),
            Some("bestmove") => {
                let mv = parts
                    .next()
                    .ok_or_else(|| UciError::ParseError("bestmove without a move".to_string()))?;
                let mv = match mv {
                    "(none)" | "0000" => None,
                    m => Some(m.to_string()),
                };
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(str::to_string),
                    _ => None,
                };
                Ok(EngineMessage::BestMove { mv, ponder })
            }
            _ => Ok(EngineMessage::Other(line.to_string())),
        }
    }
}

/// Everything after the first occurrence of `keyword` and its trailing space.
fn rest_after(line: &str, keyword: &str) -> String {
    line.split_once(keyword)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}
