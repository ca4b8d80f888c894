//! Scripted engine for tests.
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream crates.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::board::Position;
use crate::config::EngineConfig;
use crate::engine::{EngineError, EngineSession, Variation};
use crate::Evaluation;

/// A call received by a [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Configure(EngineConfig),
    /// FEN of the loaded position.
    SetPosition(String),
    BestMove,
    Evaluate,
    TopLines(usize),
    Shutdown,
}

/// Shared record of the calls a [`ScriptedEngine`] received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    fn push(&self, call: EngineCall) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }
}

#[derive(Debug, Clone)]
enum Fault {
    Terminated,
    Garbled(String),
}

/// An [`EngineSession`] that answers from a fixed script.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    best_move: Option<String>,
    evaluation: Evaluation,
    lines: Vec<Variation>,
    fault: Option<Fault>,
    log: CallLog,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self {
            best_move: None,
            evaluation: Evaluation::Centipawns(0),
            lines: Vec::new(),
            fault: None,
            log: CallLog::default(),
        }
    }
}

impl ScriptedEngine {
    /// An engine that reports no legal moves and a level position.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best_move(mut self, mv: &str) -> Self {
        self.best_move = Some(mv.to_string());
        self
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Append a raw line (UCI moves) to the lines returned by `top_lines`.
    pub fn with_line(mut self, moves: Vec<String>, evaluation: Evaluation) -> Self {
        self.lines.push(Variation { moves, evaluation });
        self
    }

    /// Every query fails as if the process had died.
    pub fn terminated(mut self) -> Self {
        self.fault = Some(Fault::Terminated);
        self
    }

    /// Every query fails with an unparseable response.
    pub fn garbled(mut self, response: &str) -> Self {
        self.fault = Some(Fault::Garbled(response.to_string()));
        self
    }

    /// Handle to the calls this engine receives, usable after the engine has
    /// been moved into a service.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn check(&self) -> Result<(), EngineError> {
        match &self.fault {
            None => Ok(()),
            Some(Fault::Terminated) => Err(EngineError::Terminated),
            Some(Fault::Garbled(r)) => Err(EngineError::InvalidResponse(r.clone())),
        }
    }
}

#[async_trait]
impl EngineSession for ScriptedEngine {
    async fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.log.push(EngineCall::Configure(config.clone()));
        self.check()
    }

    async fn set_position(&mut self, position: &Position) -> Result<(), EngineError> {
        self.log.push(EngineCall::SetPosition(position.fen()));
        self.check()
    }

    async fn best_move(&mut self) -> Result<Option<String>, EngineError> {
        self.log.push(EngineCall::BestMove);
        self.check()?;
        Ok(self.best_move.clone())
    }

    async fn evaluate(&mut self) -> Result<Evaluation, EngineError> {
        self.log.push(EngineCall::Evaluate);
        self.check()?;
        Ok(self.evaluation)
    }

    async fn top_lines(&mut self, n: usize) -> Result<Vec<Variation>, EngineError> {
        self.log.push(EngineCall::TopLines(n));
        self.check()?;
        Ok(self.lines.iter().take(n).cloned().collect())
    }

    fn is_alive(&mut self) -> bool {
        !matches!(self.fault, Some(Fault::Terminated))
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.log.push(EngineCall::Shutdown);
        Ok(())
    }
}
