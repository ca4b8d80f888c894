//! Stockfish (or any UCI engine) running as a child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use uci::{EngineMessage, GoOptions, GuiCommand};

use crate::board::{self, Position};
use crate::config::EngineConfig;
use crate::engine::{EngineError, EngineSession, Variation};
use crate::Evaluation;

/// How long `quit` may take before the process is killed.
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Startup settings for a [`UciEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound for the `uci`/`isready` handshake.
    pub handshake_timeout: Duration,
    /// Options sent with `setoption` right after the handshake.
    pub options: Vec<(String, String)>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            options: Vec::new(),
        }
    }
}

/// Result of one `go` command.
#[derive(Debug, Clone, Default)]
struct SearchOutcome {
    /// `MultiPV` the search ran with.
    multipv: usize,
    best_move: Option<String>,
    /// Last exact score of the first line, even when it came without a PV.
    score: Option<Evaluation>,
    /// Deepest exact line seen per `multipv` index.
    lines: Vec<Option<Variation>>,
}

/// A UCI engine process.
pub struct UciEngine {
    /// The engine process handle.
    child: Child,
    /// Writer for sending commands to the engine.
    stdin: ChildStdin,
    /// Reader for receiving responses from the engine.
    stdout: Lines<BufReader<ChildStdout>>,
    /// The engine's name (reported via UCI id).
    name: String,
    path: PathBuf,
    config: EngineConfig,
    /// The loaded position.
    position: Option<Position>,
    /// Reused by queries until the position or configuration changes.
    last_search: Option<SearchOutcome>,
    /// `MultiPV` value the engine currently holds.
    multipv: usize,
    /// A `go` was sent and its `bestmove` has not been read yet.
    searching: bool,
    /// `isready` commands whose `readyok` has not been read yet.
    pending_ready: usize,
}

impl UciEngine {
    /// Spawn the engine at `path` and complete the UCI handshake.
    ///
    /// # Errors
    ///
    /// - `EngineError::SpawnError` if the process fails to start
    /// - `EngineError::Timeout` if the handshake exceeds the configured bound
    /// - `EngineError::InitFailed` if the engine exits or misbehaves during it
    pub async fn spawn(path: &Path, settings: &EngineSettings) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::SpawnError)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::InitFailed("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::InitFailed("stdout not captured".to_string()))?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            name: String::new(),
            path: path.to_path_buf(),
            config: EngineConfig::default(),
            position: None,
            last_search: None,
            multipv: 1,
            searching: false,
            pending_ready: 0,
        };

        match tokio::time::timeout(settings.handshake_timeout, engine.handshake()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(EngineError::InitFailed(e.to_string())),
            Err(_) => return Err(EngineError::Timeout("uci handshake".to_string())),
        }

        for (name, value) in &settings.options {
            engine.send(&GuiCommand::set_option(name, value)).await?;
        }
        engine.send(&GuiCommand::UciNewGame).await?;
        engine.sync().await?;

        tracing::info!(engine = %engine.name, path = %engine.path.display(), "Engine ready");
        Ok(engine)
    }

    /// Returns the engine's name as reported via UCI protocol.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(&GuiCommand::Uci).await?;
        loop {
            match self.read_message().await? {
                EngineMessage::Id {
                    name: Some(name), ..
                } => self.name = name,
                EngineMessage::UciOk => break,
                _ => {}
            }
        }
        if self.name.is_empty() {
            self.name = "Unknown Engine".to_string();
        }
        self.sync().await
    }

    /// Send `isready` and wait until every outstanding `readyok` is read.
    async fn sync(&mut self) -> Result<(), EngineError> {
        self.send(&GuiCommand::IsReady).await?;
        self.pending_ready += 1;
        while self.pending_ready > 0 {
            self.read_message().await?;
        }
        Ok(())
    }

    /// Consume replies owed to an operation that was dropped midway, so the
    /// next command starts against a quiet engine.
    ///
    /// A dropped search is stopped and drained up to its `bestmove`; the
    /// engine may answer `readyok` before that, so a sync alone is not enough.
    async fn settle(&mut self) -> Result<(), EngineError> {
        if self.searching {
            tracing::warn!(engine = %self.name, "Stopping abandoned search");
            self.send(&GuiCommand::Stop).await?;
            while self.searching {
                self.read_message().await?;
            }
            self.last_search = None;
        }
        if self.pending_ready > 0 {
            self.sync().await?;
        }
        Ok(())
    }

    /// Send a command to the engine.
    async fn send(&mut self, command: &GuiCommand) -> Result<(), EngineError> {
        let mut line = command.to_uci();
        tracing::trace!(command = %line, "-> engine");
        line.push('\n');
        // One write per line, so a dropped caller never leaves half a command.
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read and parse the next line of engine output, tracking the replies
    /// still owed by the engine.
    async fn read_message(&mut self) -> Result<EngineMessage, EngineError> {
        let line = self.stdout.next_line().await?.ok_or(EngineError::Terminated)?;
        tracing::trace!(line = %line, "<- engine");
        let message =
            EngineMessage::parse(&line).map_err(|e| EngineError::InvalidResponse(e.to_string()))?;
        match &message {
            EngineMessage::ReadyOk => self.pending_ready = self.pending_ready.saturating_sub(1),
            EngineMessage::BestMove { .. } => self.searching = false,
            _ => {}
        }
        Ok(message)
    }

    async fn set_multipv(&mut self, multipv: usize) -> Result<(), EngineError> {
        if self.multipv != multipv {
            self.send(&GuiCommand::set_option("MultiPV", multipv)).await?;
            self.multipv = multipv;
        }
        Ok(())
    }

    /// Run a search on the loaded position with the active configuration.
    async fn search(&mut self, multipv: usize) -> Result<SearchOutcome, EngineError> {
        let position = self.position.clone().ok_or(EngineError::NoPosition)?;
        self.settle().await?;
        self.set_multipv(multipv).await?;

        let go = match self.config.time_budget {
            Some(budget) => GoOptions::movetime(budget),
            None => GoOptions::depth(self.config.depth),
        };
        self.send(&GuiCommand::Go(go)).await?;
        self.searching = true;

        let mut outcome = SearchOutcome {
            multipv,
            ..SearchOutcome::default()
        };

        loop {
            match self.read_message().await? {
                EngineMessage::Info(info) => {
                    // Bounds come from aspiration-window fail highs/lows.
                    let Some(score) = info.exact_score() else {
                        continue;
                    };
                    let index = info.multipv.unwrap_or(1).max(1) as usize - 1;
                    if index == 0 {
                        outcome.score = Some(score.into());
                    }
                    if !info.pv.is_empty() {
                        if outcome.lines.len() <= index {
                            outcome.lines.resize(index + 1, None);
                        }
                        outcome.lines[index] = Some(Variation {
                            moves: info.pv,
                            evaluation: score.into(),
                        });
                    }
                }
                EngineMessage::BestMove { mv, .. } => {
                    outcome.best_move = mv;
                    break;
                }
                _ => {}
            }
        }

        tracing::debug!(
            engine = %self.name,
            best_move = ?outcome.best_move,
            score = ?outcome.score,
            lines = outcome.lines.len(),
            "Search finished"
        );
        check_best_move(&position, outcome.best_move.as_deref())?;
        Ok(outcome)
    }

    /// The last search if it covers `multipv` lines, otherwise a new one.
    async fn ensure_search(&mut self, multipv: usize) -> Result<&SearchOutcome, EngineError> {
        let fresh = matches!(&self.last_search, Some(s) if s.multipv >= multipv);
        if !fresh {
            let outcome = self.search(multipv).await;
            // Left alone while a search is still running; the next search resets it.
            if !self.searching {
                self.set_multipv(1).await?;
            }
            self.last_search = Some(outcome?);
        }
        self.last_search
            .as_ref()
            .ok_or_else(|| EngineError::InvalidResponse("no search result".to_string()))
    }
}

#[async_trait]
impl EngineSession for UciEngine {
    async fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.settle().await?;
        self.send(&GuiCommand::set_option("Skill Level", config.skill_level))
            .await?;
        self.sync().await?;
        self.config = config.clone();
        self.last_search = None;
        Ok(())
    }

    async fn set_position(&mut self, position: &Position) -> Result<(), EngineError> {
        self.settle().await?;
        self.send(&GuiCommand::Position { fen: position.fen() }).await?;
        self.sync().await?;
        self.position = Some(position.clone());
        self.last_search = None;
        Ok(())
    }

    async fn best_move(&mut self) -> Result<Option<String>, EngineError> {
        Ok(self.ensure_search(1).await?.best_move.clone())
    }

    async fn evaluate(&mut self) -> Result<Evaluation, EngineError> {
        self.ensure_search(1)
            .await?
            .score
            .ok_or_else(|| EngineError::InvalidResponse("search finished without a score".to_string()))
    }

    async fn top_lines(&mut self, n: usize) -> Result<Vec<Variation>, EngineError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let outcome = self.ensure_search(n).await?;
        Ok(outcome.lines.iter().flatten().take(n).cloned().collect())
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        // The engine may already be gone; killing below covers that case.
        let _ = self.send(&GuiCommand::Quit).await;

        match tokio::time::timeout(QUIT_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(engine = %self.name, ?status, "Engine exited");
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::Io(e)),
            Err(_) => {
                tracing::warn!(engine = %self.name, "Engine ignored quit, killing");
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}

/// Reject a `bestmove` that cannot belong to `position`.
fn check_best_move(position: &Position, best_move: Option<&str>) -> Result<(), EngineError> {
    match best_move {
        Some(mv) if !board::legal_moves(position).iter().any(|legal| legal == mv) => Err(
            EngineError::InvalidResponse(format!("bestmove {} is not legal in {}", mv, position)),
        ),
        None if position.has_legal_moves() => Err(EngineError::InvalidResponse(format!(
            "no bestmove for {}",
            position
        ))),
        _ => Ok(()),
    }
}
