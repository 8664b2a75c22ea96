//! Handle owning one UCI engine subprocess.
//!
//! The handle spawns the engine with piped stdio. Background reader tasks drain
//! stdout and stderr into one ordered queue, and the calling task sends commands
//! and awaits the lines it needs. The handshake waits are bounded. The search
//! wait ends on `bestmove`, or on an optional defensive deadline.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uci::{EngineLine, EngineMessage, GuiCommand};

use crate::analysis::PositionAnalysis;
use crate::config::{EngineConfig, SearchTimeoutPolicy};
use crate::difficulty::SearchBudget;

/// UCI option controlling how many lines the engine reports.
pub const MULTI_PV_OPTION: &str = "MultiPV";

/// Errors that can occur when working with an engine process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine executable could not be started.
    #[error("Engine unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A handshake acknowledgement did not arrive in time.
    #[error("Engine did not acknowledge `{command}` within {timeout:?}")]
    StartupTimeout {
        command: &'static str,
        timeout: Duration,
    },
    /// The search outlived its defensive deadline.
    #[error("Engine search exceeded {0:?}")]
    SearchTimeout(Duration),
    /// The engine closed its output before answering.
    #[error("Engine process exited unexpectedly")]
    Exited,
    /// Writing to the engine failed.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Defensive bound on one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDeadline {
    pub after: Duration,
    pub policy: SearchTimeoutPolicy,
}

/// One running engine subprocess.
///
/// Every operation takes `&mut self`, so a handle serves one request at a time.
/// Dropping the handle kills the process; [`close`](Self::close) does so
/// gracefully and waits for it to exit.
pub struct EngineProcess {
    /// The engine process handle.
    child: Child,
    /// Writer for sending commands to the engine. `None` once closed.
    stdin: Option<ChildStdin>,
    /// Lines from stdout and stderr, in arrival order.
    lines: mpsc::UnboundedReceiver<String>,
    /// Tasks draining the output streams.
    readers: Vec<JoinHandle<()>>,
    /// The engine's name (reported via `id name`).
    name: String,
    closed: bool,
}

impl EngineProcess {
    /// Spawn the engine described by `config` and perform the UCI handshake.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Unavailable`] if the process cannot be spawned
    /// - [`EngineError::StartupTimeout`] if `uciok` or `readyok` is late
    /// - [`EngineError::Exited`] if the process dies during the handshake
    ///
    /// The process is killed before any handshake error is returned.
    pub async fn open(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Unavailable {
                path: config.path.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::Exited)?;
        let stdout = child.stdout.take().ok_or(EngineError::Exited)?;
        let stderr = child.stderr.take().ok_or(EngineError::Exited)?;

        let (tx, lines) = mpsc::unbounded_channel();
        let readers = vec![spawn_reader(stdout, tx.clone()), spawn_reader(stderr, tx)];

        let mut engine = Self {
            child,
            stdin: Some(stdin),
            lines,
            readers,
            name: String::new(),
            closed: false,
        };
        tracing::debug!(
            pid = ?engine.id(),
            path = %config.path.display(),
            "spawned engine"
        );

        if let Err(e) = engine.handshake(config.handshake_timeout()).await {
            engine.close().await;
            return Err(e);
        }
        Ok(engine)
    }

    /// OS process id, or `None` once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the engine's name as reported via UCI protocol.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send(&GuiCommand::Uci).await?;
        self.wait_for(uci::UCI_OK, "uci", timeout).await?;
        self.send(&GuiCommand::IsReady).await?;
        self.wait_for(uci::READY_OK, "isready", timeout).await?;
        tracing::debug!(engine = %self.name, "engine ready");
        Ok(())
    }

    /// Wait for a line containing `token`, capturing the engine name on the way.
    async fn wait_for(
        &mut self,
        token: &str,
        command: &'static str,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        let wait = async {
            loop {
                let line = self.next_line().await?;
                if line.contains(token) {
                    return Ok(());
                }
                if let EngineMessage::Id { key, value } = EngineMessage::parse(&line) {
                    if key == "name" {
                        self.name = value;
                    }
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| EngineError::StartupTimeout { command, timeout })?
    }

    /// Set an engine option. The protocol sends no acknowledgement.
    pub async fn configure(&mut self, name: &str, value: impl ToString) -> Result<(), EngineError> {
        self.send(&GuiCommand::set_option(name, value)).await
    }

    /// Analyze `position` and collect up to `candidate_pool` ranked lines.
    ///
    /// Lines are keyed by their `multipv` rank and later reports replace earlier
    /// ones. The search ends when the engine prints `bestmove`. With a
    /// `deadline`, an overdue search is stopped and either fails or returns
    /// what was collected, depending on the deadline's policy.
    pub async fn analyze(
        &mut self,
        position: &str,
        budget: SearchBudget,
        candidate_pool: u32,
        deadline: Option<SearchDeadline>,
    ) -> Result<PositionAnalysis, EngineError> {
        self.configure(MULTI_PV_OPTION, candidate_pool).await?;
        for cmd in uci::start_search(position, budget.limit()) {
            self.send(&cmd).await?;
        }

        let mut ranked = BTreeMap::new();
        let best_move = match deadline {
            None => self.collect(&mut ranked).await?,
            Some(deadline) => {
                let outcome = tokio::time::timeout(deadline.after, self.collect(&mut ranked)).await;
                match outcome {
                    Ok(best) => best?,
                    Err(_) => self.abandon_search(deadline, &ranked).await?,
                }
            }
        };

        tracing::debug!(
            lines = ranked.len(),
            best_move = best_move.as_deref().unwrap_or("(none)"),
            "search finished"
        );
        Ok(PositionAnalysis::from_ranked(position, ranked, best_move))
    }

    /// Pull lines until `bestmove`, recording the latest line per rank.
    async fn collect(
        &mut self,
        ranked: &mut BTreeMap<u32, EngineLine>,
    ) -> Result<Option<String>, EngineError> {
        loop {
            let raw = self.next_line().await?;
            if let Some(line) = uci::decode_info_line(&raw) {
                ranked.insert(line.rank, line);
                continue;
            }
            if let Some(best) = uci::decode_best_move(&raw) {
                return Ok(best.mv);
            }
            tracing::trace!(line = %raw, "skipping non-analysis line");
        }
    }

    async fn abandon_search(
        &mut self,
        deadline: SearchDeadline,
        ranked: &BTreeMap<u32, EngineLine>,
    ) -> Result<Option<String>, EngineError> {
        tracing::warn!(
            after = ?deadline.after,
            lines = ranked.len(),
            "search deadline expired"
        );
        // The session closes the process next, so a failed stop is harmless.
        let _ = self.send(&GuiCommand::Stop).await;

        match deadline.policy {
            SearchTimeoutPolicy::Fail => Err(EngineError::SearchTimeout(deadline.after)),
            SearchTimeoutPolicy::ReturnPartial => Ok(ranked
                .values()
                .next()
                .and_then(EngineLine::first_move)
                .map(str::to_string)),
        }
    }

    /// Shut the engine down: best-effort `quit`, then kill and reap.
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let pid = self.id();

        // The process may already be gone; nothing to report then.
        let _ = self.send(&GuiCommand::Quit).await;
        self.stdin = None;

        if let Err(e) = self.child.kill().await {
            tracing::debug!(?pid, error = %e, "engine already exited");
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.lines.close();
        tracing::debug!(?pid, "engine closed");
    }

    /// Send a command to the engine.
    async fn send(&mut self, cmd: &GuiCommand) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Exited)?;
        let line = cmd.to_uci();
        tracing::trace!(command = %line, "-> engine");
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Next queued output line; `Exited` once both streams have closed.
    async fn next_line(&mut self) -> Result<String, EngineError> {
        self.lines.recv().await.ok_or(EngineError::Exited)
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.child.start_kill();
        }
        for reader in &self.readers {
            reader.abort();
        }
    }
}

fn spawn_reader<R>(stream: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    })
}
