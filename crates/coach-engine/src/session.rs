//! Analysis sessions: one engine process per analyzed position.
//!
//! A session walks `Idle -> Spawning -> Configuring -> Searching -> Completed`,
//! or ends in `Failed` from any state. Once the process has been opened it is
//! closed on every exit path, including cancellation.

use std::future::Future;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::analysis::PositionAnalysis;
use crate::config::{CoachConfig, EngineConfig};
use crate::difficulty::{clamp_to_bucket, resolve_profile, DifficultyProfile};
use crate::process::{EngineError, EngineProcess, SearchDeadline};
use crate::selector::MoveSelector;

/// UCI option for the engine's strength dial.
pub const SKILL_LEVEL_OPTION: &str = "Skill Level";

/// Errors that end an analysis session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The engine process failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The caller cancelled the session.
    #[error("Analysis session cancelled")]
    Cancelled,
}

/// Lifecycle of one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Spawning,
    Configuring,
    Searching,
    Completed,
    Failed,
}

/// The engine's reply together with the analysis it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Move to play; `None` only when the position has no legal moves.
    pub mv: Option<String>,
    pub analysis: PositionAnalysis,
}

/// Runs one position through one freshly spawned engine.
pub struct AnalysisSession<'a> {
    config: &'a EngineConfig,
    profile: DifficultyProfile,
    state: SessionState,
}

impl<'a> AnalysisSession<'a> {
    pub fn new(config: &'a EngineConfig, profile: DifficultyProfile) -> Self {
        Self {
            config,
            profile,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Run the session to completion.
    pub async fn run(&mut self, position: &str) -> Result<PositionAnalysis, SessionError> {
        self.run_until(position, std::future::pending()).await
    }

    /// Run the session unless `cancel` resolves first.
    ///
    /// On cancellation the engine is closed and [`SessionError::Cancelled`] is
    /// returned; no partial analysis escapes.
    pub async fn run_until<F>(
        &mut self,
        position: &str,
        cancel: F,
    ) -> Result<PositionAnalysis, SessionError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        self.transition(SessionState::Spawning);
        let mut process = tokio::select! {
            opened = EngineProcess::open(self.config) => match opened {
                Ok(process) => process,
                Err(e) => return Err(self.fail(e.into())),
            },
            _ = &mut cancel => return Err(self.fail(SessionError::Cancelled)),
        };

        let result = tokio::select! {
            analysis = self.drive(&mut process, position) => analysis.map_err(SessionError::from),
            _ = &mut cancel => Err(SessionError::Cancelled),
        };
        process.close().await;

        match result {
            Ok(analysis) => {
                self.transition(SessionState::Completed);
                Ok(analysis)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn drive(
        &mut self,
        process: &mut EngineProcess,
        position: &str,
    ) -> Result<PositionAnalysis, EngineError> {
        self.transition(SessionState::Configuring);
        process
            .configure(SKILL_LEVEL_OPTION, self.profile.strength_level)
            .await?;

        self.transition(SessionState::Searching);
        let deadline = self
            .config
            .search_deadline(&self.profile.budget)
            .map(|after| SearchDeadline {
                after,
                policy: self.config.on_search_timeout,
            });
        process
            .analyze(
                position,
                self.profile.budget,
                self.profile.candidate_pool,
                deadline,
            )
            .await
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        tracing::warn!(state = ?self.state, error = %error, "analysis session failed");
        self.transition(SessionState::Failed);
        error
    }
}

/// Entry point for engine-backed analysis and replies.
///
/// Each call spawns its own engine process and tears it down before returning.
#[derive(Debug, Clone)]
pub struct Coach {
    engine: EngineConfig,
    limiter: Option<Arc<Semaphore>>,
}

impl Coach {
    pub fn new(config: CoachConfig) -> Self {
        Self {
            engine: config.engine,
            limiter: config
                .max_concurrent_sessions
                .map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Analyze `position` at the strength matching `rating`.
    pub async fn analyze_position(
        &self,
        position: &str,
        rating: i32,
    ) -> Result<PositionAnalysis, SessionError> {
        self.analyze_until(position, rating, std::future::pending())
            .await
    }

    /// Like [`analyze_position`](Self::analyze_position), aborting when `cancel` resolves.
    pub async fn analyze_until<F>(
        &self,
        position: &str,
        rating: i32,
        cancel: F,
    ) -> Result<PositionAnalysis, SessionError>
    where
        F: Future<Output = ()>,
    {
        let bucket = clamp_to_bucket(rating);
        let profile = resolve_profile(bucket);
        tokio::pin!(cancel);

        let _permit = tokio::select! {
            permit = self.admit() => permit,
            _ = &mut cancel => return Err(SessionError::Cancelled),
        };
        tracing::info!(rating, bucket, position, "analyzing position");

        AnalysisSession::new(&self.engine, profile)
            .run_until(position, cancel)
            .await
    }

    /// Analyze `position` and pick the reply a player of `rating` would make.
    pub async fn choose_reply(&self, position: &str, rating: i32) -> Result<Reply, SessionError> {
        let mut selector = MoveSelector::from_entropy();
        self.choose_reply_with(position, rating, &mut selector).await
    }

    /// [`choose_reply`](Self::choose_reply) with a caller-supplied selector.
    pub async fn choose_reply_with<R: Rng>(
        &self,
        position: &str,
        rating: i32,
        selector: &mut MoveSelector<R>,
    ) -> Result<Reply, SessionError> {
        let profile = resolve_profile(clamp_to_bucket(rating));
        let analysis = self.analyze_position(position, rating).await?;
        let mv = selector.select(
            &analysis.lines,
            analysis.best_move.as_deref(),
            profile.replay_pool,
        );
        Ok(Reply { mv, analysis })
    }

    async fn admit(&self) -> Option<SemaphorePermit<'_>> {
        let limiter = self.limiter.as_ref()?;
        // The semaphore is never closed, so acquire only fails if that changes.
        limiter.acquire().await.ok()
    }
}
