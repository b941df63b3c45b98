//! Duel state poller.
//!
//! One logical timer: fetch, normalize, render, then sleep for the current
//! backoff interval. The next tick is only scheduled after the previous one
//! completes, so requests never overlap. The loop runs until its
//! cancellation token fires; [`PollerHandle::stop`] does that and hands the
//! session back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::backoff::{PollBackoff, PollConfig};
use crate::application::session::SpectatorSession;
use crate::ports::outbound::{
    DuelStatePort, FetchError, FetchOutcome, PollStatus, RandomProvider, ViewSinkPort,
};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A fresh payload was normalized and rendered.
    Rendered,
    /// The server answered 304; the previous view stays on screen.
    Unchanged,
    /// Rate limited or server error; the interval grew.
    BackedOff { next: Duration },
    /// Any other failure; rendered state untouched.
    Failed,
}

pub struct Poller {
    source: Arc<dyn DuelStatePort>,
    sink: Arc<dyn ViewSinkPort>,
    random: Arc<dyn RandomProvider>,
    session: SpectatorSession,
    backoff: PollBackoff,
    last_status: Option<PollStatus>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn DuelStatePort>,
        sink: Arc<dyn ViewSinkPort>,
        random: Arc<dyn RandomProvider>,
        session: SpectatorSession,
        config: PollConfig,
    ) -> Self {
        Self {
            source,
            sink,
            random,
            session,
            backoff: PollBackoff::new(config),
            last_status: None,
        }
    }

    pub fn session(&self) -> &SpectatorSession {
        &self.session
    }

    /// Delay before the next tick.
    pub fn next_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Run one fetch-normalize-render cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        match self.source.fetch_state(self.session.etag()).await {
            Ok(FetchOutcome::Fresh {
                body,
                etag,
                endpoint,
            }) => {
                let was_finished = self.session.last_good().is_some_and(|v| v.is_finished());
                let view = self.session.absorb(&body, etag);
                self.sink.render(&view);
                if view.is_finished() && !was_finished {
                    tracing::info!(room = %self.session.room_id(), winner = ?view.winner, "Duel finished");
                }
                self.report(PollStatus::Live);
                if self.backoff.is_backed_off() {
                    tracing::info!(endpoint = %endpoint, "Duel state endpoint recovered");
                }
                self.backoff.reset();
                TickOutcome::Rendered
            }
            Ok(FetchOutcome::NotModified) => {
                if self.session.last_good().is_none() {
                    // Only reachable if the server ignores our (absent) validator.
                    tracing::warn!("Got 304 with no cached duel state");
                    self.report(PollStatus::LoadFailed);
                    return TickOutcome::Failed;
                }
                self.report(PollStatus::Live);
                self.backoff.reset();
                TickOutcome::Unchanged
            }
            Err(error) if error.warrants_backoff() => {
                let next = self.escalate(&error);
                let status = match &error {
                    FetchError::Server { status, .. } => PollStatus::ServerError {
                        status: *status,
                        retry_in: next,
                    },
                    _ => PollStatus::RateLimited { retry_in: next },
                };
                tracing::warn!(
                    error = %error,
                    delay_ms = next.as_millis() as u64,
                    "Duel state poll backing off"
                );
                self.report(status);
                TickOutcome::BackedOff { next }
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to load duel state");
                self.report(PollStatus::LoadFailed);
                TickOutcome::Failed
            }
        }
    }

    /// Show `status` unless it is already the one on screen.
    fn report(&mut self, status: PollStatus) {
        if self.last_status.as_ref() == Some(&status) {
            return;
        }
        self.sink.status(&status);
        self.last_status = Some(status);
    }

    fn escalate(&mut self, error: &FetchError) -> Duration {
        let max_jitter_ms = self.backoff.config().max_jitter.as_millis() as u64;
        let jitter = Duration::from_millis(self.random.random_range(0, max_jitter_ms));
        let retry_after = match error {
            FetchError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        };
        self.backoff.escalate(jitter, retry_after)
    }

    /// Spawn the poll loop on the tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let task = tokio::spawn(self.run(cancel.clone()));
        PollerHandle { cancel, task }
    }

    /// Poll until `cancel` fires, then return the session.
    pub async fn run(mut self, cancel: CancellationToken) -> SpectatorSession {
        if let Some(view) = self.session.last_good().cloned() {
            self.sink.render(&view);
            self.report(PollStatus::Restored);
        }

        tracing::info!(room = %self.session.room_id(), "Duel state poller started");
        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.tick() => outcome,
            };

            let delay = self.next_delay();
            tracing::trace!(?outcome, delay_ms = delay.as_millis() as u64, "Poll tick complete");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tracing::info!(room = %self.session.room_id(), "Duel state poller stopped");
        self.session
    }
}

/// Handle to a running poll loop.
///
/// Dropping the handle does NOT stop the loop; call [`PollerHandle::stop`]
/// or cancel the token.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<SpectatorSession>,
}

impl PollerHandle {
    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) -> Option<SpectatorSession> {
        self.cancel.cancel();
        match self.task.await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::error!(error = %e, "Duel state poller task failed");
                None
            }
        }
    }
}
