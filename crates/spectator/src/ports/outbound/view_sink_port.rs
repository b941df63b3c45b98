//! View Sink Port - where rendered duel state and status lines go.

use std::fmt;
use std::time::Duration;

use duelview_domain::DuelViewModel;

/// User-visible poll status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Showing a snapshot restored from the last run while the first poll is in flight.
    Restored,
    Live,
    RateLimited { retry_in: Duration },
    ServerError { status: u16, retry_in: Duration },
    LoadFailed,
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStatus::Restored => f.write_str("Showing last known state, reconnecting..."),
            PollStatus::Live => f.write_str("Live match"),
            PollStatus::RateLimited { retry_in } => {
                write!(f, "Rate limited, retrying in {}s", retry_in.as_secs().max(1))
            }
            PollStatus::ServerError { status, retry_in } => write!(
                f,
                "Server error ({status}), retrying in {}s",
                retry_in.as_secs().max(1)
            ),
            PollStatus::LoadFailed => f.write_str("Failed to load duel."),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ViewSinkPort: Send + Sync {
    /// Draw a freshly normalized view model.
    fn render(&self, view: &DuelViewModel);

    /// Replace the status line.
    fn status(&self, status: &PollStatus);
}
