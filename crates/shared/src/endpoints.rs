//! Duel state endpoint paths, relative to the API base (`.../api`).

use std::fmt;

/// Canonical state endpoint.
pub const DUEL_STATE: &[&str] = &["duel", "state"];

/// Older deployments, tried in order after the canonical path.
pub const LEGACY_DUEL_STATE: &[&[&str]] = &[&["duel", "live", "current"], &["duel", "current"]];

/// Per-duel legacy endpoint; the session id is appended as a final segment.
pub const DUEL_LIVE_BY_ID: &[&str] = &["duel", "live"];

pub const QUERY_SESSION: &str = "session";
pub const QUERY_SAFE_VIEW: &str = "safeView";
pub const QUERY_TOKEN: &str = "token";

pub const HEADER_PLAYER_TOKEN: &str = "X-Player-Token";

/// A path below the API base, kept as unencoded segments so that ids with
/// reserved characters survive URL building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPath {
    segments: Vec<String>,
}

impl EndpointPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// Ordered candidate paths for one poll.
pub fn candidate_paths(session_id: Option<&str>) -> Vec<EndpointPath> {
    let mut paths = Vec::with_capacity(LEGACY_DUEL_STATE.len() + 2);
    paths.push(EndpointPath::new(DUEL_STATE.iter().copied()));
    paths.extend(
        LEGACY_DUEL_STATE
            .iter()
            .map(|p| EndpointPath::new(p.iter().copied())),
    );
    if let Some(id) = session_id.filter(|id| !id.is_empty()) {
        let mut segments: Vec<String> = DUEL_LIVE_BY_ID.iter().map(|s| s.to_string()).collect();
        segments.push(id.to_string());
        paths.push(EndpointPath::new(segments));
    }
    paths
}
