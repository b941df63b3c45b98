//! Spectator configuration from environment variables.
//!
//! Reads the same knobs the browser client took from its query string (mode,
//! session, user, token, api, imgbase), prefixed `DUELVIEW_`. A `.env` file is
//! honored when the binary calls `dotenvy::dotenv()` first.

use std::time::Duration;

use duelview_domain::NameHints;
use url::Url;

use crate::application::backoff::PollConfig;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api";
pub const DEFAULT_IMG_BASE: &str = "images/cards";
pub const DEFAULT_USER_NAME: &str = "Spectator";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing session id (set DUELVIEW_SESSION, or DUELVIEW_MODE=practice)")]
    MissingSession,

    #[error("Invalid URL in {key}: {value} ({source})")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme in {key}: {value}")]
    UnsupportedScheme { key: &'static str, value: String },

    #[error("Invalid number in {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Poll interval must be at least 1 ms")]
    ZeroPollInterval,

    #[error("Backoff factor must be greater than 1.0, got {0}")]
    InvalidBackoffFactor(f64),

    #[error("Unknown mode: {0} (expected duel or practice)")]
    InvalidMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Duel,
    Practice,
}

impl ViewMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "duel" => Ok(ViewMode::Duel),
            "practice" => Ok(ViewMode::Practice),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpectatorConfig {
    /// API base, always ending in `/api`
    pub api_base: Url,
    pub mode: ViewMode,
    pub session_id: Option<String>,
    pub user_name: String,
    pub token: Option<String>,
    /// Card art base (URL or path prefix), no trailing slash
    pub img_base: String,
    /// Chat room socket; `None` disables chat
    pub chat_url: Option<Url>,
    pub poll: PollConfig,
    pub name_hints: NameHints,
}

impl SpectatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = ViewMode::parse(&get("DUELVIEW_MODE").unwrap_or_default())?;
        let session_id = get("DUELVIEW_SESSION").or_else(|| get("DUELVIEW_DUEL_ID"));
        if mode == ViewMode::Duel && session_id.is_none() {
            return Err(ConfigError::MissingSession);
        }

        let api_base = normalize_api_base(
            &get("DUELVIEW_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )?;

        let chat_url = match get("DUELVIEW_CHAT").as_deref() {
            Some("off") | Some("false") | Some("0") => None,
            _ => Some(match get("DUELVIEW_CHAT_URL") {
                Some(raw) => parse_url("DUELVIEW_CHAT_URL", &raw)?,
                None => derive_chat_url(&api_base)?,
            }),
        };

        let defaults = PollConfig::default();
        let poll = PollConfig {
            base_interval: millis(&get, "DUELVIEW_POLL_BASE_MS")?.unwrap_or(defaults.base_interval),
            max_interval: millis(&get, "DUELVIEW_POLL_MAX_MS")?.unwrap_or(defaults.max_interval),
            backoff_factor: match get("DUELVIEW_POLL_FACTOR") {
                Some(raw) => raw.parse::<f64>().map_err(|_| ConfigError::InvalidNumber {
                    key: "DUELVIEW_POLL_FACTOR",
                    value: raw.clone(),
                })?,
                None => defaults.backoff_factor,
            },
            max_jitter: millis(&get, "DUELVIEW_POLL_JITTER_MS")?.unwrap_or(defaults.max_jitter),
        };
        if poll.base_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if poll.backoff_factor.is_nan() || poll.backoff_factor <= 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(poll.backoff_factor));
        }

        Ok(Self {
            api_base,
            mode,
            session_id,
            user_name: get("DUELVIEW_USER").unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            token: get("DUELVIEW_TOKEN"),
            img_base: get("DUELVIEW_IMG_BASE")
                .unwrap_or_else(|| DEFAULT_IMG_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            chat_url,
            poll,
            name_hints: NameHints {
                player1: get("DUELVIEW_PLAYER1_NAME"),
                player2: get("DUELVIEW_PLAYER2_NAME"),
            },
        })
    }

    /// Chat room for this view: the duel session, else a per-user practice
    /// or spectate room.
    pub fn room_id(&self) -> String {
        match (&self.session_id, self.mode) {
            (Some(session), _) => session.clone(),
            (None, ViewMode::Practice) => format!("practice:{}", self.user_name),
            (None, ViewMode::Duel) => format!("spectate:{}", self.user_name),
        }
    }

    /// Session id to send as a query parameter (never in practice mode).
    pub fn query_session(&self) -> Option<&str> {
        match self.mode {
            ViewMode::Practice => None,
            ViewMode::Duel => self.session_id.as_deref(),
        }
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        key,
        value: raw.to_string(),
        source,
    })
}

/// Trim trailing slashes and make sure the path ends in `/api`.
fn normalize_api_base(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    let with_api = if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    };
    let url = parse_url("DUELVIEW_API_BASE", &with_api)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            key: "DUELVIEW_API_BASE",
            value: raw.to_string(),
        }),
    }
}

/// The chat socket lives at the backend origin, not under `/api`.
fn derive_chat_url(api_base: &Url) -> Result<Url, ConfigError> {
    let mut url = api_base.clone();
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| ConfigError::UnsupportedScheme {
            key: "DUELVIEW_API_BASE",
            value: api_base.to_string(),
        })?;
    url.set_path("/chat");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn millis<G>(get: &G, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        })
        .transpose()
}
