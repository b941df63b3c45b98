//! HTTP adapter for the duel state endpoint.
//!
//! Tries the candidate paths in order (the last one that worked goes first)
//! and classifies failures so the poller can decide whether to back off.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ETAG, IF_NONE_MATCH, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use duelview_shared::endpoints::{
    HEADER_PLAYER_TOKEN, QUERY_SAFE_VIEW, QUERY_SESSION, QUERY_TOKEN,
};
use duelview_shared::{candidate_paths, EndpointPath};

use crate::config::SpectatorConfig;
use crate::ports::outbound::{DuelStatePort, FetchError, FetchOutcome};

/// Per-request timeout; a poll that hangs longer is treated as a network failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpDuelStateClient {
    client: Client,
    api_base: Url,
    paths: Vec<EndpointPath>,
    session: Option<String>,
    token: Option<String>,
    /// Index of the candidate that answered last
    preferred: Mutex<Option<usize>>,
}

impl HttpDuelStateClient {
    pub fn new(api_base: Url, session: Option<String>, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            paths: candidate_paths(session.as_deref()),
            api_base,
            session,
            token,
            preferred: Mutex::new(None),
        }
    }

    pub fn from_config(config: &SpectatorConfig) -> Self {
        Self::new(
            config.api_base.clone(),
            config.query_session().map(str::to_string),
            config.token.clone(),
        )
    }

    fn endpoint_url(&self, path: &EndpointPath) -> Result<Url, FetchError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Network(format!("API base cannot take a path: {}", self.api_base)))?
            .pop_if_empty()
            .extend(path.segments());

        {
            let mut query = url.query_pairs_mut();
            if let Some(session) = &self.session {
                query.append_pair(QUERY_SESSION, session);
            }
            query.append_pair(QUERY_SAFE_VIEW, "true");
            if let Some(token) = &self.token {
                query.append_pair(QUERY_TOKEN, token);
            }
        }
        Ok(url)
    }

    fn candidate_order(&self) -> Vec<usize> {
        let preferred = self.preferred.lock().ok().and_then(|guard| *guard);
        let mut order: Vec<usize> = preferred.into_iter().collect();
        order.extend((0..self.paths.len()).filter(|i| Some(*i) != preferred));
        order
    }

    fn remember(&self, index: usize) {
        if let Ok(mut guard) = self.preferred.lock() {
            *guard = Some(index);
        }
    }

    async fn fetch_one(
        &self,
        path: &EndpointPath,
        etag: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let endpoint = path.to_string();
        let url = self.endpoint_url(path)?;

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.header(HEADER_PLAYER_TOKEN, token);
        }
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::RateLimited {
                endpoint,
                retry_after,
            });
        }
        if status.is_server_error() {
            return Err(FetchError::Server {
                endpoint,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(FetchOutcome::Fresh {
            body,
            etag,
            endpoint,
        })
    }
}

#[async_trait]
impl DuelStatePort for HttpDuelStateClient {
    async fn fetch_state(&self, etag: Option<String>) -> Result<FetchOutcome, FetchError> {
        let mut worst: Option<FetchError> = None;

        for index in self.candidate_order() {
            let path = &self.paths[index];
            match self.fetch_one(path, etag.as_deref()).await {
                Ok(outcome) => {
                    self.remember(index);
                    return Ok(outcome);
                }
                // Trying other paths would only add to the load we were asked to shed.
                Err(error @ FetchError::RateLimited { .. }) => return Err(error),
                Err(error) => {
                    tracing::debug!(endpoint = %path, error = %error, "Duel state candidate failed");
                    if worst
                        .as_ref()
                        .map_or(true, |w| error.severity() > w.severity())
                    {
                        worst = Some(error);
                    }
                }
            }
        }

        Err(worst.unwrap_or(FetchError::NoEndpoints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::Query;
    use axum::http::{header, HeaderMap, StatusCode as AxumStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr, session: Option<&str>, token: Option<&str>) -> HttpDuelStateClient {
        HttpDuelStateClient::new(
            Url::parse(&format!("http://{addr}/api")).unwrap(),
            session.map(str::to_string),
            token.map(str::to_string),
        )
    }

    async fn not_found() -> Response {
        AxumStatus::NOT_FOUND.into_response()
    }

    #[test]
    fn url_carries_session_safe_view_and_token() {
        let client = HttpDuelStateClient::new(
            Url::parse("https://duel.example.com/api").unwrap(),
            Some("duel 7/x".into()),
            Some("tok".into()),
        );
        let url = client.endpoint_url(&client.paths[3]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://duel.example.com/api/duel/live/duel%207%2Fx?session=duel+7%2Fx&safeView=true&token=tok"
        );
    }

    #[tokio::test]
    async fn fresh_body_and_conditional_not_modified() {
        let router = Router::new().route(
            "/api/duel/state",
            get(
                |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                    assert_eq!(query.get("session").map(String::as_str), Some("duel-1"));
                    assert_eq!(query.get("safeView").map(String::as_str), Some("true"));
                    assert_eq!(
                        headers.get("x-player-token").and_then(|v| v.to_str().ok()),
                        Some("secret")
                    );
                    if headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
                        == Some("\"v1\"")
                    {
                        return AxumStatus::NOT_MODIFIED.into_response();
                    }
                    (
                        [(header::ETAG, "\"v1\"")],
                        axum::Json(json!({"currentPlayer": "player2"})),
                    )
                        .into_response()
                },
            ),
        );
        let addr = serve(router).await;
        let client = client(addr, Some("duel-1"), Some("secret"));

        let first = client.fetch_state(None).await.unwrap();
        assert_eq!(
            first,
            FetchOutcome::Fresh {
                body: json!({"currentPlayer": "player2"}),
                etag: Some("\"v1\"".into()),
                endpoint: "/duel/state".into(),
            }
        );

        let second = client.fetch_state(Some("\"v1\"".into())).await.unwrap();
        assert_eq!(second, FetchOutcome::NotModified);
    }

    #[tokio::test]
    async fn falls_back_to_legacy_paths_and_prefers_the_winner() {
        let state_hits = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&state_hits);
        let router = Router::new()
            .route(
                "/api/duel/state",
                get(move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        not_found().await
                    }
                }),
            )
            .route("/api/duel/live/current", get(not_found))
            .route(
                "/api/duel/current",
                get(|| async { axum::Json(json!({"spectatorCount": 3})) }),
            );
        let addr = serve(router).await;
        let client = client(addr, None, None);

        for _ in 0..2 {
            match client.fetch_state(None).await.unwrap() {
                FetchOutcome::Fresh { endpoint, .. } => assert_eq!(endpoint, "/duel/current"),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(state_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_short_circuits_and_reads_retry_after() {
        let legacy_hits = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&legacy_hits);
        let router = Router::new()
            .route(
                "/api/duel/state",
                get(|| async {
                    (AxumStatus::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "7")]).into_response()
                }),
            )
            .route(
                "/api/duel/live/current",
                get(move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        axum::Json(json!({}))
                    }
                }),
            );
        let addr = serve(router).await;

        let err = client(addr, None, None).fetch_state(None).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::RateLimited {
                endpoint: "/duel/state".into(),
                retry_after: Some(Duration::from_secs(7)),
            }
        );
        assert_eq!(legacy_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn most_severe_failure_is_reported() {
        let router = Router::new()
            .route("/api/duel/state", get(not_found))
            .route(
                "/api/duel/live/current",
                get(|| async { AxumStatus::SERVICE_UNAVAILABLE.into_response() }),
            )
            .route("/api/duel/current", get(|| async { "not json" }));
        let addr = serve(router).await;

        let err = client(addr, None, None).fetch_state(None).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Server {
                endpoint: "/duel/live/current".into(),
                status: 503,
            }
        );
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let router = Router::new().route("/api/duel/state", get(|| async { "<html>" }));
        let addr = serve(router).await;

        let err = client(addr, None, None).fetch_state(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(addr, None, None).fetch_state(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }
}
