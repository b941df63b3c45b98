//! Duelview - terminal spectator for card duels.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duelview_spectator::infrastructure::http_client::HttpDuelStateClient;
use duelview_spectator::infrastructure::random::SystemRandom;
use duelview_spectator::infrastructure::storage::FileStorage;
use duelview_spectator::runner::{self, RunnerDeps};
use duelview_spectator::ui::{CardArt, TerminalSink};
use duelview_spectator::SpectatorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duelview=info,duelview_spectator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SpectatorConfig::from_env()?;
    tracing::info!(
        api = %config.api_base,
        mode = ?config.mode,
        room = %config.room_id(),
        chat = config.chat_url.is_some(),
        "Starting Duelview spectator"
    );

    let storage = FileStorage::new();
    tracing::debug!(path = ?storage.path(), "Using preference storage");

    runner::run(RunnerDeps {
        source: Arc::new(HttpDuelStateClient::from_config(&config)),
        storage: Arc::new(storage),
        random: Arc::new(SystemRandom::new()),
        terminal: Arc::new(TerminalSink::stdout(CardArt::new(config.img_base.clone()))),
        config,
    })
    .await
}
