//! Composition of the poller, chat room and terminal input.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use duelview_shared::ClientEvent;

use crate::application::chat::{ChatError, ChatOutbox, ChatRoom, RoomUpdate};
use crate::application::poller::Poller;
use crate::application::preferences::Preferences;
use crate::application::session::SpectatorSession;
use crate::config::SpectatorConfig;
use crate::infrastructure::chat::ChatClient;
use crate::ports::outbound::{ConnectionState, DuelStatePort, RandomProvider, StorageProvider};
use crate::ui::TerminalSink;

/// How long a stopping chat task gets before it is aborted.
const CHAT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const HELP: &str = "\
Commands:
  /mute     toggle background music preference
  /help     show this help
  /quit     stop watching
Anything else is sent to the room chat. End a line with \\ to keep writing.";

pub struct RunnerDeps {
    pub config: SpectatorConfig,
    pub storage: Arc<dyn StorageProvider>,
    pub source: Arc<dyn DuelStatePort>,
    pub random: Arc<dyn RandomProvider>,
    pub terminal: Arc<TerminalSink>,
}

/// Watch until the viewer quits or presses Ctrl+C.
pub async fn run(deps: RunnerDeps) -> anyhow::Result<()> {
    let RunnerDeps {
        config,
        storage,
        source,
        random,
        terminal,
    } = deps;

    let prefs = Preferences::new(Arc::clone(&storage));
    let room_id = config.room_id();
    terminal.line(&format!(
        "Watching {room_id} as {} (music {}). Type /help for commands.",
        config.user_name,
        if prefs.music_muted() { "muted" } else { "on" }
    ));

    let mut session = SpectatorSession::new(room_id.clone(), config.name_hints.clone())
        .with_storage(Arc::clone(&storage));
    if session.restore().is_some() {
        tracing::info!(room = %room_id, "Restored last known duel state");
    }

    let shutdown = CancellationToken::new();
    let poller = Poller::new(source, terminal.clone(), random, session, config.poll)
        .spawn(shutdown.child_token());

    let mut chat = match &config.chat_url {
        Some(url) => {
            let room = ChatRoom::new(room_id.clone(), prefs.viewer_id(), config.user_name.clone());
            Some(ChatWiring::start(url, room, Arc::clone(&terminal)).await)
        }
        None => {
            tracing::info!("Chat disabled");
            None
        }
    };

    let outcome = input_loop(&prefs, chat.as_mut(), &terminal).await;

    shutdown.cancel();
    if let Some(chat) = chat {
        chat.stop().await;
    }
    if poller.stop().await.is_some() {
        tracing::info!(room = %room_id, "Stopped watching");
    }
    outcome
}

/// Chat client, room state and outbox for one room.
struct ChatWiring {
    client: ChatClient,
    room: Arc<Mutex<ChatRoom>>,
    outbox: ChatOutbox,
    task: JoinHandle<()>,
}

impl ChatWiring {
    async fn start(url: &Url, room: ChatRoom, terminal: Arc<TerminalSink>) -> Self {
        tracing::info!(room = %room.room_id(), url = %url, "Joining chat room");
        let client = ChatClient::new(url.as_str(), room.join_event());
        let room = Arc::new(Mutex::new(room));

        {
            let room = Arc::clone(&room);
            let terminal = Arc::clone(&terminal);
            client
                .set_on_event(move |event| {
                    let Ok(mut room) = room.lock() else {
                        return;
                    };
                    let update = room.apply(&event);
                    show_update(&room, update, &terminal);
                })
                .await;
        }
        {
            let room = Arc::clone(&room);
            client
                .set_on_state_change(move |state| {
                    if let Ok(mut room) = room.lock() {
                        room.set_connection(state);
                    }
                    terminal.line(&format!("-- Chat {}", connection_label(state)));
                })
                .await;
        }

        let runner = client.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = runner.connect().await {
                tracing::warn!(error = %e, "Chat unavailable");
            }
        });
        let outbox = ChatOutbox::new(Arc::new(client.clone()));

        Self {
            client,
            room,
            outbox,
            task,
        }
    }

    fn connection(&self) -> ConnectionState {
        self.room
            .lock()
            .map(|room| room.connection())
            .unwrap_or_default()
    }

    fn compose(&self, text: &str) -> Result<ClientEvent, ChatError> {
        match self.room.lock() {
            Ok(room) => room.compose(text),
            Err(_) => Err(ChatError::NotConnected),
        }
    }

    async fn stop(mut self) {
        self.client.disconnect().await;
        if tokio::time::timeout(CHAT_SHUTDOWN_GRACE, &mut self.task)
            .await
            .is_err()
        {
            tracing::debug!("Chat task did not stop in time, aborting");
            self.task.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn input_loop(
    prefs: &Preferences,
    mut chat: Option<&mut ChatWiring>,
    terminal: &TerminalSink,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut draft: Vec<String> = Vec::new();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let idle = chat.as_ref().and_then(|c| c.outbox.idle_deadline());
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                break;
            }
            _ = wait_until(idle) => {
                if let Some(chat) = chat.as_deref_mut() {
                    report(terminal, chat.outbox.tick(Instant::now()).await);
                }
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    let flow =
                        handle_line(line, &mut draft, prefs, chat.as_deref_mut(), terminal).await;
                    if flow == Flow::Quit {
                        break;
                    }
                }
                None => {
                    stdin_open = false;
                    tracing::debug!("stdin closed, waiting for Ctrl+C");
                }
            },
        }
    }
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

async fn handle_line(
    line: String,
    draft: &mut Vec<String>,
    prefs: &Preferences,
    chat: Option<&mut ChatWiring>,
    terminal: &TerminalSink,
) -> Flow {
    if draft.is_empty() {
        match line.trim() {
            "/quit" | "/exit" => return Flow::Quit,
            "/help" => {
                terminal.line(HELP);
                return Flow::Continue;
            }
            "/mute" => {
                let muted = prefs.toggle_music();
                terminal.line(if muted { "-- Music muted" } else { "-- Music on" });
                return Flow::Continue;
            }
            _ => {}
        }
    }

    let Some(chat) = chat else {
        terminal.line("-- Chat is disabled");
        draft.clear();
        return Flow::Continue;
    };

    if let Some(part) = line.strip_suffix('\\') {
        draft.push(part.to_string());
        let connection = chat.connection();
        report(terminal, chat.outbox.input(connection, Instant::now()).await);
        return Flow::Continue;
    }

    draft.push(line);
    let text = draft.join("\n");
    draft.clear();

    let result = match chat.compose(&text) {
        Ok(message) => chat.outbox.submit(message).await,
        Err(e) => Err(e),
    };
    report(terminal, result);
    Flow::Continue
}

fn report<W: Write + Send>(terminal: &TerminalSink<W>, result: Result<(), ChatError>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "Chat action failed");
        terminal.line(&format!("-- {e}"));
    }
}

fn show_update<W: Write + Send>(room: &ChatRoom, update: RoomUpdate, terminal: &TerminalSink<W>) {
    match update {
        RoomUpdate::LogReplaced => {
            for entry in room.log() {
                terminal.line(&entry.to_string());
            }
        }
        RoomUpdate::Appended => {
            if let Some(entry) = room.last_entry() {
                terminal.line(&entry.to_string());
            }
        }
        RoomUpdate::Typing => {
            if let Some(text) = room.typing_text() {
                terminal.line(&format!("-- {text}"));
            }
        }
        RoomUpdate::Presence => {
            if let Some(text) = room.presence_text() {
                terminal.line(&format!("-- {text}"));
            }
        }
        RoomUpdate::DuelResult => {
            if let Some(text) = room.result_text() {
                terminal.line(&format!("*** {text} ***"));
            }
        }
        RoomUpdate::Ignored => {}
    }
}

fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Connected => "connected",
        ConnectionState::Reconnecting => "connection lost, reconnecting...",
        ConnectionState::Disconnected => "disconnected, sending disabled",
        ConnectionState::Failed => "unavailable",
    }
}
