//! Chat room WebSocket client using tokio-tungstenite

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use duelview_shared::{ClientEvent, ServerEvent};

use super::core::{BackoffState, ReconnectPolicy};
use crate::ports::outbound::{ChatConnectionPort, ChatTransportError, ConnectionState};

type EventCallback = Box<dyn Fn(ServerEvent) + Send + Sync>;
type StateCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// WebSocket client for one chat room.
///
/// `join` is re-sent on every (re)connect so the server always knows which
/// room and viewer this socket belongs to.
pub struct ChatClient {
    url: String,
    join: ClientEvent,
    policy: ReconnectPolicy,
    state: Arc<AtomicU8>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientEvent>>>>,
    on_event: Arc<Mutex<Option<EventCallback>>>,
    on_state_change: Arc<Mutex<Option<StateCallback>>>,
    /// Set by `disconnect()` so a closing socket is not treated as a drop
    intentional_disconnect: Arc<RwLock<bool>>,
}

impl ChatClient {
    pub fn new(url: impl Into<String>, join: ClientEvent) -> Self {
        Self {
            url: url.into(),
            join,
            policy: ReconnectPolicy::default(),
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected.to_u8())),
            tx: Arc::new(Mutex::new(None)),
            on_event: Arc::new(Mutex::new(None)),
            on_state_change: Arc::new(Mutex::new(None)),
            intentional_disconnect: Arc::new(RwLock::new(false)),
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub async fn set_on_event<F>(&self, callback: F)
    where
        F: Fn(ServerEvent) + Send + Sync + 'static,
    {
        let mut on_event = self.on_event.lock().await;
        *on_event = Some(Box::new(callback));
    }

    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let mut on_state_change = self.on_state_change.lock().await;
        *on_state_change = Some(Box::new(callback));
    }

    async fn set_state(&self, new_state: ConnectionState) {
        notify_state(&self.state, &self.on_state_change, new_state).await;
    }

    /// Internal connect logic - returns whether the connection closed unexpectedly
    async fn connect_internal(&self) -> Result<bool> {
        self.set_state(ConnectionState::Connecting).await;

        let (ws_stream, _) = match connect_async(self.url.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Failed to connect to chat");
                return Err(e.into());
            }
        };
        tracing::info!(url = %self.url, "Connected to chat");

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<ClientEvent>(32);
        // Queued before anything else can be sent on this socket.
        tx.send(self.join.clone()).await?;
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = Some(tx);
        }
        self.set_state(ConnectionState::Connected).await;

        let on_event = Arc::clone(&self.on_event);
        let intentional_disconnect = Arc::clone(&self.intentional_disconnect);

        let mut read_handle = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ServerEvent::parse(&text) {
                        Ok(event) => {
                            let callback = on_event.lock().await;
                            if let Some(ref cb) = *callback {
                                cb(event);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to parse chat event"),
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("Chat server closed connection");
                        return !*intentional_disconnect.read().await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Chat socket error");
                        return true;
                    }
                }
            }
            !*intentional_disconnect.read().await
        });

        let mut write_handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize chat event");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    tracing::warn!(error = %e, "Failed to send chat event");
                    return;
                }
            }
            // Sender dropped: we are disconnecting.
            let _ = write.send(Message::Close(None)).await;
        });

        let unexpected_close = tokio::select! {
            result = &mut read_handle => {
                write_handle.abort();
                result.unwrap_or(true)
            }
            _ = &mut write_handle => {
                read_handle.abort();
                !*self.intentional_disconnect.read().await
            }
        };

        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        self.set_state(ConnectionState::Disconnected).await;
        Ok(unexpected_close)
    }

    /// Attempt to reconnect with exponential backoff
    async fn reconnect_with_backoff(&self) {
        let mut backoff = BackoffState::new(self.policy);

        loop {
            self.set_state(ConnectionState::Reconnecting).await;
            let Some(delay) = backoff.next_delay_and_advance() else {
                tracing::error!("Max chat reconnection attempts reached, giving up");
                self.set_state(ConnectionState::Failed).await;
                return;
            };
            tracing::info!(
                attempt = backoff.attempts(),
                max_attempts = backoff.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                "Chat reconnection scheduled"
            );

            tokio::time::sleep(delay).await;

            if *self.intentional_disconnect.read().await {
                tracing::info!("Chat reconnection cancelled - intentional disconnect");
                self.set_state(ConnectionState::Disconnected).await;
                return;
            }

            match self.connect_internal().await {
                Ok(true) if !*self.intentional_disconnect.read().await => {
                    // Was connected, dropped again: start a fresh sequence.
                    backoff = BackoffState::new(self.policy);
                }
                Ok(_) => return,
                Err(e) => {
                    tracing::warn!(attempt = backoff.attempts(), error = %e, "Chat reconnection attempt failed");
                }
            }
        }
    }

    /// Connect and stay connected until `disconnect()` or retries run out.
    ///
    /// Returns an error only if the very first connection attempt fails.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = false;
        }

        match self.connect_internal().await {
            Ok(unexpected_close) => {
                if unexpected_close && !*self.intentional_disconnect.read().await {
                    tracing::info!("Chat connection dropped, reconnecting");
                    self.reconnect_with_backoff().await;
                }
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed).await;
                Err(e)
            }
        }
    }

    pub async fn disconnect(&self) {
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = true;
        }
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        self.set_state(ConnectionState::Disconnected).await;
    }
}

async fn notify_state(
    state: &AtomicU8,
    on_state_change: &Mutex<Option<StateCallback>>,
    new_state: ConnectionState,
) {
    let previous = ConnectionState::from_u8(state.swap(new_state.to_u8(), Ordering::SeqCst));
    if previous == new_state {
        return;
    }
    let callback = on_state_change.lock().await;
    if let Some(ref cb) = *callback {
        cb(new_state);
    }
}

#[async_trait]
impl ChatConnectionPort for ChatClient {
    async fn send(&self, event: ClientEvent) -> Result<(), ChatTransportError> {
        // Clone the sender to avoid holding the lock across await
        let tx = {
            let tx_lock = self.tx.lock().await;
            tx_lock.clone()
        };
        let Some(tx) = tx else {
            return Err(ChatTransportError::NotConnected);
        };
        tx.send(event)
            .await
            .map_err(|_| ChatTransportError::ChannelClosed)
    }
}

impl Clone for ChatClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            join: self.join.clone(),
            policy: self.policy,
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
            on_event: Arc::clone(&self.on_event),
            on_state_change: Arc::clone(&self.on_state_change),
            intentional_disconnect: Arc::clone(&self.intentional_disconnect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use duelview_shared::{ChatLine, JoinRoom};
    use serde_json::{json, Value};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_tungstenite::{accept_async, WebSocketStream};

    type ServerSocket = WebSocketStream<TcpStream>;

    fn join() -> ClientEvent {
        ClientEvent::JoinRoom(JoinRoom {
            room_id: "duel-1".into(),
            user_id: "viewer-1".into(),
            name: "Nyx".into(),
        })
    }

    fn fast_policy() -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            max_attempts: 3,
        }
    }

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/chat", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> ServerSocket {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn next_json(socket: &mut ServerSocket) -> Value {
        loop {
            match socket.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                Message::Close(_) => panic!("socket closed"),
                _ => {}
            }
        }
    }

    async fn client_with_recorders(
        url: &str,
    ) -> (
        ChatClient,
        UnboundedReceiver<ServerEvent>,
        UnboundedReceiver<ConnectionState>,
    ) {
        let client = ChatClient::new(url, join()).with_reconnect_policy(fast_policy());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        client
            .set_on_event(move |event| {
                let _ = event_tx.send(event);
            })
            .await;
        client
            .set_on_state_change(move |state| {
                let _ = state_tx.send(state);
            })
            .await;
        (client, event_rx, state_rx)
    }

    async fn wait_for_state(rx: &mut UnboundedReceiver<ConnectionState>, wanted: ConnectionState) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(state) = rx.recv().await {
                if state == wanted {
                    return;
                }
            }
            panic!("state channel closed before {wanted:?}");
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn joins_room_then_relays_events_both_ways() {
        let (listener, url) = listener().await;
        let (client, mut events, mut states) = client_with_recorders(&url).await;

        let runner = client.clone();
        let task = tokio::spawn(async move { runner.connect().await });

        let mut server = accept(&listener).await;
        assert_eq!(
            next_json(&mut server).await,
            json!({"event": "join_room", "data": {"roomId": "duel-1", "userId": "viewer-1", "name": "Nyx"}})
        );
        wait_for_state(&mut states, ConnectionState::Connected).await;

        server
            .send(Message::Text(
                r#"{"event":"message","data":{"userId":"u-2","name":"Vex","text":"hi"}}"#.into(),
            ))
            .await
            .unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            ServerEvent::Message(ChatLine {
                user_id: Some("u-2".into()),
                name: Some("Vex".into()),
                text: "hi".into(),
                ts: None,
            })
        );

        client
            .send(ClientEvent::ChatMessage("gg".into()))
            .await
            .unwrap();
        assert_eq!(
            next_json(&mut server).await,
            json!({"event": "chat_message", "data": "gg"})
        );

        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rejoins_after_server_drop() {
        let (listener, url) = listener().await;
        let (client, _events, mut states) = client_with_recorders(&url).await;

        let runner = client.clone();
        let task = tokio::spawn(async move { runner.connect().await });

        let mut first = accept(&listener).await;
        next_json(&mut first).await;
        first.close(None).await.unwrap();
        drop(first);

        wait_for_state(&mut states, ConnectionState::Reconnecting).await;
        let mut second = accept(&listener).await;
        assert_eq!(next_json(&mut second).await["event"], "join_room");
        wait_for_state(&mut states, ConnectionState::Connected).await;

        client.disconnect().await;
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn send_without_connection_is_rejected() {
        let client = ChatClient::new("ws://127.0.0.1:9/chat", join());
        assert_eq!(
            client.send(ClientEvent::Typing(true)).await,
            Err(ChatTransportError::NotConnected)
        );
    }

    #[tokio::test]
    async fn first_connect_failure_reports_failed() {
        let (listener, url) = listener().await;
        drop(listener);

        let client = ChatClient::new(url, join());
        assert!(client.connect().await.is_err());
        assert_eq!(client.state(), ConnectionState::Failed);
    }
}
