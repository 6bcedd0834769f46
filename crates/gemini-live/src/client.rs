use std::sync::{Arc, Mutex};

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::client::stats::Stats;
use crate::types::{
    Blob, ClientContent, ClientMessage, RealtimeInput, ServerEvent, ServerMessage, Setup,
};

pub(crate) mod config;
mod consts;
pub(crate) mod stats;
mod utils;

pub type ClientTx = tokio::sync::mpsc::Sender<ClientMessage>;
type ServerTx = tokio::sync::broadcast::Sender<ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<ServerEvent>;

/// A live, bidirectional session with the Gemini Live API.
///
/// Outgoing messages are queued on an mpsc channel drained by a writer task;
/// incoming messages are parsed by a reader task and broadcast to every
/// subscriber returned by [`Client::server_events`].
pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(Stats::default())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("connected to Gemini Live at {}", self.config.base_url());

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<ClientMessage>(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx);
        self.s_tx = Some(s_tx.clone());

        // Writer: runs until every sender is dropped, then closes the socket.
        tokio::spawn(async move {
            while let Some(message) = c_rx.recv().await {
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize message: {}", e);
                    }
                }
            }
            if let Err(e) = write.close().await {
                tracing::debug!("error while closing socket: {}", e);
            }
        });

        let stats = self.stats.clone();
        tokio::spawn(async move {
            let mut closed = false;
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        if let Err(e) = s_tx.send(ServerEvent::Error(e.to_string())) {
                            tracing::debug!("no subscriber for error event: {}", e);
                        }
                        closed = true;
                        break;
                    }
                };
                // The Live API delivers its JSON in binary frames as well as text frames.
                let text = match message {
                    Message::Text(text) => text,
                    Message::Binary(bin) => match String::from_utf8(bin) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("unexpected non-UTF-8 binary message: {}", e);
                            continue;
                        }
                    },
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close_event = ServerEvent::Close {
                            reason: reason.map(|frame| frame.reason.to_string()),
                        };
                        if let Err(e) = s_tx.send(close_event) {
                            tracing::debug!("no subscriber for close event: {}", e);
                        }
                        closed = true;
                        break;
                    }
                    _ => continue,
                };
                handle_payload(&text, &s_tx, &stats);
            }
            if !closed {
                if let Err(e) = s_tx.send(ServerEvent::Close { reason: None }) {
                    tracing::debug!("no subscriber for close event: {}", e);
                }
            }
        });
        Ok(())
    }

    /// Subscribes to server events. Only events sent after subscribing are received.
    pub fn server_events(&self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    /// The model configured for this connection.
    pub fn model(&self) -> &str {
        self.config.model()
    }

    pub fn is_connected(&self) -> bool {
        self.c_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub async fn send(&mut self, message: ClientMessage) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(message).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected")),
        }
    }

    pub async fn setup(&mut self, setup: Setup) -> Result<()> {
        tracing::debug!("sending setup for {}", setup.model());
        self.send(ClientMessage::Setup(setup)).await
    }

    /// Streams one chunk of encoded microphone audio.
    pub async fn send_realtime_audio(&mut self, blob: Blob) -> Result<()> {
        self.send(ClientMessage::RealtimeInput(RealtimeInput::audio(blob)))
            .await
    }

    /// Tells the server the microphone stream paused.
    pub async fn end_audio_stream(&mut self) -> Result<()> {
        self.send(ClientMessage::RealtimeInput(RealtimeInput::audio_stream_end()))
            .await
    }

    /// Sends a complete user text turn.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(ClientMessage::ClientContent(ClientContent::user_text(text)))
            .await
    }

    /// Closes the session. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.c_tx.take().is_some() {
            tracing::info!("closing Gemini Live session");
        }
        Ok(())
    }
}

fn handle_payload(text: &str, s_tx: &ServerTx, stats: &Arc<Mutex<Stats>>) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => {
            if let Some(usage) = &message.usage_metadata {
                if let Ok(mut stats_guard) = stats.lock() {
                    stats_guard.record(usage);
                } else {
                    tracing::error!("failed to update stats");
                }
                tracing::debug!(
                    "total_tokens: {}, input_tokens: {}, output_tokens: {}",
                    usage.total_token_count,
                    usage.prompt_token_count,
                    usage.response_token_count
                );
            }
            if let Err(e) = s_tx.send(ServerEvent::Message(message)) {
                tracing::debug!("no subscriber for server message: {}", e);
            }
        }
        Err(e) => {
            tracing::error!("failed to deserialize server message: {}, text=> {:?}", e, text);
        }
    }
}

/// Connects with an explicit configuration.
pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}
