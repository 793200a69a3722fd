//! Securiverse Core Library
//!
//! Client core for the Securiverse security-staffing marketplace.
//! Provides: the chat synchronization engine (REST history merged with a live
//! socket feed), the contract lifecycle model, and the contract document
//! renderer. UI rendering, routing, and auth flows live in the embedding
//! application.

pub mod chat;
pub mod contract;
pub mod document;
pub mod error;
pub mod models;
pub mod network;

use std::sync::Arc;

pub use chat::{ChatEngine, DateGroup};
pub use contract::{ContractBackend, ContractDesk, MIN_AMENDMENT_REASON_LEN};
pub use document::{render as render_contract_document, ContractDocument};
pub use error::{Error, Result};
pub use models::*;
pub use network::{ApiClient, ChatSocket};

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_host: String,
    pub server_port: u16,
    pub use_tls: bool,
}

impl ClientConfig {
    pub fn new(host: &str, port: u16, use_tls: bool) -> Self {
        Self {
            server_host: host.to_string(),
            server_port: port,
            use_tls,
        }
    }

    pub fn http_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.server_host, self.server_port)
    }

    pub fn ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}:{}/ws/chat", scheme, self.server_host, self.server_port)
    }
}

/// Main client instance: owns the API client, the per-conversation chat
/// socket, and the chat engine state.
pub struct SecuriverseClient {
    config: ClientConfig,
    api: Arc<ApiClient>,
    socket: Option<ChatSocket>,
    engine: ChatEngine,
}

impl SecuriverseClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.http_url())?);
        Ok(Self {
            config,
            api,
            socket: None,
            engine: ChatEngine::new(),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        self.api.set_token(token);
    }

    pub fn api(&self) -> Arc<ApiClient> {
        self.api.clone()
    }

    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    /// Workflow handle for one engagement's detail view.
    pub fn contract_desk(&self) -> ContractDesk<Arc<ApiClient>> {
        ContractDesk::new(self.api.clone())
    }

    pub async fn refresh_conversations(&mut self) -> Result<()> {
        let conversations = self.api.list_conversations().await?;
        self.engine.set_conversations(conversations);
        Ok(())
    }

    /// Select a conversation and bring its feed up: tear down the previous
    /// socket, open a new one scoped to this conversation, and fetch history.
    ///
    /// Idempotent when the id is already active. Without an auth token the
    /// socket step is skipped with a warning (history still loads); sends
    /// will fail with `NotReady` until a token is set.
    pub async fn open_conversation(&mut self, id: Option<ConversationId>) -> Result<()> {
        let before = self.engine.active();
        self.engine.select_conversation(id);
        let active = self.engine.active();

        if active == before && self.socket.is_some() {
            return Ok(());
        }

        if let Some(socket) = self.socket.take() {
            socket.close();
        }

        let Some(active) = active else {
            return Ok(());
        };

        match self.api.token() {
            Some(token) if !token.is_empty() => {
                let socket = ChatSocket::connect(&self.config.ws_url(), &token).await?;
                self.socket = Some(socket);
            }
            _ => {
                log::warn!("no auth token, chat socket not connected");
            }
        }

        let items = self.api.message_history(active).await?;
        // apply_history re-checks the active id, so a slow fetch that
        // straddles another switch is discarded rather than merged.
        self.engine.apply_history(active, items);
        Ok(())
    }

    /// Send a message in the active conversation. The text shows up in the
    /// feed immediately; there is no ack or retry at this layer.
    pub fn send_message(&mut self, text: &str) -> Result<()> {
        let ready = self.socket.as_ref().map(|s| s.is_open()).unwrap_or(false);
        if !ready {
            log::warn!("send skipped: chat socket not open");
            return Err(Error::NotReady("chat socket not open"));
        }

        let frame = self.engine.compose_send(text)?;
        if let Some(socket) = self.socket.as_ref() {
            socket.send(&frame)?;
        }
        Ok(())
    }

    /// Drain the socket and fold frames into the engine. Returns how many
    /// messages were appended (echoes and cross-conversation frames drop).
    pub fn poll(&mut self) -> usize {
        let frames = match self.socket.as_ref() {
            Some(socket) => socket.drain(),
            None => return 0,
        };
        let mut appended = 0;
        for frame in frames {
            if self.engine.handle_frame(frame) {
                appended += 1;
            }
        }
        appended
    }

    /// The rendered feed for the active conversation.
    pub fn feed(&self) -> Vec<DateGroup> {
        self.engine.render()
    }
}
