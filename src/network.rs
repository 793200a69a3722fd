//! Network layer for Securiverse Core - HTTP API and chat socket

use std::collections::VecDeque;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use url::Url;

use crate::error::{Error, Result};
use crate::models::*;

// ============================================================================
// HTTP API Client
// ============================================================================

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.lock() = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn auth_header(&self) -> Option<String> {
        self.token.lock().as_ref().map(|t| format!("Bearer {}", t))
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_header() {
            Some(auth) => req.header("Authorization", auth),
            None => req,
        }
    }

    /// Map a non-2xx response into `Error::Backend`, carrying the backend's
    /// message field when the body has one.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        Err(Error::Backend { status, message })
    }

    // ============= Chat =============

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let req = self.client.get(format!("{}/api/v1/chats", self.base_url));
        let resp = Self::check(self.with_auth(req).send().await?).await?;
        let wires: Vec<ConversationWire> = resp.json().await?;
        Ok(wires.into_iter().map(Conversation::from).collect())
    }

    /// Raw history items in server order; classification happens in the chat
    /// engine against the active participant set.
    pub async fn message_history(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<HistoryItemWire>> {
        let req = self.client.get(format!(
            "{}/api/v1/chats/{}/messages",
            self.base_url, conversation_id
        ));
        let resp = Self::check(self.with_auth(req).send().await?).await?;
        let envelope: HistoryEnvelope = resp.json().await?;
        Ok(envelope.data)
    }

    // ============= Contracts =============

    pub async fn contract(&self, id: EngagementId) -> Result<Engagement> {
        let req = self
            .client
            .get(format!("{}/api/v1/contracts/{}", self.base_url, id));
        let resp = Self::check(self.with_auth(req).send().await?).await?;
        let wire: EngagementWire = resp.json().await?;
        Ok(Engagement::from(wire))
    }

    pub async fn contracts(&self, page: u32) -> Result<(Vec<ContractSummary>, u64)> {
        let req = self
            .client
            .get(format!("{}/api/v1/contracts", self.base_url))
            .query(&[("page", page)]);
        let resp = Self::check(self.with_auth(req).send().await?).await?;
        let paged: Paged<ContractSummaryWire> = resp.json().await?;
        let total = paged.total;
        Ok((
            paged.data.into_iter().map(ContractSummary::from).collect(),
            total,
        ))
    }

    pub async fn update_pay_rate(&self, id: EngagementId, rate: f64) -> Result<()> {
        let req = self
            .client
            .put(format!("{}/api/v1/contracts/{}/pay-rate", self.base_url, id))
            .json(&json!({ "total_amount": rate }));
        Self::check(self.with_auth(req).send().await?).await?;
        Ok(())
    }

    /// Multipart upload into the party's signature slot. The field name
    /// (`signature_party_a` / `signature_party_b`) is a wire contract.
    pub async fn upload_signature(
        &self,
        id: EngagementId,
        party: Party,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .map_err(|e| Error::Http(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(party.signature_field(), part);

        let req = self
            .client
            .post(format!("{}/api/v1/contracts/{}/signature", self.base_url, id))
            .multipart(form);
        Self::check(self.with_auth(req).send().await?).await?;
        Ok(())
    }

    pub async fn submit_amendment(
        &self,
        id: EngagementId,
        new_end_time: &str,
        reason: &str,
    ) -> Result<()> {
        let req = self
            .client
            .post(format!("{}/api/v1/contracts/{}/amendment", self.base_url, id))
            .json(&json!({
                "new_end_time": new_end_time,
                "detail_amendment": reason,
            }));
        Self::check(self.with_auth(req).send().await?).await?;
        Ok(())
    }
}

impl crate::contract::ContractBackend for Arc<ApiClient> {
    async fn fetch_engagement(&self, id: EngagementId) -> Result<Engagement> {
        self.contract(id).await
    }

    async fn update_pay_rate(&self, id: EngagementId, rate: f64) -> Result<()> {
        ApiClient::update_pay_rate(self.as_ref(), id, rate).await
    }

    async fn upload_signature(
        &self,
        id: EngagementId,
        party: Party,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<()> {
        ApiClient::upload_signature(self.as_ref(), id, party, image, file_name).await
    }

    async fn submit_amendment(
        &self,
        id: EngagementId,
        new_end_time: &str,
        reason: &str,
    ) -> Result<()> {
        ApiClient::submit_amendment(self.as_ref(), id, new_end_time, reason).await
    }
}

// ============================================================================
// Chat Socket
// ============================================================================

/// One live socket per mounted conversation view. Owns no persisted state;
/// torn down and re-created on every conversation or token change.
pub struct ChatSocket {
    sender: mpsc::UnboundedSender<String>,
    incoming: Arc<Mutex<VecDeque<InboundFrame>>>,
    connected: Arc<Mutex<bool>>,
}

/// Handshake URL with the auth token as a query parameter. Authentication is
/// per-connection, not per-frame.
pub fn chat_socket_url(ws_base: &str, token: &str) -> Result<Url> {
    let mut url = Url::parse(ws_base)?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

impl ChatSocket {
    pub async fn connect(ws_base: &str, token: &str) -> Result<Self> {
        if token.is_empty() {
            log::warn!("chat socket connect skipped: no auth token");
            return Err(Error::NotReady("no auth token"));
        }

        let url = chat_socket_url(ws_base, token)?;
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let incoming = Arc::new(Mutex::new(VecDeque::new()));
        let connected = Arc::new(Mutex::new(true));

        let incoming_clone = incoming.clone();
        let connected_clone = connected.clone();

        // Receive task
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<InboundFrame>(&text) {
                            Ok(frame) => incoming_clone.lock().push_back(frame),
                            Err(e) => log::debug!("ignoring malformed frame: {}", e),
                        }
                    }
                    Ok(WsMessage::Close(_)) => {
                        *connected_clone.lock() = false;
                        break;
                    }
                    Err(e) => {
                        log::warn!("chat socket read error: {}", e);
                        *connected_clone.lock() = false;
                        break;
                    }
                    _ => {}
                }
            }
        });

        // Send task
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if write.send(WsMessage::Text(msg)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            sender: tx,
            incoming,
            connected,
        })
    }

    pub fn send(&self, frame: &OutboundFrame) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotReady("socket closed"));
        }
        let text = serde_json::to_string(frame)?;
        self.sender
            .send(text)
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        Ok(())
    }

    /// Drain everything received since the last poll.
    pub fn drain(&self) -> Vec<InboundFrame> {
        let mut incoming = self.incoming.lock();
        incoming.drain(..).collect()
    }

    pub fn is_open(&self) -> bool {
        *self.connected.lock()
    }

    /// Close only if currently open; repeated calls are harmless.
    pub fn close(&self) {
        let mut connected = self.connected.lock();
        if *connected {
            *connected = false;
        }
    }
}
