//! Chat synchronization engine
//!
//! Maintains one chronologically consistent message feed for the active
//! conversation by merging durable REST history with session-local messages
//! (optimistic sends plus live socket deliveries). The engine is pure state:
//! it never touches the network, so every property here is testable without a
//! transport.
//!
//! Classification rule: the backend never marks a message as "mine". The only
//! available signal is the conversation's participant list, which holds the
//! *other* side. A sender id absent from that set is therefore the current
//! user. The same inverted-membership test drives echo suppression: the
//! server redelivers our own sends over the socket, and a frame classified as
//! "mine" is already present from the optimistic append, so it is dropped.

use std::collections::HashSet;

use chrono::{Datelike, Local, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::models::{
    ChatMessage, Conversation, ConversationId, Direction, HistoryItemWire, InboundFrame,
    OutboundFrame, UserId,
};

/// One date bucket of the rendered feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    pub label: String,
    pub messages: Vec<ChatMessage>,
}

pub struct ChatEngine {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    participant_ids: HashSet<UserId>,
    /// Durable history for the active conversation, as returned by the server.
    history: Vec<ChatMessage>,
    /// Optimistic sends and live-received messages for the current session.
    /// Cleared on every conversation switch.
    session: Vec<ChatMessage>,
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatEngine {
    pub fn new() -> Self {
        Self {
            conversations: Vec::new(),
            active: None,
            participant_ids: HashSet::new(),
            history: Vec::new(),
            session: Vec::new(),
        }
    }

    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active(&self) -> Option<ConversationId> {
        self.active
    }

    /// Switch the active conversation.
    ///
    /// Idempotent when the requested id is already active. An id that is not
    /// in the known conversation set falls back to the first known
    /// conversation (warn-logged substitution); with no conversations at all
    /// the selection becomes empty. Session-local messages and stale history
    /// are cleared, so nothing from the previous conversation survives the
    /// switch.
    ///
    /// Returns the previously active id when the selection actually changed,
    /// so the caller can tear down the old transport connection.
    pub fn select_conversation(
        &mut self,
        requested: Option<ConversationId>,
    ) -> Option<ConversationId> {
        let resolved = match requested {
            Some(id) if self.conversations.iter().any(|c| c.id == id) => Some(id),
            Some(id) => {
                let fallback = self.conversations.first().map(|c| c.id);
                log::warn!(
                    "conversation {} not in known set, falling back to {:?}",
                    id,
                    fallback
                );
                fallback
            }
            None => None,
        };

        if resolved == self.active {
            return None;
        }

        let previous = self.active;
        self.active = resolved;
        self.session.clear();
        self.history.clear();
        self.participant_ids = resolved
            .and_then(|id| self.conversations.iter().find(|c| c.id == id))
            .map(|c| c.participant_ids().into_iter().collect())
            .unwrap_or_default();

        previous
    }

    fn classify(&self, sender_id: UserId) -> Direction {
        if self.participant_ids.contains(&sender_id) {
            Direction::Theirs
        } else {
            Direction::Mine
        }
    }

    /// Install the history fetch result.
    ///
    /// Gated on the conversation id still being active: a fetch that resolves
    /// after the user has switched away is discarded, never merged into the
    /// new conversation's feed.
    pub fn apply_history(&mut self, conversation_id: ConversationId, items: Vec<HistoryItemWire>) {
        if self.active != Some(conversation_id) {
            log::debug!(
                "discarding stale history for conversation {} (active: {:?})",
                conversation_id,
                self.active
            );
            return;
        }

        let now = Utc::now().timestamp_millis();
        self.history = items
            .into_iter()
            .map(|item| ChatMessage {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id,
                sender_id: Some(item.sender.id),
                body: item.text,
                sent_at: now,
                direction: self.classify(item.sender.id),
            })
            .collect();
    }

    /// Process one inbound socket frame.
    ///
    /// Frames for other conversations are dropped. Frames classified as the
    /// current user's own echo are dropped too, since the optimistic append
    /// in [`ChatEngine::compose_send`] already placed them in the feed.
    /// Returns whether the frame was appended.
    pub fn handle_frame(&mut self, frame: InboundFrame) -> bool {
        if self.active != Some(frame.chat_id) {
            log::debug!(
                "dropping frame for conversation {} (active: {:?})",
                frame.chat_id,
                self.active
            );
            return false;
        }

        if self.classify(frame.sender_id) == Direction::Mine {
            // Echo of our own send, already rendered.
            return false;
        }

        self.session.push(ChatMessage {
            id: frame
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            conversation_id: frame.chat_id,
            sender_id: Some(frame.sender_id),
            body: frame.message,
            sent_at: Utc::now().timestamp_millis(),
            direction: Direction::Theirs,
        });
        true
    }

    /// Prepare an outbound frame for `text` and optimistically append the
    /// message to the session feed.
    ///
    /// The append is unconditional once the frame is composed: delivery
    /// failure at the socket layer does not retract it (no ack/retry in this
    /// protocol). Fails with `Validation` on empty input and `NotReady` when
    /// no conversation is selected.
    pub fn compose_send(&mut self, text: &str) -> Result<OutboundFrame> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("message text is empty".into()));
        }
        let chat_id = self.active.ok_or(Error::NotReady("no conversation selected"))?;

        self.session.push(ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: chat_id,
            sender_id: None,
            body: text.to_string(),
            sent_at: Utc::now().timestamp_millis(),
            direction: Direction::Mine,
        });

        Ok(OutboundFrame {
            message: text.to_string(),
            chat_id,
        })
    }

    /// Pure projection of the feed: history first, then session-local
    /// messages in arrival order, grouped into consecutive date buckets.
    /// Sources are never re-sorted against each other.
    pub fn render(&self) -> Vec<DateGroup> {
        let mut groups: Vec<DateGroup> = Vec::new();

        for msg in self.history.iter().chain(self.session.iter()) {
            let label = date_label(msg.sent_at);
            match groups.last_mut() {
                Some(group) if group.label == label => group.messages.push(msg.clone()),
                _ => groups.push(DateGroup {
                    label,
                    messages: vec![msg.clone()],
                }),
            }
        }

        groups
    }
}

/// Date bucket label for a unix-millis timestamp.
pub fn date_label(timestamp_millis: i64) -> String {
    let Some(dt) = Utc.timestamp_millis_opt(timestamp_millis).single() else {
        return "Today".to_string();
    };
    let local = dt.with_timezone(&Local);
    let now = Local::now();

    if local.date_naive() == now.date_naive() {
        "Today".to_string()
    } else if local.date_naive() == (now - chrono::Duration::days(1)).date_naive() {
        "Yesterday".to_string()
    } else if local.year() == now.year() {
        local.format("%d %b").to_string()
    } else {
        local.format("%d %b %Y").to_string()
    }
}
