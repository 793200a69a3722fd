//! Data models for Securiverse Core
//!
//! Wire DTOs mirror the backend's JSON shapes exactly; domain entities are
//! what the rest of the crate operates on. Every wire shape passes through an
//! explicit normalization step so backend drift surfaces at the boundary
//! instead of corrupting engine state.

use serde::{Deserialize, Serialize};

pub type ConversationId = i64;
pub type UserId = i64;
pub type EngagementId = i64;

// ============================================================================
// Chat - wire shapes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantWire {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessageWire {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWire {
    pub id: ConversationId,
    pub participants: Vec<ParticipantWire>,
    pub last_message: Option<LastMessageWire>,
    pub last_message_time: Option<String>,
    pub updated_at: Option<String>,
}

/// History endpoint envelope: `{ "data": [ ... ] }`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEnvelope {
    pub data: Vec<HistoryItemWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItemWire {
    pub text: String,
    pub sender: HistorySenderWire,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySenderWire {
    pub id: UserId,
    pub last_activity: Option<String>,
}

/// Inbound socket frame. `id` is present only when the server has already
/// persisted the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundFrame {
    pub chat_id: ConversationId,
    pub sender_id: UserId,
    pub id: Option<i64>,
    pub message: String,
}

/// Outbound socket frame. Field names are a wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: String,
    pub chat_id: ConversationId,
}

// ============================================================================
// Chat - domain entities
// ============================================================================

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<ParticipantWire> for Participant {
    fn from(w: ParticipantWire) -> Self {
        Self {
            id: w.id,
            display_name: format!("{} {}", w.first_name, w.last_name),
            avatar: w.image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LastMessage {
    pub text: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: Vec<Participant>,
    pub last_message: Option<LastMessage>,
}

impl Conversation {
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.id).collect()
    }
}

impl From<ConversationWire> for Conversation {
    fn from(w: ConversationWire) -> Self {
        let time = w.last_message_time.or(w.updated_at);
        Self {
            id: w.id,
            participants: w.participants.into_iter().map(Participant::from).collect(),
            last_message: w.last_message.map(|m| LastMessage {
                text: m.text,
                time,
            }),
        }
    }
}

/// Whether a rendered message belongs to the current user or the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Mine,
    Theirs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Server id for history/live items, locally synthesized for sends.
    pub id: String,
    pub conversation_id: ConversationId,
    /// Absent for optimistic local sends.
    pub sender_id: Option<UserId>,
    pub body: String,
    /// Display timestamp, unix millis.
    pub sent_at: i64,
    pub direction: Direction,
}

// ============================================================================
// Contracts - wire shapes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EngagementWire {
    pub id: EngagementId,
    pub application: ApplicationWire,
    pub signature_party_a: Option<String>,
    pub signature_party_b: Option<String>,
    pub total_amount: f64,
    pub pay_rate: f64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub contacts_trackers: String,
    pub amendment_trackers: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationWire {
    pub id: i64,
    pub candidate: CandidateWire,
    pub job: JobDetailsWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateWire {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub licence_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobDetailsWire {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: CompanyWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyWire {
    pub name: String,
    pub address: Option<String>,
    pub registration_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractSummaryWire {
    pub id: EngagementId,
    pub candidate_name: String,
    pub company_name: String,
    pub contacts_trackers: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub total: u64,
}

// ============================================================================
// Contracts - domain entities
// ============================================================================

/// Raw contract lifecycle tracker. Unrecognized backend values land in
/// `Unknown` and are logged at the boundary rather than passed through
/// silently, so enum drift is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractStatus {
    Pending,
    Cancelled,
    IsSigned,
    NotPay,
    Completed,
    Unknown(String),
}

impl ContractStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "cancelled" => Self::Cancelled,
            "is_signed" => Self::IsSigned,
            "not_pay" => Self::NotPay,
            "completed" => Self::Completed,
            other => {
                log::warn!("unrecognized contract status from backend: {:?}", other);
                Self::Unknown(other.to_string())
            }
        }
    }
}

/// Amendment overlay state. Accepted/rejected are terminal for a given
/// request; a new request restarts at pending server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmendmentState {
    NotAmend,
    Pending,
    Accepted,
    Rejected,
    Unknown(String),
}

impl AmendmentState {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "not_amend" => Self::NotAmend,
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            other => {
                log::warn!("unrecognized amendment state from backend: {:?}", other);
                Self::Unknown(other.to_string())
            }
        }
    }
}

/// One of the two independent signature slots on an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    A,
    B,
}

impl Party {
    /// Multipart field name for the signature upload.
    pub fn signature_field(&self) -> &'static str {
        match self {
            Party::A => "signature_party_a",
            Party::B => "signature_party_b",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: i64,
    pub full_name: String,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub licence_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Company {
    pub name: String,
    pub address: Option<String>,
    pub registration_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobDetails {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: Company,
}

#[derive(Debug, Clone)]
pub struct Application {
    pub id: i64,
    pub candidate: Candidate,
    pub job: JobDetails,
}

#[derive(Debug, Clone)]
pub struct Engagement {
    pub id: EngagementId,
    pub application: Application,
    pub signature_party_a: Option<String>,
    pub signature_party_b: Option<String>,
    pub total_amount: f64,
    pub pay_rate: f64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: ContractStatus,
    pub amendment: AmendmentState,
}

impl Engagement {
    /// A slot is signable while it is still empty. Once populated there is no
    /// unsign path in this model.
    pub fn can_sign(&self, party: Party) -> bool {
        match party {
            Party::A => self.signature_party_a.is_none(),
            Party::B => self.signature_party_b.is_none(),
        }
    }
}

impl From<EngagementWire> for Engagement {
    fn from(w: EngagementWire) -> Self {
        Self {
            id: w.id,
            application: Application {
                id: w.application.id,
                candidate: Candidate {
                    id: w.application.candidate.id,
                    full_name: format!(
                        "{} {}",
                        w.application.candidate.first_name, w.application.candidate.last_name
                    ),
                    address: w.application.candidate.address,
                    bank_name: w.application.candidate.bank_name,
                    bank_account: w.application.candidate.bank_account,
                    licence_number: w.application.candidate.licence_number,
                },
                job: JobDetails {
                    id: w.application.job.id,
                    title: w.application.job.title,
                    description: w.application.job.description,
                    company: Company {
                        name: w.application.job.company.name,
                        address: w.application.job.company.address,
                        registration_number: w.application.job.company.registration_number,
                    },
                },
            },
            signature_party_a: w.signature_party_a,
            signature_party_b: w.signature_party_b,
            total_amount: w.total_amount,
            pay_rate: w.pay_rate,
            start_time: w.start_time,
            end_time: w.end_time,
            status: ContractStatus::from_raw(&w.contacts_trackers),
            amendment: AmendmentState::from_raw(&w.amendment_trackers),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContractSummary {
    pub id: EngagementId,
    pub candidate_name: String,
    pub company_name: String,
    pub status: ContractStatus,
}

impl From<ContractSummaryWire> for ContractSummary {
    fn from(w: ContractSummaryWire) -> Self {
        Self {
            id: w.id,
            candidate_name: w.candidate_name,
            company_name: w.company_name,
            status: ContractStatus::from_raw(&w.contacts_trackers),
        }
    }
}
