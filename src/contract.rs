//! Contract lifecycle model
//!
//! Derives the signable/negotiable state of an engagement from raw backend
//! fields, validates mutations before they hit the network, and re-fetches
//! authoritative state after every successful write. Nothing here is
//! optimistic: the displayed engagement only changes once the backend
//! confirms.

use crate::error::{Error, Result};
use crate::models::{AmendmentState, ContractStatus, Engagement, EngagementId, Party};

/// Minimum characters for an amendment reason, checked before any network
/// call is issued.
pub const MIN_AMENDMENT_REASON_LEN: usize = 10;

impl ContractStatus {
    /// Human label for the raw lifecycle tracker. Total over all variants;
    /// unknown backend values surface as "Unknown" rather than leaking raw
    /// enum text into the UI.
    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "Processing",
            ContractStatus::Cancelled => "Cancelled",
            ContractStatus::IsSigned => "Signed",
            ContractStatus::NotPay => "Not Paid",
            ContractStatus::Completed => "Completed",
            ContractStatus::Unknown(_) => "Unknown",
        }
    }
}

impl AmendmentState {
    pub fn label(&self) -> &'static str {
        match self {
            AmendmentState::NotAmend => "Not Amend",
            AmendmentState::Pending => "Pending",
            AmendmentState::Accepted => "Accepted",
            AmendmentState::Rejected => "Reject",
            AmendmentState::Unknown(_) => "Unknown",
        }
    }
}

/// Backend operations the contract workflow needs. The trait seam keeps the
/// workflow testable against a recording stub.
pub trait ContractBackend {
    fn fetch_engagement(
        &self,
        id: EngagementId,
    ) -> impl std::future::Future<Output = Result<Engagement>> + Send;

    fn update_pay_rate(
        &self,
        id: EngagementId,
        rate: f64,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn upload_signature(
        &self,
        id: EngagementId,
        party: Party,
        image: Vec<u8>,
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn submit_amendment(
        &self,
        id: EngagementId,
        new_end_time: &str,
        reason: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Workflow state for one engagement's detail view.
pub struct ContractDesk<B: ContractBackend> {
    backend: B,
    engagement: Option<Engagement>,
    /// Raw user input for the rate editor. Preserved across a failed
    /// negotiation so the user can correct it without re-typing.
    rate_input: Option<String>,
}

impl<B: ContractBackend> ContractDesk<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            engagement: None,
            rate_input: None,
        }
    }

    pub fn engagement(&self) -> Option<&Engagement> {
        self.engagement.as_ref()
    }

    pub fn is_editing_rate(&self) -> bool {
        self.rate_input.is_some()
    }

    pub fn rate_input(&self) -> Option<&str> {
        self.rate_input.as_deref()
    }

    pub fn begin_rate_edit(&mut self, initial: &str) {
        self.rate_input = Some(initial.to_string());
    }

    pub async fn load(&mut self, id: EngagementId) -> Result<&Engagement> {
        let engagement = self.backend.fetch_engagement(id).await?;
        Ok(&*self.engagement.insert(engagement))
    }

    fn loaded(&self) -> Result<&Engagement> {
        self.engagement.as_ref().ok_or(Error::NotLoaded)
    }

    /// Upload a signature image for one party's slot.
    ///
    /// Rejected locally when the slot is already populated; there is no
    /// re-signing. On success the engagement is re-fetched rather than
    /// marked signed locally. On failure state is unchanged and the user may
    /// retry.
    pub async fn submit_signature(
        &mut self,
        party: Party,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<()> {
        let engagement = self.loaded()?;
        if !engagement.can_sign(party) {
            return Err(Error::Validation(format!(
                "{} has already signed this contract",
                match party {
                    Party::A => "party A",
                    Party::B => "party B",
                }
            )));
        }
        if image.is_empty() {
            return Err(Error::Validation("signature image is empty".into()));
        }

        let id = engagement.id;
        self.backend
            .upload_signature(id, party, image, file_name)
            .await?;
        self.engagement = Some(self.backend.fetch_engagement(id).await?);
        Ok(())
    }

    /// Negotiate a new pay rate from raw user input.
    ///
    /// The input must parse as a finite number before any network call. On
    /// success the engagement is re-fetched and editing mode ends; on failure
    /// the input stays in the editor.
    pub async fn negotiate_rate(&mut self, input: &str) -> Result<()> {
        let id = self.loaded()?.id;
        self.rate_input = Some(input.to_string());

        let rate: f64 = input
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("{:?} is not a valid rate", input)))?;
        if !rate.is_finite() {
            return Err(Error::Validation(format!("{:?} is not a valid rate", input)));
        }

        self.backend.update_pay_rate(id, rate).await?;
        self.engagement = Some(self.backend.fetch_engagement(id).await?);
        self.rate_input = None;
        Ok(())
    }

    /// Submit an amendment request for a new end time.
    ///
    /// The reason must carry at least [`MIN_AMENDMENT_REASON_LEN`] characters;
    /// shorter reasons never reach the backend. The amendment tracker only
    /// moves to pending via the post-submit re-fetch.
    pub async fn request_amendment(&mut self, new_end_time: &str, reason: &str) -> Result<()> {
        let id = self.loaded()?.id;

        if reason.trim().len() < MIN_AMENDMENT_REASON_LEN {
            return Err(Error::Validation(format!(
                "amendment reason must be at least {} characters",
                MIN_AMENDMENT_REASON_LEN
            )));
        }

        self.backend.submit_amendment(id, new_end_time, reason).await?;
        self.engagement = Some(self.backend.fetch_engagement(id).await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Application, Candidate, Company, JobDetails};
    use parking_lot::Mutex;

    fn engagement(sig_a: Option<&str>, sig_b: Option<&str>) -> Engagement {
        Engagement {
            id: 7,
            application: Application {
                id: 1,
                candidate: Candidate {
                    id: 2,
                    full_name: "Avery Cole".into(),
                    address: None,
                    bank_name: None,
                    bank_account: None,
                    licence_number: None,
                },
                job: JobDetails {
                    id: 3,
                    title: "Night watch".into(),
                    description: "Patrol the premises".into(),
                    company: Company {
                        name: "Acme Security".into(),
                        address: None,
                        registration_number: None,
                    },
                },
            },
            signature_party_a: sig_a.map(str::to_string),
            signature_party_b: sig_b.map(str::to_string),
            total_amount: 1200.0,
            pay_rate: 25.0,
            start_time: Some("2026-09-01T08:00:00Z".into()),
            end_time: Some("2026-12-01T08:00:00Z".into()),
            status: ContractStatus::Pending,
            amendment: AmendmentState::NotAmend,
        }
    }

    /// Records every backend call so tests can assert which network requests
    /// were (not) issued.
    struct StubBackend {
        calls: Mutex<Vec<String>>,
        engagement: Mutex<Engagement>,
        fail_mutations: bool,
    }

    impl StubBackend {
        fn new(engagement: Engagement) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                engagement: Mutex::new(engagement),
                fail_mutations: false,
            }
        }

        fn failing(engagement: Engagement) -> Self {
            Self {
                fail_mutations: true,
                ..Self::new(engagement)
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl ContractBackend for &StubBackend {
        async fn fetch_engagement(&self, _id: EngagementId) -> Result<Engagement> {
            self.calls.lock().push("fetch".into());
            Ok(self.engagement.lock().clone())
        }

        async fn update_pay_rate(&self, _id: EngagementId, rate: f64) -> Result<()> {
            self.calls.lock().push(format!("rate:{}", rate));
            if self.fail_mutations {
                return Err(Error::Backend {
                    status: 422,
                    message: "rejected".into(),
                });
            }
            self.engagement.lock().pay_rate = rate;
            Ok(())
        }

        async fn upload_signature(
            &self,
            _id: EngagementId,
            party: Party,
            _image: Vec<u8>,
            _file_name: &str,
        ) -> Result<()> {
            self.calls.lock().push(format!("sign:{:?}", party));
            if self.fail_mutations {
                return Err(Error::Backend {
                    status: 500,
                    message: "upload failed".into(),
                });
            }
            let mut e = self.engagement.lock();
            match party {
                Party::A => e.signature_party_a = Some("sig-a.png".into()),
                Party::B => e.signature_party_b = Some("sig-b.png".into()),
            }
            Ok(())
        }

        async fn submit_amendment(
            &self,
            _id: EngagementId,
            new_end_time: &str,
            _reason: &str,
        ) -> Result<()> {
            self.calls.lock().push(format!("amend:{}", new_end_time));
            if self.fail_mutations {
                return Err(Error::Backend {
                    status: 422,
                    message: "rejected".into(),
                });
            }
            self.engagement.lock().amendment = AmendmentState::Pending;
            Ok(())
        }
    }

    #[test]
    fn status_labels_are_total_and_non_empty() {
        for raw in ["pending", "cancelled", "is_signed", "not_pay", "completed", "???"] {
            let label = ContractStatus::from_raw(raw).label();
            assert!(!label.is_empty(), "no label for {:?}", raw);
        }
        assert_eq!(ContractStatus::from_raw("not_pay").label(), "Not Paid");
        assert_eq!(ContractStatus::from_raw("is_signed").label(), "Signed");
        assert_eq!(ContractStatus::from_raw("pending").label(), "Processing");
    }

    #[test]
    fn amendment_labels_are_total_and_non_empty() {
        for raw in ["not_amend", "pending", "accepted", "rejected", "???"] {
            let label = AmendmentState::from_raw(raw).label();
            assert!(!label.is_empty(), "no label for {:?}", raw);
        }
        assert_eq!(AmendmentState::from_raw("rejected").label(), "Reject");
    }

    #[test]
    fn can_sign_tracks_slot_emptiness_per_party() {
        let e = engagement(Some("a.png"), None);
        assert!(!e.can_sign(Party::A));
        assert!(e.can_sign(Party::B));

        let e = engagement(None, None);
        assert!(e.can_sign(Party::A));
        assert!(e.can_sign(Party::B));
    }

    #[tokio::test]
    async fn short_amendment_reason_never_reaches_backend() {
        let stub = StubBackend::new(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        let result = desk.request_amendment("2026-12-15T08:00:00Z", "short").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(stub.calls(), vec!["fetch".to_string()]);
    }

    #[tokio::test]
    async fn valid_amendment_submits_then_refetches() {
        let stub = StubBackend::new(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        desk.request_amendment("2026-12-15T08:00:00Z", "extend for holiday coverage")
            .await
            .unwrap();
        assert_eq!(
            stub.calls(),
            vec![
                "fetch".to_string(),
                "amend:2026-12-15T08:00:00Z".to_string(),
                "fetch".to_string(),
            ]
        );
        assert_eq!(desk.engagement().unwrap().amendment, AmendmentState::Pending);
    }

    #[tokio::test]
    async fn signing_occupied_slot_is_rejected_locally() {
        let stub = StubBackend::new(engagement(Some("a.png"), None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        let result = desk.submit_signature(Party::A, vec![1, 2, 3], "sig.png").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(stub.calls(), vec!["fetch".to_string()]);
    }

    #[tokio::test]
    async fn successful_signature_refetches_and_closes_slot() {
        let stub = StubBackend::new(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        desk.submit_signature(Party::B, vec![1, 2, 3], "sig.png")
            .await
            .unwrap();
        let e = desk.engagement().unwrap();
        assert!(!e.can_sign(Party::B));
        assert!(e.can_sign(Party::A));
    }

    #[tokio::test]
    async fn failed_signature_leaves_state_unchanged() {
        let stub = StubBackend::failing(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        let result = desk.submit_signature(Party::A, vec![1], "sig.png").await;
        assert!(matches!(result, Err(Error::Backend { .. })));
        assert!(desk.engagement().unwrap().can_sign(Party::A));
    }

    #[tokio::test]
    async fn invalid_rate_input_stays_in_editor_without_network() {
        let stub = StubBackend::new(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        let result = desk.negotiate_rate("twenty").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(desk.is_editing_rate());
        assert_eq!(desk.rate_input(), Some("twenty"));
        assert_eq!(stub.calls(), vec!["fetch".to_string()]);
    }

    #[tokio::test]
    async fn successful_rate_negotiation_exits_editing() {
        let stub = StubBackend::new(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        desk.negotiate_rate("27.5").await.unwrap();
        assert!(!desk.is_editing_rate());
        assert_eq!(desk.engagement().unwrap().pay_rate, 27.5);
    }

    #[tokio::test]
    async fn failed_rate_negotiation_preserves_input() {
        let stub = StubBackend::failing(engagement(None, None));
        let mut desk = ContractDesk::new(&stub);
        desk.load(7).await.unwrap();

        let result = desk.negotiate_rate("30").await;
        assert!(matches!(result, Err(Error::Backend { .. })));
        assert!(desk.is_editing_rate());
        assert_eq!(desk.rate_input(), Some("30"));
        assert_eq!(desk.engagement().unwrap().pay_rate, 25.0);
    }
}
