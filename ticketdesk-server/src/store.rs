//! Process-lifetime stores for interview sessions and decision requests.
//!
//! Both stores keep their map behind a single `RwLock`, and every
//! check-then-act operation runs under one write guard, so concurrent events
//! for the same key cannot interleave between the check and the mutation.
//! Nothing is persisted: a restart forgets every session and decision.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::platform::MessageHandle;
use ticketdesk_core::{
    AnswerOutcome, ChannelId, DecisionId, DecisionRequest, Session, TicketError, UserId, Verdict,
};

/// Active interviews keyed by the channel they run in.
pub struct SessionStore {
    question_count: usize,
    sessions: RwLock<HashMap<ChannelId, Session>>,
}

impl SessionStore {
    /// Every session created by this store runs `question_count` questions.
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session. At most one session may exist per channel.
    pub async fn create(
        &self,
        channel: ChannelId,
        applicant: UserId,
    ) -> Result<Session, TicketError> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(channel) {
            Entry::Occupied(_) => Err(TicketError::AlreadyActive { channel }),
            Entry::Vacant(entry) => {
                let session = Session::new(channel, applicant, self.question_count);
                entry.insert(session.clone());
                Ok(session)
            }
        }
    }

    pub async fn get(&self, channel: ChannelId) -> Result<Session, TicketError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&channel)
            .cloned()
            .ok_or_else(|| TicketError::not_found(format!("interview in channel {}", channel)))
    }

    /// The channel of `applicant`'s running interview, if any.
    pub async fn find_by_applicant(&self, applicant: UserId) -> Option<ChannelId> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|s| s.applicant() == applicant)
            .map(Session::channel)
    }

    /// Record an answer for the current question.
    ///
    /// Fails with `NotFound` if no session runs in `channel` and with
    /// `Forbidden` if `author` is not the applicant; neither touches state.
    pub async fn record_answer(
        &self,
        channel: ChannelId,
        author: UserId,
        text: &str,
    ) -> Result<AnswerOutcome, TicketError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&channel)
            .ok_or_else(|| TicketError::not_found(format!("interview in channel {}", channel)))?;
        session.record_answer(author, text)
    }

    /// Remove a session. Removing a missing session is not an error.
    pub async fn remove(&self, channel: ChannelId) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&channel)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// A decision request plus the review message showing its controls.
#[derive(Debug, Clone)]
pub struct StoredDecision {
    pub request: DecisionRequest,
    pub message: MessageHandle,
}

/// Published decision requests keyed by their id.
///
/// Decided requests stay in the store so a late second verdict is rejected
/// with `AlreadyDecided` instead of `NotFound`.
#[derive(Default)]
pub struct DecisionStore {
    decisions: RwLock<HashMap<DecisionId, StoredDecision>>,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a published request along with the message carrying its controls.
    pub async fn insert(&self, request: DecisionRequest, message: MessageHandle) {
        let mut decisions = self.decisions.write().await;
        decisions.insert(request.id(), StoredDecision { request, message });
    }

    pub async fn get(&self, id: DecisionId) -> Result<StoredDecision, TicketError> {
        let decisions = self.decisions.read().await;
        decisions
            .get(&id)
            .cloned()
            .ok_or_else(|| TicketError::not_found(format!("application {}", id)))
    }

    /// Apply a verdict atomically; only the first verdict for a request wins.
    pub async fn decide(
        &self,
        id: DecisionId,
        reviewer: UserId,
        verdict: Verdict,
    ) -> Result<StoredDecision, TicketError> {
        let mut decisions = self.decisions.write().await;
        let stored = decisions
            .get_mut(&id)
            .ok_or_else(|| TicketError::not_found(format!("application {}", id)))?;
        stored.request.decide(reviewer, verdict)?;
        Ok(stored.clone())
    }

    pub async fn is_empty(&self) -> bool {
        self.decisions.read().await.is_empty()
    }
}
