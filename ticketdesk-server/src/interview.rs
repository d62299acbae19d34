//! Interview engine: drives the questionnaire through a session.
//!
//! Every operation returns effects instead of performing them. Answers from
//! anyone but the applicant, and chatter in channels without a session, are
//! ignored without touching state.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::Timing;
use crate::effect::{Effect, LogLevel, MessageContent};
use crate::platform::MessageTarget;
use crate::store::SessionStore;
use ticketdesk_core::{AnswerOutcome, ChannelId, Questionnaire, TicketError, UserId};

pub struct InterviewEngine {
    sessions: SessionStore,
    questionnaire: Arc<Questionnaire>,
    question_delay: Duration,
    completion_delay: Duration,
}

impl InterviewEngine {
    pub fn new(questionnaire: Arc<Questionnaire>, timing: &Timing) -> Self {
        Self {
            sessions: SessionStore::new(questionnaire.len()),
            questionnaire,
            question_delay: timing.question_delay,
            completion_delay: timing.application_close_delay,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Start an interview for `applicant` in `channel` and ask the first
    /// question.
    pub async fn begin(
        &self,
        channel: ChannelId,
        applicant: UserId,
    ) -> Result<Vec<Effect>, TicketError> {
        self.sessions.create(channel, applicant).await?;
        Ok(vec![
            Effect::Log {
                level: LogLevel::Info,
                message: format!("Interview started for {} in channel {}", applicant, channel),
            },
            Effect::AskQuestion { channel, index: 0 },
        ])
    }

    /// Handle a message posted in `channel`.
    pub async fn on_answer(&self, channel: ChannelId, author: UserId, text: &str) -> Vec<Effect> {
        let outcome = match self.sessions.record_answer(channel, author, text).await {
            Ok(outcome) => outcome,
            Err(TicketError::Forbidden { .. }) => {
                debug!("Ignoring message from non-applicant {} in {}", author, channel);
                return vec![];
            }
            Err(_) => return vec![],
        };

        match outcome {
            AnswerOutcome::Next { index } => vec![Effect::ScheduleQuestion {
                channel,
                index,
                delay: self.question_delay,
            }],
            AnswerOutcome::Complete { answers } => {
                // Only the caller that recorded the last answer gets here.
                let Some(session) = self.sessions.remove(channel).await else {
                    return vec![];
                };
                vec![
                    Effect::CancelTimers { channel },
                    Effect::PublishDecision {
                        channel,
                        applicant: session.applicant(),
                        answers,
                    },
                ]
            }
        }
    }

    /// The completed interview in `channel` reached the review channel.
    pub fn on_published(&self, channel: ChannelId, applicant: UserId) -> Vec<Effect> {
        vec![
            Effect::SendMessage {
                target: MessageTarget::Channel(channel),
                content: MessageContent::ApplicationSubmitted,
            },
            Effect::ScheduleChannelDeletion {
                channel,
                delay: self.completion_delay,
            },
            Effect::Log {
                level: LogLevel::Info,
                message: format!(
                    "Interview in channel {} completed by {}",
                    channel, applicant
                ),
            },
        ]
    }

    /// Publishing failed. The channel stays open so the answers survive in
    /// its history, and the applicant is told to follow up.
    pub fn on_publish_failed(
        &self,
        channel: ChannelId,
        applicant: UserId,
        reason: &str,
    ) -> Vec<Effect> {
        vec![
            Effect::SendMessage {
                target: MessageTarget::Channel(channel),
                content: MessageContent::SubmissionFailed { applicant },
            },
            Effect::Log {
                level: LogLevel::Error,
                message: format!(
                    "Could not publish application from {} in channel {}: {}",
                    applicant, channel, reason
                ),
            },
        ]
    }

    /// Abandon any interview in `channel`, e.g. because its ticket is closing.
    pub async fn end(&self, channel: ChannelId) -> Vec<Effect> {
        match self.sessions.remove(channel).await {
            Some(session) => vec![
                Effect::CancelTimers { channel },
                Effect::Log {
                    level: LogLevel::Info,
                    message: format!(
                        "Interview for {} in channel {} abandoned after {} answer(s)",
                        session.applicant(),
                        channel,
                        session.cursor()
                    ),
                },
            ],
            None => vec![],
        }
    }

    /// The question to post for a fired continuation, if the session still
    /// exists and is waiting on exactly that question.
    pub async fn question_due(&self, channel: ChannelId, index: usize) -> Option<MessageContent> {
        let session = self.sessions.get(channel).await.ok()?;
        if session.cursor() != index {
            return None;
        }
        let text = self.questionnaire.question(index)?;
        Some(MessageContent::Question {
            heading: self.questionnaire.heading(index),
            text: text.to_string(),
        })
    }
}
