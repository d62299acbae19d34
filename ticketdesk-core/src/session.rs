//! A single in-progress interview.

use serde::Serialize;

use crate::error::TicketError;
use crate::ids::{ChannelId, UserId};

/// Stored in place of an empty or whitespace-only answer.
pub const NO_ANSWER: &str = "(No answer)";

/// Interview progress for one applicant in one channel.
///
/// The answers vector doubles as the cursor: its length is the index of the
/// next unanswered question, so answers stay index-aligned with the
/// questionnaire and the cursor can only move forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    channel: ChannelId,
    applicant: UserId,
    answers: Vec<String>,
    question_count: usize,
}

/// What recording an answer did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// More questions remain; `index` is the next one to ask.
    Next { index: usize },
    /// That was the last answer.
    Complete { answers: Vec<String> },
}

impl Session {
    pub fn new(channel: ChannelId, applicant: UserId, question_count: usize) -> Self {
        Self {
            channel,
            applicant,
            answers: Vec::with_capacity(question_count),
            question_count,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn applicant(&self) -> UserId {
        self.applicant
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Index of the next unanswered question.
    pub fn cursor(&self) -> usize {
        self.answers.len()
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn is_complete(&self) -> bool {
        self.cursor() >= self.question_count
    }

    /// Record `text` as the answer to the current question.
    ///
    /// Only the applicant may answer; anyone else gets `Forbidden` and the
    /// session is left untouched.
    pub fn record_answer(
        &mut self,
        author: UserId,
        text: &str,
    ) -> Result<AnswerOutcome, TicketError> {
        if author != self.applicant {
            return Err(TicketError::forbidden(
                author,
                "answer someone else's application",
            ));
        }
        if self.is_complete() {
            return Err(TicketError::InterviewComplete {
                channel: self.channel,
            });
        }

        let trimmed = text.trim();
        self.answers.push(if trimmed.is_empty() {
            NO_ANSWER.to_string()
        } else {
            trimmed.to_string()
        });

        if self.is_complete() {
            Ok(AnswerOutcome::Complete {
                answers: self.answers.clone(),
            })
        } else {
            Ok(AnswerOutcome::Next {
                index: self.cursor(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const APPLICANT: UserId = UserId(1);
    const OTHER: UserId = UserId(2);

    #[test]
    fn test_new_session_starts_at_zero() {
        let session = Session::new(ChannelId(5), APPLICANT, 3);
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_answers_advance_cursor() {
        let mut session = Session::new(ChannelId(5), APPLICANT, 2);
        assert_eq!(
            session.record_answer(APPLICANT, "I love helping people"),
            Ok(AnswerOutcome::Next { index: 1 })
        );
        assert_eq!(
            session.record_answer(APPLICANT, "  ten hours  "),
            Ok(AnswerOutcome::Complete {
                answers: vec!["I love helping people".to_string(), "ten hours".to_string()]
            })
        );
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_blank_answer_gets_placeholder() {
        let mut session = Session::new(ChannelId(5), APPLICANT, 2);
        session.record_answer(APPLICANT, " \n\t").unwrap();
        assert_eq!(session.answers(), [NO_ANSWER.to_string()]);
    }

    #[test]
    fn test_other_author_is_forbidden() {
        let mut session = Session::new(ChannelId(5), APPLICANT, 2);
        let before = session.clone();
        assert!(matches!(
            session.record_answer(OTHER, "hello"),
            Err(TicketError::Forbidden { actor: OTHER, .. })
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn test_complete_session_rejects_more_answers() {
        let mut session = Session::new(ChannelId(5), APPLICANT, 1);
        session.record_answer(APPLICANT, "done").unwrap();
        assert_eq!(
            session.record_answer(APPLICANT, "again"),
            Err(TicketError::InterviewComplete {
                channel: ChannelId(5)
            })
        );
        assert_eq!(session.cursor(), 1);
    }

    proptest! {
        /// The cursor never decreases, never exceeds the question count, and
        /// only the applicant moves it. `Complete` is reported exactly once.
        #[test]
        fn cursor_is_monotonic_bounded_and_single_writer(
            question_count in 1usize..10,
            messages in proptest::collection::vec((any::<bool>(), ".{0,12}"), 0..40),
        ) {
            let mut session = Session::new(ChannelId(5), APPLICANT, question_count);
            let mut completions = 0;

            for (from_applicant, text) in messages {
                let before = session.clone();
                let author = if from_applicant { APPLICANT } else { OTHER };
                let result = session.record_answer(author, &text);

                prop_assert!(session.cursor() >= before.cursor());
                prop_assert!(session.cursor() <= question_count);

                if !from_applicant {
                    prop_assert_eq!(&session, &before);
                }
                if let Ok(AnswerOutcome::Complete { answers }) = result {
                    completions += 1;
                    prop_assert_eq!(answers.len(), question_count);
                }
            }

            prop_assert!(completions <= 1);
            prop_assert_eq!(completions == 1, session.is_complete());
        }
    }
}
