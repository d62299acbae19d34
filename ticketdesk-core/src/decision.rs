//! Reviewer decisions on completed applications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TicketError;
use crate::ids::{RoleId, UserId};

/// Identifies one decision request; embedded in reviewer control ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub Uuid);

impl DecisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DecisionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A reviewer's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept { roles: Vec<RoleId> },
    Deny,
}

/// Where a decision request is in its lifecycle.
///
/// `Pending` is the only state with outgoing transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionStatus {
    Pending,
    Accepted { reviewer: UserId, roles: Vec<RoleId> },
    Denied { reviewer: UserId },
}

impl DecisionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted { .. } => "accepted",
            Self::Denied { .. } => "denied",
        }
    }
}

/// A completed interview awaiting a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    id: DecisionId,
    applicant: UserId,
    answers: Vec<String>,
    status: DecisionStatus,
}

impl DecisionRequest {
    pub fn new(applicant: UserId, answers: Vec<String>) -> Self {
        Self::with_id(DecisionId::new(), applicant, answers)
    }

    pub fn with_id(id: DecisionId, applicant: UserId, answers: Vec<String>) -> Self {
        Self {
            id,
            applicant,
            answers,
            status: DecisionStatus::Pending,
        }
    }

    pub fn id(&self) -> DecisionId {
        self.id
    }

    pub fn applicant(&self) -> UserId {
        self.applicant
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn status(&self) -> &DecisionStatus {
        &self.status
    }

    /// Apply a verdict. Fails with `AlreadyDecided` once terminal, leaving
    /// the recorded outcome untouched.
    pub fn decide(&mut self, reviewer: UserId, verdict: Verdict) -> Result<(), TicketError> {
        if self.status.is_terminal() {
            return Err(TicketError::AlreadyDecided {
                id: self.id,
                status: self.status.label(),
            });
        }

        self.status = match verdict {
            Verdict::Accept { roles } => DecisionStatus::Accepted { reviewer, roles },
            Verdict::Deny => DecisionStatus::Denied { reviewer },
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DecisionRequest {
        DecisionRequest::new(UserId(1), vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn test_pending_to_denied() {
        let mut req = request();
        req.decide(UserId(9), Verdict::Deny).unwrap();
        assert_eq!(req.status(), &DecisionStatus::Denied { reviewer: UserId(9) });
    }

    #[test]
    fn test_pending_to_accepted_keeps_roles() {
        let mut req = request();
        req.decide(
            UserId(9),
            Verdict::Accept {
                roles: vec![RoleId(3), RoleId(4)],
            },
        )
        .unwrap();
        assert_eq!(
            req.status(),
            &DecisionStatus::Accepted {
                reviewer: UserId(9),
                roles: vec![RoleId(3), RoleId(4)]
            }
        );
    }

    #[test]
    fn test_deny_then_anything_is_rejected() {
        let mut req = request();
        req.decide(UserId(9), Verdict::Deny).unwrap();

        let again = req.decide(UserId(8), Verdict::Deny);
        assert!(matches!(
            again,
            Err(TicketError::AlreadyDecided {
                status: "denied",
                ..
            })
        ));
        let accept = req.decide(
            UserId(8),
            Verdict::Accept {
                roles: vec![RoleId(3)],
            },
        );
        assert!(matches!(accept, Err(TicketError::AlreadyDecided { .. })));
        assert_eq!(req.status(), &DecisionStatus::Denied { reviewer: UserId(9) });
    }

    #[test]
    fn test_accept_then_deny_is_rejected() {
        let mut req = request();
        req.decide(UserId(9), Verdict::Accept { roles: vec![] }).unwrap();
        assert!(matches!(
            req.decide(UserId(9), Verdict::Deny),
            Err(TicketError::AlreadyDecided {
                status: "accepted",
                ..
            })
        ));
    }

    #[test]
    fn test_decision_id_parses_its_display() {
        let id = DecisionId::new();
        assert_eq!(id.to_string().parse::<DecisionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<DecisionId>().is_err());
    }
}
