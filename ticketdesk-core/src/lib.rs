//! Domain vocabulary for the ticket and application engine.
//!
//! Everything here is pure: ids, request categories, the visibility rules
//! for ticket channels, interview sessions and reviewer decisions. The
//! server crate layers storage, timers and platform I/O on top.

pub mod command;
pub mod component;
pub mod decision;
pub mod error;
pub mod ids;
pub mod naming;
pub mod questionnaire;
pub mod request;
pub mod session;
pub mod visibility;

pub use command::{parse_command, BotCommand, ParseResult};
pub use component::ComponentId;
pub use decision::{DecisionId, DecisionRequest, DecisionStatus, Verdict};
pub use error::TicketError;
pub use ids::{ChannelId, GuildId, MessageId, RoleId, UserId};
pub use naming::{channel_name, channel_topic, parse_topic, TicketTopic};
pub use questionnaire::Questionnaire;
pub use request::RequestType;
pub use session::{AnswerOutcome, Session, NO_ANSWER};
pub use visibility::{
    resolve_visibility, AccessRoles, OverwriteTarget, PermissionOverwrite, Permissions, Visibility,
};
