//! Text commands typed into guild channels.

use std::fmt;

use crate::ids::UserId;

/// Default reason recorded for a scammer report without one.
pub const NO_REASON: &str = "No reason provided";

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Post the ticket panel (admin only).
    TicketPanel,
    /// Log a purchase status update for a user (admin only).
    Purchase { status: String, user: UserId },
    /// Report a user as a scammer (admin only).
    Scammer { user: UserId, reason: String },
    /// List the available commands.
    Help,
}

impl BotCommand {
    pub fn requires_admin(&self) -> bool {
        !matches!(self, BotCommand::Help)
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotCommand::TicketPanel => write!(f, "!ticketpanel"),
            BotCommand::Purchase { .. } => write!(f, "!purchase"),
            BotCommand::Scammer { .. } => write!(f, "!scammer"),
            BotCommand::Help => write!(f, "!help"),
        }
    }
}

/// Result of parsing a message for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    Command(BotCommand),
    /// A known command word with missing or invalid arguments.
    Malformed { attempted: String },
    /// Ordinary chatter.
    NotACommand,
}

/// Parse a message body.
///
/// The command word must be the first token. `!ticketpanel` and `!help`
/// take no arguments; `!purchase <status> <user>` and
/// `!scammer <user> [reason...]` accept a raw id or a mention for the user.
pub fn parse_command(text: &str) -> ParseResult {
    let mut tokens = text.split_whitespace();
    let Some(word) = tokens.next() else {
        return ParseResult::NotACommand;
    };
    let args: Vec<&str> = tokens.collect();

    match word {
        "!ticketpanel" if args.is_empty() => ParseResult::Command(BotCommand::TicketPanel),
        "!help" if args.is_empty() => ParseResult::Command(BotCommand::Help),
        "!purchase" => match args.as_slice() {
            [status, user, ..] => match UserId::parse_mention(user) {
                Some(user) => ParseResult::Command(BotCommand::Purchase {
                    status: status.to_string(),
                    user,
                }),
                None => malformed(text),
            },
            _ => malformed(text),
        },
        "!scammer" => match args.split_first() {
            Some((user, reason)) => match UserId::parse_mention(user) {
                Some(user) => ParseResult::Command(BotCommand::Scammer {
                    user,
                    reason: if reason.is_empty() {
                        NO_REASON.to_string()
                    } else {
                        reason.join(" ")
                    },
                }),
                None => malformed(text),
            },
            None => malformed(text),
        },
        _ => ParseResult::NotACommand,
    }
}

fn malformed(text: &str) -> ParseResult {
    ParseResult::Malformed {
        attempted: text.trim().to_string(),
    }
}
