use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::effect::MAX_MENU_OPTIONS;
use ticketdesk_core::{AccessRoles, ChannelId, GuildId, RoleId};

/// Channels that receive audit entries. Any of them may be left unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogChannels {
    pub open: Option<ChannelId>,
    pub close: Option<ChannelId>,
    pub purchase: Option<ChannelId>,
    pub scam: Option<ChannelId>,
}

/// Delays applied by the interview and ticket lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Pause before asking the next interview question.
    pub question_delay: Duration,
    /// Grace period between "closing" and deleting a ticket channel.
    pub close_delay: Duration,
    /// Grace period before deleting a submitted application's channel.
    pub application_close_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            question_delay: Duration::from_millis(1000),
            close_delay: Duration::from_secs(5),
            application_close_delay: Duration::from_secs(7),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    /// Overrides the platform REST endpoint, e.g. for a local proxy.
    pub discord_api_base: Option<String>,
    pub guild_id: GuildId,
    /// Shared secret the gateway relay signs event payloads with.
    pub relay_secret: String,
    pub port: u16,
    pub support_role: Option<RoleId>,
    pub reviewer_role: Option<RoleId>,
    pub owner_contact_role: Option<RoleId>,
    pub admin_role: Option<RoleId>,
    /// Roles a reviewer may hand out when accepting an application.
    pub assignable_roles: Vec<RoleId>,
    /// Where decision requests are posted.
    pub review_channel: ChannelId,
    pub log_channels: LogChannels,
    pub timing: Timing,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| parse_optional_var(lookup(key));

        let discord_token = var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN environment variable is required")?;

        let guild_id = parse_var(&var, "GUILD_ID")?
            .context("GUILD_ID environment variable is required")?;

        let relay_secret =
            var("RELAY_SECRET").context("RELAY_SECRET environment variable is required")?;

        let review_channel = parse_var(&var, "REVIEW_CHANNEL_ID")?
            .context("REVIEW_CHANNEL_ID environment variable is required")?;

        let port = parse_var(&var, "PORT")?.unwrap_or(3000);

        let assignable_roles = match var("ASSIGNABLE_ROLE_IDS") {
            Some(list) => parse_id_list(&list)
                .context("ASSIGNABLE_ROLE_IDS must be a comma-separated list of role ids")?,
            None => Vec::new(),
        };
        if assignable_roles.len() > MAX_MENU_OPTIONS {
            return Err(anyhow!(
                "ASSIGNABLE_ROLE_IDS lists {} roles; at most {} fit in the accept menu",
                assignable_roles.len(),
                MAX_MENU_OPTIONS
            ));
        }

        let defaults = Timing::default();
        let timing = Timing {
            question_delay: parse_var(&var, "QUESTION_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.question_delay),
            close_delay: parse_var(&var, "CLOSE_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.close_delay),
            application_close_delay: parse_var(&var, "APPLICATION_CLOSE_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.application_close_delay),
        };

        Ok(Config {
            discord_token,
            discord_api_base: var("DISCORD_API_BASE"),
            guild_id,
            relay_secret,
            port,
            support_role: parse_var(&var, "SUPPORT_ROLE_ID")?,
            reviewer_role: parse_var(&var, "REVIEWER_ROLE_ID")?,
            owner_contact_role: parse_var(&var, "OWNER_CONTACT_ROLE_ID")?,
            admin_role: parse_var(&var, "ADMIN_ROLE_ID")?,
            assignable_roles,
            review_channel,
            log_channels: LogChannels {
                open: parse_var(&var, "LOG_OPEN_CHANNEL_ID")?,
                close: parse_var(&var, "LOG_CLOSE_CHANNEL_ID")?,
                purchase: parse_var(&var, "LOG_PURCHASE_CHANNEL_ID")?,
                scam: parse_var(&var, "LOG_SCAM_CHANNEL_ID")?,
            },
            timing,
        })
    }

    pub fn access_roles(&self) -> AccessRoles {
        AccessRoles {
            support: self.support_role,
            reviewer: self.reviewer_role,
            owner_contact: self.owner_contact_role,
            admin: self.admin_role,
            ..AccessRoles::new(self.guild_id)
        }
    }
}

/// Treat missing, empty and whitespace-only values alike as unset.
pub fn parse_optional_var(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e))
        })
        .transpose()
}

fn parse_id_list(list: &str) -> Result<Vec<RoleId>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<RoleId>()
                .with_context(|| format!("invalid role id {:?}", s))
        })
        .collect()
}
