//! Snowflake identifiers for platform objects.
//!
//! The chat platform hands out 64-bit ids but serializes them as JSON
//! strings. Each kind of object gets its own newtype so a role id can never
//! be passed where a channel id is expected.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Text(String),
    Number(u64),
}

fn deserialize_snowflake<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match RawSnowflake::deserialize(deserializer)? {
        RawSnowflake::Number(n) => Ok(n),
        RawSnowflake::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_snowflake(deserializer).map(Self)
            }
        }
    };
}

snowflake!(
    /// A user account.
    UserId
);
snowflake!(
    /// A text channel or category.
    ChannelId
);
snowflake!(
    /// A role (group) within the guild.
    RoleId
);
snowflake!(
    /// The guild (community) the bot serves.
    GuildId
);
snowflake!(MessageId);

impl UserId {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }

    /// Parse a raw id or a mention (`<@123>`, `<@!123>`).
    pub fn parse_mention(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .map(|rest| rest.trim_start_matches('!'))
            .unwrap_or(trimmed);
        inner.parse().ok()
    }
}

impl ChannelId {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.0)
    }
}

impl RoleId {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl GuildId {
    /// The implicit role every guild member holds shares the guild's id.
    pub fn everyone_role(&self) -> RoleId {
        RoleId(self.0)
    }
}
