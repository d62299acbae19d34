//! Permission model for ticket channels.
//!
//! A ticket channel is private by default. Which groups may see it depends
//! only on the request type, so the overwrite list is a pure function of
//! `(RequestType, requester, AccessRoles)`.

use std::fmt;
use std::ops::BitOr;

use crate::ids::{GuildId, RoleId, UserId};
use crate::request::RequestType;

/// Bit set of channel permissions, using the platform's bit positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);

    /// See the channel, read its history and post in it.
    pub const READ_WRITE: Self =
        Self(Self::VIEW_CHANNEL.0 | Self::SEND_MESSAGES.0 | Self::READ_MESSAGE_HISTORY.0);

    /// Read-write plus moderation of the channel itself.
    pub const MANAGE: Self =
        Self(Self::READ_WRITE.0 | Self::MANAGE_CHANNELS.0 | Self::MANAGE_MESSAGES.0);

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    Role(RoleId),
    Member(UserId),
}

/// One entry of a channel's access-control list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    pub fn allow(target: OverwriteTarget, allow: Permissions) -> Self {
        Self {
            target,
            allow,
            deny: Permissions::NONE,
        }
    }

    pub fn deny(target: OverwriteTarget, deny: Permissions) -> Self {
        Self {
            target,
            allow: Permissions::NONE,
            deny,
        }
    }
}

/// The groups that take part in ticket visibility.
///
/// Optional groups are simply left out of the overwrite list when the guild
/// does not configure them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRoles {
    /// The implicit role held by every member.
    pub everyone: RoleId,
    /// Staff that service general tickets.
    pub support: Option<RoleId>,
    /// Staff that review applications.
    pub reviewer: Option<RoleId>,
    /// Group that handles owner-contact tickets.
    pub owner_contact: Option<RoleId>,
    /// Administrator-equivalent group, always granted last.
    pub admin: Option<RoleId>,
}

impl AccessRoles {
    pub fn new(guild: GuildId) -> Self {
        Self {
            everyone: guild.everyone_role(),
            support: None,
            reviewer: None,
            owner_contact: None,
            admin: None,
        }
    }
}

/// Ordered overwrite list with at most one entry per target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    overwrites: Vec<PermissionOverwrite>,
}

impl Visibility {
    /// Add an overwrite, replacing any earlier entry for the same target.
    fn set(&mut self, overwrite: PermissionOverwrite) {
        self.overwrites.retain(|o| o.target != overwrite.target);
        self.overwrites.push(overwrite);
    }

    pub fn overwrites(&self) -> &[PermissionOverwrite] {
        &self.overwrites
    }

    pub fn into_overwrites(self) -> Vec<PermissionOverwrite> {
        self.overwrites
    }

    pub fn get(&self, target: OverwriteTarget) -> Option<&PermissionOverwrite> {
        self.overwrites.iter().find(|o| o.target == target)
    }

    /// Whether `target` is explicitly granted every permission in `perms`.
    pub fn allows(&self, target: OverwriteTarget, perms: Permissions) -> bool {
        self.get(target).is_some_and(|o| o.allow.contains(perms))
    }

    /// Whether `target` is explicitly denied every permission in `perms`.
    pub fn denies(&self, target: OverwriteTarget, perms: Permissions) -> bool {
        self.get(target).is_some_and(|o| o.deny.contains(perms))
    }
}

/// Compute the access-control list for a new ticket channel.
///
/// - `@everyone` is denied view.
/// - The requester gets read-write.
/// - Purchase, support and team tickets add the support group.
/// - Owner-contact tickets deny the support group and add the owner-contact group.
/// - Applications add the reviewer group instead of support.
/// - The admin group, if any, is appended last with manage rights.
pub fn resolve_visibility(
    request_type: RequestType,
    requester: UserId,
    roles: &AccessRoles,
) -> Visibility {
    let mut visibility = Visibility::default();

    visibility.set(PermissionOverwrite::deny(
        OverwriteTarget::Role(roles.everyone),
        Permissions::VIEW_CHANNEL,
    ));
    visibility.set(PermissionOverwrite::allow(
        OverwriteTarget::Member(requester),
        Permissions::READ_WRITE,
    ));

    match request_type {
        RequestType::PurchaseBot
        | RequestType::PurchaseWebsite
        | RequestType::Support
        | RequestType::JoinTeam => {
            if let Some(support) = roles.support {
                visibility.set(PermissionOverwrite::allow(
                    OverwriteTarget::Role(support),
                    Permissions::READ_WRITE,
                ));
            }
        }
        RequestType::ContactOwner => {
            if let Some(support) = roles.support {
                visibility.set(PermissionOverwrite::deny(
                    OverwriteTarget::Role(support),
                    Permissions::VIEW_CHANNEL,
                ));
            }
            // A shared id would turn the support deny back into an allow.
            if let Some(owner) = roles.owner_contact.filter(|r| Some(*r) != roles.support) {
                visibility.set(PermissionOverwrite::allow(
                    OverwriteTarget::Role(owner),
                    Permissions::READ_WRITE,
                ));
            }
        }
        RequestType::ApplyStaff => {
            if let Some(reviewer) = roles.reviewer {
                visibility.set(PermissionOverwrite::allow(
                    OverwriteTarget::Role(reviewer),
                    Permissions::READ_WRITE,
                ));
            }
        }
    }

    if let Some(admin) = roles.admin {
        visibility.set(PermissionOverwrite::allow(
            OverwriteTarget::Role(admin),
            Permissions::MANAGE,
        ));
    }

    visibility
}
