use tracing::info;

use treats_types::models::UserId;

use crate::error::{Result, TreatsError};
use crate::workspace::{Permission, Workspace};

pub const REMOVED_FIRST_NAME: &str = "Removed";
pub const REMOVED_LAST_NAME: &str = "user";
pub const REMOVED_MESSAGE_BODY: &str = "Removed user";

impl Workspace {
    fn global_owner_count(&self) -> usize {
        self.users
            .values()
            .filter(|u| !u.removed && u.is_global_owner())
            .count()
    }

    fn require_global_owner(&self, u_id: UserId) -> Result<()> {
        if !self.active_user(u_id)?.is_global_owner() {
            return Err(TreatsError::auth("user is not a global owner"));
        }
        Ok(())
    }

    pub fn admin_permission_change(&mut self, u_id: UserId, target: UserId, permission_id: u8) -> Result<()> {
        let current = self.active_user(target)?.permission;
        let permission = Permission::from_id(permission_id)
            .ok_or_else(|| TreatsError::input(format!("permissionId {} is not valid", permission_id)))?;
        self.require_global_owner(u_id)?;

        if current == Permission::GlobalOwner
            && permission == Permission::Member
            && self.global_owner_count() == 1
        {
            return Err(TreatsError::input("cannot demote the only global owner"));
        }
        if current == permission {
            return Err(TreatsError::input("user already has this permission"));
        }

        self.user_mut(target)?.permission = permission;
        info!(u_id, target, permission_id, "global permission changed");
        Ok(())
    }

    /// Remove a user from the workspace. Their account is kept so old
    /// messages still resolve, but it is renamed, logged out, dropped from
    /// every channel and DM, and its email and handle become free to reuse.
    pub fn admin_user_remove(&mut self, u_id: UserId, target: UserId) -> Result<()> {
        let is_owner = self.active_user(target)?.is_global_owner();
        if is_owner && self.global_owner_count() == 1 {
            return Err(TreatsError::input("cannot remove the only global owner"));
        }
        self.require_global_owner(u_id)?;

        for message in self.messages.values_mut().filter(|m| m.u_id == target) {
            message.body = REMOVED_MESSAGE_BODY.to_string();
        }
        for channel in self.channels.values_mut() {
            channel.all_members.retain(|id| *id != target);
            channel.owner_members.retain(|id| *id != target);
        }
        for dm in self.dms.values_mut() {
            dm.members.retain(|id| *id != target);
        }

        let user = self.user_mut(target)?;
        user.name_first = REMOVED_FIRST_NAME.to_string();
        user.name_last = REMOVED_LAST_NAME.to_string();
        user.sessions.clear();
        user.reset_codes.clear();
        user.removed = true;

        info!(u_id, target, "user removed");
        Ok(())
    }
}
