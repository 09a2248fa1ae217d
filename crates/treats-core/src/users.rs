use treats_types::models::{Notification, UserId, UserProfile};

use crate::auth::{MAX_HANDLE_LEN, validate_email, validate_name};
use crate::error::{Result, TreatsError};
use crate::workspace::{User, Workspace};

const MIN_HANDLE_LEN: usize = 3;

impl Workspace {
    /// Profile of any registered user, including removed ones.
    pub fn user_profile(&self, u_id: UserId) -> Result<UserProfile> {
        self.user(u_id).map(User::profile)
    }

    pub fn users_all(&self) -> Vec<UserProfile> {
        self.users
            .values()
            .filter(|u| !u.removed)
            .map(User::profile)
            .collect()
    }

    pub fn user_set_handle(&mut self, u_id: UserId, handle_str: &str) -> Result<()> {
        let len = handle_str.chars().count();
        if !(MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&len)
            || !handle_str.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(TreatsError::input(format!(
                "handle must be {} to {} alphanumeric characters",
                MIN_HANDLE_LEN, MAX_HANDLE_LEN
            )));
        }
        let current = &self.active_user(u_id)?.handle_str;
        if current != handle_str && self.handle_taken(handle_str) {
            return Err(TreatsError::input(format!("handle {} is already taken", handle_str)));
        }

        self.user_mut(u_id)?.handle_str = handle_str.to_string();
        Ok(())
    }

    pub fn user_set_name(&mut self, u_id: UserId, name_first: &str, name_last: &str) -> Result<()> {
        validate_name(name_first, name_last)?;
        let user = self.user_mut(u_id)?;
        user.name_first = name_first.to_string();
        user.name_last = name_last.to_string();
        Ok(())
    }

    pub fn user_set_email(&mut self, u_id: UserId, email: &str) -> Result<()> {
        validate_email(email)?;
        let current = &self.active_user(u_id)?.email;
        if current != email && self.email_taken(email) {
            return Err(TreatsError::input(format!("email {} is already registered", email)));
        }

        self.user_mut(u_id)?.email = email.to_string();
        Ok(())
    }

    /// The user's feed, oldest first.
    pub fn notifications(&self, u_id: UserId) -> Result<Vec<Notification>> {
        Ok(self.active_user(u_id)?.notifications.clone())
    }
}
