use tracing::info;

use treats_types::api::{ChannelDetailsResponse, MessagesPage};
use treats_types::models::{ChannelId, ChannelSummary, UserId};

use crate::error::{Result, TreatsError};
use crate::notify;
use crate::pager;
use crate::workspace::{Channel, ConversationRef, Workspace};

pub const MAX_CHANNEL_NAME_LEN: usize = 20;

fn summary(channel: &Channel) -> ChannelSummary {
    ChannelSummary {
        channel_id: channel.channel_id,
        name: channel.name.clone(),
    }
}

impl Workspace {
    fn require_channel_member(&self, channel_id: ChannelId, u_id: UserId) -> Result<&Channel> {
        let channel = self.channel(channel_id)?;
        if !channel.all_members.contains(&u_id) {
            return Err(TreatsError::auth(format!(
                "user {} is not a member of channel {}",
                u_id, channel_id
            )));
        }
        Ok(channel)
    }

    pub fn channels_create(&mut self, u_id: UserId, name: &str, is_public: bool) -> Result<ChannelId> {
        if !(1..=MAX_CHANNEL_NAME_LEN).contains(&name.chars().count()) {
            return Err(TreatsError::input(format!(
                "channel name must be between 1 and {} characters",
                MAX_CHANNEL_NAME_LEN
            )));
        }
        self.active_user(u_id)?;

        let channel_id = self.alloc_channel_id();
        self.channels.insert(
            channel_id,
            Channel {
                channel_id,
                name: name.to_string(),
                is_public,
                owner_members: vec![u_id],
                all_members: vec![u_id],
                message_ids: Vec::new(),
                standup: None,
            },
        );

        self.record_channels_joined(u_id);
        self.record_channels_exist();
        info!(channel_id, u_id, name, "channel created");
        Ok(channel_id)
    }

    /// Channels `u_id` belongs to.
    pub fn channels_list(&self, u_id: UserId) -> Vec<ChannelSummary> {
        self.channels
            .values()
            .filter(|c| c.all_members.contains(&u_id))
            .map(summary)
            .collect()
    }

    /// Every channel, public or private.
    pub fn channels_listall(&self) -> Vec<ChannelSummary> {
        self.channels.values().map(summary).collect()
    }

    pub fn channel_details(&self, u_id: UserId, channel_id: ChannelId) -> Result<ChannelDetailsResponse> {
        let channel = self.require_channel_member(channel_id, u_id)?;
        Ok(ChannelDetailsResponse {
            name: channel.name.clone(),
            is_public: channel.is_public,
            owner_members: self.profiles(&channel.owner_members),
            all_members: self.profiles(&channel.all_members),
        })
    }

    /// Join a public channel. Global owners may also join private ones.
    pub fn channel_join(&mut self, u_id: UserId, channel_id: ChannelId) -> Result<()> {
        let global_owner = self.active_user(u_id)?.is_global_owner();
        let channel = self.channel(channel_id)?;

        if channel.all_members.contains(&u_id) {
            return Err(TreatsError::input("user is already a member of this channel"));
        }
        if !channel.is_public && !global_owner {
            return Err(TreatsError::auth("channel is private"));
        }

        self.channel_mut(channel_id)?.all_members.push(u_id);
        self.record_channels_joined(u_id);
        Ok(())
    }

    /// Add `invitee` to the channel and send them an added notification.
    pub fn channel_invite(&mut self, u_id: UserId, channel_id: ChannelId, invitee: UserId) -> Result<()> {
        let channel = self.channel(channel_id)?;
        self.active_user(invitee)?;

        if channel.all_members.contains(&invitee) || !channel.all_members.contains(&u_id) {
            return Err(TreatsError::auth(
                "inviter must be a member and invitee must not be one",
            ));
        }
        let name = channel.name.clone();

        self.channel_mut(channel_id)?.all_members.push(invitee);
        notify::notify_added(self, u_id, invitee, ConversationRef::Channel(channel_id), &name);
        self.record_channels_joined(invitee);
        Ok(())
    }

    pub fn channel_leave(&mut self, u_id: UserId, channel_id: ChannelId) -> Result<()> {
        let channel = self.channel(channel_id)?;
        if channel.standup.as_ref().is_some_and(|s| s.starter == u_id) {
            return Err(TreatsError::input("the user who started the active standup cannot leave"));
        }
        self.require_channel_member(channel_id, u_id)?;

        let channel = self.channel_mut(channel_id)?;
        channel.owner_members.retain(|id| *id != u_id);
        channel.all_members.retain(|id| *id != u_id);
        self.record_channels_joined(u_id);
        Ok(())
    }

    pub fn channel_add_owner(&mut self, u_id: UserId, channel_id: ChannelId, target: UserId) -> Result<()> {
        let channel = self.channel(channel_id)?;
        self.active_user(target)?;

        if channel.owner_members.contains(&target) {
            return Err(TreatsError::input("user is already an owner of this channel"));
        }
        if !channel.all_members.contains(&target) {
            return Err(TreatsError::input("user is not a member of this channel"));
        }
        if !self.has_owner_rights(ConversationRef::Channel(channel_id), u_id) {
            return Err(TreatsError::auth("user does not have owner permissions"));
        }

        self.channel_mut(channel_id)?.owner_members.push(target);
        Ok(())
    }

    pub fn channel_remove_owner(&mut self, u_id: UserId, channel_id: ChannelId, target: UserId) -> Result<()> {
        let channel = self.channel(channel_id)?;
        self.active_user(target)?;

        if !channel.owner_members.contains(&target) {
            return Err(TreatsError::input("user is not an owner of this channel"));
        }
        if channel.owner_members.len() == 1 {
            return Err(TreatsError::input("user is the only owner of this channel"));
        }
        if !self.has_owner_rights(ConversationRef::Channel(channel_id), u_id) {
            return Err(TreatsError::auth("user does not have owner permissions"));
        }

        self.channel_mut(channel_id)?.owner_members.retain(|id| *id != target);
        Ok(())
    }

    /// Newest-first page of channel messages as seen by `u_id`.
    pub fn channel_messages(&self, u_id: UserId, channel_id: ChannelId, start: usize) -> Result<MessagesPage> {
        let channel = self.channel(channel_id)?;
        if start > channel.message_ids.len() {
            return Err(TreatsError::input("start is greater than the total number of messages"));
        }
        self.require_channel_member(channel_id, u_id)?;

        pager::page(
            self.conversation_messages(ConversationRef::Channel(channel_id)),
            start,
            u_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Workspace, UserId, UserId) {
        let mut ws = Workspace::new();
        let (owner, _) = ws.register("owner@example.com", "h".into(), "John", "Smith").unwrap();
        let (other, _) = ws.register("other@example.com", "h".into(), "John", "Smith").unwrap();
        (ws, owner, other)
    }

    #[test]
    fn test_create_and_list() {
        let (mut ws, owner, other) = setup();
        let c = ws.channels_create(owner, "First channel", true).unwrap();
        assert_eq!(ws.channels_list(owner).len(), 1);
        assert!(ws.channels_list(other).is_empty());
        assert_eq!(ws.channels_listall()[0].channel_id, c);
        assert!(ws.channels_create(owner, "", true).is_err());
        assert!(ws.channels_create(owner, "a name that is far too long", true).is_err());
    }

    #[test]
    fn test_private_channel_join() {
        let (mut ws, owner, other) = setup();
        let c = ws.channels_create(other, "secret", false).unwrap();
        // global owner may join a private channel
        ws.channel_join(owner, c).unwrap();

        let c2 = ws.channels_create(owner, "secret2", false).unwrap();
        assert!(matches!(ws.channel_join(other, c2), Err(TreatsError::Auth(_))));
        assert!(matches!(ws.channel_join(owner, c2), Err(TreatsError::Input(_))));
    }

    #[test]
    fn test_invite_notifies() {
        let (mut ws, owner, other) = setup();
        let c = ws.channels_create(owner, "First channel", true).unwrap();
        ws.channel_invite(owner, c, other).unwrap();

        let feed = &ws.user(other).unwrap().notifications;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].notification_message, "johnsmith added you to First channel");
        assert_eq!(feed[0].channel_id, i64::from(c));
        assert_eq!(feed[0].dm_id, -1);
        assert!(ws.user(owner).unwrap().notifications.is_empty());

        assert!(matches!(ws.channel_invite(owner, c, other), Err(TreatsError::Auth(_))));
    }

    #[test]
    fn test_owner_management() {
        let (mut ws, owner, other) = setup();
        let c = ws.channels_create(owner, "First", true).unwrap();
        assert!(ws.channel_add_owner(owner, c, other).is_err());

        ws.channel_join(other, c).unwrap();
        assert!(matches!(ws.channel_add_owner(other, c, other), Err(TreatsError::Auth(_))));
        ws.channel_add_owner(owner, c, other).unwrap();
        ws.channel_remove_owner(other, c, owner).unwrap();
        assert!(ws.channel_remove_owner(other, c, other).is_err());

        let details = ws.channel_details(owner, c).unwrap();
        assert_eq!(details.owner_members.len(), 1);
        assert_eq!(details.owner_members[0].u_id, other);
        assert_eq!(details.all_members.len(), 2);
    }

    #[test]
    fn test_leave() {
        let (mut ws, owner, other) = setup();
        let c = ws.channels_create(owner, "First", true).unwrap();
        assert!(matches!(ws.channel_leave(other, c), Err(TreatsError::Auth(_))));
        ws.channel_leave(owner, c).unwrap();
        assert!(ws.channel_details(owner, c).is_err());
    }
}
