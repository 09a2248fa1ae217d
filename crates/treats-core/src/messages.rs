use tracing::{debug, info};

use treats_types::models::{ChannelId, DmId, MessageId, NO_CONVERSATION, UserId};

use crate::error::{Result, TreatsError};
use crate::mentions;
use crate::notify;
use crate::workspace::{ConversationRef, MAX_MESSAGE_LEN, Message, REACT_THUMBS_UP, Workspace, now};

fn validate_body(body: &str) -> Result<()> {
    if !(1..=MAX_MESSAGE_LEN).contains(&body.chars().count()) {
        return Err(TreatsError::input(format!(
            "message must be between 1 and {} characters",
            MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}

fn validate_react(react_id: u32) -> Result<()> {
    if react_id != REACT_THUMBS_UP {
        return Err(TreatsError::input(format!("reactId {} is not valid", react_id)));
    }
    Ok(())
}

impl Workspace {
    /// The conversation must exist; an unknown id is an input error.
    fn require_conversation(&self, conversation: ConversationRef) -> Result<()> {
        match conversation {
            ConversationRef::Channel(id) => self.channel(id).map(|_| ()),
            ConversationRef::Dm(id) => self.dm(id).map(|_| ()),
        }
    }

    fn require_member(&self, conversation: ConversationRef, u_id: UserId) -> Result<()> {
        if !self.is_member(conversation, u_id) {
            return Err(TreatsError::auth(format!(
                "user {} is not a member of {:?}",
                u_id, conversation
            )));
        }
        Ok(())
    }

    /// Insert a message and run the post-send bookkeeping: tag notifications
    /// for every mentioned member and the sender's stats.
    pub(crate) fn deliver(
        &mut self,
        message_id: MessageId,
        u_id: UserId,
        conversation: ConversationRef,
        body: String,
    ) -> Result<MessageId> {
        let mentioned = mentions::scan(&body);
        self.insert_message(message_id, u_id, conversation, body)?;
        notify::resolve_and_notify(self, message_id, &mentioned);
        self.record_message_sent(u_id);
        debug!(message_id, u_id, ?conversation, "message sent");
        Ok(message_id)
    }

    pub(crate) fn send_to(&mut self, u_id: UserId, conversation: ConversationRef, body: &str) -> Result<MessageId> {
        self.require_conversation(conversation)?;
        validate_body(body)?;
        self.require_member(conversation, u_id)?;

        let message_id = self.reserve_message_id();
        self.deliver(message_id, u_id, conversation, body.to_string())
    }

    pub fn message_send(&mut self, u_id: UserId, channel_id: ChannelId, body: &str) -> Result<MessageId> {
        self.send_to(u_id, ConversationRef::Channel(channel_id), body)
    }

    pub fn message_send_dm(&mut self, u_id: UserId, dm_id: DmId, body: &str) -> Result<MessageId> {
        self.send_to(u_id, ConversationRef::Dm(dm_id), body)
    }

    /// Editing and removal need both authorship and owner rights in the
    /// hosting conversation.
    fn require_editor(&self, u_id: UserId, message: &Message) -> Result<()> {
        let conversation = message.conversation;
        if message.u_id != u_id
            || !self.is_member(conversation, u_id)
            || !self.has_owner_rights(conversation, u_id)
        {
            return Err(TreatsError::auth("user may not modify this message"));
        }
        Ok(())
    }

    /// Replace the body. An empty body deletes the message. Only handles the
    /// old body did not already mention are notified.
    pub fn message_edit(&mut self, u_id: UserId, message_id: MessageId, body: &str) -> Result<()> {
        let message = self.message(message_id)?;
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(TreatsError::input(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        self.require_editor(u_id, message)?;

        if body.is_empty() {
            self.remove_message(message_id);
            self.record_messages_exist();
            debug!(message_id, u_id, "message deleted by empty edit");
            return Ok(());
        }

        let mentioned = mentions::scan_delta(body, &message.body);
        self.message_mut(message_id)?.body = body.to_string();
        notify::resolve_and_notify(self, message_id, &mentioned);
        Ok(())
    }

    pub fn message_remove(&mut self, u_id: UserId, message_id: MessageId) -> Result<()> {
        let message = self.message(message_id)?;
        self.require_editor(u_id, message)?;

        self.remove_message(message_id);
        self.record_messages_exist();
        debug!(message_id, u_id, "message removed");
        Ok(())
    }

    /// A reactor must belong to the message's conversation. Failing that is an
    /// input error since the message is not visible to them.
    fn visible_message(&self, u_id: UserId, message_id: MessageId) -> Result<&Message> {
        let message = self.message(message_id)?;
        if !self.is_member(message.conversation, u_id) {
            return Err(TreatsError::input(format!(
                "messageId {} is not in a conversation the user has joined",
                message_id
            )));
        }
        Ok(message)
    }

    pub fn message_react(&mut self, u_id: UserId, message_id: MessageId, react_id: u32) -> Result<()> {
        self.visible_message(u_id, message_id)?;
        validate_react(react_id)?;

        let message = self.message_mut(message_id)?;
        let react = message
            .reacts
            .iter_mut()
            .find(|r| r.react_id == react_id)
            .ok_or_else(|| TreatsError::input("react not found"))?;
        if react.u_ids.contains(&u_id) {
            return Err(TreatsError::input("user has already reacted"));
        }
        react.u_ids.push(u_id);

        notify::notify_reacted(self, u_id, message_id);
        Ok(())
    }

    pub fn message_unreact(&mut self, u_id: UserId, message_id: MessageId, react_id: u32) -> Result<()> {
        self.visible_message(u_id, message_id)?;
        validate_react(react_id)?;

        let message = self.message_mut(message_id)?;
        let react = message
            .reacts
            .iter_mut()
            .find(|r| r.react_id == react_id)
            .ok_or_else(|| TreatsError::input("react not found"))?;
        if !react.u_ids.contains(&u_id) {
            return Err(TreatsError::input("user has not reacted"));
        }
        react.u_ids.retain(|id| *id != u_id);
        Ok(())
    }

    fn set_pinned(&mut self, u_id: UserId, message_id: MessageId, pinned: bool) -> Result<()> {
        let conversation = self.visible_message(u_id, message_id)?.conversation;
        if !self.has_owner_rights(conversation, u_id) {
            return Err(TreatsError::auth("user does not have owner permissions"));
        }

        let message = self.message_mut(message_id)?;
        if message.is_pinned == pinned {
            return Err(TreatsError::input(if pinned {
                "message is already pinned"
            } else {
                "message is not pinned"
            }));
        }
        message.is_pinned = pinned;
        Ok(())
    }

    pub fn message_pin(&mut self, u_id: UserId, message_id: MessageId) -> Result<()> {
        self.set_pinned(u_id, message_id, true)
    }

    pub fn message_unpin(&mut self, u_id: UserId, message_id: MessageId) -> Result<()> {
        self.set_pinned(u_id, message_id, false)
    }

    /// Resolve a `(channelId, dmId)` pair where exactly one side is set and
    /// the other is `-1`.
    pub fn share_target(&self, channel_id: i64, dm_id: i64) -> Result<ConversationRef> {
        let target = match (channel_id, dm_id) {
            (c, NO_CONVERSATION) if c != NO_CONVERSATION => {
                ChannelId::try_from(c).ok().map(ConversationRef::Channel)
            }
            (NO_CONVERSATION, d) if d != NO_CONVERSATION => DmId::try_from(d).ok().map(ConversationRef::Dm),
            _ => None,
        }
        .ok_or_else(|| TreatsError::input("exactly one of channelId and dmId must be -1"))?;

        self.require_conversation(target)?;
        Ok(target)
    }

    /// Copy a message into `target`, optionally followed by `": caption"`.
    pub fn message_share(
        &mut self,
        u_id: UserId,
        og_message_id: MessageId,
        caption: &str,
        target: ConversationRef,
    ) -> Result<MessageId> {
        self.require_conversation(target)?;
        let original = self.visible_message(u_id, og_message_id)?;

        let body = if caption.is_empty() {
            original.body.clone()
        } else {
            format!("{}: {}", original.body, caption)
        };
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(TreatsError::input(format!(
                "shared message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        self.require_member(target, u_id)?;

        let message_id = self.reserve_message_id();
        let mentioned = mentions::scan(&body);
        self.insert_message(message_id, u_id, target, body)?;
        notify::resolve_and_notify(self, message_id, &mentioned);
        self.record_messages_exist();

        info!(og_message_id, message_id, u_id, ?target, "message shared");
        Ok(message_id)
    }

    /// Validate a deferred send and reserve its message id. The caller
    /// schedules [`Workspace::deliver_scheduled`] for `time_sent`.
    pub fn message_send_later(
        &mut self,
        u_id: UserId,
        conversation: ConversationRef,
        body: &str,
        time_sent: i64,
    ) -> Result<MessageId> {
        self.require_conversation(conversation)?;
        if time_sent < now().timestamp() {
            return Err(TreatsError::input("timeSent is in the past"));
        }
        if time_sent.checked_mul(1000).is_none() {
            return Err(TreatsError::input("timeSent is out of range"));
        }
        validate_body(body)?;
        self.require_member(conversation, u_id)?;

        let message_id = self.reserve_message_id();
        info!(message_id, u_id, ?conversation, time_sent, "message scheduled");
        Ok(message_id)
    }

    /// Send a previously scheduled message under its reserved id. Membership
    /// and the conversation itself are checked again since either may have
    /// gone away in the meantime.
    pub fn deliver_scheduled(
        &mut self,
        message_id: MessageId,
        u_id: UserId,
        conversation: ConversationRef,
        body: &str,
    ) -> Result<MessageId> {
        self.require_conversation(conversation)?;
        self.active_user(u_id)?;
        self.require_member(conversation, u_id)?;
        if self.messages.contains_key(&message_id) {
            return Err(TreatsError::input(format!("messageId {} is already in use", message_id)));
        }
        self.deliver(message_id, u_id, conversation, body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        ws: Workspace,
        owner: UserId,
        member: UserId,
        channel: ChannelId,
    }

    fn setup() -> Fixture {
        let mut ws = Workspace::new();
        let (owner, _) = ws.register("owner@example.com", "h".into(), "John", "Smith").unwrap();
        let (member, _) = ws.register("member@example.com", "h".into(), "John", "Smith").unwrap();
        let channel = ws.channels_create(owner, "general", true).unwrap();
        ws.channel_join(member, channel).unwrap();
        Fixture {
            ws,
            owner,
            member,
            channel,
        }
    }

    #[test]
    fn test_send_validates_body_and_membership() {
        let mut f = setup();
        assert!(matches!(f.ws.message_send(f.owner, f.channel, ""), Err(TreatsError::Input(_))));
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(f.ws.message_send(f.owner, f.channel, &long), Err(TreatsError::Input(_))));
        assert!(matches!(f.ws.message_send(f.owner, 99, "hi"), Err(TreatsError::Input(_))));

        let private = f.ws.channels_create(f.owner, "private", false).unwrap();
        assert!(matches!(f.ws.message_send(f.member, private, "hi"), Err(TreatsError::Auth(_))));
    }

    #[test]
    fn test_send_tags_members_only() {
        let mut f = setup();
        let (outsider, _) = f.ws.register("out@example.com", "h".into(), "Out", "Sider").unwrap();
        f.ws.message_send(f.owner, f.channel, "hey @johnsmith0 and @outsider").unwrap();

        let feed = &f.ws.user(f.member).unwrap().notifications;
        assert_eq!(feed.len(), 1);
        assert_eq!(
            feed[0].notification_message,
            "johnsmith tagged you in general: hey @johnsmith0 and "
        );
        assert!(f.ws.user(outsider).unwrap().notifications.is_empty());
    }

    #[test]
    fn test_edit_requires_author_with_owner_rights() {
        let mut f = setup();
        let m = f.ws.message_send(f.member, f.channel, "mine").unwrap();
        // author without owner rights
        assert!(matches!(f.ws.message_edit(f.member, m, "changed"), Err(TreatsError::Auth(_))));
        // owner who is not the author
        assert!(matches!(f.ws.message_edit(f.owner, m, "changed"), Err(TreatsError::Auth(_))));

        let own = f.ws.message_send(f.owner, f.channel, "hello").unwrap();
        f.ws.message_edit(f.owner, own, "hello again").unwrap();
        assert_eq!(f.ws.message(own).unwrap().body, "hello again");
    }

    #[test]
    fn test_empty_edit_deletes() {
        let mut f = setup();
        let m = f.ws.message_send(f.owner, f.channel, "bye").unwrap();
        f.ws.message_edit(f.owner, m, "").unwrap();
        assert!(f.ws.message(m).is_err());
        assert!(f.ws.channel(f.channel).unwrap().message_ids.is_empty());
    }

    #[test]
    fn test_edit_notifies_new_mentions_only() {
        let mut f = setup();
        let (third, _) = f.ws.register("third@example.com", "h".into(), "Ann", "Lee").unwrap();
        f.ws.channel_join(third, f.channel).unwrap();

        let m = f.ws.message_send(f.owner, f.channel, "@annlee hi").unwrap();
        assert_eq!(f.ws.user(third).unwrap().notifications.len(), 1);

        f.ws.message_edit(f.owner, m, "@annlee @johnsmith0 hi").unwrap();
        assert_eq!(f.ws.user(third).unwrap().notifications.len(), 1);
        assert_eq!(f.ws.user(f.member).unwrap().notifications.len(), 1);
    }

    #[test]
    fn test_react_and_unreact() {
        let mut f = setup();
        let m = f.ws.message_send(f.owner, f.channel, "react to me").unwrap();

        assert!(f.ws.message_react(f.member, m, 2).is_err());
        f.ws.message_react(f.member, m, REACT_THUMBS_UP).unwrap();
        assert!(matches!(
            f.ws.message_react(f.member, m, REACT_THUMBS_UP),
            Err(TreatsError::Input(_))
        ));

        let feed = &f.ws.user(f.owner).unwrap().notifications;
        assert_eq!(
            feed.last().unwrap().notification_message,
            "johnsmith0 reacted to your message in general"
        );

        let before = f.ws.user(f.owner).unwrap().notifications.len();
        f.ws.message_unreact(f.member, m, REACT_THUMBS_UP).unwrap();
        assert_eq!(f.ws.user(f.owner).unwrap().notifications.len(), before);
        assert!(f.ws.message_unreact(f.member, m, REACT_THUMBS_UP).is_err());
    }

    #[test]
    fn test_pin_requires_owner() {
        let mut f = setup();
        let m = f.ws.message_send(f.member, f.channel, "pin me").unwrap();
        assert!(matches!(f.ws.message_pin(f.member, m), Err(TreatsError::Auth(_))));
        f.ws.message_pin(f.owner, m).unwrap();
        assert!(matches!(f.ws.message_pin(f.owner, m), Err(TreatsError::Input(_))));
        f.ws.message_unpin(f.owner, m).unwrap();
        assert!(f.ws.message_unpin(f.owner, m).is_err());
    }

    #[test]
    fn test_share_with_and_without_caption() {
        let mut f = setup();
        let m = f.ws.message_send(f.owner, f.channel, "original").unwrap();
        let dm = f.ws.dm_create(f.owner, &[f.member]).unwrap();

        let plain = f.ws.message_share(f.owner, m, "", ConversationRef::Dm(dm)).unwrap();
        assert_eq!(f.ws.message(plain).unwrap().body, "original");

        let captioned = f
            .ws
            .message_share(f.owner, m, "look", ConversationRef::Channel(f.channel))
            .unwrap();
        assert_eq!(f.ws.message(captioned).unwrap().body, "original: look");
    }

    #[test]
    fn test_share_target_needs_exactly_one_side() {
        let mut f = setup();
        let dm = f.ws.dm_create(f.owner, &[f.member]).unwrap();
        assert!(f.ws.share_target(-1, -1).is_err());
        assert!(f.ws.share_target(i64::from(f.channel), i64::from(dm)).is_err());
        assert_eq!(
            f.ws.share_target(i64::from(f.channel), -1).unwrap(),
            ConversationRef::Channel(f.channel)
        );
        assert_eq!(f.ws.share_target(-1, i64::from(dm)).unwrap(), ConversationRef::Dm(dm));
    }

    #[test]
    fn test_send_later_reserves_id_and_revalidates() {
        let mut f = setup();
        let conv = ConversationRef::Channel(f.channel);
        let past = now().timestamp() - 10;
        assert!(f.ws.message_send_later(f.member, conv, "late", past).is_err());

        let future = now().timestamp() + 5;
        let id = f.ws.message_send_later(f.member, conv, "later", future).unwrap();
        assert!(f.ws.message(id).is_err());

        let other = f.ws.message_send(f.owner, f.channel, "now").unwrap();
        assert_ne!(other, id);

        f.ws.channel_leave(f.member, f.channel).unwrap();
        assert!(f.ws.deliver_scheduled(id, f.member, conv, "later").is_err());

        f.ws.channel_join(f.member, f.channel).unwrap();
        assert_eq!(f.ws.deliver_scheduled(id, f.member, conv, "later").unwrap(), id);
        assert_eq!(f.ws.message(id).unwrap().body, "later");
    }

    #[test]
    fn test_send_later_rejects_unrepresentable_time() {
        let mut f = setup();
        let conv = ConversationRef::Channel(f.channel);
        for time_sent in [i64::MAX / 100, i64::MAX] {
            assert!(matches!(
                f.ws.message_send_later(f.member, conv, "someday", time_sent),
                Err(TreatsError::Input(_))
            ));
        }
        // nothing was reserved for the rejected sends
        let next = f.ws.message_send(f.member, f.channel, "now").unwrap();
        assert_eq!(next, 1);
    }
}
