//! Mention resolution and notification emission.
//!
//! Every notification is rendered once, when it is appended to the
//! recipient's feed. Later edits or removals of the triggering message never
//! touch it.

use std::collections::HashSet;

use tracing::debug;

use treats_types::models::{MessageId, UserId};

use crate::directory::Directory;
use crate::workspace::ConversationRef;

/// Characters of the message body quoted in a tag notification. Counted in
/// `char`s (Unicode scalar values), so a preview never ends inside a
/// surrogate pair; for BMP text this equals a UTF-16 unit count.
pub const TAG_PREVIEW_CHARS: usize = 20;

/// Notify every member of the message's conversation whose handle is in
/// `mentioned`. Handles of non-members are ignored. Returns how many
/// notifications were appended.
pub fn resolve_and_notify<D: Directory>(
    directory: &mut D,
    message_id: MessageId,
    mentioned: &HashSet<String>,
) -> usize {
    if mentioned.is_empty() {
        return 0;
    }

    let Some(info) = directory.conversation_for_message(message_id) else {
        return 0;
    };
    let Some(message) = directory.find_message(message_id) else {
        return 0;
    };
    let sender = message.u_id;
    let preview: String = message.body.chars().take(TAG_PREVIEW_CHARS).collect();
    let Some(sender_handle) = directory.handle_of(sender).map(str::to_string) else {
        return 0;
    };

    let text = format!("{} tagged you in {}: {}", sender_handle, info.name, preview);
    let tagged: Vec<UserId> = info
        .members
        .iter()
        .filter(|m| mentioned.contains(&m.handle_str))
        .map(|m| m.u_id)
        .collect();

    for u_id in &tagged {
        directory.append_notification(*u_id, info.conversation.notification(text.clone()));
    }

    if !tagged.is_empty() {
        debug!(message_id, count = tagged.len(), "tag notifications emitted");
    }
    tagged.len()
}

/// "`inviter` added you to `name`".
pub fn notify_added<D: Directory>(
    directory: &mut D,
    inviter: UserId,
    invitee: UserId,
    conversation: ConversationRef,
    name: &str,
) {
    let Some(inviter_handle) = directory.handle_of(inviter).map(str::to_string) else {
        return;
    };
    let text = format!("{} added you to {}", inviter_handle, name);
    directory.append_notification(invitee, conversation.notification(text));
    debug!(inviter, invitee, ?conversation, "added notification emitted");
}

/// Tell the author of `message_id` that `reactor` reacted, if the author is
/// still a member of the conversation. Returns whether a notification was
/// appended.
pub fn notify_reacted<D: Directory>(
    directory: &mut D,
    reactor: UserId,
    message_id: MessageId,
) -> bool {
    let Some(info) = directory.conversation_for_message(message_id) else {
        return false;
    };
    let Some(author) = directory.find_message(message_id).map(|m| m.u_id) else {
        return false;
    };
    if !info.members.iter().any(|m| m.u_id == author) {
        return false;
    }
    let Some(reactor_handle) = directory.handle_of(reactor).map(str::to_string) else {
        return false;
    };

    let text = format!("{} reacted to your message in {}", reactor_handle, info.name);
    directory.append_notification(author, info.conversation.notification(text));
    debug!(reactor, author, message_id, "react notification emitted");
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use treats_types::models::Notification;

    use super::*;
    use crate::directory::{ConversationInfo, Member};
    use crate::mentions;
    use crate::workspace::{Message, React};

    /// Minimal in-memory directory with one conversation.
    struct FakeDirectory {
        conversation: ConversationRef,
        name: String,
        members: Vec<Member>,
        handles: HashMap<UserId, String>,
        messages: HashMap<MessageId, Message>,
        feeds: HashMap<UserId, Vec<Notification>>,
    }

    impl FakeDirectory {
        fn new(conversation: ConversationRef, name: &str) -> Self {
            Self {
                conversation,
                name: name.to_string(),
                members: Vec::new(),
                handles: HashMap::new(),
                messages: HashMap::new(),
                feeds: HashMap::new(),
            }
        }

        fn user(mut self, u_id: UserId, handle: &str, member: bool) -> Self {
            self.handles.insert(u_id, handle.to_string());
            if member {
                self.members.push(Member {
                    u_id,
                    handle_str: handle.to_string(),
                });
            }
            self
        }

        fn message(mut self, message_id: MessageId, author: UserId, body: &str) -> Self {
            self.messages.insert(
                message_id,
                Message {
                    message_id,
                    u_id: author,
                    conversation: self.conversation,
                    body: body.to_string(),
                    time_sent: 0,
                    time_sent_ms: 0,
                    seq: message_id.into(),
                    reacts: vec![React {
                        react_id: 1,
                        u_ids: vec![],
                    }],
                    is_pinned: false,
                },
            );
            self
        }

        fn feed(&self, u_id: UserId) -> Vec<Notification> {
            self.feeds.get(&u_id).cloned().unwrap_or_default()
        }
    }

    impl Directory for FakeDirectory {
        fn find_message(&self, message_id: MessageId) -> Option<&Message> {
            self.messages.get(&message_id)
        }

        fn conversation_for_message(&self, message_id: MessageId) -> Option<ConversationInfo> {
            self.messages.get(&message_id)?;
            Some(ConversationInfo {
                conversation: self.conversation,
                name: self.name.clone(),
                members: self.members.clone(),
            })
        }

        fn handle_of(&self, u_id: UserId) -> Option<&str> {
            self.handles.get(&u_id).map(String::as_str)
        }

        fn append_notification(&mut self, u_id: UserId, notification: Notification) {
            self.feeds.entry(u_id).or_default().push(notification);
        }
    }

    #[test]
    fn test_member_is_tagged() {
        let mut dir = FakeDirectory::new(ConversationRef::Channel(4), "general")
            .user(1, "sender", true)
            .user(2, "alice", true)
            .message(10, 1, "hi @alice bye");

        let count = resolve_and_notify(&mut dir, 10, &mentions::scan("hi @alice bye"));
        assert_eq!(count, 1);
        assert_eq!(
            dir.feed(2),
            vec![Notification::in_channel(4, "sender tagged you in general: hi @alice bye".into())]
        );
    }

    #[test]
    fn test_non_member_is_not_tagged() {
        let mut dir = FakeDirectory::new(ConversationRef::Channel(4), "general")
            .user(1, "sender", true)
            .user(2, "alice", false)
            .message(10, 1, "hi @alice bye");

        let count = resolve_and_notify(&mut dir, 10, &mentions::scan("hi @alice bye"));
        assert_eq!(count, 0);
        assert!(dir.feed(2).is_empty());
    }

    #[test]
    fn test_preview_is_truncated_after_assembly() {
        let body = "hi@johnsmith0@johnsmith hello!";
        let mut dir = FakeDirectory::new(ConversationRef::Dm(3), "johnsmith, johnsmith0")
            .user(1, "johnsmith", true)
            .user(2, "johnsmith0", true)
            .message(10, 1, body);

        let count = resolve_and_notify(&mut dir, 10, &mentions::scan(body));
        assert_eq!(count, 2);
        let expected = "johnsmith tagged you in johnsmith, johnsmith0: hi@johnsmith0@johnsm";
        assert_eq!(dir.feed(1)[0].notification_message, expected);
        assert_eq!(dir.feed(2)[0].notification_message, expected);
        assert_eq!(dir.feed(2)[0].dm_id, 3);
        assert_eq!(dir.feed(2)[0].channel_id, -1);
    }

    #[test]
    fn test_added_notification() {
        let mut dir = FakeDirectory::new(ConversationRef::Channel(9), "First channel")
            .user(1, "johnsmith", true)
            .user(2, "johnsmith0", false);

        notify_added(&mut dir, 1, 2, ConversationRef::Channel(9), "First channel");
        assert_eq!(
            dir.feed(2),
            vec![Notification::in_channel(9, "johnsmith added you to First channel".into())]
        );
    }

    #[test]
    fn test_react_notifies_member_author() {
        let mut dir = FakeDirectory::new(ConversationRef::Channel(4), "First")
            .user(1, "johnsmith", true)
            .user(2, "johnsmith0", true)
            .message(10, 2, "hello world");

        assert!(notify_reacted(&mut dir, 1, 10));
        assert_eq!(
            dir.feed(2)[0].notification_message,
            "johnsmith reacted to your message in First"
        );
    }

    #[test]
    fn test_react_skips_author_who_left() {
        let mut dir = FakeDirectory::new(ConversationRef::Channel(4), "First")
            .user(1, "johnsmith", true)
            .user(2, "johnsmith0", false)
            .message(10, 2, "hello world");

        assert!(!notify_reacted(&mut dir, 1, 10));
        assert!(dir.feed(2).is_empty());
    }

    #[test]
    fn test_preview_counts_chars() {
        let body = "🎉🎉 @alice ship it today please";
        let mut dir = FakeDirectory::new(ConversationRef::Channel(4), "general")
            .user(1, "sender", true)
            .user(2, "alice", true)
            .message(10, 1, body);

        resolve_and_notify(&mut dir, 10, &mentions::scan(body));
        let expected = format!("sender tagged you in general: {}", "🎉🎉 @alice ship it to");
        assert_eq!(dir.feed(2)[0].notification_message, expected);
    }
}
