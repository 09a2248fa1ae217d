//! The workspace as seen by mention resolution and notification delivery.

use treats_types::models::{MessageId, Notification, UserId};

use crate::workspace::{ConversationRef, Message, Workspace};

/// A member as seen by mention resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub u_id: UserId,
    pub handle_str: String,
}

/// The conversation hosting a message, with its current membership.
#[derive(Debug, Clone)]
pub struct ConversationInfo {
    pub conversation: ConversationRef,
    pub name: String,
    pub members: Vec<Member>,
}

/// Read/append view of the workspace used by the notification code.
pub trait Directory {
    fn find_message(&self, message_id: MessageId) -> Option<&Message>;

    fn conversation_for_message(&self, message_id: MessageId) -> Option<ConversationInfo>;

    fn handle_of(&self, u_id: UserId) -> Option<&str>;

    fn append_notification(&mut self, u_id: UserId, notification: Notification);
}

impl Directory for Workspace {
    fn find_message(&self, message_id: MessageId) -> Option<&Message> {
        self.messages.get(&message_id)
    }

    fn conversation_for_message(&self, message_id: MessageId) -> Option<ConversationInfo> {
        let conversation = self.messages.get(&message_id)?.conversation;
        let name = self.conversation_name(conversation)?.to_string();
        let members = self
            .members(conversation)
            .iter()
            .filter_map(|id| self.users.get(id))
            .map(|u| Member {
                u_id: u.u_id,
                handle_str: u.handle_str.clone(),
            })
            .collect();

        Some(ConversationInfo {
            conversation,
            name,
            members,
        })
    }

    fn handle_of(&self, u_id: UserId) -> Option<&str> {
        self.users.get(&u_id).map(|u| u.handle_str.as_str())
    }

    fn append_notification(&mut self, u_id: UserId, notification: Notification) {
        if let Some(user) = self.users.get_mut(&u_id) {
            user.notifications.push(notification);
        }
    }
}
