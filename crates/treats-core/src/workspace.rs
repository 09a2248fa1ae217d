use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use treats_types::models::{
    ChannelId, DmId, MessageId, Notification, UserId, UserProfile, UserStats, WorkspaceStats,
};

use crate::error::{Result, TreatsError};

/// The only react id the workspace understands.
pub const REACT_THUMBS_UP: u32 = 1;

pub const MAX_MESSAGE_LEN: usize = 1000;

/// Which conversation a message lives in. A message always has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationRef {
    Channel(ChannelId),
    Dm(DmId),
}

impl ConversationRef {
    /// Build a notification addressed from this conversation.
    pub fn notification(self, text: String) -> Notification {
        match self {
            Self::Channel(id) => Notification::in_channel(id, text),
            Self::Dm(id) => Notification::in_dm(id, text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    GlobalOwner,
    Member,
}

impl Permission {
    pub fn id(self) -> u8 {
        match self {
            Self::GlobalOwner => 1,
            Self::Member => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::GlobalOwner),
            2 => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub u_id: UserId,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
    pub password_hash: String,
    pub permission: Permission,
    pub sessions: Vec<Uuid>,
    pub reset_codes: Vec<String>,
    pub removed: bool,
    /// Oldest first.
    pub notifications: Vec<Notification>,
    pub stats: UserStats,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            u_id: self.u_id,
            email: self.email.clone(),
            name_first: self.name_first.clone(),
            name_last: self.name_last.clone(),
            handle_str: self.handle_str.clone(),
        }
    }

    pub fn is_global_owner(&self) -> bool {
        self.permission == Permission::GlobalOwner
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct React {
    pub react_id: u32,
    pub u_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub u_id: UserId,
    pub conversation: ConversationRef,
    pub body: String,
    pub time_sent: i64,
    pub time_sent_ms: i64,
    /// Insertion order across the whole workspace; breaks `time_sent_ms` ties.
    pub seq: u64,
    pub reacts: Vec<React>,
    pub is_pinned: bool,
}

impl Message {
    /// Recency key: larger is newer.
    pub fn recency(&self) -> (i64, u64) {
        (self.time_sent_ms, self.seq)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standup {
    pub starter: UserId,
    pub time_finish: i64,
    pub buffer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: ChannelId,
    pub name: String,
    pub is_public: bool,
    pub owner_members: Vec<UserId>,
    pub all_members: Vec<UserId>,
    /// Send order. Records live in the workspace message index.
    pub message_ids: Vec<MessageId>,
    pub standup: Option<Standup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dm {
    pub dm_id: DmId,
    pub name: String,
    pub creator: UserId,
    pub members: Vec<UserId>,
    pub message_ids: Vec<MessageId>,
}

/// All workspace state. Messages are stored once, in `messages`; channels and
/// DMs hold id references only.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) channels: BTreeMap<ChannelId, Channel>,
    pub(crate) dms: BTreeMap<DmId, Dm>,
    pub(crate) messages: BTreeMap<MessageId, Message>,
    pub(crate) stats: WorkspaceStats,
    next_user_id: UserId,
    next_channel_id: ChannelId,
    next_dm_id: DmId,
    next_message_id: MessageId,
    next_seq: u64,
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, including id counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // -- Id allocation --

    pub(crate) fn alloc_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub(crate) fn alloc_channel_id(&mut self) -> ChannelId {
        self.next_channel_id += 1;
        self.next_channel_id
    }

    pub(crate) fn alloc_dm_id(&mut self) -> DmId {
        self.next_dm_id += 1;
        self.next_dm_id
    }

    /// Message ids are also handed out ahead of time for scheduled sends.
    pub fn reserve_message_id(&mut self) -> MessageId {
        self.next_message_id += 1;
        self.next_message_id
    }

    // -- Lookups --

    /// Any registered user, removed or not.
    pub fn user(&self, u_id: UserId) -> Result<&User> {
        self.users
            .get(&u_id)
            .ok_or_else(|| TreatsError::input(format!("uId {} does not refer to a valid user", u_id)))
    }

    /// A registered user that has not been removed by an admin.
    pub fn active_user(&self, u_id: UserId) -> Result<&User> {
        self.user(u_id).and_then(|u| {
            if u.removed {
                Err(TreatsError::input(format!("uId {} has been removed", u_id)))
            } else {
                Ok(u)
            }
        })
    }

    pub(crate) fn user_mut(&mut self, u_id: UserId) -> Result<&mut User> {
        self.users
            .get_mut(&u_id)
            .ok_or_else(|| TreatsError::input(format!("uId {} does not refer to a valid user", u_id)))
    }

    pub fn channel(&self, channel_id: ChannelId) -> Result<&Channel> {
        self.channels
            .get(&channel_id)
            .ok_or_else(|| TreatsError::input(format!("channelId {} does not exist", channel_id)))
    }

    pub(crate) fn channel_mut(&mut self, channel_id: ChannelId) -> Result<&mut Channel> {
        self.channels
            .get_mut(&channel_id)
            .ok_or_else(|| TreatsError::input(format!("channelId {} does not exist", channel_id)))
    }

    pub fn dm(&self, dm_id: DmId) -> Result<&Dm> {
        self.dms
            .get(&dm_id)
            .ok_or_else(|| TreatsError::input(format!("dmId {} does not exist", dm_id)))
    }

    pub(crate) fn dm_mut(&mut self, dm_id: DmId) -> Result<&mut Dm> {
        self.dms
            .get_mut(&dm_id)
            .ok_or_else(|| TreatsError::input(format!("dmId {} does not exist", dm_id)))
    }

    pub fn message(&self, message_id: MessageId) -> Result<&Message> {
        self.messages
            .get(&message_id)
            .ok_or_else(|| TreatsError::input(format!("messageId {} does not exist", message_id)))
    }

    pub(crate) fn message_mut(&mut self, message_id: MessageId) -> Result<&mut Message> {
        self.messages
            .get_mut(&message_id)
            .ok_or_else(|| TreatsError::input(format!("messageId {} does not exist", message_id)))
    }

    pub(crate) fn profiles(&self, ids: &[UserId]) -> Vec<UserProfile> {
        ids.iter()
            .filter_map(|id| self.users.get(id))
            .map(User::profile)
            .collect()
    }

    /// Member ids of a conversation, empty when it no longer exists.
    pub fn members(&self, conversation: ConversationRef) -> &[UserId] {
        match conversation {
            ConversationRef::Channel(id) => self
                .channels
                .get(&id)
                .map(|c| c.all_members.as_slice())
                .unwrap_or_default(),
            ConversationRef::Dm(id) => self
                .dms
                .get(&id)
                .map(|d| d.members.as_slice())
                .unwrap_or_default(),
        }
    }

    pub fn is_member(&self, conversation: ConversationRef, u_id: UserId) -> bool {
        self.members(conversation).contains(&u_id)
    }

    pub fn conversation_name(&self, conversation: ConversationRef) -> Option<&str> {
        match conversation {
            ConversationRef::Channel(id) => self.channels.get(&id).map(|c| c.name.as_str()),
            ConversationRef::Dm(id) => self.dms.get(&id).map(|d| d.name.as_str()),
        }
    }

    /// Channel owner, DM creator, or a global owner who is a member.
    pub(crate) fn has_owner_rights(&self, conversation: ConversationRef, u_id: UserId) -> bool {
        let is_member = self.is_member(conversation, u_id);
        let global_owner = self
            .users
            .get(&u_id)
            .map(User::is_global_owner)
            .unwrap_or(false);
        let local_owner = match conversation {
            ConversationRef::Channel(id) => self
                .channels
                .get(&id)
                .map(|c| c.owner_members.contains(&u_id))
                .unwrap_or(false),
            ConversationRef::Dm(id) => self.dms.get(&id).map(|d| d.creator == u_id).unwrap_or(false),
        };
        local_owner || (is_member && global_owner)
    }

    fn conversation_messages_mut(&mut self, conversation: ConversationRef) -> Option<&mut Vec<MessageId>> {
        match conversation {
            ConversationRef::Channel(id) => self.channels.get_mut(&id).map(|c| &mut c.message_ids),
            ConversationRef::Dm(id) => self.dms.get_mut(&id).map(|d| &mut d.message_ids),
        }
    }

    /// Messages of one conversation, in send order.
    pub fn conversation_messages(&self, conversation: ConversationRef) -> Vec<&Message> {
        let ids = match conversation {
            ConversationRef::Channel(id) => self.channels.get(&id).map(|c| &c.message_ids),
            ConversationRef::Dm(id) => self.dms.get(&id).map(|d| &d.message_ids),
        };
        ids.map(|ids| ids.iter().filter_map(|id| self.messages.get(id)).collect())
            .unwrap_or_default()
    }

    // -- Message index --

    /// Create a message with a pre-reserved id and file it in both the index
    /// and its conversation.
    pub(crate) fn insert_message(
        &mut self,
        message_id: MessageId,
        u_id: UserId,
        conversation: ConversationRef,
        body: String,
    ) -> Result<MessageId> {
        let sent = now();
        self.next_seq += 1;
        let message = Message {
            message_id,
            u_id,
            conversation,
            body,
            time_sent: sent.timestamp(),
            time_sent_ms: sent.timestamp_millis(),
            seq: self.next_seq,
            reacts: vec![React {
                react_id: REACT_THUMBS_UP,
                u_ids: Vec::new(),
            }],
            is_pinned: false,
        };

        let list = self
            .conversation_messages_mut(conversation)
            .ok_or_else(|| TreatsError::input("conversation does not exist"))?;
        list.push(message_id);
        self.messages.insert(message_id, message);
        Ok(message_id)
    }

    /// Drop a message from the index and from its conversation.
    pub(crate) fn remove_message(&mut self, message_id: MessageId) -> Option<Message> {
        let message = self.messages.remove(&message_id)?;
        if let Some(list) = self.conversation_messages_mut(message.conversation) {
            list.retain(|id| *id != message_id);
        }
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_restores_counters() {
        let mut ws = Workspace::new();
        let (u, _) = ws.register("a@example.com", "h".into(), "Ann", "Lee").unwrap();
        let c = ws.channels_create(u, "general", true).unwrap();
        let m = ws.message_send(u, c, "before restart").unwrap();

        let json = serde_json::to_string(&ws).unwrap();
        let mut restored: Workspace = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.message(m).unwrap().body, "before restart");
        let next = restored.message_send(u, c, "after restart").unwrap();
        assert!(next > m);
        let page = restored.channel_messages(u, c, 0).unwrap();
        assert_eq!(page.messages[0].message_id, next);
    }

    #[test]
    fn test_owner_rights() {
        let mut ws = Workspace::new();
        let (global, _) = ws.register("g@example.com", "h".into(), "Gil", "Owner").unwrap();
        let (creator, _) = ws.register("c@example.com", "h".into(), "Cat", "Maker").unwrap();
        let c = ws.channels_create(creator, "room", true).unwrap();
        let conv = ConversationRef::Channel(c);

        assert!(ws.has_owner_rights(conv, creator));
        // a global owner needs to be a member first
        assert!(!ws.has_owner_rights(conv, global));
        ws.channel_join(global, c).unwrap();
        assert!(ws.has_owner_rights(conv, global));
    }
}
