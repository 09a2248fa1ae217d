use serde::{Deserialize, Serialize};

pub type UserId = u32;
pub type ChannelId = u32;
pub type DmId = u32;
pub type MessageId = u32;

/// Wire value used for the absent side of a channel/DM pair.
pub const NO_CONVERSATION: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub u_id: UserId,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmSummary {
    pub dm_id: DmId,
    pub name: String,
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactView {
    pub react_id: u32,
    pub u_ids: Vec<UserId>,
    /// Derived per viewer at read time, never stored.
    pub is_this_user_reacted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub message_id: MessageId,
    pub u_id: UserId,
    pub message: String,
    pub time_sent: i64,
    pub reacts: Vec<ReactView>,
    pub is_pinned: bool,
}

// -- Notifications --

/// A directed, pre-rendered notification. Exactly one of `channel_id` and
/// `dm_id` is not `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub channel_id: i64,
    pub dm_id: i64,
    pub notification_message: String,
}

impl Notification {
    pub fn in_channel(channel_id: ChannelId, notification_message: String) -> Self {
        Self {
            channel_id: channel_id.into(),
            dm_id: NO_CONVERSATION,
            notification_message,
        }
    }

    pub fn in_dm(dm_id: DmId, notification_message: String) -> Self {
        Self {
            channel_id: NO_CONVERSATION,
            dm_id: dm_id.into(),
            notification_message,
        }
    }
}

// -- Stats --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsJoined {
    pub num_channels_joined: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmsJoined {
    pub num_dms_joined: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSent {
    pub num_messages_sent: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsExist {
    pub num_channels_exist: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmsExist {
    pub num_dms_exist: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesExist {
    pub num_messages_exist: usize,
    pub time_stamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub channels_joined: Vec<ChannelsJoined>,
    pub dms_joined: Vec<DmsJoined>,
    pub messages_sent: Vec<MessagesSent>,
    pub involvement_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStats {
    pub channels_exist: Vec<ChannelsExist>,
    pub dms_exist: Vec<DmsExist>,
    pub messages_exist: Vec<MessagesExist>,
    pub utilization_rate: f64,
}
