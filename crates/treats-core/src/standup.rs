//! Timed standups. While one is active, lines sent to it are buffered; when
//! it finishes the buffer is posted to the channel as a single message from
//! the user who started it.

use tracing::{info, warn};

use treats_types::api::StandupActiveResponse;
use treats_types::models::{ChannelId, MessageId, UserId};

use crate::error::{Result, TreatsError};
use crate::workspace::{ConversationRef, MAX_MESSAGE_LEN, Standup, Workspace, now};

impl Workspace {
    fn require_standup_member(&self, channel_id: ChannelId, u_id: UserId) -> Result<()> {
        let channel = self.channel(channel_id)?;
        if !channel.all_members.contains(&u_id) {
            return Err(TreatsError::auth(format!(
                "user {} is not a member of channel {}",
                u_id, channel_id
            )));
        }
        Ok(())
    }

    /// Start a standup lasting `length` seconds and return its finish time.
    /// The caller is responsible for calling [`Workspace::standup_finish`]
    /// once that time is reached.
    pub fn standup_start(&mut self, u_id: UserId, channel_id: ChannelId, length: i64) -> Result<i64> {
        self.channel(channel_id)?;
        if length < 0 {
            return Err(TreatsError::input("standup length cannot be negative"));
        }
        self.require_standup_member(channel_id, u_id)?;

        let channel = self.channel_mut(channel_id)?;
        if channel.standup.is_some() {
            return Err(TreatsError::input("a standup is already active in this channel"));
        }
        let time_finish = now()
            .timestamp()
            .checked_add(length)
            .filter(|t| t.checked_mul(1000).is_some())
            .ok_or_else(|| TreatsError::input("standup length is out of range"))?;
        channel.standup = Some(Standup {
            starter: u_id,
            time_finish,
            buffer: String::new(),
        });

        info!(channel_id, u_id, time_finish, "standup started");
        Ok(time_finish)
    }

    pub fn standup_active(&self, u_id: UserId, channel_id: ChannelId) -> Result<StandupActiveResponse> {
        self.require_standup_member(channel_id, u_id)?;
        let standup = self.channel(channel_id)?.standup.as_ref();
        Ok(StandupActiveResponse {
            is_active: standup.is_some(),
            time_finish: standup.map(|s| s.time_finish),
        })
    }

    /// Buffer `"<handle>: <message>"` as a new line of the active standup.
    pub fn standup_send(&mut self, u_id: UserId, channel_id: ChannelId, message: &str) -> Result<()> {
        self.channel(channel_id)?;
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(TreatsError::input(format!(
                "standup message must be at most {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        self.require_standup_member(channel_id, u_id)?;
        let handle = self.active_user(u_id)?.handle_str.clone();

        let standup = self
            .channel_mut(channel_id)?
            .standup
            .as_mut()
            .ok_or_else(|| TreatsError::input("no standup is active in this channel"))?;
        if !standup.buffer.is_empty() {
            standup.buffer.push('\n');
        }
        standup.buffer.push_str(&handle);
        standup.buffer.push_str(": ");
        standup.buffer.push_str(message);
        Ok(())
    }

    /// `(channel, time_finish)` for every running standup.
    pub fn active_standups(&self) -> Vec<(ChannelId, i64)> {
        self.channels
            .values()
            .filter_map(|c| c.standup.as_ref().map(|s| (c.channel_id, s.time_finish)))
            .collect()
    }

    /// End the active standup and post its buffer, if any, as the starter.
    /// Returns the id of the posted message.
    pub fn standup_finish(&mut self, channel_id: ChannelId) -> Result<Option<MessageId>> {
        let Some(standup) = self.channel_mut(channel_id)?.standup.take() else {
            return Ok(None);
        };
        info!(channel_id, starter = standup.starter, "standup finished");

        if standup.buffer.is_empty() {
            return Ok(None);
        }
        let conversation = ConversationRef::Channel(channel_id);
        if !self.is_member(conversation, standup.starter) {
            warn!(channel_id, starter = standup.starter, "standup starter left, summary dropped");
            return Ok(None);
        }

        let message_id = self.reserve_message_id();
        self.deliver(message_id, standup.starter, conversation, standup.buffer)
            .map(Some)
    }
}
