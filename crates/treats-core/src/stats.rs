use treats_types::models::{
    ChannelsExist, ChannelsJoined, DmsExist, DmsJoined, MessagesExist, MessagesSent, UserId,
    UserStats, WorkspaceStats,
};

use crate::error::Result;
use crate::workspace::{Workspace, now};

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Stats for a freshly registered user: one zero sample per series.
pub(crate) fn initial_user_stats() -> UserStats {
    let time_stamp = now().timestamp();
    UserStats {
        channels_joined: vec![ChannelsJoined {
            num_channels_joined: 0,
            time_stamp,
        }],
        dms_joined: vec![DmsJoined {
            num_dms_joined: 0,
            time_stamp,
        }],
        messages_sent: vec![MessagesSent {
            num_messages_sent: 0,
            time_stamp,
        }],
        involvement_rate: 0.0,
    }
}

impl Workspace {
    pub(crate) fn init_workspace_stats(&mut self) {
        if !self.stats.channels_exist.is_empty() {
            return;
        }
        let time_stamp = now().timestamp();
        self.stats = WorkspaceStats {
            channels_exist: vec![ChannelsExist {
                num_channels_exist: 0,
                time_stamp,
            }],
            dms_exist: vec![DmsExist {
                num_dms_exist: 0,
                time_stamp,
            }],
            messages_exist: vec![MessagesExist {
                num_messages_exist: 0,
                time_stamp,
            }],
            utilization_rate: 0.0,
        };
    }

    pub(crate) fn record_channels_joined(&mut self, u_id: UserId) {
        let count = self
            .channels
            .values()
            .filter(|c| c.all_members.contains(&u_id))
            .count();
        if let Some(user) = self.users.get_mut(&u_id) {
            user.stats.channels_joined.push(ChannelsJoined {
                num_channels_joined: count,
                time_stamp: now().timestamp(),
            });
        }
    }

    pub(crate) fn record_dms_joined(&mut self, u_id: UserId) {
        let count = self
            .dms
            .values()
            .filter(|d| d.members.contains(&u_id))
            .count();
        if let Some(user) = self.users.get_mut(&u_id) {
            user.stats.dms_joined.push(DmsJoined {
                num_dms_joined: count,
                time_stamp: now().timestamp(),
            });
        }
    }

    pub(crate) fn record_message_sent(&mut self, u_id: UserId) {
        if let Some(user) = self.users.get_mut(&u_id) {
            let sent = user
                .stats
                .messages_sent
                .last()
                .map(|s| s.num_messages_sent)
                .unwrap_or(0);
            user.stats.messages_sent.push(MessagesSent {
                num_messages_sent: sent + 1,
                time_stamp: now().timestamp(),
            });
        }
        self.record_messages_exist();
    }

    pub(crate) fn record_channels_exist(&mut self) {
        self.stats.channels_exist.push(ChannelsExist {
            num_channels_exist: self.channels.len(),
            time_stamp: now().timestamp(),
        });
    }

    pub(crate) fn record_dms_exist(&mut self) {
        self.stats.dms_exist.push(DmsExist {
            num_dms_exist: self.dms.len(),
            time_stamp: now().timestamp(),
        });
    }

    pub(crate) fn record_messages_exist(&mut self) {
        self.stats.messages_exist.push(MessagesExist {
            num_messages_exist: self.messages.len(),
            time_stamp: now().timestamp(),
        });
    }

    /// The user's series plus an involvement rate clamped to `[0, 1]`.
    pub fn user_stats(&self, u_id: UserId) -> Result<UserStats> {
        let user = self.active_user(u_id)?;
        let mut stats = user.stats.clone();

        let joined_channels = stats.channels_joined.last().map_or(0, |s| s.num_channels_joined);
        let joined_dms = stats.dms_joined.last().map_or(0, |s| s.num_dms_joined);
        let sent = stats.messages_sent.last().map_or(0, |s| s.num_messages_sent);

        let numerator = (joined_channels + joined_dms + sent) as f64;
        let denominator = (self.channels.len() + self.dms.len() + self.messages.len()) as f64;

        stats.involvement_rate = if denominator == 0.0 {
            0.0
        } else {
            round2(numerator / denominator).min(1.0)
        };
        Ok(stats)
    }

    /// Workspace series plus the share of active users in at least one
    /// channel or DM.
    pub fn workspace_stats(&self) -> WorkspaceStats {
        let active: Vec<UserId> = self
            .users
            .values()
            .filter(|u| !u.removed)
            .map(|u| u.u_id)
            .collect();
        let involved = active
            .iter()
            .filter(|id| {
                self.channels.values().any(|c| c.all_members.contains(id))
                    || self.dms.values().any(|d| d.members.contains(id))
            })
            .count();

        let mut stats = self.stats.clone();
        stats.utilization_rate = if active.is_empty() {
            0.0
        } else {
            round2(involved as f64 / active.len() as f64)
        };
        stats
    }
}
