use std::collections::HashSet;

use tracing::info;

use treats_types::api::{DmDetailsResponse, MessagesPage};
use treats_types::models::{DmId, DmSummary, UserId};

use crate::error::{Result, TreatsError};
use crate::notify;
use crate::pager;
use crate::workspace::{ConversationRef, Dm, Workspace};

impl Workspace {
    fn require_dm_member(&self, dm_id: DmId, u_id: UserId) -> Result<&Dm> {
        let dm = self.dm(dm_id)?;
        if !dm.members.contains(&u_id) {
            return Err(TreatsError::auth(format!(
                "user {} is not a member of dm {}",
                u_id, dm_id
            )));
        }
        Ok(dm)
    }

    /// Create a DM between `creator` and `u_ids`. The name is the members'
    /// handles sorted and joined with ", ". Every invitee is notified.
    pub fn dm_create(&mut self, creator: UserId, u_ids: &[UserId]) -> Result<DmId> {
        for id in u_ids {
            self.active_user(*id)?;
        }
        if u_ids.contains(&creator) {
            return Err(TreatsError::input("creator must not be listed in uIds"));
        }
        if u_ids.iter().collect::<HashSet<_>>().len() != u_ids.len() {
            return Err(TreatsError::input("uIds contains duplicates"));
        }

        let mut members: Vec<UserId> = Vec::with_capacity(u_ids.len() + 1);
        members.push(creator);
        members.extend_from_slice(u_ids);

        let mut handles: Vec<String> = members
            .iter()
            .map(|id| self.user(*id).map(|u| u.handle_str.clone()))
            .collect::<Result<_>>()?;
        handles.sort();
        let name = handles.join(", ");

        let dm_id = self.alloc_dm_id();
        self.dms.insert(
            dm_id,
            Dm {
                dm_id,
                name: name.clone(),
                creator,
                members: members.clone(),
                message_ids: Vec::new(),
            },
        );

        for invitee in u_ids {
            notify::notify_added(self, creator, *invitee, ConversationRef::Dm(dm_id), &name);
        }
        for member in &members {
            self.record_dms_joined(*member);
        }
        self.record_dms_exist();

        info!(dm_id, creator, name = %name, "dm created");
        Ok(dm_id)
    }

    pub fn dm_list(&self, u_id: UserId) -> Vec<DmSummary> {
        self.dms
            .values()
            .filter(|d| d.members.contains(&u_id))
            .map(|d| DmSummary {
                dm_id: d.dm_id,
                name: d.name.clone(),
            })
            .collect()
    }

    pub fn dm_details(&self, u_id: UserId, dm_id: DmId) -> Result<DmDetailsResponse> {
        let dm = self.require_dm_member(dm_id, u_id)?;
        Ok(DmDetailsResponse {
            name: dm.name.clone(),
            members: self.profiles(&dm.members),
        })
    }

    /// Delete a DM and all its messages. Only its creator, while still a
    /// member, may do this.
    pub fn dm_remove(&mut self, u_id: UserId, dm_id: DmId) -> Result<()> {
        let dm = self.dm(dm_id)?;
        if dm.creator != u_id {
            return Err(TreatsError::auth("only the dm creator can remove it"));
        }
        self.require_dm_member(dm_id, u_id)?;

        let Some(dm) = self.dms.remove(&dm_id) else {
            return Ok(());
        };
        for message_id in &dm.message_ids {
            self.messages.remove(message_id);
        }
        for member in &dm.members {
            self.record_dms_joined(*member);
        }
        self.record_dms_exist();
        if !dm.message_ids.is_empty() {
            self.record_messages_exist();
        }

        info!(dm_id, u_id, "dm removed");
        Ok(())
    }

    pub fn dm_leave(&mut self, u_id: UserId, dm_id: DmId) -> Result<()> {
        self.require_dm_member(dm_id, u_id)?;
        self.dm_mut(dm_id)?.members.retain(|id| *id != u_id);
        self.record_dms_joined(u_id);
        Ok(())
    }

    pub fn dm_messages(&self, u_id: UserId, dm_id: DmId, start: usize) -> Result<MessagesPage> {
        let dm = self.dm(dm_id)?;
        if start > dm.message_ids.len() {
            return Err(TreatsError::input("start is greater than the total number of messages"));
        }
        self.require_dm_member(dm_id, u_id)?;

        pager::page(self.conversation_messages(ConversationRef::Dm(dm_id)), start, u_id)
    }
}
