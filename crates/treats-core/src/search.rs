use treats_types::models::{MessageView, UserId};

use crate::error::{Result, TreatsError};
use crate::pager;
use crate::workspace::{MAX_MESSAGE_LEN, Message, Workspace};

impl Workspace {
    /// Messages in the user's channels and DMs whose body contains the
    /// lower-cased query, in send order.
    pub fn search(&self, u_id: UserId, query_str: &str) -> Result<Vec<MessageView>> {
        if !(1..=MAX_MESSAGE_LEN).contains(&query_str.chars().count()) {
            return Err(TreatsError::input(format!(
                "query must be between 1 and {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        let needle = query_str.to_lowercase();

        let mut hits: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| self.is_member(m.conversation, u_id))
            .filter(|m| m.body.contains(&needle))
            .collect();
        hits.sort_by_key(|m| m.seq);

        Ok(hits.into_iter().map(|m| pager::view(m, u_id)).collect())
    }
}
