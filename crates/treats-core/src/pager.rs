//! Fixed-size, newest-first message pages.

use treats_types::api::MessagesPage;
use treats_types::models::{MessageView, ReactView, UserId};

use crate::error::{Result, TreatsError};
use crate::workspace::Message;

pub const PAGE_SIZE: usize = 50;

/// Render a message for `viewer`, deriving `isThisUserReacted`.
pub fn view(message: &Message, viewer: UserId) -> MessageView {
    MessageView {
        message_id: message.message_id,
        u_id: message.u_id,
        message: message.body.clone(),
        time_sent: message.time_sent,
        reacts: message
            .reacts
            .iter()
            .map(|r| ReactView {
                react_id: r.react_id,
                u_ids: r.u_ids.clone(),
                is_this_user_reacted: r.u_ids.contains(&viewer),
            })
            .collect(),
        is_pinned: message.is_pinned,
    }
}

/// Page `[start, start + PAGE_SIZE)` of `messages` ordered newest first.
///
/// The ordering is recomputed on every call. `end` is `-1` when the page is
/// empty or its last entry is the oldest message of the conversation.
pub fn page(mut messages: Vec<&Message>, start: usize, viewer: UserId) -> Result<MessagesPage> {
    if start > messages.len() {
        return Err(TreatsError::input(format!(
            "start {} is greater than the total number of messages ({})",
            start,
            messages.len()
        )));
    }

    messages.sort_by(|a, b| b.recency().cmp(&a.recency()));
    let oldest = messages.last().map(|m| m.message_id);

    let window: Vec<&Message> = messages.iter().skip(start).take(PAGE_SIZE).copied().collect();
    let end = match window.last() {
        Some(last) if Some(last.message_id) != oldest => (start + PAGE_SIZE) as i64,
        _ => -1,
    };

    Ok(MessagesPage {
        messages: window.into_iter().map(|m| view(m, viewer)).collect(),
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{ConversationRef, React};

    fn make(count: u32) -> Vec<Message> {
        (1..=count)
            .map(|i| Message {
                message_id: i,
                u_id: 1,
                conversation: ConversationRef::Channel(1),
                body: format!("message {}", i),
                time_sent: 1_700_000_000 + i64::from(i),
                time_sent_ms: 1_700_000_000_000 + i64::from(i) * 1000,
                seq: u64::from(i),
                reacts: vec![React {
                    react_id: 1,
                    u_ids: vec![],
                }],
                is_pinned: false,
            })
            .collect()
    }

    #[test]
    fn test_empty_conversation() {
        let page = page(Vec::new(), 0, 1).unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.start, 0);
        assert_eq!(page.end, -1);
    }

    #[test]
    fn test_start_beyond_total_is_rejected() {
        let msgs = make(3);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert!(matches!(page(refs, 4, 1), Err(TreatsError::Input(_))));
    }

    #[test]
    fn test_start_equal_to_total_is_empty() {
        let msgs = make(3);
        let refs: Vec<&Message> = msgs.iter().collect();
        let page = page(refs, 3, 1).unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.end, -1);
    }

    #[test]
    fn test_hundred_and_one_messages() {
        let msgs = make(101);

        let first = page(msgs.iter().collect(), 0, 1).unwrap();
        assert_eq!(first.messages.len(), 50);
        assert_eq!(first.end, 50);
        assert_eq!(first.messages[0].message_id, 101);

        let second = page(msgs.iter().collect(), 50, 1).unwrap();
        assert_eq!(second.messages.len(), 50);
        assert_eq!(second.end, 100);

        let third = page(msgs.iter().collect(), 100, 1).unwrap();
        assert_eq!(third.messages.len(), 1);
        assert_eq!(third.end, -1);
        assert_eq!(third.messages[0].message_id, 1);
    }

    #[test]
    fn test_exactly_one_page() {
        let msgs = make(50);
        let page = page(msgs.iter().collect(), 0, 1).unwrap();
        assert_eq!(page.messages.len(), 50);
        assert_eq!(page.end, -1);
    }

    #[test]
    fn test_millisecond_ties_fall_back_to_insertion_order() {
        let mut msgs = make(3);
        for m in &mut msgs {
            m.time_sent_ms = 42;
        }
        let page = page(msgs.iter().collect(), 0, 1).unwrap();
        let ids: Vec<u32> = page.messages.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_reacted_flag_is_per_viewer() {
        let mut msgs = make(1);
        msgs[0].reacts[0].u_ids.push(7);

        let seen_by_reactor = page(msgs.iter().collect(), 0, 7).unwrap();
        assert!(seen_by_reactor.messages[0].reacts[0].is_this_user_reacted);

        let seen_by_other = page(msgs.iter().collect(), 0, 8).unwrap();
        assert!(!seen_by_other.messages[0].reacts[0].is_this_user_reacted);
    }
}
