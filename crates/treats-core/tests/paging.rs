use treats_core::{TreatsError, Workspace};

#[test]
fn test_paging_a_busy_channel() {
    let mut ws = Workspace::new();
    let (u, _) = ws.register("pager@example.com", "hash".into(), "Page", "Turner").unwrap();
    let c = ws.channels_create(u, "busy", true).unwrap();

    let ids: Vec<u32> = (0..120)
        .map(|i| ws.message_send(u, c, &format!("message {}", i)).unwrap())
        .collect();

    let first = ws.channel_messages(u, c, 0).unwrap();
    assert_eq!(first.messages.len(), 50);
    assert_eq!(first.end, 50);
    assert_eq!(first.messages[0].message_id, ids[119]);
    assert_eq!(first.messages[0].message, "message 119");

    let second = ws.channel_messages(u, c, 50).unwrap();
    assert_eq!(second.end, 100);
    assert_eq!(second.messages[0].message_id, ids[69]);

    let last = ws.channel_messages(u, c, 100).unwrap();
    assert_eq!(last.messages.len(), 20);
    assert_eq!(last.end, -1);
    assert_eq!(last.messages[19].message_id, ids[0]);

    assert!(ws.channel_messages(u, c, 120).unwrap().messages.is_empty());
    assert!(matches!(ws.channel_messages(u, c, 121), Err(TreatsError::Input(_))));
}

#[test]
fn test_paging_requires_membership() {
    let mut ws = Workspace::new();
    let (a, _) = ws.register("a@example.com", "hash".into(), "Ann", "Lee").unwrap();
    let (b, _) = ws.register("b@example.com", "hash".into(), "Ben", "Lee").unwrap();
    let dm = ws.dm_create(a, &[b]).unwrap();
    ws.message_send_dm(a, dm, "hi").unwrap();

    let page = ws.dm_messages(b, dm, 0).unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.end, -1);

    ws.dm_leave(b, dm).unwrap();
    assert!(matches!(ws.dm_messages(b, dm, 0), Err(TreatsError::Auth(_))));
}

#[test]
fn test_reacted_flag_follows_the_viewer() {
    let mut ws = Workspace::new();
    let (a, _) = ws.register("a@example.com", "hash".into(), "Ann", "Lee").unwrap();
    let (b, _) = ws.register("b@example.com", "hash".into(), "Ben", "Lee").unwrap();
    let c = ws.channels_create(a, "flags", true).unwrap();
    ws.channel_join(b, c).unwrap();
    let m = ws.message_send(a, c, "react please").unwrap();
    ws.message_react(b, m, 1).unwrap();

    let as_b = ws.channel_messages(b, c, 0).unwrap();
    assert!(as_b.messages[0].reacts[0].is_this_user_reacted);
    assert_eq!(as_b.messages[0].reacts[0].u_ids, vec![b]);

    let as_a = ws.channel_messages(a, c, 0).unwrap();
    assert!(!as_a.messages[0].reacts[0].is_this_user_reacted);
}
