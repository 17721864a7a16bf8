//! Property tests for the timeline view model.

use proptest::prelude::*;
use veilroom_app::Timeline;
use veilroom_client::{LocalId, MessageEntry, MessageIndex};
use veilroom_core::{DecryptedMessage, MessageState, RoomId};

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(usize),
    Refresh(usize, MessageState),
}

fn op_strategy(ids: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ids).prop_map(Op::Insert),
        (0..ids, prop_oneof![
            Just(MessageState::Pending),
            Just(MessageState::Confirmed),
            Just(MessageState::Failed),
        ])
            .prop_map(|(i, state)| Op::Refresh(i, state)),
    ]
}

fn message(i: usize, state: MessageState) -> DecryptedMessage {
    DecryptedMessage {
        server_id: None,
        user: format!("<b>user{i}</b>"),
        content: format!("message {i}"),
        timestamp: "2025-01-01T00:00:00.000Z".into(),
        state,
    }
}

fn local_ids(n: usize) -> Vec<LocalId> {
    let mut index = MessageIndex::new();
    (0..n).map(|i| index.insert(message(i, MessageState::Pending))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Entries appear once each, in first-seen order, with their latest state.
    #[test]
    fn entries_follow_first_appearance(ops in prop::collection::vec(op_strategy(6), 0..40)) {
        let ids = local_ids(6);
        let mut timeline = Timeline::new(RoomId::parse("0123456789abcdef").unwrap(), "me".into());
        let mut order = Vec::new();
        let mut latest = std::collections::HashMap::new();

        for op in ops {
            let (i, state) = match op {
                Op::Insert(i) => (i, MessageState::Pending),
                Op::Refresh(i, state) => (i, state),
            };
            let entry = MessageEntry { id: ids[i], message: message(i, state) };
            match op {
                Op::Insert(_) => timeline.insert(entry),
                Op::Refresh(..) => timeline.refresh(entry),
            }
            if !order.contains(&i) {
                order.push(i);
            }
            latest.insert(i, state);
        }

        let shown: Vec<_> = timeline.entries().iter().map(|e| e.id).collect();
        let expected: Vec<_> = order.iter().map(|&i| ids[i]).collect();
        prop_assert_eq!(shown, expected);

        for &i in &order {
            let entry = timeline.get(ids[i]).unwrap();
            prop_assert_eq!(entry.state, latest[&i]);
            prop_assert_eq!(&entry.user, &format!("user{i}"));
        }
    }
}
