//! Property tests for the App state machine.

use cuechat_app::{App, AppEvent};
use cuechat_client::{ConversationId, UserId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Open(u8),
    Close(u8),
    Evict(u8),
    Message(u8, bool),
    Focus(u8),
    Line(String),
}

fn peer(n: u8) -> UserId {
    UserId::new(format!("peer{n}"))
}

fn conv(n: u8) -> ConversationId {
    ConversationId::new(format!("conv{n}"))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..5).prop_map(Op::Open),
        (0u8..5).prop_map(Op::Close),
        (0u8..5).prop_map(Op::Evict),
        (0u8..5, any::<bool>()).prop_map(|(n, own)| Op::Message(n, own)),
        (0u8..5).prop_map(Op::Focus),
        "[a-z/ ]{0,12}".prop_map(Op::Line),
    ]
}

fn apply(app: &mut App, op: Op) {
    let event = match op {
        Op::Open(n) => {
            if app.windows().iter().any(|w| w.conversation_id == conv(n)) {
                return;
            }
            AppEvent::WindowOpened { peer: peer(n), conversation_id: conv(n) }
        },
        Op::Close(n) => AppEvent::WindowClosed { peer: peer(n), conversation_id: conv(n) },
        Op::Evict(n) => AppEvent::WindowEvicted { peer: peer(n), conversation_id: conv(n) },
        Op::Message(n, from_self) => {
            AppEvent::MessageAppended { conversation_id: conv(n), from_self }
        },
        Op::Focus(n) => AppEvent::Line(format!("/focus peer{n}")),
        Op::Line(line) => AppEvent::Line(line),
    };
    app.handle(event);
}

proptest! {
    #[test]
    fn prop_active_window_is_open(ops in prop::collection::vec(op(), 0..60)) {
        let mut app = App::new();

        for op in ops {
            apply(&mut app, op);

            match app.active_window() {
                Some(active) => {
                    prop_assert!(app.windows().iter().any(|w| &w.conversation_id == active));
                },
                None => prop_assert!(app.windows().is_empty()),
            }
        }
    }

    #[test]
    fn prop_active_window_never_unread(ops in prop::collection::vec(op(), 0..60)) {
        let mut app = App::new();

        for op in ops {
            apply(&mut app, op);

            if let Some(view) = app.active_window_view() {
                prop_assert!(!view.unread);
            }
        }
    }
}
