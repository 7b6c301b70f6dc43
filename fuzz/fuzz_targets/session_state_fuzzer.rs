//! Fuzz target for the Session state machine
//!
//! # Strategy
//!
//! - Small id spaces so opens, closes and echoes collide
//! - History responses for conversations never requested, or requested twice
//! - Socket flapping between sends
//!
//! # Invariants
//!
//! - Open windows never exceed capacity
//! - No two windows show the same conversation
//! - Every open window has a loaded log and a joined room
//! - No message id appears twice in a log

#![no_main]

use arbitrary::Arbitrary;
use cuechat_client::{
    ConversationId, MessageId, ServerEvent, Session, SessionConfig, SessionEvent, UserId,
    WireMessage,
};
use cuechat_harness::{ClientSnapshot, InvariantRegistry, SimEnv, SystemSnapshot};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Login(u8),
    Logout,
    Open { peer: u8, conversation: u8 },
    History { conversation: u8, messages: Vec<u8> },
    HistoryFailed { conversation: u8 },
    Close { peer: u8 },
    Send { conversation: u8, blank: bool },
    Receive { conversation: u8, id: u8, sender: u8 },
    Connected,
    Disconnected,
}

fn user(n: u8) -> UserId {
    UserId::new(format!("u{}", n % 4))
}

fn conversation(n: u8) -> ConversationId {
    ConversationId::new(format!("c{}", n % 5))
}

fn wire(conversation_id: ConversationId, id: u8, sender: u8) -> WireMessage {
    WireMessage {
        id: MessageId::new(format!("m{}", id % 16)),
        conversation_id,
        sender: user(sender),
        content: format!("msg {id}"),
        created_at: None,
        client_id: None,
    }
}

fn event(op: SessionOp) -> SessionEvent {
    match op {
        SessionOp::Login(n) => SessionEvent::Login { user_id: user(n) },
        SessionOp::Logout => SessionEvent::Logout,
        SessionOp::Open { peer, conversation: c } => {
            SessionEvent::OpenChat { peer: user(peer), conversation_id: conversation(c) }
        }
        SessionOp::History { conversation: c, messages } => SessionEvent::HistoryLoaded {
            conversation_id: conversation(c),
            messages: messages.into_iter().map(|id| wire(conversation(c), id, id)).collect(),
        },
        SessionOp::HistoryFailed { conversation: c } => SessionEvent::HistoryFailed {
            conversation_id: conversation(c),
            reason: "fuzz".into(),
        },
        SessionOp::Close { peer } => SessionEvent::CloseChat { peer: user(peer) },
        SessionOp::Send { conversation: c, blank } => SessionEvent::SendMessage {
            conversation_id: conversation(c),
            content: if blank { "  ".into() } else { "hello".into() },
        },
        SessionOp::Receive { conversation: c, id, sender } => {
            SessionEvent::Server(ServerEvent::ReceiveMessage(wire(conversation(c), id, sender)))
        }
        SessionOp::Connected => SessionEvent::TransportConnected,
        SessionOp::Disconnected => SessionEvent::TransportDisconnected,
    }
}

fuzz_target!(|input: (u8, Vec<SessionOp>)| {
    let (capacity, ops) = input;
    let max_windows = usize::from(capacity % 4) + 1;
    let mut session = Session::new(SimEnv::new(), SessionConfig::with_max_windows(max_windows));
    let registry = InvariantRegistry::standard();

    for op in ops {
        // Rejected operations (not logged in, blank text, unknown
        // conversation) are expected; they must leave state consistent.
        let _ = session.handle(event(op));

        let snapshot = SystemSnapshot::single(ClientSnapshot::from_session(0, &session));
        registry.assert_all(&snapshot, "after op");
    }
});
