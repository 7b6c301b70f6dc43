//! End-to-end behavior of the session state machine.
//!
//! Each test drives a [`Session`] with a seeded [`SimEnv`] and ends with an
//! invariant check over the captured snapshot.

use cuechat_client::{
    ClientCommand, ConnectionAction, ConnectionState, ConversationId, ConversationKind, Ingest,
    Message, ServerEvent, Session, SessionAction, SessionConfig, SessionError, SessionEvent,
    UserId, WindowState, WireMessage,
};
use cuechat_harness::{ClientSnapshot, InvariantRegistry, SimEnv, SystemSnapshot};
use cuechat_proto::{Conversation, MessageId};

const ME: &str = "u1";

fn wire(id: &str, conversation: &str, sender: &str, content: &str) -> WireMessage {
    WireMessage {
        id: MessageId::new(id),
        conversation_id: ConversationId::new(conversation),
        sender: UserId::new(sender),
        content: content.into(),
        created_at: None,
        client_id: None,
    }
}

fn session() -> Session<SimEnv> {
    let mut session = Session::new(SimEnv::with_seed(42), SessionConfig::default());
    session.handle(SessionEvent::Login { user_id: UserId::new(ME) }).unwrap();
    session.handle(SessionEvent::TransportConnected).unwrap();
    session
}

fn request_open(
    session: &mut Session<SimEnv>,
    peer: &str,
    conversation: &str,
) -> Vec<SessionAction> {
    session
        .handle(SessionEvent::OpenChat {
            peer: UserId::new(peer),
            conversation_id: ConversationId::new(conversation),
        })
        .unwrap()
}

fn load(
    session: &mut Session<SimEnv>,
    conversation: &str,
    messages: Vec<WireMessage>,
) -> Vec<SessionAction> {
    session
        .handle(SessionEvent::HistoryLoaded {
            conversation_id: ConversationId::new(conversation),
            messages,
        })
        .unwrap()
}

fn open(session: &mut Session<SimEnv>, peer: &str, conversation: &str) -> Vec<SessionAction> {
    request_open(session, peer, conversation);
    load(session, conversation, vec![])
}

fn receive(session: &mut Session<SimEnv>, message: WireMessage) -> Vec<SessionAction> {
    session.handle(SessionEvent::Server(ServerEvent::ReceiveMessage(message))).unwrap()
}

fn open_conversations(session: &Session<SimEnv>) -> Vec<&str> {
    session.windows().iter().map(|w| w.conversation_id.as_str()).collect()
}

fn contents(session: &Session<SimEnv>, conversation: &str) -> Vec<(String, bool)> {
    session
        .messages(&ConversationId::new(conversation))
        .unwrap_or_default()
        .iter()
        .map(|m| (m.content.clone(), m.from_self))
        .collect()
}

fn assert_invariants(session: &Session<SimEnv>, context: &str) {
    let snapshot = SystemSnapshot::single(ClientSnapshot::from_session(0, session));
    InvariantRegistry::standard().assert_all(&snapshot, context);
}

fn sent_commands(actions: &[SessionAction]) -> Vec<&ClientCommand> {
    actions
        .iter()
        .filter_map(|a| match a {
            SessionAction::Transport(ConnectionAction::Send(command)) => Some(command),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_open_with_history() {
    let mut session = session();

    let actions = request_open(&mut session, "u2", "c1");
    assert_eq!(actions, vec![SessionAction::FetchHistory {
        conversation_id: ConversationId::new("c1")
    }]);

    load(&mut session, "c1", vec![wire("m1", "c1", "u2", "hi")]);

    assert_eq!(open_conversations(&session), vec!["c1"]);
    assert_eq!(
        session.window_for(&UserId::new("u2")).map(|w| w.conversation_id.as_str()),
        Some("c1")
    );
    assert_eq!(contents(&session, "c1"), vec![("hi".to_owned(), false)]);
    assert_invariants(&session, "after scenario A");
}

#[test]
fn scenario_live_message_from_self() {
    let mut session = session();
    open(&mut session, "u2", "c1");

    let actions = receive(&mut session, wire("m2", "c1", ME, "hey"));

    assert_eq!(actions, vec![SessionAction::MessageAppended {
        conversation_id: ConversationId::new("c1"),
        index: 0,
        from_self: true,
    }]);
    assert_eq!(contents(&session, "c1"), vec![("hey".to_owned(), true)]);
}

#[test]
fn scenario_fourth_window_evicts_oldest() {
    let mut session = session();
    for (peer, conversation) in [("u2", "c1"), ("u3", "c2"), ("u4", "c3")] {
        open(&mut session, peer, conversation);
    }

    let actions = open(&mut session, "u5", "c4");

    assert!(actions.contains(&SessionAction::WindowEvicted {
        peer: UserId::new("u2"),
        conversation_id: ConversationId::new("c1"),
    }));
    assert_eq!(open_conversations(&session), vec!["c2", "c3", "c4"]);
    assert_invariants(&session, "after eviction");
}

#[test]
fn double_open_yields_one_window() {
    let mut session = session();

    let first = request_open(&mut session, "u2", "c1");
    let second = request_open(&mut session, "u2", "c1");
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());

    load(&mut session, "c1", vec![]);
    let again = request_open(&mut session, "u2", "c1");

    assert!(again.is_empty());
    assert_eq!(open_conversations(&session), vec!["c1"]);
}

#[test]
fn open_sequence_is_fetch_join_show() {
    let mut session = session();

    let fetch = request_open(&mut session, "u2", "c1");
    let rest = load(&mut session, "c1", vec![]);

    assert!(matches!(fetch.as_slice(), [SessionAction::FetchHistory { .. }]));
    assert_eq!(rest, vec![
        SessionAction::Transport(ConnectionAction::Send(ClientCommand::JoinConversation(
            ConversationId::new("c1")
        ))),
        SessionAction::WindowOpened {
            peer: UserId::new("u2"),
            conversation_id: ConversationId::new("c1"),
        },
    ]);
}

#[test]
fn history_failure_leaves_window_closed() {
    let mut session = session();
    request_open(&mut session, "u2", "c1");

    let actions = session
        .handle(SessionEvent::HistoryFailed {
            conversation_id: ConversationId::new("c1"),
            reason: "502".into(),
        })
        .unwrap();

    assert_eq!(actions, vec![SessionAction::OpenFailed {
        peer: UserId::new("u2"),
        conversation_id: Some(ConversationId::new("c1")),
        reason: "502".into(),
    }]);
    assert!(session.windows().is_empty());
    assert_eq!(session.window_state(&ConversationId::new("c1")), WindowState::Closed);
    assert!(!session.connection().is_joined(&ConversationId::new("c1")));
}

#[test]
fn history_after_close_is_discarded() {
    let mut session = session();
    request_open(&mut session, "u2", "c1");

    session.handle(SessionEvent::CloseChat { peer: UserId::new("u2") }).unwrap();
    let actions = load(&mut session, "c1", vec![wire("m1", "c1", "u2", "hi")]);

    assert!(actions.is_empty());
    assert!(session.windows().is_empty());
    assert!(session.log(&ConversationId::new("c1")).is_none());
    assert!(!session.connection().is_joined(&ConversationId::new("c1")));
}

#[test]
fn history_after_logout_is_discarded() {
    let mut session = session();
    request_open(&mut session, "u2", "c1");

    session.handle(SessionEvent::Logout).unwrap();
    let actions = load(&mut session, "c1", vec![]);

    assert!(actions.is_empty());
    assert!(session.windows().is_empty());
}

#[test]
fn close_removes_only_matching_window() {
    let mut session = session();
    open(&mut session, "u2", "c1");
    open(&mut session, "u3", "c2");
    receive(&mut session, wire("m1", "c2", "u3", "nice shot"));

    let actions = session.handle(SessionEvent::CloseChat { peer: UserId::new("u2") }).unwrap();

    assert_eq!(actions, vec![SessionAction::WindowClosed {
        peer: UserId::new("u2"),
        conversation_id: ConversationId::new("c1"),
    }]);
    assert_eq!(open_conversations(&session), vec!["c2"]);
    assert_eq!(contents(&session, "c2"), vec![("nice shot".to_owned(), false)]);
}

#[test]
fn closed_conversation_stays_warm() {
    let mut session = session();
    open(&mut session, "u2", "c1");
    session.handle(SessionEvent::CloseChat { peer: UserId::new("u2") }).unwrap();

    receive(&mut session, wire("m1", "c1", "u2", "still there?"));
    assert!(session.connection().is_joined(&ConversationId::new("c1")));

    // Reopen: history lacks the live message, which must survive the merge.
    request_open(&mut session, "u2", "c1");
    let actions = load(&mut session, "c1", vec![wire("m0", "c1", "u2", "earlier")]);

    assert_eq!(contents(&session, "c1"), vec![
        ("earlier".to_owned(), false),
        ("still there?".to_owned(), false)
    ]);
    // Room is already joined; reopening sends no second join.
    assert!(sent_commands(&actions).is_empty());
    assert_invariants(&session, "after warm reopen");
}

#[test]
fn from_self_tagged_for_history_and_live() {
    let mut session = session();
    request_open(&mut session, "u2", "c1");
    load(&mut session, "c1", vec![wire("m1", "c1", ME, "mine"), wire("m2", "c1", "u2", "theirs")]);
    receive(&mut session, wire("m3", "c1", ME, "mine again"));
    receive(&mut session, wire("m4", "c1", "u2", "theirs again"));

    let tags: Vec<bool> = contents(&session, "c1").into_iter().map(|(_, s)| s).collect();
    assert_eq!(tags, vec![true, false, true, false]);
}

#[test]
fn send_appends_optimistic_then_emits_command() {
    let mut session = session();
    open(&mut session, "u2", "c1");

    let actions = session
        .handle(SessionEvent::SendMessage {
            conversation_id: ConversationId::new("c1"),
            content: "break and run".into(),
        })
        .unwrap();

    assert_eq!(actions[0], SessionAction::MessageAppended {
        conversation_id: ConversationId::new("c1"),
        index: 0,
        from_self: true,
    });
    let sent = sent_commands(&actions);
    assert!(matches!(
        sent.as_slice(),
        [ClientCommand::SendMessage { content, .. }] if content == "break and run"
    ));

    let message = &session.messages(&ConversationId::new("c1")).unwrap()[0];
    assert!(message.is_pending());
    assert!(message.created_at.is_some());
}

#[test]
fn echo_with_client_id_confirms_in_place() {
    let mut session = session();
    open(&mut session, "u2", "c1");
    let actions = session
        .handle(SessionEvent::SendMessage {
            conversation_id: ConversationId::new("c1"),
            content: "gg".into(),
        })
        .unwrap();
    let first = sent_commands(&actions).first().copied();
    let Some(ClientCommand::SendMessage { client_id, .. }) = first else {
        panic!("expected a send");
    };

    // Someone else talks before the echo arrives.
    receive(&mut session, wire("m1", "c1", "u2", "wp"));
    let mut echo = wire("m2", "c1", ME, "gg");
    echo.client_id = Some(client_id.clone());
    let actions = receive(&mut session, echo.clone());

    assert_eq!(actions, vec![SessionAction::MessageConfirmed {
        conversation_id: ConversationId::new("c1"),
        index: 0,
    }]);
    assert_eq!(contents(&session, "c1"), vec![
        ("gg".to_owned(), true),
        ("wp".to_owned(), false)
    ]);

    // Redelivery of the same server message is dropped.
    assert!(receive(&mut session, echo).is_empty());
    assert_invariants(&session, "after echo");
}

#[test]
fn echo_without_client_id_matches_content() {
    let mut session = session();
    open(&mut session, "u2", "c1");
    session
        .handle(SessionEvent::SendMessage {
            conversation_id: ConversationId::new("c1"),
            content: "rack".into(),
        })
        .unwrap();

    let actions = receive(&mut session, wire("m1", "c1", ME, "rack"));

    assert!(matches!(actions.as_slice(), [SessionAction::MessageConfirmed { index: 0, .. }]));
    assert_eq!(session.log(&ConversationId::new("c1")).map(|l| l.pending()), Some(0));
}

#[test]
fn arrival_order_preserved() {
    let mut session = session();
    open(&mut session, "u2", "c1");

    session
        .handle(SessionEvent::SendMessage {
            conversation_id: ConversationId::new("c1"),
            content: "one".into(),
        })
        .unwrap();
    receive(&mut session, wire("m1", "c1", "u2", "two"));
    receive(&mut session, wire("m2", "c1", "u3", "three"));

    let order: Vec<String> = contents(&session, "c1").into_iter().map(|(c, _)| c).collect();
    assert_eq!(order, vec!["one", "two", "three"]);
}

#[test]
fn unknown_conversation_messages_dropped() {
    let mut session = session();
    let actions = receive(&mut session, wire("m1", "c9", "u2", "stray"));

    assert!(actions.is_empty());
    assert!(session.log(&ConversationId::new("c9")).is_none());
}

#[test]
fn notification_passed_through() {
    let mut session = session();
    let payload = serde_json::json!({ "type": "friend_request" });

    let actions = session
        .handle(SessionEvent::Server(ServerEvent::NewNotification(payload.clone())))
        .unwrap();

    assert_eq!(actions, vec![SessionAction::Notification(payload)]);
}

#[test]
fn reconnect_replays_identity_and_rooms() {
    let mut session = session();
    open(&mut session, "u2", "c2");
    open(&mut session, "u3", "c1");

    session.handle(SessionEvent::TransportDisconnected).unwrap();
    assert_eq!(session.connection().state(), ConnectionState::Connecting);

    let actions = session.handle(SessionEvent::TransportConnected).unwrap();

    assert_eq!(sent_commands(&actions), vec![
        &ClientCommand::InitUser(UserId::new(ME)),
        &ClientCommand::JoinConversation(ConversationId::new("c1")),
        &ClientCommand::JoinConversation(ConversationId::new("c2")),
    ]);
}

#[test]
fn send_while_disconnected_is_flushed_after_replay() {
    let mut session = session();
    open(&mut session, "u2", "c1");
    session.handle(SessionEvent::TransportDisconnected).unwrap();

    let actions = session
        .handle(SessionEvent::SendMessage {
            conversation_id: ConversationId::new("c1"),
            content: "you there?".into(),
        })
        .unwrap();
    assert!(sent_commands(&actions).is_empty());

    let actions = session.handle(SessionEvent::TransportConnected).unwrap();
    let sent = sent_commands(&actions);
    assert!(matches!(
        sent.as_slice(),
        [
            ClientCommand::InitUser(_),
            ClientCommand::JoinConversation(_),
            ClientCommand::SendMessage { .. }
        ]
    ));
}

#[test]
fn start_chat_creates_then_opens() {
    let mut session = session();

    let actions = session
        .handle(SessionEvent::StartChat { peer: UserId::new("u2"), kind: ConversationKind::Single })
        .unwrap();
    assert_eq!(actions, vec![SessionAction::CreateConversation {
        peer: UserId::new("u2"),
        kind: ConversationKind::Single,
    }]);

    // Second click while the create is in flight is ignored.
    let again = session
        .handle(SessionEvent::StartChat { peer: UserId::new("u2"), kind: ConversationKind::Single })
        .unwrap();
    assert!(again.is_empty());

    let conversation = Conversation {
        id: ConversationId::new("c7"),
        kind: ConversationKind::Single,
        members: vec![UserId::new(ME), UserId::new("u2")],
    };
    let actions = session
        .handle(SessionEvent::ConversationCreated { peer: UserId::new("u2"), conversation })
        .unwrap();

    assert_eq!(actions, vec![SessionAction::FetchHistory {
        conversation_id: ConversationId::new("c7")
    }]);
}

#[test]
fn start_chat_failure_reported() {
    let mut session = session();
    session
        .handle(SessionEvent::StartChat { peer: UserId::new("u2"), kind: ConversationKind::Group })
        .unwrap();

    let actions = session
        .handle(SessionEvent::ConversationFailed {
            peer: UserId::new("u2"),
            reason: "forbidden".into(),
        })
        .unwrap();

    assert_eq!(actions, vec![SessionAction::OpenFailed {
        peer: UserId::new("u2"),
        conversation_id: None,
        reason: "forbidden".into(),
    }]);
}

#[test]
fn login_as_someone_else_rejected() {
    let mut session = session();
    let result = session.handle(SessionEvent::Login { user_id: UserId::new("u9") });

    assert!(matches!(result, Err(SessionError::Connection(_))));
    assert_eq!(session.user_id(), Some(&UserId::new(ME)));
}

#[test]
fn logout_then_login_starts_clean() {
    let mut session = session();
    open(&mut session, "u2", "c1");

    let actions = session.handle(SessionEvent::Logout).unwrap();
    assert_eq!(actions.last(), Some(&SessionAction::Transport(ConnectionAction::Close)));
    assert_eq!(session.connection().state(), ConnectionState::Disconnected);

    let actions = session.handle(SessionEvent::Login { user_id: UserId::new("u9") }).unwrap();
    assert_eq!(actions, vec![SessionAction::Transport(ConnectionAction::Connect)]);
    assert!(session.connection().joined().next().is_none());
}

#[test]
fn capacity_is_configurable() {
    let mut session = Session::new(SimEnv::new(), SessionConfig::with_max_windows(0));
    session.handle(SessionEvent::Login { user_id: UserId::new(ME) }).unwrap();

    open(&mut session, "u2", "c1");
    open(&mut session, "u3", "c2");

    assert_eq!(session.max_windows(), 1);
    assert_eq!(open_conversations(&session), vec!["c2"]);
}

#[test]
fn ingest_reports_duplicates() {
    let mut log = cuechat_client::MessageLog::default();
    let me = UserId::new(ME);

    assert_eq!(log.ingest(wire("m1", "c1", "u2", "hi"), &me), Ingest::Appended(0));
    assert_eq!(log.ingest(wire("m1", "c1", "u2", "hi"), &me), Ingest::Duplicate);
    assert_eq!(log.messages().iter().filter(|m: &&Message| !m.from_self).count(), 1);
}
