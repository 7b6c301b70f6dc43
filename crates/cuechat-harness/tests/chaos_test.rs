//! Two clients chatting through a shared simulated server while their
//! sockets drop and come back.

use cuechat_app::Runtime;
use cuechat_client::{ConversationId, SessionConfig, UserId};
use cuechat_harness::{
    ClientKey, InvariantRegistry, SharedSimServer, SimDriver, SimEnv, create_shared_server,
};
use proptest::prelude::*;

type Client = Runtime<SimDriver, SimEnv>;

fn conversation() -> ConversationId {
    ConversationId::new("table-7")
}

fn client(server: &SharedSimServer, key: ClientKey) -> Client {
    let driver = SimDriver::new()
        .with_server(server.clone(), key)
        .with_invariants(InvariantRegistry::standard());
    Runtime::new(driver, SimEnv::with_seed(key), SessionConfig::default())
}

async fn pair(server: &SharedSimServer) -> [Client; 2] {
    server.lock().unwrap().add_conversation(conversation(), vec![
        UserId::new("alice"),
        UserId::new("bob"),
    ]);

    let mut alice = client(server, 1);
    let mut bob = client(server, 2);
    alice.login(UserId::new("alice")).await.unwrap();
    bob.login(UserId::new("bob")).await.unwrap();
    alice.driver().inject_line("/open bob table-7");
    bob.driver().inject_line("/open alice table-7");
    settle(&mut [&mut alice, &mut bob]).await;
    [alice, bob]
}

async fn settle(clients: &mut [&mut Client]) {
    for _ in 0..3 {
        for client in clients.iter_mut() {
            client.run_until_idle().await.unwrap();
        }
    }
}

fn own_messages(client: &Client) -> Vec<String> {
    client
        .bridge()
        .session()
        .messages(&conversation())
        .unwrap_or_default()
        .iter()
        .filter(|m| m.from_self)
        .map(|m| m.content.clone())
        .collect()
}

#[tokio::test]
async fn messages_reach_the_other_side() {
    let server = create_shared_server();
    let [mut alice, mut bob] = pair(&server).await;

    alice.driver().inject_line("break's yours");
    settle(&mut [&mut alice, &mut bob]).await;
    bob.driver().inject_line("thanks");
    settle(&mut [&mut alice, &mut bob]).await;

    for client in [&alice, &bob] {
        let contents: Vec<_> = client
            .bridge()
            .session()
            .messages(&conversation())
            .unwrap()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["break's yours", "thanks"]);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Say(usize, String),
    Drop(usize),
    Restore(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..2, "[a-z]{1,8}").prop_map(|(who, text)| Op::Say(who, text)),
        1 => (0usize..2).prop_map(Op::Drop),
        1 => (0usize..2).prop_map(Op::Restore),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_message_lands_once(ops in prop::collection::vec(op(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let server = create_shared_server();
            let [mut alice, mut bob] = pair(&server).await;
            let mut online = [true, true];
            let mut said: [Vec<String>; 2] = [Vec::new(), Vec::new()];

            for op in ops {
                match op {
                    Op::Say(who, text) => {
                        let client = if who == 0 { &alice } else { &bob };
                        client.driver().inject_line(text.clone());
                        said[who].push(text);
                    },
                    Op::Drop(who) if online[who] => {
                        let client = if who == 0 { &alice } else { &bob };
                        client.driver().drop_connection();
                        online[who] = false;
                    },
                    Op::Restore(who) if !online[who] => {
                        let client = if who == 0 { &alice } else { &bob };
                        client.driver().restore_connection();
                        online[who] = true;
                    },
                    Op::Drop(_) | Op::Restore(_) => {},
                }
                settle(&mut [&mut alice, &mut bob]).await;
            }

            for (who, client) in [&alice, &bob].into_iter().enumerate() {
                if !online[who] {
                    client.driver().restore_connection();
                }
            }
            settle(&mut [&mut alice, &mut bob]).await;

            let stored = server.lock().unwrap().messages(&conversation()).len();
            assert_eq!(stored, said[0].len() + said[1].len());

            for (who, client) in [&alice, &bob].into_iter().enumerate() {
                let log = client.bridge().session().log(&conversation()).unwrap();
                assert_eq!(log.pending(), 0);
                assert_eq!(own_messages(client), said[who]);
            }
        });
    }
}
