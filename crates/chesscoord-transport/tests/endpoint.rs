//! Integration tests for the [`Endpoint`] abstraction, using an
//! in-memory fake [`Connection`] so these don't need a real socket.

use std::sync::Mutex;

use chesscoord_protocol::Color;
use chesscoord_transport::{Connection, ConnectionId, Endpoint, Subscription};
use serde_json::json;

struct FakeConnection {
    id: ConnectionId,
    sent: Mutex<Vec<Vec<u8>>>,
    inbox: Mutex<Vec<Vec<u8>>>,
    fail_send: bool,
}

impl FakeConnection {
    fn new(id: u64) -> Self {
        Self {
            id: ConnectionId::new(id),
            sent: Mutex::new(Vec::new()),
            inbox: Mutex::new(Vec::new()),
            fail_send: false,
        }
    }

    fn push_inbound(&self, bytes: Vec<u8>) {
        self.inbox.lock().unwrap().push(bytes);
    }
}

impl Connection for FakeConnection {
    type Error = std::io::Error;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_send {
            return Err(std::io::Error::other("send failed"));
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.inbox.lock().unwrap().pop())
    }

    async fn close(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[tokio::test]
async fn test_endpoint_send_encodes_route_action_value_and_id() {
    let endpoint = Endpoint::new(FakeConnection::new(1));
    endpoint
        .send("game", "gameupdate", json!({"fullmove": 3}), Some("corr-1".to_string()))
        .await
        .expect("send should succeed");

    let sent = endpoint.connection_sent_for_test();
    let decoded: serde_json::Value = serde_json::from_slice(&sent[0]).unwrap();
    assert_eq!(decoded["route"], "game");
    assert_eq!(decoded["action"], "gameupdate");
    assert_eq!(decoded["value"]["fullmove"], 3);
    assert_eq!(decoded["id"], "corr-1");
}

#[tokio::test]
async fn test_endpoint_recv_decodes_inbound_message() {
    let conn = FakeConnection::new(2);
    conn.push_inbound(
        serde_json::to_vec(&json!({
            "route": "game",
            "action": "resign",
            "value": null,
            "id": null,
        }))
        .unwrap(),
    );
    let endpoint = Endpoint::new(conn);
    let msg = endpoint.recv().await.unwrap().unwrap();
    assert_eq!(msg.route, "game");
    assert_eq!(msg.action, "resign");
}

#[tokio::test]
async fn test_endpoint_starts_open_and_send_failure_closes_it() {
    let mut conn = FakeConnection::new(3);
    conn.fail_send = true;
    let endpoint = Endpoint::new(conn);
    assert!(endpoint.is_open());

    let result = endpoint.send("game", "clock", json!(null), None).await;
    assert!(result.is_err());
    assert!(!endpoint.is_open());
}

#[tokio::test]
async fn test_endpoint_subscription_metadata_bag() {
    let endpoint = Endpoint::new(FakeConnection::new(4));
    assert_eq!(endpoint.subscription(), None);

    endpoint.set_subscription(Some(Subscription {
        game_id: "game-1".to_string(),
        color: Color::White,
    }));
    assert_eq!(
        endpoint.subscription(),
        Some(Subscription {
            game_id: "game-1".to_string(),
            color: Color::White,
        })
    );

    endpoint.set_subscription(None);
    assert_eq!(endpoint.subscription(), None);
}

#[tokio::test]
async fn test_endpoint_close_marks_not_open() {
    let endpoint = Endpoint::new(FakeConnection::new(5));
    endpoint.close().await.expect("close should succeed");
    assert!(!endpoint.is_open());
}

// Test-only accessor: exercising `Endpoint::send`'s wire effect requires
// peeking at what the fake connection recorded.
impl Endpoint<FakeConnection> {
    fn connection_sent_for_test(&self) -> Vec<Vec<u8>> {
        self.raw_connection().sent.lock().unwrap().clone()
    }
}
