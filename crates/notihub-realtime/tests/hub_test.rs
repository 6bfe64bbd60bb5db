//! Behavioral tests for the socket hub actor.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use notihub_entity::notification::{Notification, NotificationKind, NotificationStatus};
use notihub_realtime::{SocketClient, SocketHub};

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

fn directed(cpf: &str) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        title: "T".to_string(),
        message: "M".to_string(),
        kind: NotificationKind::InApp,
        status: NotificationStatus::Pending,
        data: None,
        user_cpf: Some(cpf.to_string()),
        user_phone: None,
        user_email: None,
        group_id: None,
        broadcast: false,
        is_html: false,
        is_scheduled: false,
        scheduled_for: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        read_at: None,
    }
}

fn broadcast() -> Notification {
    let mut n = directed("");
    n.user_cpf = None;
    n.broadcast = true;
    n
}

async fn recv_frame(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let frame = timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("socket buffer closed");
    serde_json::from_str(&frame).expect("frame is not JSON")
}

#[tokio::test]
async fn directed_notification_reaches_every_socket_of_the_target_user() {
    let hub = SocketHub::new();

    let (client_a1, mut rx_a1) = SocketClient::new("111".to_string(), 16);
    let (client_a2, mut rx_a2) = SocketClient::new("111".to_string(), 16);
    let (client_b, mut rx_b) = SocketClient::new("222".to_string(), 16);
    hub.register(client_a1);
    hub.register(client_a2);
    hub.register(client_b);

    let notification = directed("111");
    hub.deliver(notification.clone());

    let frame_1 = recv_frame(&mut rx_a1).await;
    let frame_2 = recv_frame(&mut rx_a2).await;
    assert_eq!(frame_1["id"], notification.id.to_string());
    assert_eq!(frame_2["id"], notification.id.to_string());

    // The other user receives nothing.
    assert!(timeout(Duration::from_millis(100), rx_b.recv()).await.is_err());
}

#[tokio::test]
async fn directed_notification_is_enqueued_exactly_once_per_socket() {
    let hub = SocketHub::new();

    let (client, mut rx) = SocketClient::new("111".to_string(), 16);
    hub.register(client);

    hub.deliver(directed("111"));

    recv_frame(&mut rx).await;
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
}

#[tokio::test]
async fn broadcast_reaches_every_live_socket() {
    let hub = SocketHub::new();

    let mut receivers = Vec::new();
    for user in ["a", "b", "c"] {
        let (client, rx) = SocketClient::new(user.to_string(), 16);
        hub.register(client);
        receivers.push(rx);
    }

    let notification = broadcast();
    hub.deliver(notification.clone());

    for rx in receivers.iter_mut() {
        let frame = recv_frame(rx).await;
        assert_eq!(frame["id"], notification.id.to_string());
        assert_eq!(frame["broadcast"], true);
    }
}

#[tokio::test]
async fn falls_back_to_phone_when_cpf_is_absent() {
    let hub = SocketHub::new();

    let (client, mut rx) = SocketClient::new("5521999999999".to_string(), 16);
    hub.register(client);

    let mut notification = directed("");
    notification.user_cpf = None;
    notification.user_phone = Some("5521999999999".to_string());
    hub.deliver(notification.clone());

    let frame = recv_frame(&mut rx).await;
    assert_eq!(frame["id"], notification.id.to_string());
}

#[tokio::test]
async fn unregistered_socket_receives_nothing() {
    let hub = SocketHub::new();

    let (client, mut rx) = SocketClient::new("111".to_string(), 16);
    let socket_id = client.id;
    hub.register(client);
    hub.unregister("111".to_string(), socket_id);

    // Allow the unregister command to drain before delivering.
    tokio::time::sleep(Duration::from_millis(50)).await;
    hub.deliver(directed("111"));

    // The buffer is dropped on eviction, so recv yields None rather than a frame.
    let got = timeout(RECV_TIMEOUT, rx.recv()).await.expect("hub did not drop the buffer");
    assert!(got.is_none());
}

#[tokio::test]
async fn slow_socket_is_evicted_when_its_buffer_fills() {
    let hub = SocketHub::new();

    // Buffer of one frame, never drained.
    let (slow, mut slow_rx) = SocketClient::new("111".to_string(), 1);
    let (healthy, mut healthy_rx) = SocketClient::new("111".to_string(), 16);
    hub.register(slow);
    hub.register(healthy);

    // First delivery fills the slow buffer; second overflows it and evicts.
    hub.deliver(directed("111"));
    hub.deliver(directed("111"));

    recv_frame(&mut healthy_rx).await;
    recv_frame(&mut healthy_rx).await;

    // The slow socket got the first frame, then its buffer was closed.
    recv_frame(&mut slow_rx).await;
    let got = timeout(RECV_TIMEOUT, slow_rx.recv()).await.expect("buffer not closed");
    assert!(got.is_none());

    // The healthy socket keeps receiving after the eviction.
    hub.deliver(directed("111"));
    recv_frame(&mut healthy_rx).await;
}
