//! End-to-end gateway behavior
//!
//! Single-node flows plus two-node cluster flows over the in-process
//! bus.

use integration_tests::{assert_silent, frame_of, next_frame, ClusterBus, TestNode};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_welcome_and_connect_announcements() {
    let node = TestNode::standalone("n1");

    let (_alice, mut alice_rx) = node.connect("conn-a", "alice", None, None).await;
    let welcome = next_frame(&mut alice_rx).await;
    assert_eq!(welcome.event, "welcome");
    assert_eq!(welcome.data["message"], "Welcome alice!");
    assert_eq!(welcome.data["connectedUsers"], 1);

    let (_bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;
    let welcome = next_frame(&mut bob_rx).await;
    assert_eq!(welcome.data["connectedUsers"], 2);

    let announce = next_frame(&mut alice_rx).await;
    assert_eq!(announce.event, "userConnected");
    assert_eq!(announce.data["username"], "bob");
    assert_eq!(announce.data["totalUsers"], 2);

    // The new client never hears about itself
    assert_silent(&mut bob_rx).await;
}

#[tokio::test]
async fn test_room_message_spans_nodes() {
    let bus = ClusterBus::new();
    let node1 = TestNode::join(&bus, "n1");
    let node2 = TestNode::join(&bus, "n2");

    let (alice, mut alice_rx) = node1.connect("conn-a", "alice", None, None).await;
    let (bob, mut bob_rx) = node2.connect("conn-b", "bob", None, None).await;

    node1.send(&alice, "joinRoom", json!({"room": "chat:1"})).await;
    node2.send(&bob, "joinRoom", json!({"room": "chat:1"})).await;

    // Alice hears bob join even though he is on another node
    let joined = frame_of(&mut alice_rx, "userJoinedRoom").await;
    assert_eq!(joined.data["username"], "bob");

    node1
        .send(&alice, "roomMessage", json!({"room": "chat:1", "message": "hello"}))
        .await;

    // Inclusive on the origin node
    let local = frame_of(&mut alice_rx, "roomMessage").await;
    assert_eq!(local.data["username"], "alice");
    assert_eq!(local.data["message"], "hello");

    // Remote member gets exactly the same event
    let remote = frame_of(&mut bob_rx, "roomMessage").await;
    assert_eq!(remote.data["username"], "alice");
    assert_eq!(remote.data["message"], "hello");
    assert_eq!(remote.data["room"], "chat:1");
}

#[tokio::test]
async fn test_own_commands_returning_from_bus_are_discarded() {
    let bus = ClusterBus::new();
    let node = TestNode::join(&bus, "n1");

    let (alice, mut alice_rx) = node.connect("conn-a", "alice", None, None).await;
    let (bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;

    node.send(&alice, "joinRoom", json!({"room": "general"})).await;
    node.send(&bob, "joinRoom", json!({"room": "general"})).await;

    node.send(&alice, "roomMessage", json!({"room": "general", "message": "once"}))
        .await;

    // Each member sees the message exactly once; the copy the node gets
    // back from the bus carries its own origin and is dropped.
    assert_eq!(frame_of(&mut alice_rx, "roomMessage").await.data["message"], "once");
    assert_eq!(frame_of(&mut bob_rx, "roomMessage").await.data["message"], "once");
    frame_of(&mut alice_rx, "ack").await;
    assert_silent(&mut alice_rx).await;
    assert_silent(&mut bob_rx).await;
}

#[tokio::test]
async fn test_typing_is_never_echoed_to_sender() {
    let bus = ClusterBus::new();
    let node1 = TestNode::join(&bus, "n1");
    let node2 = TestNode::join(&bus, "n2");

    let (alice, mut alice_rx) = node1.connect("conn-a", "alice", None, None).await;
    let (bob, mut bob_rx) = node2.connect("conn-b", "bob", None, None).await;

    node1.send(&alice, "joinRoom", json!({"room": "chat:1"})).await;
    node2.send(&bob, "joinRoom", json!({"room": "chat:1"})).await;
    frame_of(&mut alice_rx, "userJoinedRoom").await;
    frame_of(&mut bob_rx, "ack").await;

    node1
        .send(
            &alice,
            "chat:typing",
            json!({"conversationId": "chat:1", "isTyping": true}),
        )
        .await;

    let typing = frame_of(&mut bob_rx, "chat:typing").await;
    assert_eq!(typing.data["username"], "alice");
    assert_eq!(typing.data["isTyping"], true);

    // No echo and no ack for the sender
    assert_silent(&mut alice_rx).await;
}

#[tokio::test]
async fn test_oversized_message_is_rejected_without_broadcast() {
    let node = TestNode::standalone("n1");

    let (alice, mut alice_rx) = node.connect("conn-a", "alice", None, None).await;
    let (bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;

    node.send(&alice, "joinRoom", json!({"room": "general"})).await;
    node.send(&bob, "joinRoom", json!({"room": "general"})).await;
    frame_of(&mut bob_rx, "ack").await;

    let oversized = "x".repeat(10_001);
    node.send(&alice, "roomMessage", json!({"room": "general", "message": oversized}))
        .await;

    let err = frame_of(&mut alice_rx, "error").await;
    assert_eq!(err.data["code"], "VALIDATION_ERROR");
    assert_eq!(err.data["request"], "roomMessage");

    assert_silent(&mut bob_rx).await;
}

#[tokio::test]
async fn test_reconnect_within_grace_is_invisible_to_peers() {
    let node = TestNode::standalone("n1");

    let (alice, mut alice_rx) = node.connect("conn-a", "alice", Some("alice-id"), None).await;
    let (bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;

    node.send(&alice, "joinRoom", json!({"room": "general"})).await;
    node.send(&bob, "joinRoom", json!({"room": "general"})).await;
    frame_of(&mut alice_rx, "userJoinedRoom").await;
    frame_of(&mut bob_rx, "ack").await;

    drop(alice_rx);
    node.disconnect("conn-a").await;

    // Reconnect immediately, well inside the 50ms window
    let (resumed, mut alice_rx2) = node.connect("conn-a2", "alice", Some("alice-id"), None).await;
    assert_eq!(resumed.session_id(), "alice-id");

    let frame = next_frame(&mut alice_rx2).await;
    assert_eq!(frame.event, "reconnected");
    assert_eq!(frame.data["rooms"], json!(["general"]));

    // Past the original deadline: no departure, no fresh userConnected
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_silent(&mut bob_rx).await;
}

#[tokio::test]
async fn test_grace_expiry_announces_departure_exactly_once() {
    let node = TestNode::standalone("n1");

    let (alice, alice_rx) = node.connect("conn-a", "alice", Some("alice-id"), None).await;
    let (bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;

    node.send(&alice, "joinRoom", json!({"room": "general"})).await;
    node.send(&bob, "joinRoom", json!({"room": "general"})).await;

    drop(alice_rx);
    node.disconnect("conn-a").await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let left = frame_of(&mut bob_rx, "userLeftRoom").await;
    assert_eq!(left.data["username"], "alice");
    assert_eq!(left.data["room"], "general");

    let gone = next_frame(&mut bob_rx).await;
    assert_eq!(gone.event, "userDisconnected");
    assert_eq!(gone.data["username"], "alice");
    assert_eq!(gone.data["totalUsers"], 1);

    assert_silent(&mut bob_rx).await;

    // A reconnect after expiry is a brand-new session
    let (fresh, mut fresh_rx) = node.connect("conn-a2", "alice", Some("alice-id"), None).await;
    assert!(fresh.rooms().await.is_empty());
    assert_eq!(next_frame(&mut fresh_rx).await.event, "welcome");
}

#[tokio::test]
async fn test_private_message_to_remote_node_still_delivers() {
    let bus = ClusterBus::new();
    let node1 = TestNode::join(&bus, "n1");
    let node2 = TestNode::join(&bus, "n2");

    let (alice, mut alice_rx) = node1.connect("conn-a", "alice", None, None).await;
    let (_bob, mut bob_rx) = node2.connect("conn-b", "bob", Some("bob-id"), None).await;

    node1
        .send(&alice, "privateMessage", json!({"targetId": "bob-id", "message": "psst"}))
        .await;

    // The origin node cannot see the target, so the sender is told so,
    // but the fanned-out command still reaches bob's node.
    let err = frame_of(&mut alice_rx, "error").await;
    assert_eq!(err.data["code"], "TARGET_UNREACHABLE");

    let received = frame_of(&mut bob_rx, "privateMessage").await;
    assert_eq!(received.data["from"], "alice");
    assert_eq!(received.data["message"], "psst");
}

#[tokio::test]
async fn test_private_message_same_node() {
    let node = TestNode::standalone("n1");

    let (alice, mut alice_rx) = node.connect("conn-a", "alice", None, None).await;
    let (_bob, mut bob_rx) = node.connect("conn-b", "bob", None, None).await;

    node.send(&alice, "privateMessage", json!({"targetId": "conn-b", "message": "hi"}))
        .await;

    assert_eq!(frame_of(&mut bob_rx, "privateMessage").await.data["from"], "alice");
    let ack = frame_of(&mut alice_rx, "ack").await;
    assert_eq!(ack.data["targetId"], "conn-b");
}

#[tokio::test]
async fn test_authenticated_message_requires_token() {
    let node = TestNode::standalone("n1");

    let (alice, mut alice_rx) = node.connect("conn-a", "alice", None, Some("test-secret")).await;
    node.send(&alice, "authenticatedMessage", json!({"message": "hi"}))
        .await;
    let ack = frame_of(&mut alice_rx, "ack").await;
    assert_eq!(ack.data["accepted"], true);

    let (mallory, mut mallory_rx) = node.connect("conn-m", "mallory", None, None).await;
    node.send(&mallory, "authenticatedMessage", json!({"message": "hi"}))
        .await;
    let err = frame_of(&mut mallory_rx, "error").await;
    assert_eq!(err.data["code"], "AUTHENTICATION_ERROR");

    // The refused connection still works for open operations
    node.send(&mallory, "getOnlineUsers", json!(null)).await;
    let users = frame_of(&mut mallory_rx, "onlineUsers").await;
    assert_eq!(users.data["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_online_users_is_a_local_node_view() {
    let bus = ClusterBus::new();
    let node1 = TestNode::join(&bus, "n1");
    let node2 = TestNode::join(&bus, "n2");

    let (alice, mut alice_rx) = node1.connect("conn-a", "alice", None, None).await;
    let (_bob, _bob_rx) = node2.connect("conn-b", "bob", None, None).await;

    node1.send(&alice, "getOnlineUsers", json!(null)).await;

    let users = frame_of(&mut alice_rx, "onlineUsers").await;
    let list = users.data["users"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["displayName"], "alice");
}
