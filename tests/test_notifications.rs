use std::sync::Arc;

use tokio::sync::mpsc;

use helpline::models::NotificationKind;
use helpline::services::{MockPushProvider, MockTextGenerator};
use helpline::ws::hub::notification_group;

mod helpers;
use helpers::*;

fn services(db: &helpline::Database, push_fails: bool) -> TestServices {
    let push = if push_fails {
        Arc::new(MockPushProvider::new_failing())
    } else {
        Arc::new(MockPushProvider::new())
    };
    build_services(db, Arc::new(MockTextGenerator::replying("ok")), push)
}

#[tokio::test]
async fn record_persists_even_when_push_delivery_fails() {
    let db = setup_test_db().await;
    let svc = services(&db, true);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff_with_token(&db, "agent@example.com", "device-999").await;
    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    svc.notifier.mark_all_read(&agent.id).await.unwrap();

    let notification = svc
        .notifier
        .notify(&agent, NotificationKind::Message, "ping".to_string(), &room)
        .await
        .expect("push failure must not fail notify");

    let stored = db
        .get_notification_by_id(&notification.id)
        .await
        .unwrap()
        .expect("durable record missing");
    assert_eq!(stored.agent_id, agent.id);
    assert_eq!(stored.room_id, room.room_id);
    assert!(!stored.is_read);
}

#[tokio::test]
async fn notify_broadcasts_to_the_agents_stream() {
    let db = setup_test_db().await;
    let svc = services(&db, false);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;
    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    svc.hub.join(&notification_group(&agent.id), "agent-tab", tx).await;

    svc.notifier
        .notify(&agent, NotificationKind::Assigned, "room handed over".to_string(), &room)
        .await
        .unwrap();

    let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame["type"], "notification");
    assert_eq!(frame["notification_type"], "assigned");
    assert_eq!(frame["message"], "room handed over");
    assert_eq!(frame["room_id"], room.room_id.as_str());
    assert!(frame["timestamp"].is_string());
}

#[tokio::test]
async fn offline_agents_still_get_the_durable_record() {
    let db = setup_test_db().await;
    let svc = services(&db, false);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;
    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();

    // Nobody is connected to the agent's stream; the row persists anyway.
    let unread = db.list_unread_notifications(&agent.id).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind, NotificationKind::NewRequest);
    assert_eq!(unread[0].room_id, room.room_id);
}

#[tokio::test]
async fn staff_fanout_reaches_each_active_agent_independently() {
    let db = setup_test_db().await;
    let svc = services(&db, true); // broken push everywhere
    let customer = create_customer_with_token(&db, "alice@example.com", "c-token").await;
    let agent_a = create_staff_with_token(&db, "a@example.com", "a-token").await;
    let agent_b = create_staff(&db, "b@example.com").await;
    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    svc.notifier.mark_all_read(&agent_a.id).await.unwrap();
    svc.notifier.mark_all_read(&agent_b.id).await.unwrap();

    let delivered = svc
        .notifier
        .notify_all_staff(NotificationKind::NewRequest, "escalated", &room)
        .await
        .unwrap();

    assert_eq!(delivered, 2);
    assert_eq!(db.list_unread_notifications(&agent_a.id).await.unwrap().len(), 1);
    assert_eq!(db.list_unread_notifications(&agent_b.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn mark_all_read_scopes_to_one_agent() {
    let db = setup_test_db().await;
    let svc = services(&db, false);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent_a = create_staff(&db, "a@example.com").await;
    let agent_b = create_staff(&db, "b@example.com").await;
    svc.rooms.create_room(&customer, None).await.unwrap();

    let flipped = svc.notifier.mark_all_read(&agent_a.id).await.unwrap();
    assert_eq!(flipped, 1);

    assert!(db.list_unread_notifications(&agent_a.id).await.unwrap().is_empty());
    assert_eq!(db.list_unread_notifications(&agent_b.id).await.unwrap().len(), 1);
}
