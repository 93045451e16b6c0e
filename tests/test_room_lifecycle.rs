use std::sync::Arc;

use helpline::models::{RoomStatus, SenderType};
use helpline::services::{MockPushProvider, MockTextGenerator};

mod helpers;
use helpers::*;

fn services(db: &helpline::Database) -> TestServices {
    build_services(
        db,
        Arc::new(MockTextGenerator::replying("How can I help?")),
        Arc::new(MockPushProvider::new()),
    )
}

#[tokio::test]
async fn create_room_starts_pending_with_bot_greeting() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;

    let (room, created) = svc
        .rooms
        .create_room(&customer, Some("refund".to_string()))
        .await
        .expect("Failed to create room");

    assert!(created);
    assert_eq!(room.status, RoomStatus::Pending);
    assert_eq!(room.subject, "refund");
    assert!(room.agent_id.is_none());
    assert!(room.room_id.starts_with("room_"));

    let messages = db.list_messages(&room.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_type, SenderType::Bot);
    assert!(messages[0].sender_id.is_none());
}

#[tokio::test]
async fn at_most_one_open_room_per_customer() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;

    let (first, created_first) = svc
        .rooms
        .create_room(&customer, Some("orders".to_string()))
        .await
        .unwrap();
    let (second, created_second) = svc
        .rooms
        .create_room(&customer, Some("something else".to_string()))
        .await
        .unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
    // The existing room comes back unchanged.
    assert_eq!(second.subject, "orders");

    // A second customer is unaffected.
    let other = create_customer(&db, "bob@example.com").await;
    let (_, created_other) = svc.rooms.create_room(&other, None).await.unwrap();
    assert!(created_other);
}

#[tokio::test]
async fn closing_frees_the_customer_for_a_new_room() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;

    let (first, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    svc.rooms.close_room(&first.room_id, &customer).await.unwrap();

    let (second, created) = svc.rooms.create_room(&customer, None).await.unwrap();
    assert!(created);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn new_room_notifies_every_active_staff_member() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent_a = create_staff(&db, "agent-a@example.com").await;
    let agent_b = create_staff(&db, "agent-b@example.com").await;
    let sleeping = create_inactive_staff(&db, "gone@example.com").await;

    svc.rooms.create_room(&customer, None).await.unwrap();

    assert_eq!(db.list_unread_notifications(&agent_a.id).await.unwrap().len(), 1);
    assert_eq!(db.list_unread_notifications(&agent_b.id).await.unwrap().len(), 1);
    assert!(db.list_unread_notifications(&sleeping.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn accepting_assigns_agent_and_announces_it() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;

    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    let accepted = svc.rooms.accept_room(&room.room_id, &agent).await.unwrap();

    assert_eq!(accepted.status, RoomStatus::Active);
    assert_eq!(accepted.agent_id.as_deref(), Some(agent.id.as_str()));

    let messages = db.list_messages(&room.id).await.unwrap();
    let announcement = messages.last().unwrap();
    assert_eq!(announcement.sender_type, SenderType::Bot);
    assert!(announcement.body.contains(&agent.username));

    // Stored row reflects the transition too.
    let fresh = db.get_room(&room.room_id).await.unwrap().unwrap();
    assert_eq!(fresh.status, RoomStatus::Active);
    assert_eq!(fresh.agent_id.as_deref(), Some(agent.id.as_str()));
}

#[tokio::test]
async fn accept_requires_staff_and_pending_status() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;
    let intruder = create_customer(&db, "mallory@example.com").await;

    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();

    let err = svc.rooms.accept_room(&room.room_id, &intruder).await.unwrap_err();
    assert!(matches!(err, helpline::ApiError::Forbidden(_)));

    svc.rooms.accept_room(&room.room_id, &agent).await.unwrap();

    // Already active: a second accept is an invalid transition.
    let err = svc.rooms.accept_room(&room.room_id, &agent).await.unwrap_err();
    assert!(matches!(err, helpline::ApiError::BadRequest(_)));
}

#[tokio::test]
async fn close_stamps_resolution_and_terminal_states_stay_terminal() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;

    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    svc.rooms.accept_room(&room.room_id, &agent).await.unwrap();

    let closed = svc.rooms.close_room(&room.room_id, &agent).await.unwrap();
    assert_eq!(closed.status, RoomStatus::Resolved);
    assert!(closed.resolved_at.is_some());

    let err = svc.rooms.close_room(&room.room_id, &customer).await.unwrap_err();
    assert!(matches!(err, helpline::ApiError::BadRequest(_)));
}

#[tokio::test]
async fn only_participants_can_close() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let outsider = create_customer(&db, "bob@example.com").await;

    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();

    let err = svc.rooms.close_room(&room.room_id, &outsider).await.unwrap_err();
    assert!(matches!(err, helpline::ApiError::Forbidden(_)));
}

#[tokio::test]
async fn closing_notifies_the_assigned_agent() {
    let db = setup_test_db().await;
    let svc = services(&db);
    let customer = create_customer(&db, "alice@example.com").await;
    let agent = create_staff(&db, "agent@example.com").await;

    let (room, _) = svc.rooms.create_room(&customer, None).await.unwrap();
    svc.rooms.accept_room(&room.room_id, &agent).await.unwrap();
    svc.rooms.close_room(&room.room_id, &customer).await.unwrap();

    let notifications = db.list_unread_notifications(&agent.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.kind == helpline::models::NotificationKind::Resolved
            && n.room_id == room.room_id));
}
