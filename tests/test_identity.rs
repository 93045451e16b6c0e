use helpline::models::Identity;
use helpline::services::IdentityService;

mod helpers;
use helpers::*;

#[tokio::test]
async fn valid_token_resolves_to_the_user() {
    let db = setup_test_db().await;
    let identity = IdentityService::new(db.clone());
    let user = create_customer(&db, "alice@example.com").await;
    let session = issue_session(&db, &user, 9).await;

    match identity.resolve(Some(&session.token)).await {
        Identity::Known(resolved) => assert_eq!(resolved.id, user.id),
        Identity::Anonymous => panic!("valid token resolved to anonymous"),
    }
}

#[tokio::test]
async fn every_failure_kind_resolves_to_anonymous() {
    let db = setup_test_db().await;
    let identity = IdentityService::new(db.clone());

    // No credential at all.
    assert!(matches!(identity.resolve(None).await, Identity::Anonymous));
    assert!(matches!(identity.resolve(Some("")).await, Identity::Anonymous));

    // Token nobody ever issued.
    assert!(matches!(
        identity.resolve(Some("deadbeef")).await,
        Identity::Anonymous
    ));

    // Expired session.
    let user = create_customer(&db, "alice@example.com").await;
    let expired = issue_session(&db, &user, -1).await;
    assert!(matches!(
        identity.resolve(Some(&expired.token)).await,
        Identity::Anonymous
    ));

    // Inactive user behind a live session.
    let sleeper = create_inactive_staff(&db, "gone@example.com").await;
    let session = issue_session(&db, &sleeper, 9).await;
    assert!(matches!(
        identity.resolve(Some(&session.token)).await,
        Identity::Anonymous
    ));
}
