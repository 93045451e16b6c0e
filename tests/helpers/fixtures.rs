use helpline::database::Database;
use helpline::models::{Session, User};

pub async fn create_customer(db: &Database, email: &str) -> User {
    let user = User::new(email.to_string(), email.split('@').next().unwrap().to_string(), false);
    db.create_user(&user).await.expect("Failed to create customer");
    user
}

pub async fn create_staff(db: &Database, email: &str) -> User {
    let user = User::new(email.to_string(), email.split('@').next().unwrap().to_string(), true);
    db.create_user(&user).await.expect("Failed to create staff user");
    user
}

pub async fn create_inactive_staff(db: &Database, email: &str) -> User {
    let mut user = User::new(email.to_string(), "inactive".to_string(), true);
    user.is_active = false;
    db.create_user(&user).await.expect("Failed to create user");
    user
}

pub async fn create_customer_with_token(db: &Database, email: &str, fcm_token: &str) -> User {
    let mut user = User::new(email.to_string(), email.split('@').next().unwrap().to_string(), false);
    user.fcm_token = Some(fcm_token.to_string());
    db.create_user(&user).await.expect("Failed to create customer");
    user
}

pub async fn create_staff_with_token(db: &Database, email: &str, fcm_token: &str) -> User {
    let mut user = User::new(email.to_string(), email.split('@').next().unwrap().to_string(), true);
    user.fcm_token = Some(fcm_token.to_string());
    db.create_user(&user).await.expect("Failed to create staff user");
    user
}

pub async fn issue_session(db: &Database, user: &User, duration_hours: i64) -> Session {
    let session = Session::new(user.id.clone(), duration_hours);
    db.create_session(&session).await.expect("Failed to create session");
    session
}
