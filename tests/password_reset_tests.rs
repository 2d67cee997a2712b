use altauth::{
    repositories::{SqliteUserRepository, UserRepository},
    services::{AccountService, AccountServiceError, MockEmailService, Notifier},
    test_utils::test_helpers,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

fn build_service(pool: &sqlx::SqlitePool) -> (AccountService, Arc<SqliteUserRepository>) {
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let notifier = Notifier::spawn(Box::new(MockEmailService::new("http://localhost:3000")));
    let service = AccountService::new(repository.clone(), notifier, 2).unwrap();
    (service, repository)
}

#[tokio::test]
async fn forgot_password_attaches_challenge() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();

    let stored = repository.find_by_email("a@x.com").await.unwrap().unwrap();
    let token = stored.reset_token.unwrap();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let expires = DateTime::parse_from_rfc3339(&stored.reset_expires.unwrap()).unwrap();
    let remaining = expires.with_timezone(&Utc) - Utc::now();
    assert!(remaining > Duration::minutes(59));
    assert!(remaining <= Duration::hours(1));
}

#[tokio::test]
async fn forgot_password_unknown_email_is_not_found() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, _) = build_service(&pool);

    let result = service.forgot_password("ghost@x.com").await;
    assert!(matches!(result, Err(AccountServiceError::UserNotFound)));
}

#[tokio::test]
async fn reset_rotates_password_and_clears_challenge() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let token = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    service
        .reset_password(&token, "NewSecret456!")
        .await
        .unwrap();

    // Both reset columns cleared together.
    let stored = repository.find_by_email("a@x.com").await.unwrap().unwrap();
    assert!(stored.reset_token.is_none());
    assert!(stored.reset_expires.is_none());

    // The old password no longer authenticates; the new one does.
    let result = service.login("a@x.com", "Secret123!").await;
    assert!(matches!(
        result,
        Err(AccountServiceError::InvalidCredentials)
    ));
    service.login("a@x.com", "NewSecret456!").await.unwrap();
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let token = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    service
        .reset_password(&token, "NewSecret456!")
        .await
        .unwrap();

    let result = service.reset_password(&token, "Another789!").await;
    assert!(matches!(result, Err(AccountServiceError::InvalidToken)));
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let token = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    test_helpers::expire_reset_challenge(&pool, "a@x.com")
        .await
        .unwrap();

    // Value still matches, expiry does not.
    let result = service.reset_password(&token, "NewSecret456!").await;
    assert!(matches!(result, Err(AccountServiceError::InvalidToken)));

    // The old password is untouched.
    service.login("a@x.com", "Secret123!").await.unwrap();
}

#[tokio::test]
async fn new_challenge_replaces_a_pending_one() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let first = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let second = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .unwrap();

    assert_ne!(first, second);

    // The superseded token no longer matches anything.
    let result = service.reset_password(&first, "NewSecret456!").await;
    assert!(matches!(result, Err(AccountServiceError::InvalidToken)));

    service.reset_password(&second, "NewSecret456!").await.unwrap();
}
