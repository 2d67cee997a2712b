use altauth::{
    repositories::{SqliteUserRepository, UserRepository},
    services::{AccountService, AccountServiceError, MockEmailService, Notifier},
    test_utils::test_helpers,
};
use std::sync::Arc;

fn build_service(pool: &sqlx::SqlitePool) -> (AccountService, Arc<SqliteUserRepository>) {
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let notifier = Notifier::spawn(Box::new(MockEmailService::new("http://localhost:3000")));
    let service = AccountService::new(repository.clone(), notifier, 2).unwrap();
    (service, repository)
}

#[tokio::test]
async fn login_success_updates_last_login() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    let before = repository
        .find_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap()
        .last_login;

    let user = service.login("a@x.com", "Secret123!").await.unwrap();
    assert!(user.last_login >= before);

    let stored = repository.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(stored.last_login, user.last_login);
}

#[tokio::test]
async fn login_wrong_password_leaves_record_untouched() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, repository) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    let before = repository.find_by_email("a@x.com").await.unwrap().unwrap();

    let result = service.login("a@x.com", "WrongPassword").await;
    assert!(matches!(
        result,
        Err(AccountServiceError::InvalidCredentials)
    ));

    let after = repository.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(after.password_hash, before.password_hash);
    assert_eq!(after.last_login, before.last_login);
}

#[tokio::test]
async fn login_unknown_email_is_not_found() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, _) = build_service(&pool);

    let result = service.login("ghost@x.com", "whatever").await;
    assert!(matches!(result, Err(AccountServiceError::UserNotFound)));
}

#[tokio::test]
async fn login_blank_fields_are_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, _) = build_service(&pool);

    let result = service.login("", "Secret123!").await;
    assert!(matches!(result, Err(AccountServiceError::MissingFields)));

    let result = service.login("a@x.com", "").await;
    assert!(matches!(result, Err(AccountServiceError::MissingFields)));
}

#[tokio::test]
async fn login_matches_email_case_insensitively() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let (service, _) = build_service(&pool);

    test_helpers::insert_test_user(&pool, "Ann", "a@x.com", "Secret123!", true)
        .await
        .unwrap();

    let user = service.login("A@X.COM", "Secret123!").await.unwrap();
    assert_eq!(user.email, "a@x.com");
}
