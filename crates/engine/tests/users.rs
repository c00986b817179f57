use sea_orm::Database;

use engine::{Engine, EngineError};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .password_cost(4)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn register_normalizes_and_login_verifies() {
    let engine = engine_with_db().await;

    let user = engine
        .register_user("  Alice ", " Alice@Example.COM ", "hunter2")
        .await
        .unwrap();
    assert_eq!(user.name, "Alice");
    assert_eq!(user.email, "alice@example.com");

    let logged = engine
        .verify_credentials("ALICE@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(logged.id, user.id);

    let found = engine.user_by_id(user.id).await.unwrap();
    assert_eq!(found.map(|u| u.email), Some("alice@example.com".to_string()));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let engine = engine_with_db().await;
    engine
        .register_user("Alice", "alice@example.com", "one")
        .await
        .unwrap();

    let err = engine
        .register_user("Other", "ALICE@example.com", "two")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice@example.com".to_string()));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let engine = engine_with_db().await;
    engine
        .register_user("Alice", "alice@example.com", "right")
        .await
        .unwrap();

    let wrong = engine
        .verify_credentials("alice@example.com", "wrong")
        .await
        .unwrap_err();
    let unknown = engine
        .verify_credentials("nobody@example.com", "right")
        .await
        .unwrap_err();
    assert_eq!(wrong, EngineError::InvalidCredentials);
    assert_eq!(unknown, EngineError::InvalidCredentials);
}

#[tokio::test]
async fn registration_validates_input() {
    let engine = engine_with_db().await;

    for (name, email, password) in [
        ("", "a@b.c", "pw"),
        ("A", "not-an-email", "pw"),
        ("A", "a@b.c", ""),
    ] {
        let err = engine.register_user(name, email, password).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "{err:?}");
    }
}

#[tokio::test]
async fn unknown_user_id_is_none() {
    let engine = engine_with_db().await;
    assert_eq!(engine.user_by_id(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn builder_rejects_out_of_range_cost() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let result = Engine::builder()
        .database(db.clone())
        .password_cost(1)
        .build()
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    let result = Engine::builder()
        .database(db.clone())
        .password_cost(32)
        .build()
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    assert!(Engine::builder().database(db).password_cost(31).build().await.is_ok());
}
