use std::sync::Arc;

use sea_orm::Database;

use engine::{Engine, EngineError, ErrorKind, UserCmd, verify_password};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn create_user_trims_and_hashes() {
    let engine = engine().await;
    let user = engine
        .create_user(UserCmd::new("  u1 ", " u1@x.com", "plain-secret"))
        .await
        .unwrap();
    assert_eq!(user.username, "u1");
    assert_eq!(user.email, "u1@x.com");

    let hash = engine.password_hash(user.id).await.unwrap();
    assert_ne!(hash, "plain-secret");
    assert!(verify_password(&hash, "plain-secret").unwrap());

    let fetched = engine.user(user.id).await.unwrap();
    assert_eq!((fetched.id, fetched.email), (user.id, user.email));
}

#[tokio::test]
async fn duplicate_email_creates_no_row() {
    let engine = engine().await;
    engine
        .create_user(UserCmd::new("u1", "u1@x.com", "a"))
        .await
        .unwrap();

    let err = engine
        .create_user(UserCmd::new("other", "u1@x.com", "b"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::EmailExists("u1@x.com".to_string()));
    assert_eq!(engine.users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn blank_fields_are_invalid_input() {
    let engine = engine().await;
    for cmd in [
        UserCmd::new("", "a@b.c", "pw"),
        UserCmd::new("a", "   ", "pw"),
        UserCmd::new("a", "a@b.c", ""),
    ] {
        let err = engine.create_user(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert!(engine.users().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_user_rehashes_and_overwrites() {
    let engine = engine().await;
    let user = engine
        .create_user(UserCmd::new("u1", "u1@x.com", "old"))
        .await
        .unwrap();
    let old_hash = engine.password_hash(user.id).await.unwrap();

    engine
        .update_user(user.id, UserCmd::new("u1b", "u1b@x.com", "old"))
        .await
        .unwrap();

    let updated = engine.user(user.id).await.unwrap();
    assert_eq!(updated.username, "u1b");
    assert_eq!(updated.email, "u1b@x.com");
    let new_hash = engine.password_hash(user.id).await.unwrap();
    assert_ne!(new_hash, old_hash);
    assert!(verify_password(&new_hash, "old").unwrap());
}

#[tokio::test]
async fn update_to_taken_email_is_rejected_by_the_store() {
    let engine = engine().await;
    engine
        .create_user(UserCmd::new("u1", "u1@x.com", "a"))
        .await
        .unwrap();
    let second = engine
        .create_user(UserCmd::new("u2", "u2@x.com", "b"))
        .await
        .unwrap();

    let err = engine
        .update_user(second.id, UserCmd::new("u2", "u1@x.com", "b"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmailExists);
    assert_eq!(engine.user(second.id).await.unwrap().email, "u2@x.com");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let engine = engine().await;
    assert!(matches!(
        engine.user(9).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine
            .update_user(9, UserCmd::new("x", "x@x.com", "x"))
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn user_accounts_lists_only_own_accounts() {
    let engine = engine().await;
    let u1 = engine
        .create_user(UserCmd::new("u1", "u1@x.com", "a"))
        .await
        .unwrap();
    let u2 = engine
        .create_user(UserCmd::new("u2", "u2@x.com", "b"))
        .await
        .unwrap();
    assert!(engine.user_accounts(u1.id).await.unwrap().is_empty());

    let a1 = engine.create_account(u1.id).await.unwrap();
    engine.create_account(u2.id).await.unwrap();

    let owned: Vec<_> = engine
        .user_accounts(u1.id)
        .await
        .unwrap()
        .into_iter()
        .map(|account| account.id_number)
        .collect();
    assert_eq!(owned, vec![a1.id_number]);
    assert!(engine.user_accounts(404).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_signups_hash_independently() {
    let engine = Arc::new(engine().await);
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..4 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .create_user(UserCmd::new(format!("u{i}"), format!("u{i}@x.com"), "same"))
                .await
        });
    }

    let mut hashes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let user = joined.unwrap().unwrap();
        let hash = engine.password_hash(user.id).await.unwrap();
        assert!(verify_password(&hash, "same").unwrap());
        hashes.push(hash);
    }
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), 4);
}
