use std::sync::Arc;

use rand::{SeedableRng, rngs::SmallRng};
use sea_orm::Database;

use engine::{DepositCmd, Engine, EngineError, Money, TransactionKind, UserCmd};
use migration::MigratorTrait;
use scheduler::{AccountSweepJob, Job, SignupJob, WithdrawSweepJob};

async fn engine() -> Arc<Engine> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Arc::new(Engine::builder().database(db).build().await.unwrap())
}

async fn funded_account(engine: &Engine, user_id: i64, minor: i64) -> engine::Account {
    let account = engine.create_account(user_id).await.unwrap();
    if minor > 0 {
        engine
            .deposit(DepositCmd::new(account.id, Money::new(minor)))
            .await
            .unwrap();
    }
    account
}

#[tokio::test]
async fn signup_creates_a_funded_user() {
    let engine = engine().await;
    let mut job = SignupJob::with_rng(Arc::clone(&engine), SmallRng::seed_from_u64(1));

    job.tick().await.unwrap();

    let users = engine.users().await.unwrap();
    assert_eq!(users.len(), 1);
    let user = &users[0];
    let n = user.username.strip_prefix("user_").unwrap();
    assert_eq!(user.email, format!("user_{n}@example.com"));

    let accounts = engine.user_accounts(user.id).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balance.minor(), n.parse::<i64>().unwrap() * 100);
    assert_eq!(accounts[0].balance.to_string(), format!("{n}.00"));
}

#[tokio::test]
async fn same_seed_reuses_names_and_fails_on_the_email() {
    let engine = engine().await;
    SignupJob::with_rng(Arc::clone(&engine), SmallRng::seed_from_u64(9))
        .tick()
        .await
        .unwrap();

    let err = SignupJob::with_rng(Arc::clone(&engine), SmallRng::seed_from_u64(9))
        .tick()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmailExists(_)));
    assert_eq!(engine.accounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn account_sweep_gives_every_user_one_more_account() {
    let engine = engine().await;
    for name in ["a", "b"] {
        engine
            .create_user(UserCmd::new(name, format!("{name}@x.com"), "pw"))
            .await
            .unwrap();
    }

    let mut job = AccountSweepJob::with_rng(Arc::clone(&engine), SmallRng::seed_from_u64(3));
    job.tick().await.unwrap();

    let accounts = engine.accounts().await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_ne!(accounts[0].user_id, accounts[1].user_id);
    assert!(accounts[0].balance.is_positive());
    assert_eq!(accounts[0].balance, accounts[1].balance);
}

#[tokio::test]
async fn withdraw_sweep_stops_at_the_first_failing_account() {
    let engine = engine().await;
    let user = engine
        .create_user(UserCmd::new("u1", "u1@x.com", "pw"))
        .await
        .unwrap();
    let rich = funded_account(&engine, user.id, 1_000_000).await;
    let empty = funded_account(&engine, user.id, 0).await;
    let untouched = funded_account(&engine, user.id, 1_000_000).await;

    let mut job = WithdrawSweepJob::with_rng(Arc::clone(&engine), SmallRng::seed_from_u64(5));
    let err = job.tick().await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    let rich_balance = engine.account_balance(&rich.id_number).await.unwrap();
    assert!(rich_balance < Money::new(1_000_000));
    assert!(rich_balance.is_positive());
    assert_eq!(
        engine.account_balance(&empty.id_number).await.unwrap(),
        Money::ZERO
    );
    assert_eq!(
        engine.account_balance(&untouched.id_number).await.unwrap(),
        Money::new(1_000_000)
    );

    let withdrawals = engine
        .account_transactions(&rich.id_number)
        .await
        .unwrap()
        .into_iter()
        .filter(|tx| tx.kind == TransactionKind::Withdraw)
        .count();
    assert_eq!(withdrawals, 1);
}
