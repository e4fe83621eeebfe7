use std::sync::Arc;

use engine::{DepositCmd, Engine, Money, ResultEngine, UserCmd, WithdrawCmd};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::Job;

/// Minor units in one whole currency unit.
const MINOR_PER_UNIT: i64 = 100;

/// Upper bound (exclusive) of a swept withdrawal, in minor units.
const MAX_WITHDRAW_MINOR: i64 = 1_000_000;

fn deposit_amount(rng: &mut SmallRng) -> Money {
    Money::new(i64::from(rng.gen_range(1..=u32::MAX)))
}

/// Signs up a new random user with one account funded with `n` whole units,
/// `n` being the random suffix of the user name.
pub struct SignupJob {
    engine: Arc<Engine>,
    rng: SmallRng,
}

impl SignupJob {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_rng(engine, SmallRng::from_entropy())
    }

    pub fn with_rng(engine: Arc<Engine>, rng: SmallRng) -> Self {
        Self { engine, rng }
    }
}

impl Job for SignupJob {
    fn name(&self) -> &'static str {
        "signup"
    }

    async fn tick(&mut self) -> ResultEngine<()> {
        let n: u32 = self.rng.gen_range(1..=u32::MAX);
        let username = format!("user_{n}");
        let cmd = UserCmd::new(
            username.as_str(),
            format!("{username}@example.com"),
            format!("password_{n}"),
        );

        let user = self.engine.create_user(cmd).await?;
        let account = self.engine.create_account(user.id).await?;
        let amount = Money::new(i64::from(n) * MINOR_PER_UNIT);
        let receipt = self
            .engine
            .deposit(DepositCmd::new(account.id, amount))
            .await?;

        tracing::info!(
            job = self.name(),
            %username,
            id_number = %account.id_number,
            transaction_id = receipt.transaction_id,
            balance = %receipt.balance,
            "deposited {amount}"
        );
        Ok(())
    }
}

/// Opens one more funded account for every user. All deposits of a run use
/// the same amount.
pub struct AccountSweepJob {
    engine: Arc<Engine>,
    rng: SmallRng,
}

impl AccountSweepJob {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_rng(engine, SmallRng::from_entropy())
    }

    pub fn with_rng(engine: Arc<Engine>, rng: SmallRng) -> Self {
        Self { engine, rng }
    }
}

impl Job for AccountSweepJob {
    fn name(&self) -> &'static str {
        "account_sweep"
    }

    async fn tick(&mut self) -> ResultEngine<()> {
        let amount = deposit_amount(&mut self.rng);
        for user in self.engine.users().await? {
            let account = self.engine.create_account(user.id).await?;
            let receipt = self
                .engine
                .deposit(DepositCmd::new(account.id, amount))
                .await?;
            tracing::info!(
                job = self.name(),
                id_number = %account.id_number,
                transaction_id = receipt.transaction_id,
                balance = %receipt.balance,
                "deposited {amount}"
            );
        }
        Ok(())
    }
}

/// Withdraws the same random amount from every account. The first account
/// that cannot pay ends the run.
pub struct WithdrawSweepJob {
    engine: Arc<Engine>,
    rng: SmallRng,
}

impl WithdrawSweepJob {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_rng(engine, SmallRng::from_entropy())
    }

    pub fn with_rng(engine: Arc<Engine>, rng: SmallRng) -> Self {
        Self { engine, rng }
    }
}

impl Job for WithdrawSweepJob {
    fn name(&self) -> &'static str {
        "withdraw_sweep"
    }

    async fn tick(&mut self) -> ResultEngine<()> {
        let amount = Money::new(self.rng.gen_range(1..MAX_WITHDRAW_MINOR));
        for account in self.engine.accounts().await? {
            let receipt = self
                .engine
                .withdraw(WithdrawCmd::new(account.id_number.as_str(), amount))
                .await?;
            tracing::info!(
                job = self.name(),
                id_number = %account.id_number,
                transaction_id = receipt.transaction_id,
                balance = %receipt.balance,
                "withdrew {amount}"
            );
        }
        Ok(())
    }
}
