use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Account, DepositCmd, Engine, Money, UserCmd, WithdrawCmd};
use migration::MigratorTrait;
use sea_orm::Database;

mod prompt;

pub(crate) type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "bank_admin")]
#[command(about = "Operator utilities for the bank (users, accounts, cash)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./bank.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Account(AccountArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user; the password is asked on the terminal.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    List,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create {
        #[arg(long)]
        user_id: i64,
    },
    List,
    Deposit(Movement),
    Withdraw(Movement),
}

#[derive(Args, Debug)]
struct Movement {
    #[arg(long)]
    id_number: String,
    /// Decimal amount, e.g. `12.50` or `12,50`.
    #[arg(long)]
    amount: Money,
    #[arg(long, default_value = "")]
    detail: String,
}

fn print_account(account: &Account) {
    println!(
        "{}\tuser {}\t{}",
        account.id_number, account.user_id, account.balance
    );
}

async fn run(cli: Cli) -> CliResult<()> {
    let db = Database::connect(cli.database_url.as_str()).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create { username, email },
        }) => {
            let password = prompt::new_password()?;
            let user = engine
                .create_user(UserCmd::new(username, email, password))
                .await?;
            println!("created user {} ({})", user.id, user.email);
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in engine.users().await? {
                println!("{}\t{}\t{}", user.id, user.username, user.email);
            }
        }
        Command::Account(AccountArgs { command }) => match command {
            AccountCommand::Create { user_id } => {
                let account = engine.create_account(user_id).await?;
                println!("created account {}", account.id_number);
            }
            AccountCommand::List => {
                for account in engine.accounts().await? {
                    print_account(&account);
                }
            }
            AccountCommand::Deposit(movement) => {
                let account = engine.account_by_id_number(&movement.id_number).await?;
                let receipt = engine
                    .deposit(DepositCmd::new(account.id, movement.amount).detail(movement.detail))
                    .await?;
                println!(
                    "transaction {}: balance {}",
                    receipt.transaction_id, receipt.balance
                );
            }
            AccountCommand::Withdraw(movement) => {
                let receipt = engine
                    .withdraw(
                        WithdrawCmd::new(movement.id_number, movement.amount)
                            .detail(movement.detail),
                    )
                    .await?;
                println!(
                    "transaction {}: balance {}",
                    receipt.transaction_id, receipt.balance
                );
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
