use std::error::Error;

use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{CreateTransactionCmd, Engine, EngineError, Money};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "pennywise_admin")]
#[command(about = "Admin utilities for Pennywise (users, sessions, maintenance)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pennywise.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Session(Session),
    Transaction(Transaction),
    /// Recompute every account balance of a user from its transactions.
    Reconcile(ReconcileArgs),
    /// Look for recurring charges in an account's history.
    Detect(DetectArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct Session {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Print a new bearer token for the user.
    Issue(SessionIssueArgs),
}

#[derive(Args, Debug)]
struct SessionIssueArgs {
    #[arg(long)]
    email: String,
    /// Days until the token expires.
    #[arg(long, default_value_t = 30)]
    days: i64,
}

#[derive(Args, Debug)]
struct Transaction {
    #[command(subcommand)]
    command: TransactionCommand,
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// Record a transaction on one of the user's accounts.
    Add(TransactionAddArgs),
}

#[derive(Args, Debug)]
struct TransactionAddArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    account: Uuid,
    /// Decimal amount such as `-12.34` or `250,00`; negative for outflows.
    #[arg(long, allow_hyphen_values = true)]
    amount: Money,
    #[arg(long)]
    description: String,
    /// Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    account: Uuid,
    /// Start tracking the detected payments.
    #[arg(long)]
    track: bool,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn find_user(
    engine: &Engine,
    email: &str,
) -> Result<engine::User, Box<dyn Error + Send + Sync>> {
    match engine.user_by_email(email).await {
        Ok(user) => Ok(user),
        Err(EngineError::KeyNotFound(_)) => {
            eprintln!("user not found: {email}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => match engine.create_user(&args.email, args.name.as_deref()).await {
            Ok(user) => println!("created user: {} ({})", user.email, user.id),
            Err(EngineError::ExistingKey(_)) => {
                eprintln!("user already exists: {}", args.email);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Session(Session {
            command: SessionCommand::Issue(args),
        }) => {
            if args.days <= 0 {
                eprintln!("--days must be positive");
                std::process::exit(2);
            }
            let user = find_user(&engine, &args.email).await?;
            let token = engine
                .issue_session(user.id, Duration::days(args.days))
                .await?;
            println!("{token}");
        }
        Command::Transaction(Transaction {
            command: TransactionCommand::Add(args),
        }) => {
            let user = find_user(&engine, &args.email).await?;
            let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
            let transaction = engine
                .create_transaction(
                    user.id,
                    CreateTransactionCmd::new(
                        args.account,
                        args.amount.minor(),
                        args.description,
                        date,
                    ),
                )
                .await?;
            println!(
                "recorded {} on {} ({})",
                Money::new(transaction.amount_minor),
                transaction.transaction_date,
                transaction.id
            );
        }
        Command::Reconcile(args) => {
            let user = find_user(&engine, &args.email).await?;
            for (account_id, balance) in engine.reconcile_all(user.id).await? {
                println!("{account_id}\t{balance}");
            }
        }
        Command::Detect(args) => {
            let user = find_user(&engine, &args.email).await?;
            let today = Utc::now().date_naive();
            if args.track {
                let tracked = engine
                    .track_detected_payments(args.account, user.id, today)
                    .await?;
                for payment in &tracked {
                    println!(
                        "tracking {} ({}), next due {}",
                        payment.name, payment.id, payment.next_due_date
                    );
                }
                println!("{} payment(s) tracked", tracked.len());
            } else {
                let patterns = engine
                    .detect_recurring_payments(args.account, user.id, today)
                    .await?;
                for pattern in &patterns {
                    println!(
                        "{}\t{}\t{}\tconfidence {:.2}\tnext {}",
                        pattern.display_name,
                        pattern.frequency.as_str(),
                        pattern.typical_amount_minor,
                        pattern.confidence,
                        pattern.next_due_date
                    );
                }
                println!("{} pattern(s) found", patterns.len());
            }
        }
    }

    Ok(())
}
