//! PalPay command line
//!
//! Thin front end over `PalPayClient`. Results go to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use palpay_client::models::{NewActivity, NewExpense, NewPayment, NewUser};
use palpay_client::{LedgerCache, PalPayClient, SettlementStrategy, DEFAULT_API_URL};

#[derive(Debug, Parser)]
#[command(name = "palpay", version, about = "Split expenses and settle up")]
struct Cli {
    /// Base URL of the PalPay API
    #[arg(long, env = "PALPAY_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server is up
    Health,
    /// Manage users
    #[command(subcommand)]
    Users(UserCommand),
    /// Manage activities
    #[command(subcommand)]
    Activities(ActivityCommand),
    /// Manage expenses
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    /// Manage payments
    #[command(subcommand)]
    Payments(PaymentCommand),
    /// Who owes whom
    Balances {
        #[arg(long, value_enum, default_value_t = SettlementStrategy::Minimal)]
        strategy: SettlementStrategy,
    },
    /// Net position of every user
    Net,
    /// Settle a single activity
    Settlements { activity_id: Uuid },
    /// Recent ledger changes, newest first
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    List,
    Show { id: Uuid },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        payment_details: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ActivityCommand {
    List,
    Show { id: Uuid },
    Add {
        #[arg(long)]
        name: String,
        /// Participant user id (repeatable)
        #[arg(long = "participant")]
        participants: Vec<Uuid>,
        /// Add every registered user as a participant
        #[arg(long, conflicts_with = "participants")]
        all_users: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ExpenseCommand {
    List,
    Show { id: Uuid },
    Add(AddExpense),
}

#[derive(Debug, Args)]
struct AddExpense {
    #[arg(long, allow_negative_numbers = true)]
    amount: Decimal,
    #[arg(long)]
    paid_by: Uuid,
    #[arg(long)]
    activity: Uuid,
    /// Participant user id (repeatable)
    #[arg(long = "participant")]
    participants: Vec<Uuid>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Subcommand)]
enum PaymentCommand {
    List,
    Show { id: Uuid },
    Add {
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,palpay=info,palpay_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = PalPayClient::new(&cli.api_url).context("Failed to build HTTP client")?;
    tracing::debug!(api_url = client.base_url(), "Using API");

    run(&client, cli.command, cli.json).await
}

async fn run(client: &PalPayClient, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Health => {
            let health = client.health().await?;
            print(json, &health, || format!("{} (v{})", health.status, health.version))?;
        }
        Command::Users(cmd) => users(client, cmd, json).await?,
        Command::Activities(cmd) => activities(client, cmd, json).await?,
        Command::Expenses(cmd) => expenses(client, cmd, json).await?,
        Command::Payments(cmd) => payments(client, cmd, json).await?,
        Command::Balances { strategy } => {
            let mut cache = LedgerCache::new();
            let balances = cache.balances_or_fetch(client, strategy).await?;
            print(json, &balances, || format_balances(balances))?;
        }
        Command::Net => {
            let nets = client.net_balances().await?;
            print(json, &nets, || {
                nets.iter()
                    .map(|n| format!("{:<20} {:>10}", n.user.name, n.net))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Settlements { activity_id } => {
            let settlements = client.settlements(activity_id).await?;
            let cache = LedgerCache::load(client).await?;
            print(json, &settlements, || {
                let lines: Vec<String> = settlements
                    .iter()
                    .flat_map(|(debtor, creditors)| {
                        creditors.iter().map(|(creditor, amount)| {
                            format!(
                                "{} owes {} {}",
                                cache.user_name(debtor),
                                cache.user_name(creditor),
                                amount
                            )
                        })
                    })
                    .collect();
                or_nothing(lines.join("\n"), "All settled")
            })?;
        }
        Command::Audit { limit } => {
            let logs = client.audit_logs(limit).await?;
            print(json, &logs, || {
                logs.iter()
                    .map(|l| {
                        format!(
                            "{}  {} {} {}",
                            l.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            l.action,
                            l.entity_type,
                            l.entity_id
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
    }

    Ok(())
}

async fn users(client: &PalPayClient, cmd: UserCommand, json: bool) -> Result<()> {
    match cmd {
        UserCommand::List => {
            let users = client.list_users().await?;
            print(json, &users, || {
                users
                    .iter()
                    .map(|u| format!("{}  {:<20} {}", u.id, u.name, u.email))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        UserCommand::Show { id } => {
            let user = client.get_user(id).await?;
            print(json, &user, || {
                let details = user.payment_details.as_deref().unwrap_or("-");
                format!("{} <{}>\npayment details: {}", user.name, user.email, details)
            })?;
        }
        UserCommand::Add {
            name,
            email,
            payment_details,
        } => {
            let user = client
                .create_user(&NewUser {
                    name,
                    email,
                    payment_details,
                })
                .await?;
            tracing::info!(user_id = %user.id, "User created");
            print(json, &user, || format!("Created user {} ({})", user.name, user.id))?;
        }
    }
    Ok(())
}

async fn activities(client: &PalPayClient, cmd: ActivityCommand, json: bool) -> Result<()> {
    match cmd {
        ActivityCommand::List => {
            let cache = LedgerCache::load(client).await?;
            let activities = cache.activities();
            print(json, &activities, || {
                activities
                    .iter()
                    .map(|a| format!("{}  {}  [{}]", a.id, a.name, names(&cache, &a.participants)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ActivityCommand::Show { id } => {
            let activity = client.get_activity(id).await?;
            let cache = LedgerCache::load(client).await?;
            print(json, &activity, || {
                format!(
                    "{}\nparticipants: {}",
                    activity.name,
                    names(&cache, &activity.participants)
                )
            })?;
        }
        ActivityCommand::Add {
            name,
            participants,
            all_users,
        } => {
            let participants = if all_users {
                client
                    .list_users()
                    .await?
                    .into_iter()
                    .map(|u| u.id)
                    .collect()
            } else {
                participants
            };
            let activity = client
                .create_activity(&NewActivity { name, participants })
                .await?;
            tracing::info!(activity_id = %activity.id, "Activity created");
            print(json, &activity, || {
                format!("Created activity {} ({})", activity.name, activity.id)
            })?;
        }
    }
    Ok(())
}

async fn expenses(client: &PalPayClient, cmd: ExpenseCommand, json: bool) -> Result<()> {
    match cmd {
        ExpenseCommand::List => {
            let cache = LedgerCache::load(client).await?;
            let expenses = cache.expenses();
            print(json, &expenses, || {
                expenses
                    .iter()
                    .map(|e| {
                        format!(
                            "{}  {:>10} paid by {:<12} {}",
                            e.id,
                            e.amount,
                            cache.user_name(&e.paid_by_user_id),
                            e.description.as_deref().unwrap_or("")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ExpenseCommand::Show { id } => {
            let expense = client.get_expense(id).await?;
            let cache = LedgerCache::load(client).await?;
            print(json, &expense, || {
                let mut lines = vec![format!(
                    "{} paid by {}",
                    expense.amount,
                    cache.user_name(&expense.paid_by_user_id)
                )];
                lines.extend(
                    expense
                        .shares
                        .iter()
                        .map(|s| format!("  {:<20} {:>10}", cache.user_name(&s.user_id), s.amount)),
                );
                lines.join("\n")
            })?;
        }
        ExpenseCommand::Add(add) => {
            let mut cache = LedgerCache::load(client).await?;
            let expense = client
                .create_expense(&NewExpense {
                    amount: add.amount,
                    paid_by_user_id: add.paid_by,
                    activity_id: add.activity,
                    participants: add.participants,
                    description: add.description,
                })
                .await?;
            tracing::info!(expense_id = %expense.id, "Expense recorded");
            print(json, &expense, || {
                format!("Recorded expense {} of {}", expense.id, expense.amount)
            })?;

            cache.merge_expense(expense);
            show_balances(client, &mut cache, json).await?;
        }
    }
    Ok(())
}

async fn payments(client: &PalPayClient, cmd: PaymentCommand, json: bool) -> Result<()> {
    match cmd {
        PaymentCommand::List => {
            let cache = LedgerCache::load(client).await?;
            let payments = cache.payments();
            print(json, &payments, || {
                payments
                    .iter()
                    .map(|p| {
                        format!(
                            "{}  {} -> {} {}",
                            p.id,
                            cache.user_name(&p.from_user_id),
                            cache.user_name(&p.to_user_id),
                            p.amount
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        PaymentCommand::Show { id } => {
            let payment = client.get_payment(id).await?;
            print(json, &payment, || {
                format!(
                    "{} -> {} {}",
                    payment.from_user_id, payment.to_user_id, payment.amount
                )
            })?;
        }
        PaymentCommand::Add { amount, from, to } => {
            let mut cache = LedgerCache::load(client).await?;
            let payment = client
                .create_payment(&NewPayment {
                    amount,
                    from_user_id: from,
                    to_user_id: to,
                })
                .await?;
            tracing::info!(payment_id = %payment.id, "Payment recorded");
            print(json, &payment, || {
                format!(
                    "Recorded payment of {} from {} to {}",
                    payment.amount,
                    cache.user_name(&payment.from_user_id),
                    cache.user_name(&payment.to_user_id)
                )
            })?;

            cache.merge_payment(payment);
            show_balances(client, &mut cache, json).await?;
        }
    }
    Ok(())
}

/// Balances after a mutation. The merge left them stale, so this refetches.
async fn show_balances(client: &PalPayClient, cache: &mut LedgerCache, json: bool) -> Result<()> {
    if json {
        return Ok(());
    }
    let balances = cache
        .balances_or_fetch(client, SettlementStrategy::Minimal)
        .await?;
    println!("\n{}", format_balances(balances));
    Ok(())
}

fn format_balances(balances: &[palpay_client::models::BalanceEntry]) -> String {
    let lines: Vec<String> = balances
        .iter()
        .map(|b| format!("{} owes {} {}", b.debtor.name, b.creditor.name, b.amount))
        .collect();
    or_nothing(lines.join("\n"), "All settled")
}

fn names(cache: &LedgerCache, ids: &[Uuid]) -> String {
    ids.iter()
        .map(|id| cache.user_name(id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_nothing(text: String, empty: &str) -> String {
    if text.is_empty() {
        empty.to_string()
    } else {
        text
    }
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
