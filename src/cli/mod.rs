use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};

use crate::application::{parse_amount, AppError, LedgerService};
use crate::domain::{
    days_remaining_in_month, format_cents, format_cents_grouped, month_name, CategoryKind,
    Transaction,
};
use crate::io::Exporter;

/// Pocketbook - Personal Income and Expense Ledger
#[derive(Parser)]
#[command(name = "pocketbook")]
#[command(about = "Track income and expenses with a running balance and monthly summaries")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "POCKETBOOK_DATABASE", default_value = "pocketbook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Set the opening balance (first run only)
    Onboard {
        /// Opening balance (e.g., "1500.00"), 0 to start empty
        balance: String,
    },

    /// Record income
    Income {
        /// Amount received (e.g., "50.00" or "50")
        amount: String,

        /// Income category (e.g., "Salary")
        #[arg(short, long)]
        category: Option<String>,

        /// Optional note
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Record an expense
    Expense {
        /// Amount spent (e.g., "12.50")
        amount: String,

        /// Expense category (required, e.g., "Food")
        #[arg(short, long)]
        category: String,

        /// Optional note
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a transaction and reverse its effect on the balance
    Delete {
        /// Transaction ID
        id: i64,
    },

    /// Show the balance and today's daily allowance
    Balance,

    /// List the most recent transactions
    Recent {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a month's transactions and totals
    Month {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the transactions of a single day
    Day {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Show which days of a month have activity
    Calendar {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },

    /// List the years, or the months of a year, that have transactions
    Periods {
        /// List months of this year instead of years
        #[arg(long)]
        year: Option<i32>,
    },

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Export a month to CSV
    Export {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Show income categories instead of expense categories
        #[arg(long)]
        income: bool,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Add to the income list instead of the expense list
        #[arg(long)]
        income: bool,
    },

    /// All-time totals for one category
    Totals {
        /// Category name
        name: String,
    },

    /// Total spent in every expense category
    Breakdown,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.command {
            LedgerService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = LedgerService::connect(&self.database)
            .await
            .with_context(|| format!("Cannot open {} (run `pocketbook init` first)", self.database))?;

        match self.command {
            Commands::Init => {}

            Commands::Onboard { balance } => {
                let opening = crate::domain::parse_cents(&balance)
                    .map_err(AppError::from)
                    .context("Invalid opening balance. Use '1500.00' or '1500'")?;
                match service.complete_onboarding(opening).await? {
                    Some(tx) => println!(
                        "Opening balance recorded: {} (#{})",
                        format_cents(tx.amount_cents),
                        tx.id
                    ),
                    None => println!("Onboarding completed with an empty balance."),
                }
            }

            Commands::Income {
                amount,
                category,
                description,
            } => {
                let amount_cents = parse_amount(&amount)?;
                let tx = service
                    .record_income(amount_cents, category, description)
                    .await?;
                println!(
                    "Recorded income: {} ({})",
                    format_cents(tx.amount_cents),
                    tx.id
                );
                print_balance_line(&service).await?;
            }

            Commands::Expense {
                amount,
                category,
                description,
            } => {
                let amount_cents = parse_amount(&amount)?;
                let tx = service
                    .record_expense(amount_cents, &category, description)
                    .await?;
                println!(
                    "Recorded expense: {} {} ({})",
                    format_cents(tx.amount_cents),
                    tx.category.as_deref().unwrap_or(""),
                    tx.id
                );
                print_balance_line(&service).await?;
            }

            Commands::Delete { id } => match service.delete_transaction(id).await {
                Ok(tx) => {
                    println!(
                        "Deleted {} of {} ({})",
                        tx.kind,
                        format_cents(tx.amount_cents),
                        tx.id
                    );
                    print_balance_line(&service).await?;
                }
                Err(AppError::NotFound(id)) => {
                    eprintln!("Warning: no transaction with id {}, nothing deleted", id);
                }
                Err(e) => return Err(e.into()),
            },

            Commands::Balance => run_balance_command(&service).await?,

            Commands::Recent { limit } => {
                let transactions = service.list_recent(limit).await?;
                print_transactions(&transactions, true);
            }

            Commands::Month {
                year,
                month,
                format,
            } => {
                let (year, month) = resolve_period(&service, year, month);
                run_month_command(&service, year, month, &format).await?;
            }

            Commands::Day { date } => {
                let date = parse_date(&date)?;
                let transactions = service.list_for_day(date).await?;
                println!("{} transactions", date.format("%a %b %d %Y"));
                print_transactions(&transactions, false);
            }

            Commands::Calendar { year, month } => {
                let (year, month) = resolve_period(&service, year, month);
                run_calendar_command(&service, year, month).await?;
            }

            Commands::Periods { year } => match year {
                Some(year) => {
                    let months = service.available_months_for_year(year).await?;
                    if months.is_empty() {
                        println!("No transactions in {}.", year);
                    }
                    for month in months {
                        println!("{:>2}  {}", month, month_name(month));
                    }
                }
                None => {
                    let years = service.available_years().await?;
                    if years.is_empty() {
                        println!("No transactions recorded.");
                    }
                    for year in years {
                        println!("{}", year);
                    }
                }
            },

            Commands::Category(cmd) => run_category_command(&service, cmd).await?,

            Commands::Export {
                year,
                month,
                output,
            } => {
                let (year, month) = resolve_period(&service, year, month);
                let (count, path) = Exporter::new(&service)
                    .export_month_to_dir(year, month, &output)
                    .await?;
                println!("Exported {} transactions to {}", count, path.display());
            }
        }

        Ok(())
    }
}

fn resolve_period(service: &LedgerService, year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let today = service.today();
    (
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}

async fn print_balance_line(service: &LedgerService) -> Result<()> {
    let balance = service.balance().await?;
    println!("Balance: {}", format_cents_grouped(balance));
    Ok(())
}

async fn run_balance_command(service: &LedgerService) -> Result<()> {
    let balance = service.balance().await?;
    let today = service.today();
    let runway = LedgerService::compute_runway(balance, today);

    println!("Balance:         {}", format_cents_grouped(balance));
    println!(
        "Per day:         {} ({} days left in {})",
        format_cents_grouped(runway),
        days_remaining_in_month(today),
        month_name(today.month())
    );
    Ok(())
}

async fn run_month_command(
    service: &LedgerService,
    year: i32,
    month: u32,
    format: &str,
) -> Result<()> {
    let summary = service.list_for_month(year, month).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("{} {}", summary.month_name(), summary.year);
            println!("{}", "=".repeat(40));
            print_transactions(&summary.transactions, true);
            println!();
            println!("Income:   {:>14}", format_cents_grouped(summary.total_income));
            println!("Expenses: {:>14}", format_cents_grouped(summary.total_expense));
            println!("Net:      {:>14}", format_cents_grouped(summary.net_amount));
        }
    }
    Ok(())
}

async fn run_calendar_command(service: &LedgerService, year: i32, month: u32) -> Result<()> {
    let active = service.active_dates(year, month).await?;
    let today = service.today();

    println!("{} {}", month_name(month), year);
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");

    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        anyhow::bail!("Invalid month: {}", month);
    };
    let mut line = "    ".repeat(first.weekday().num_days_from_monday() as usize);

    let mut date = first;
    while date.month() == month {
        let marker = if date == today {
            '<'
        } else if active.contains(&date) {
            '*'
        } else {
            ' '
        };
        line.push_str(&format!("{:>3}{}", date.day(), marker));

        if date.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    println!();
    println!("* days with transactions, < today");
    Ok(())
}

async fn run_category_command(service: &LedgerService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::List { income } => {
            let kind = category_kind(income);
            for category in service.categories(kind).await? {
                println!("{}", category);
            }
        }

        CategoryCommands::Add { name, income } => {
            let kind = category_kind(income);
            let added = service.add_category(kind, &name).await?;
            println!("Added {} category: {}", kind, added);
        }

        CategoryCommands::Totals { name } => {
            let totals = service.list_by_category(&name).await?;
            println!("{}", name);
            println!("  Spent:    {:>14}", format_cents_grouped(totals.total_expense));
            println!("  Received: {:>14}", format_cents_grouped(totals.total_income));
        }

        CategoryCommands::Breakdown => {
            let breakdown = service.category_breakdown().await?;
            println!("{:<20} {:>14}", "CATEGORY", "TOTAL SPENT");
            println!("{}", "-".repeat(35));
            for entry in breakdown {
                println!(
                    "{:<20} {:>14}",
                    truncate(&entry.category, 20),
                    format_cents_grouped(entry.total)
                );
            }
        }
    }
    Ok(())
}

fn category_kind(income: bool) -> CategoryKind {
    if income {
        CategoryKind::Income
    } else {
        CategoryKind::Expense
    }
}

fn print_transactions(transactions: &[Transaction], show_date: bool) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    if show_date {
        println!(
            "{:>6} {:<12} {:<8} {:<15} {:>12} DESCRIPTION",
            "ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"
        );
    } else {
        println!(
            "{:>6} {:<8} {:<15} {:>12} DESCRIPTION",
            "ID", "TYPE", "CATEGORY", "AMOUNT"
        );
    }
    println!("{}", "-".repeat(75));

    for tx in transactions {
        let signed = if tx.is_expense() {
            format!("-{}", format_cents_grouped(tx.amount_cents))
        } else {
            format!("+{}", format_cents_grouped(tx.amount_cents))
        };
        let category = truncate(tx.category.as_deref().unwrap_or(""), 15);
        let desc = truncate(tx.description.as_deref().unwrap_or(""), 30);

        if show_date {
            println!(
                "{:>6} {:<12} {:<8} {:<15} {:>12} {}",
                tx.id,
                tx.date.format("%Y-%m-%d"),
                tx.kind,
                category,
                signed,
                desc
            );
        } else {
            println!(
                "{:>6} {:<8} {:<15} {:>12} {}",
                tx.id, tx.kind, category, signed, desc
            );
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Food", 15), "Food");
        assert_eq!(truncate("A very long description", 10), "A very ...");
        assert_eq!(truncate("Café au lait", 8), "Café ...");
    }

    #[test]
    fn test_cli_parses_expense() {
        let cli = Cli::try_parse_from([
            "pocketbook",
            "--database",
            "test.db",
            "expense",
            "12.50",
            "--category",
            "Food",
        ])
        .unwrap();

        assert_eq!(cli.database, "test.db");
        match cli.command {
            Commands::Expense {
                amount, category, ..
            } => {
                assert_eq!(amount, "12.50");
                assert_eq!(category, "Food");
            }
            _ => panic!("expected expense command"),
        }
    }

    #[test]
    fn test_cli_requires_expense_category() {
        assert!(Cli::try_parse_from(["pocketbook", "expense", "12.50"]).is_err());
    }
}
