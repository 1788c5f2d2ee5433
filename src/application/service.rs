use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, info, warn};

use crate::domain::{
    append_category, compute_runway, parse_cents, CategoryKind, CategoryTotals, Cents, Clock,
    MonthlySummary, NewTransaction, SystemClock, Transaction, TransactionId, TransactionType,
};
use crate::storage::{Repository, ONBOARDING_KEY};

use super::AppError;

/// Description given to the income entry created by onboarding.
pub const OPENING_BALANCE_DESCRIPTION: &str = "Opening balance";

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, TUI, app shell, etc.).
///
/// The balance is persisted next to the ledger and updated in the same
/// database transaction as every insert or delete, so it always equals
/// total income minus total expense.
pub struct LedgerService {
    repo: Repository,
    clock: Box<dyn Clock>,
}

/// Total spent in one expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    pub total: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock that decides "today".
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Initialize a database at the given path, creating the file if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "ledger database ready");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database and bring its schema up to date.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        repo.migrate().await?;
        debug!(database = database_path, "connected to ledger database");
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The date new transactions are recorded on.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ========================
    // Ledger mutations
    // ========================

    /// Record money coming in. The category is optional for income.
    pub async fn record_income(
        &self,
        amount_cents: Cents,
        category: Option<String>,
        description: Option<String>,
    ) -> Result<Transaction, AppError> {
        ensure_positive(amount_cents)?;

        let new = NewTransaction::new(TransactionType::Income, amount_cents, self.today())
            .with_category(category)
            .with_description(description);

        self.record(new).await
    }

    /// Record money going out. Expenses must be categorized and may not
    /// take the balance below zero.
    pub async fn record_expense(
        &self,
        amount_cents: Cents,
        category: &str,
        description: Option<String>,
    ) -> Result<Transaction, AppError> {
        ensure_positive(amount_cents)?;
        if category.trim().is_empty() {
            return Err(AppError::validation("an expense needs a category"));
        }

        let new = NewTransaction::new(TransactionType::Expense, amount_cents, self.today())
            .with_category(Some(category.to_string()))
            .with_description(description);

        self.record(new).await
    }

    /// Delete a transaction and undo its effect on the balance.
    /// Returns the removed record.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        let mut tx = self.repo.begin().await?;

        let Some(existing) = Repository::find_transaction(&mut tx, id).await? else {
            warn!(id, "delete requested for unknown transaction");
            return Err(AppError::NotFound(id));
        };

        Repository::delete_transaction(&mut tx, id).await?;

        let balance = Repository::read_balance(&mut tx).await?;
        let new_balance = balance
            .checked_sub(existing.balance_effect())
            .ok_or_else(|| AppError::validation("balance would overflow"))?;
        Repository::write_balance(&mut tx, new_balance).await?;

        tx.commit().await.context("Failed to commit delete")?;

        info!(
            id,
            kind = %existing.kind,
            amount_cents = existing.amount_cents,
            balance = new_balance,
            "deleted transaction"
        );
        Ok(existing)
    }

    async fn record(&self, new: NewTransaction) -> Result<Transaction, AppError> {
        let mut tx = self.repo.begin().await?;
        let (id, balance) = Self::apply(&mut tx, &new).await?;
        tx.commit().await.context("Failed to commit transaction")?;

        info!(
            id,
            kind = %new.kind,
            amount_cents = new.amount_cents,
            balance,
            "recorded transaction"
        );
        Ok(new.into_transaction(id))
    }

    /// Insert `new` and move the balance by its effect on `conn`.
    /// Nothing is committed here; returns the new id and balance.
    async fn apply(
        conn: &mut SqliteConnection,
        new: &NewTransaction,
    ) -> Result<(TransactionId, Cents), AppError> {
        let balance = Repository::read_balance(conn).await?;
        let new_balance = balance
            .checked_add(new.kind.balance_effect(new.amount_cents))
            .ok_or_else(|| AppError::validation("balance would overflow"))?;

        if new.kind == TransactionType::Expense && new_balance < 0 {
            warn!(
                balance,
                required = new.amount_cents,
                "expense rejected: insufficient funds"
            );
            return Err(AppError::InsufficientFunds {
                balance,
                required: new.amount_cents,
            });
        }

        let id = Repository::insert_transaction(conn, new).await?;
        Repository::write_balance(conn, new_balance).await?;
        Ok((id, new_balance))
    }

    // ========================
    // Balance
    // ========================

    /// Current running balance.
    pub async fn balance(&self) -> Result<Cents, AppError> {
        Ok(self.repo.balance().await?)
    }

    /// Daily allowance for the rest of the month (see [`compute_runway`]).
    pub fn compute_runway(balance: Cents, today: NaiveDate) -> Cents {
        compute_runway(balance, today)
    }

    /// Daily allowance for the current balance and today's date.
    pub async fn runway(&self) -> Result<Cents, AppError> {
        let balance = self.balance().await?;
        Ok(compute_runway(balance, self.today()))
    }

    // ========================
    // Queries
    // ========================

    /// The latest `limit` transactions, newest first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<Transaction>, AppError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self.repo.list_recent(limit).await?)
    }

    /// Transactions and totals for one calendar month.
    pub async fn list_for_month(&self, year: i32, month: u32) -> Result<MonthlySummary, AppError> {
        ensure_month(month)?;
        let transactions = self.repo.list_for_month(year, month).await?;
        debug!(year, month, count = transactions.len(), "loaded month");
        Ok(MonthlySummary::from_transactions(year, month, transactions)?)
    }

    /// All-time totals for a category.
    pub async fn list_by_category(&self, category: &str) -> Result<CategoryTotals, AppError> {
        let (total_expense, total_income) = self.repo.category_totals(category).await?;
        Ok(CategoryTotals {
            total_expense,
            total_income,
        })
    }

    /// Years that have at least one transaction, newest first.
    pub async fn available_years(&self) -> Result<Vec<i32>, AppError> {
        Ok(self.repo.available_years().await?)
    }

    /// Months of `year` that have at least one transaction, latest first.
    pub async fn available_months_for_year(&self, year: i32) -> Result<Vec<u32>, AppError> {
        Ok(self.repo.available_months(year).await?)
    }

    /// Transactions recorded on one day, newest first.
    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_for_day(date).await?)
    }

    /// Days of the month with activity, in calendar order.
    pub async fn active_dates(&self, year: i32, month: u32) -> Result<Vec<NaiveDate>, AppError> {
        ensure_month(month)?;
        Ok(self.repo.active_dates(year, month).await?)
    }

    // ========================
    // Categories
    // ========================

    /// The category list of the given kind, seeded with defaults on first use.
    pub async fn categories(&self, kind: CategoryKind) -> Result<Vec<String>, AppError> {
        let mut tx = self.repo.begin().await?;
        let list = Self::load_categories(&mut tx, kind).await?;
        tx.commit().await.context("Failed to commit category seed")?;
        Ok(list)
    }

    /// Append a label to a category list.
    pub async fn add_category(&self, kind: CategoryKind, label: &str) -> Result<String, AppError> {
        let mut tx = self.repo.begin().await?;
        let mut list = Self::load_categories(&mut tx, kind).await?;
        let added = append_category(&mut list, label)?;
        Self::store_categories(&mut tx, kind, &list).await?;
        tx.commit().await.context("Failed to commit category")?;

        info!(kind = %kind, category = %added, "added category");
        Ok(added)
    }

    /// Total spent per expense category, in list order. Categories found
    /// in the ledger but missing from the list follow, sorted by name.
    pub async fn category_breakdown(&self) -> Result<Vec<CategorySpending>, AppError> {
        let categories = self.categories(CategoryKind::Expense).await?;
        let mut totals = self.repo.expense_totals_by_category().await?;

        let mut breakdown: Vec<CategorySpending> = categories
            .into_iter()
            .map(|category| {
                let total = totals.remove(&category).unwrap_or(0);
                CategorySpending { category, total }
            })
            .collect();

        let mut extra: Vec<CategorySpending> = totals
            .into_iter()
            .map(|(category, total)| CategorySpending { category, total })
            .collect();
        extra.sort_by(|a, b| a.category.cmp(&b.category));
        breakdown.extend(extra);

        Ok(breakdown)
    }

    async fn load_categories(
        conn: &mut SqliteConnection,
        kind: CategoryKind,
    ) -> Result<Vec<String>, AppError> {
        match Repository::read_setting(conn, kind.storage_key()).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)
                .with_context(|| format!("Stored {} categories are not a JSON list", kind))?),
            None => {
                let defaults = kind.defaults();
                Self::store_categories(conn, kind, &defaults).await?;
                debug!(kind = %kind, "seeded default categories");
                Ok(defaults)
            }
        }
    }

    async fn store_categories(
        conn: &mut SqliteConnection,
        kind: CategoryKind,
        list: &[String],
    ) -> Result<(), AppError> {
        let raw = serde_json::to_string(list).context("Failed to encode categories")?;
        Repository::write_setting(conn, kind.storage_key(), &raw).await?;
        Ok(())
    }

    // ========================
    // Onboarding
    // ========================

    pub async fn is_onboarded(&self) -> Result<bool, AppError> {
        Ok(self.repo.setting(ONBOARDING_KEY).await?.as_deref() == Some("true"))
    }

    /// Record the opening balance as income and mark onboarding as done.
    /// A zero opening balance records nothing.
    pub async fn complete_onboarding(
        &self,
        opening_balance: Cents,
    ) -> Result<Option<Transaction>, AppError> {
        if opening_balance < 0 {
            return Err(AppError::validation("opening balance cannot be negative"));
        }

        let mut tx = self.repo.begin().await?;

        let shown = Repository::read_setting(&mut tx, ONBOARDING_KEY).await?;
        if shown.as_deref() == Some("true") {
            return Err(AppError::validation("onboarding was already completed"));
        }

        let opening = if opening_balance > 0 {
            let new = NewTransaction::new(TransactionType::Income, opening_balance, self.today())
                .with_description(Some(OPENING_BALANCE_DESCRIPTION.to_string()));
            let (id, _) = Self::apply(&mut tx, &new).await?;
            Some(new.into_transaction(id))
        } else {
            None
        };

        Repository::write_setting(&mut tx, ONBOARDING_KEY, "true").await?;
        tx.commit().await.context("Failed to commit onboarding")?;

        info!(opening_balance, "onboarding completed");
        Ok(opening)
    }
}

/// Parse a user-entered amount into positive cents.
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    let cents = parse_cents(input)?;
    ensure_positive(cents)?;
    Ok(cents)
}

fn ensure_positive(amount_cents: Cents) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::validation("amount must be positive"));
    }
    Ok(())
}

fn ensure_month(month: u32) -> Result<(), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!(
            "month must be between 1 and 12, got {}",
            month
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), 1250);
        assert!(matches!(parse_amount("abc"), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount("0"), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount("-5"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_ensure_month() {
        assert!(ensure_month(1).is_ok());
        assert!(ensure_month(12).is_ok());
        assert!(ensure_month(0).is_err());
        assert!(ensure_month(13).is_err());
    }
}
