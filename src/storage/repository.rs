use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::domain::{Cents, NewTransaction, Transaction, TransactionId, TransactionType};

use super::MIGRATION_001_INITIAL;

/// Settings key of the running balance (stringified integer cents).
pub const BALANCE_KEY: &str = "balance";

/// Settings key of the onboarding flag.
pub const ONBOARDING_KEY: &str = "onboardingShown";

const DATE_FORMAT: &str = "%Y-%m-%d";

const TRANSACTION_COLUMNS: &str = "id, amount_cents, type, category, date, description";

/// Repository for persisting and querying ledger entries and settings.
///
/// Reads go straight to the pool. Writes that must be applied together
/// (a ledger row and the balance) are associated functions taking a
/// connection, so callers can run them inside one database transaction.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a database transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin database transaction")
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Ledger writes
    // ========================

    /// Insert a ledger entry and return the id assigned by SQLite.
    pub async fn insert_transaction(
        conn: &mut SqliteConnection,
        new: &NewTransaction,
    ) -> Result<TransactionId> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (amount_cents, type, category, date, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.amount_cents)
        .bind(new.kind.as_str())
        .bind(&new.category)
        .bind(new.date.format(DATE_FORMAT).to_string())
        .bind(&new.description)
        .execute(&mut *conn)
        .await
        .context("Failed to insert transaction")?;

        Ok(result.last_insert_rowid())
    }

    /// Delete a ledger entry. Returns false when no row had that id.
    pub async fn delete_transaction(conn: &mut SqliteConnection, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete transaction")?;

        Ok(result.rows_affected() > 0)
    }

    /// Look up a ledger entry on the given connection.
    pub async fn find_transaction(
        conn: &mut SqliteConnection,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    // ========================
    // Settings
    // ========================

    /// Read a raw settings value.
    pub async fn read_setting(conn: &mut SqliteConnection, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("Failed to read setting '{}'", key))?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Insert or replace a raw settings value.
    pub async fn write_setting(conn: &mut SqliteConnection, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to write setting '{}'", key))?;
        Ok(())
    }

    /// Read the running balance. A missing entry means nothing was recorded yet.
    pub async fn read_balance(conn: &mut SqliteConnection) -> Result<Cents> {
        match Self::read_setting(conn, BALANCE_KEY).await? {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Stored balance is not an integer: {:?}", raw)),
            None => Ok(0),
        }
    }

    pub async fn write_balance(conn: &mut SqliteConnection, balance: Cents) -> Result<()> {
        Self::write_setting(conn, BALANCE_KEY, &balance.to_string()).await
    }

    /// Current balance, read outside of any transaction.
    pub async fn balance(&self) -> Result<Cents> {
        let mut conn = self.acquire().await?;
        Self::read_balance(&mut conn).await
    }

    /// Settings value, read outside of any transaction.
    pub async fn setting(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.acquire().await?;
        Self::read_setting(&mut conn, key).await
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire database connection")
    }

    // ========================
    // Ledger queries
    // ========================

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let mut conn = self.acquire().await?;
        Self::find_transaction(&mut conn, id).await
    }

    /// Most recent transactions first, newest id first within a day.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY date DESC, id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Transactions whose date falls in the given calendar month.
    pub async fn list_for_month(&self, year: i32, month: u32) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE strftime('%Y', date) = ? AND strftime('%m', date) = ?
            ORDER BY date DESC, id DESC
            "#
        ))
        .bind(format!("{:04}", year))
        .bind(format!("{:02}", month))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions for month")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Transactions recorded on a single day.
    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE date = ? ORDER BY id DESC"
        ))
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions for day")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// All-time income and expense sums for one category.
    pub async fn category_totals(&self, category: &str) -> Result<(Cents, Cents)> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount_cents ELSE 0 END), 0) as total_expense,
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount_cents ELSE 0 END), 0) as total_income
            FROM transactions
            WHERE category = ?
            "#,
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum transactions by category")?;

        Ok((row.get("total_expense"), row.get("total_income")))
    }

    /// All-time expense sums grouped by category. Uncategorized rows are skipped.
    pub async fn expense_totals_by_category(&self) -> Result<HashMap<String, Cents>> {
        let rows = sqlx::query(
            r#"
            SELECT category, SUM(amount_cents) as total
            FROM transactions
            WHERE type = 'expense' AND category IS NOT NULL
            GROUP BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute expense totals by category")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("category"), row.get("total")))
            .collect())
    }

    /// Distinct years present in the ledger, newest first.
    pub async fn available_years(&self) -> Result<Vec<i32>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) as year
            FROM transactions
            ORDER BY year DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list available years")?;

        rows.iter()
            .map(|row| {
                let year: i64 = row.get("year");
                i32::try_from(year).context("Stored year out of range")
            })
            .collect()
    }

    /// Distinct months present in the given year, latest first.
    pub async fn available_months(&self, year: i32) -> Result<Vec<u32>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT CAST(strftime('%m', date) AS INTEGER) as month
            FROM transactions
            WHERE strftime('%Y', date) = ?
            ORDER BY month DESC
            "#,
        )
        .bind(format!("{:04}", year))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list available months")?;

        rows.iter()
            .map(|row| {
                let month: i64 = row.get("month");
                u32::try_from(month).context("Stored month out of range")
            })
            .collect()
    }

    /// Distinct days in the month that have at least one transaction.
    pub async fn active_dates(&self, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT date
            FROM transactions
            WHERE strftime('%Y', date) = ? AND strftime('%m', date) = ?
            ORDER BY date
            "#,
        )
        .bind(format!("{:04}", year))
        .bind(format!("{:02}", month))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active dates")?;

        rows.iter()
            .map(|row| {
                let date_str: String = row.get("date");
                parse_date(&date_str)
            })
            .collect()
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let type_str: String = row.get("type");
        let date_str: String = row.get("date");

        Ok(Transaction {
            id: row.get("id"),
            amount_cents: row.get("amount_cents"),
            kind: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            category: row.get("category"),
            date: parse_date(&date_str)?,
            description: row.get("description"),
        })
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date: {}", date_str))
}
