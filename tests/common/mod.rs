// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use pocketbook::application::LedgerService;
use pocketbook::domain::{Cents, ManualClock};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database.
/// The returned clock decides the date of every recorded transaction.
pub async fn test_service() -> Result<(LedgerService, Arc<ManualClock>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let clock = Arc::new(ManualClock::new(parse_date("2024-01-01")));
    let service = LedgerService::init(db_path.to_str().unwrap())
        .await?
        .with_clock(Arc::clone(&clock));
    Ok((service, clock, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Sum of income minus sum of expense over everything in the ledger.
pub async fn ledger_net(service: &LedgerService) -> Result<Cents> {
    let all = service.list_recent(usize::MAX).await?;
    Ok(all.iter().map(|t| t.balance_effect()).sum())
}

/// Test fixture: the January/February ledger used by the rollup tests
pub struct JanuaryFebruary;

impl JanuaryFebruary {
    /// income 500 on 2024-01-05, expense 200 "Food" on 2024-01-10,
    /// expense 50 "Transport" on 2024-02-01
    pub async fn record(service: &LedgerService, clock: &ManualClock) -> Result<()> {
        clock.set(parse_date("2024-01-05"));
        service.record_income(50000, None, None).await?;

        clock.set(parse_date("2024-01-10"));
        service
            .record_expense(20000, "Food", Some("Groceries".into()))
            .await?;

        clock.set(parse_date("2024-02-01"));
        service.record_expense(5000, "Transport", None).await?;
        Ok(())
    }
}
