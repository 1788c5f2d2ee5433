use std::fmt;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Cents, Transaction, TransactionType};

/// Transactions of one calendar month together with their totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub transactions: Vec<Transaction>,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net_amount: Cents,
}

impl MonthlySummary {
    /// Build a summary by summing the given transactions.
    /// An empty slice yields all-zero totals.
    ///
    /// Only the balance is bounded when recording, so a month's income or
    /// expense sum can exceed the range of [`Cents`].
    pub fn from_transactions(
        year: i32,
        month: u32,
        transactions: Vec<Transaction>,
    ) -> Result<Self, TotalsOverflow> {
        let total_income = sum_of(&transactions, TransactionType::Income)?;
        let total_expense = sum_of(&transactions, TransactionType::Expense)?;
        let net_amount = total_income
            .checked_sub(total_expense)
            .ok_or(TotalsOverflow)?;

        Ok(Self {
            year,
            month,
            transactions,
            total_income,
            total_expense,
            net_amount,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// English month name, e.g. "January".
    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }
}

/// All-time totals for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub total_expense: Cents,
    pub total_income: Cents,
}

/// A period total did not fit in [`Cents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsOverflow;

impl fmt::Display for TotalsOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "totals are too large to compute")
    }
}

impl std::error::Error for TotalsOverflow {}

fn sum_of(transactions: &[Transaction], kind: TransactionType) -> Result<Cents, TotalsOverflow> {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .try_fold(0 as Cents, |total, t| total.checked_add(t.amount_cents))
        .ok_or(TotalsOverflow)
}

/// English name of a 1-based month number. Out-of-range months map to "".
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

/// Number of days in the given month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next_first.signed_duration_since(first).num_days()).ok()
}

/// Days left in `today`'s month, not counting today itself.
pub fn days_remaining_in_month(today: NaiveDate) -> u32 {
    days_in_month(today.year(), today.month())
        .map(|days| days.saturating_sub(today.day()))
        .unwrap_or(0)
}

/// Daily allowance that spends `balance` evenly over the rest of the month.
///
/// `runway = floor(balance / days_remaining)`, where today is excluded from
/// the remaining days. On the last day of the month there are no days left
/// to spread over, so the whole balance is returned.
pub fn compute_runway(balance: Cents, today: NaiveDate) -> Cents {
    match days_remaining_in_month(today) {
        0 => balance,
        days => balance.div_euclid(Cents::from(days)),
    }
}
