use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Cents;

pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, raises the balance
    Income,
    /// Money going out, lowers the balance
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Signed effect of an amount of this type on the balance.
    pub fn balance_effect(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionType::Income => amount_cents,
            TransactionType::Expense => -amount_cents,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry. Entries are never edited: they are either
/// recorded or deleted, and deletion reverses their balance effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Assigned by storage on insert
    pub id: TransactionId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: Option<String>,
    /// Day the transaction was recorded
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Signed effect of this transaction on the balance.
    pub fn balance_effect(&self) -> Cents {
        self.kind.balance_effect(self.amount_cents)
    }
}

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub amount_cents: Cents,
    pub kind: TransactionType,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(kind: TransactionType, amount_cents: Cents, date: NaiveDate) -> Self {
        Self {
            amount_cents,
            kind,
            category: None,
            date,
            description: None,
        }
    }

    /// Attach a category. Blank labels are treated as no category.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = non_blank(category);
        self
    }

    /// Attach a description. Blank text is treated as no description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_blank(description);
        self
    }

    /// The stored record once storage has assigned an id.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            amount_cents: self.amount_cents,
            kind: self.kind,
            category: self.category,
            date: self.date,
            description: self.description,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
