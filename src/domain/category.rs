use serde::{Deserialize, Serialize};

/// Expense categories seeded on first use.
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Health",
    "Transport",
    "Entertainment",
    "Fashion",
    "Education",
    "Utility",
    "Shopping",
    "Personal Care",
    "Bills",
    "Investments",
];

/// Income categories seeded on first use.
pub const DEFAULT_INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Business",
    "Freelance",
    "Gifts",
    "Investments",
    "Other",
];

/// Which of the two independent category lists is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }

    /// Key of the list in the settings store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "categories",
            CategoryKind::Income => "incomeCategories",
        }
    }

    pub fn defaults(&self) -> Vec<String> {
        let labels = match self {
            CategoryKind::Expense => DEFAULT_EXPENSE_CATEGORIES,
            CategoryKind::Income => DEFAULT_INCOME_CATEGORIES,
        };
        labels.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a label could not be appended to a category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    Blank,
    Duplicate(String),
}

impl std::fmt::Display for CategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryError::Blank => write!(f, "category name cannot be empty"),
            CategoryError::Duplicate(existing) => {
                write!(f, "category already exists: {}", existing)
            }
        }
    }
}

impl std::error::Error for CategoryError {}

/// Append `label` to `list`, keeping labels unique (case-insensitively).
/// Returns the trimmed label that was added.
pub fn append_category(list: &mut Vec<String>, label: &str) -> Result<String, CategoryError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(CategoryError::Blank);
    }

    if let Some(existing) = list.iter().find(|c| c.eq_ignore_ascii_case(label)) {
        return Err(CategoryError::Duplicate(existing.clone()));
    }

    list.push(label.to_string());
    Ok(label.to_string())
}
