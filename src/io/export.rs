use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::application::{AppError, LedgerService};
use crate::domain::{format_cents, month_name, parse_cents, Cents, MonthlySummary, TransactionType};

/// Header line of the monthly CSV export.
pub const CSV_HEADER: &str = "Date,Type,Category,Amount,Description";

/// One row of the monthly CSV export, as read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedRow {
    pub date: NaiveDate,
    pub kind: TransactionType,
    pub category: Option<String>,
    pub amount_cents: Cents,
    pub description: Option<String>,
}

/// File name for a month's export, e.g. `transactions_January_2024.csv`.
pub fn export_filename(year: i32, month: u32) -> String {
    format!("transactions_{}_{}.csv", month_name(month), year)
}

/// Exporter for writing ledger periods to CSV
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export one calendar month to CSV. Returns the number of rows written.
    /// A month without transactions has nothing to export.
    pub async fn export_month_csv<W: Write>(
        &self,
        year: i32,
        month: u32,
        writer: W,
    ) -> Result<usize, AppError> {
        let summary = self.service.list_for_month(year, month).await?;
        if summary.is_empty() {
            return Err(AppError::Validation(format!(
                "no data to export for {} {}",
                month_name(month),
                year
            )));
        }

        Ok(write_summary_csv(&summary, writer)?)
    }

    /// Export one calendar month into `dir`, named by [`export_filename`].
    /// Returns the row count and the path written.
    ///
    /// The file is only touched once the whole export is ready. It is written
    /// under a temporary name and renamed over any earlier export, so a
    /// refused or failed export leaves an existing file as it was.
    pub async fn export_month_to_dir(
        &self,
        year: i32,
        month: u32,
        dir: &Path,
    ) -> Result<(usize, PathBuf), AppError> {
        let mut buffer = Vec::new();
        let count = self.export_month_csv(year, month, &mut buffer).await?;

        let path = dir.join(export_filename(year, month));
        let partial = path.with_extension("csv.partial");
        fs::write(&partial, &buffer)
            .with_context(|| format!("Failed to write {}", partial.display()))?;

        if let Err(e) = fs::rename(&partial, &path) {
            if let Err(cleanup) = fs::remove_file(&partial) {
                warn!(path = %partial.display(), error = %cleanup, "could not remove partial export");
            }
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to move export into {}", path.display()))
                .into());
        }

        info!(path = %path.display(), count, "exported month");
        Ok((count, path))
    }
}

/// Write a month's transactions as CSV: a plain header line, then one row per
/// transaction with every field quoted and inner quotes doubled.
pub fn write_summary_csv<W: Write>(summary: &MonthlySummary, mut writer: W) -> Result<usize> {
    writeln!(writer, "{}", CSV_HEADER).context("Failed to write CSV header")?;

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    let mut count = 0;
    for transaction in &summary.transactions {
        csv_writer.write_record([
            transaction.date.format("%Y-%m-%d").to_string(),
            transaction.kind.as_str().to_string(),
            transaction.category.clone().unwrap_or_default(),
            format_cents(transaction.amount_cents),
            transaction.description.clone().unwrap_or_default(),
        ])?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

/// Parse a monthly CSV export back into rows.
pub fn read_transactions_csv<R: Read>(reader: R) -> Result<Vec<ExportedRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing
        let record = result.with_context(|| format!("CSV parse error on line {}", line))?;

        let field = |index: usize| record.get(index).unwrap_or("").trim();
        let optional = |index: usize| {
            let value = field(index);
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
            .with_context(|| format!("Invalid date on line {}", line))?;
        let kind = TransactionType::from_str(field(1))
            .ok_or_else(|| anyhow::anyhow!("Invalid type on line {}: {}", line, field(1)))?;
        let amount_cents = parse_cents(field(3))
            .with_context(|| format!("Invalid amount on line {}", line))?;

        rows.push(ExportedRow {
            date,
            kind,
            category: optional(2),
            amount_cents,
            description: optional(4),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transaction;

    fn sample_summary() -> MonthlySummary {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        MonthlySummary::from_transactions(
            2024,
            1,
            vec![
                Transaction {
                    id: 2,
                    amount_cents: 20000,
                    kind: TransactionType::Expense,
                    category: Some("Food".into()),
                    date,
                    description: Some("Dinner at \"Mama's\"".into()),
                },
                Transaction {
                    id: 1,
                    amount_cents: 50000,
                    kind: TransactionType::Income,
                    category: None,
                    date,
                    description: None,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(2024, 1), "transactions_January_2024.csv");
        assert_eq!(export_filename(2023, 12), "transactions_December_2023.csv");
    }

    #[test]
    fn test_csv_layout() {
        let mut out = Vec::new();
        let count = write_summary_csv(&sample_summary(), &mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Type,Category,Amount,Description");
        assert_eq!(
            lines[1],
            r#""2024-01-10","expense","Food","200.00","Dinner at ""Mama's""""#
        );
        assert_eq!(lines[2], r#""2024-01-10","income","","500.00","""#);
    }

    #[test]
    fn test_read_rejects_bad_type() {
        let input = "Date,Type,Category,Amount,Description\n\"2024-01-10\",\"gift\",\"\",\"1.00\",\"\"\n";
        assert!(read_transactions_csv(input.as_bytes()).is_err());
    }
}
