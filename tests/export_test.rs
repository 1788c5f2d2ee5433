mod common;

use anyhow::Result;
use common::{parse_date, test_service, JanuaryFebruary};
use pocketbook::application::AppError;
use pocketbook::domain::TransactionType;
use pocketbook::io::{export_filename, read_transactions_csv, Exporter, CSV_HEADER};

#[tokio::test]
async fn test_export_round_trip() -> Result<()> {
    let (service, clock, _temp) = test_service().await?;

    clock.set(parse_date("2024-01-05"));
    service
        .record_income(50000, Some("Salary".into()), Some("January, part 1".into()))
        .await?;
    clock.set(parse_date("2024-01-10"));
    service
        .record_expense(1999, "Food", Some("Pizza \"Margherita\"".into()))
        .await?;

    let mut out = Vec::new();
    let count = Exporter::new(&service)
        .export_month_csv(2024, 1, &mut out)
        .await?;
    assert_eq!(count, 2);

    let text = String::from_utf8(out.clone())?;
    assert!(text.starts_with(CSV_HEADER));
    assert!(text.contains(r#""Pizza ""Margherita""""#));

    let rows = read_transactions_csv(out.as_slice())?;
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].date, parse_date("2024-01-10"));
    assert_eq!(rows[0].kind, TransactionType::Expense);
    assert_eq!(rows[0].category.as_deref(), Some("Food"));
    assert_eq!(rows[0].amount_cents, 1999);
    assert_eq!(rows[0].description.as_deref(), Some("Pizza \"Margherita\""));

    assert_eq!(rows[1].date, parse_date("2024-01-05"));
    assert_eq!(rows[1].kind, TransactionType::Income);
    assert_eq!(rows[1].category.as_deref(), Some("Salary"));
    assert_eq!(rows[1].amount_cents, 50000);
    assert_eq!(rows[1].description.as_deref(), Some("January, part 1"));

    Ok(())
}

#[tokio::test]
async fn test_export_only_selected_month() -> Result<()> {
    let (service, clock, _temp) = test_service().await?;
    JanuaryFebruary::record(&service, &clock).await?;

    let mut out = Vec::new();
    let count = Exporter::new(&service)
        .export_month_csv(2024, 2, &mut out)
        .await?;
    assert_eq!(count, 1);

    let rows = read_transactions_csv(out.as_slice())?;
    assert_eq!(rows[0].category.as_deref(), Some("Transport"));
    assert_eq!(rows[0].description, None);

    Ok(())
}

#[tokio::test]
async fn test_export_empty_month_is_refused() -> Result<()> {
    let (service, _clock, _temp) = test_service().await?;

    let mut out = Vec::new();
    let result = Exporter::new(&service)
        .export_month_csv(2024, 5, &mut out)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(out.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_export_to_named_file() -> Result<()> {
    let (service, clock, temp) = test_service().await?;
    JanuaryFebruary::record(&service, &clock).await?;

    let (count, path) = Exporter::new(&service)
        .export_month_to_dir(2024, 1, temp.path())
        .await?;
    assert_eq!(count, 2);
    assert_eq!(path, temp.path().join(export_filename(2024, 1)));
    assert!(path.ends_with("transactions_January_2024.csv"));
    assert!(!path.with_extension("csv.partial").exists());

    let rows = read_transactions_csv(std::fs::File::open(&path)?)?;
    assert_eq!(rows.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_refused_export_keeps_existing_file() -> Result<()> {
    let (service, _clock, temp) = test_service().await?;

    let path = temp.path().join(export_filename(2024, 5));
    std::fs::write(&path, "earlier export")?;

    let result = Exporter::new(&service)
        .export_month_to_dir(2024, 5, temp.path())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(std::fs::read_to_string(&path)?, "earlier export");

    Ok(())
}

#[tokio::test]
async fn test_export_replaces_earlier_file() -> Result<()> {
    let (service, clock, temp) = test_service().await?;
    JanuaryFebruary::record(&service, &clock).await?;

    let path = temp.path().join(export_filename(2024, 2));
    std::fs::write(&path, "earlier export")?;

    Exporter::new(&service)
        .export_month_to_dir(2024, 2, temp.path())
        .await?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with(CSV_HEADER));
    assert_eq!(read_transactions_csv(text.as_bytes())?.len(), 1);

    Ok(())
}
