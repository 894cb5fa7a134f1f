//! JSON export and import of quote records.
//!
//! Export writes the full record verbatim. Import only checks that the
//! file carries a quote number, an issue date, and an items array;
//! everything else falls back to defaults. A malformed file aborts with
//! a user-facing message and no state is touched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::QuoteError;
use crate::models::Quote;

pub fn export_json(quote: &Quote, path: &Path) -> Result<(), QuoteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                QuoteError::Storage(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(path)
        .map_err(|e| QuoteError::Storage(format!("failed to create {}: {}", path.display(), e)))?;
    serde_json::to_writer_pretty(BufWriter::new(file), quote)
        .map_err(|e| QuoteError::Storage(format!("failed to write {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), "quote exported");
    Ok(())
}

pub fn import_json(path: &Path) -> Result<Quote, QuoteError> {
    let file = File::open(path)
        .map_err(|_| QuoteError::Import(format!("could not read {}", path.display())))?;

    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|_| QuoteError::Import("the file is not valid JSON".to_string()))?;

    validate(&value)?;

    serde_json::from_value(value)
        .map_err(|e| QuoteError::Import(format!("the quote data is malformed: {}", e)))
}

/// Presence checks only: number, issue date, items array.
fn validate(value: &Value) -> Result<(), QuoteError> {
    let object = value
        .as_object()
        .ok_or_else(|| QuoteError::Import("the file does not contain a quote object".to_string()))?;

    match object.get("number").and_then(Value::as_str) {
        Some(number) if !number.trim().is_empty() => {}
        _ => {
            return Err(QuoteError::Import(
                "the file is missing a quote number".to_string(),
            ));
        }
    }

    if object.get("issue_date").is_none() {
        return Err(QuoteError::Import(
            "the file is missing an issue date".to_string(),
        ));
    }

    if !object.get("items").map(Value::is_array).unwrap_or(false) {
        return Err(QuoteError::Import(
            "the file is missing an items list".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, OperationalCost, Periodicity, QuoteKind};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn full_quote() -> Quote {
        let mut item = LineItem::new("backend-1", "REST API");
        item.description = "Order API".to_string();
        item.details = "CRUD plus webhooks".to_string();
        item.hours = 30.0;
        item.hourly_rate = 120.0;
        item.recalc_from_time();

        let mut quote = Quote {
            number: "QTE-2026-001".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            validity_days: 15,
            delivery_estimate: "2 weeks".to_string(),
            kind: QuoteKind::Preliminary,
            items: vec![item],
            revenue_model: "Monthly fee".to_string(),
            notes: "Starts after signature.".to_string(),
            terms: "Net 30.".to_string(),
            subtotal: 3600.0,
            discount: 100.0,
            total: 3500.0,
            total_hours: 30.0,
            ..Quote::default()
        };
        quote.client.name = "Acme".to_string();
        quote.client.email = "ops@acme.test".to_string();
        quote.project.title = "Orders".to_string();
        quote.operational_costs.push(OperationalCost {
            description: "Hosting".to_string(),
            amount: 40.0,
            periodicity: Periodicity::Monthly,
        });
        quote
    }

    #[test]
    fn export_then_import_reproduces_the_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quote.json");

        let original = full_quote();
        export_json(&original, &path).unwrap();
        let imported = import_json(&path).unwrap();

        assert_eq!(imported, original);
    }

    #[test]
    fn import_fills_missing_optional_fields_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("minimal.json");
        fs::write(
            &path,
            r#"{"number": "QTE-9", "issue_date": "2026-01-05", "items": []}"#,
        )
        .unwrap();

        let quote = import_json(&path).unwrap();
        assert_eq!(quote.number, "QTE-9");
        assert!(quote.items.is_empty());
        assert_eq!(quote.validity_days, 30);
        assert_eq!(quote.kind, QuoteKind::Final);
    }

    #[test]
    fn import_rejects_missing_required_fields() {
        let dir = TempDir::new().unwrap();

        let cases = [
            (r#"{"issue_date": "2026-01-05", "items": []}"#, "number"),
            (r#"{"number": "Q", "items": []}"#, "issue date"),
            (r#"{"number": "Q", "issue_date": "2026-01-05"}"#, "items"),
            (r#"{"number": "Q", "issue_date": "2026-01-05", "items": 3}"#, "items"),
            (r#"{"number": "  ", "issue_date": "2026-01-05", "items": []}"#, "number"),
        ];

        for (body, expected) in cases {
            let path = dir.path().join("bad.json");
            fs::write(&path, body).unwrap();
            let err = import_json(&path).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{} should mention {}",
                err,
                expected
            );
        }
    }

    #[test]
    fn import_rejects_files_that_are_not_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not.json");
        fs::write(&path, "definitely not json").unwrap();

        assert!(matches!(import_json(&path), Err(QuoteError::Import(_))));
    }
}
