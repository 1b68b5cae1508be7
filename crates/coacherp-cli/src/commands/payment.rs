//! Payment command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use coacherp_core::store::filter_ledger;
use coacherp_core::{AppStore, LedgerFilter, PaymentMode};

use crate::output::Output;

/// Record a payment against a student
pub async fn add(
    store: &Arc<Mutex<AppStore>>,
    student_id: String,
    amount: f64,
    mode: String,
    image: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    if amount <= 0.0 {
        bail!("Payment amount must be positive");
    }
    let mode: PaymentMode = mode.parse().map_err(anyhow::Error::msg)?;

    let reference_image = match image {
        Some(path) => Some(encode_reference_image(&path)?),
        None => None,
    };

    let mut store = store.lock().await;
    let payment = store.add_payment(&student_id, amount, mode, reference_image)?;

    output.success(&format!(
        "Recorded payment {} of ₹{} for {}",
        payment.id, payment.amount, student_id
    ));
    Ok(())
}

/// Show a student's ledger with optional filters, newest first
#[allow(clippy::too_many_arguments)]
pub async fn list(
    store: &Arc<Mutex<AppStore>>,
    student_id: String,
    from: Option<String>,
    to: Option<String>,
    mode: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    output: &Output,
) -> Result<()> {
    let filter = LedgerFilter {
        from: from.as_deref().map(parse_day).transpose()?,
        to: to.as_deref().map(parse_day).transpose()?,
        mode: mode
            .as_deref()
            .map(|m| m.parse::<PaymentMode>().map_err(anyhow::Error::msg))
            .transpose()?,
        min_amount: min,
        max_amount: max,
    };

    let store = store.lock().await;
    let student = store
        .get_student(&student_id)
        .with_context(|| format!("Student not found: {}", student_id))?;

    let payments = filter_ledger(student, &filter);
    output.print_ledger(student, &payments);
    Ok(())
}

/// Parse a YYYY-MM-DD day into a UTC timestamp at midnight
fn parse_day(s: &str) -> Result<chrono::DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'; expected YYYY-MM-DD", s))?;
    Ok(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap()))
}

/// Read an image file and encode it as a data URL
fn encode_reference_image(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        let parsed = parse_day("2024-04-15").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap());
        assert!(parse_day("15/04/2024").is_err());
    }

    #[test]
    fn test_encode_reference_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, b"fake png bytes").unwrap();

        let encoded = encode_reference_image(&path).unwrap();
        assert!(encoded.starts_with("data:image/png;base64,"));
    }
}
