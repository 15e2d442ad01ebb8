//! Transaction cleaning: drops rows that cannot contribute to RFM features
//! or the purchase matrix and derives the line total.

use chrono::{NaiveDate, NaiveDateTime};
use shopper_core::types::{Transaction, CANCELLATION_MARKER};
use tracing::info;

use crate::loader::RawTransaction;

const DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Cleaned transactions plus a tally of why the other rows were dropped.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    pub transactions: Vec<Transaction>,
    pub missing_customer: usize,
    pub cancelled: usize,
    pub non_positive: usize,
    /// Positive but non-integral quantities.
    pub fractional_quantity: usize,
    pub bad_timestamp: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.missing_customer
            + self.cancelled
            + self.non_positive
            + self.fractional_quantity
            + self.bad_timestamp
    }
}

/// Filter raw rows down to valid purchases. Malformed rows are excluded
/// silently; only the per-reason totals are logged.
pub fn clean_transactions(raw: &[RawTransaction]) -> CleanReport {
    let mut report = CleanReport::default();

    for row in raw {
        let Some(customer_id) = row.customer_id.as_deref().and_then(normalize_customer_id) else {
            report.missing_customer += 1;
            continue;
        };

        let invoice_no = row.invoice_no.as_deref().unwrap_or_default();
        if invoice_no.starts_with(CANCELLATION_MARKER) {
            report.cancelled += 1;
            continue;
        }

        let raw_quantity = row.quantity.as_deref();
        let quantity = raw_quantity.and_then(parse_quantity);
        if quantity.is_none() && raw_quantity.is_some_and(is_positive_fraction) {
            report.fractional_quantity += 1;
            continue;
        }
        let unit_price = row.unit_price.as_deref().and_then(|p| p.parse::<f64>().ok());
        let (quantity, unit_price) = match (quantity, unit_price) {
            (Some(q), Some(p)) if q > 0 && p > 0.0 && p.is_finite() => (q, p),
            _ => {
                report.non_positive += 1;
                continue;
            }
        };

        let Some(invoice_date) = row.invoice_date.as_deref().and_then(parse_invoice_date) else {
            report.bad_timestamp += 1;
            continue;
        };

        report.transactions.push(Transaction {
            invoice_no: invoice_no.to_string(),
            stock_code: row.stock_code.clone(),
            description: row.description.clone().unwrap_or_default(),
            quantity,
            unit_price,
            customer_id,
            invoice_date,
            country: row.country.clone().unwrap_or_default(),
            line_total: quantity as f64 * unit_price,
        });
    }

    info!(
        kept = report.transactions.len(),
        missing_customer = report.missing_customer,
        cancelled = report.cancelled,
        non_positive = report.non_positive,
        fractional_quantity = report.fractional_quantity,
        bad_timestamp = report.bad_timestamp,
        "Transactions cleaned"
    );

    report
}

/// Trim the id and strip the `.0` suffix spreadsheets add to numeric ids,
/// so `17850` and `17850.0` refer to the same customer.
pub fn normalize_customer_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    if id.is_empty() || id.eq_ignore_ascii_case("nan") {
        return None;
    }
    let id = match id.strip_suffix(".0") {
        Some(stem) if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) => stem,
        _ => id,
    };
    Some(id.to_string())
}

/// Parse a quantity, accepting integral floats such as `6.0`.
fn parse_quantity(raw: &str) -> Option<i64> {
    if let Ok(q) = raw.parse::<i64>() {
        return Some(q);
    }
    let q = raw.parse::<f64>().ok()?;
    (q.is_finite() && q.fract() == 0.0).then_some(q as i64)
}

fn is_positive_fraction(raw: &str) -> bool {
    raw.parse::<f64>()
        .is_ok_and(|q| q.is_finite() && q > 0.0 && q.fract() != 0.0)
}

/// Parse an invoice timestamp in any of the layouts seen in retail exports.
/// A bare date maps to midnight.
pub fn parse_invoice_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
