//! RFM features: per-customer recency, frequency and monetary aggregates
//! computed from the cleaned transaction log.

use chrono::{Duration, NaiveDateTime};
use shopper_core::types::{CustomerRfm, Transaction};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Default)]
struct Accumulator<'a> {
    last_purchase: Option<NaiveDateTime>,
    invoices: HashSet<&'a str>,
    monetary: f64,
}

/// One day past the latest transaction in the log, or `None` for an empty log.
pub fn reference_date(transactions: &[Transaction]) -> Option<NaiveDateTime> {
    transactions
        .iter()
        .map(|t| t.invoice_date)
        .max()
        .map(|latest| latest + Duration::days(1))
}

/// Build RFM records relative to [`reference_date`].
pub fn build_rfm(transactions: &[Transaction]) -> Vec<CustomerRfm> {
    match reference_date(transactions) {
        Some(reference) => build_rfm_with_reference(transactions, reference),
        None => Vec::new(),
    }
}

/// Build RFM records relative to an explicit reference date. Records are
/// ordered by customer id.
pub fn build_rfm_with_reference(
    transactions: &[Transaction],
    reference: NaiveDateTime,
) -> Vec<CustomerRfm> {
    let mut customers: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();

    for txn in transactions {
        let acc = customers.entry(txn.customer_id.as_str()).or_default();
        acc.last_purchase = Some(match acc.last_purchase {
            Some(prev) => prev.max(txn.invoice_date),
            None => txn.invoice_date,
        });
        acc.invoices.insert(txn.invoice_no.as_str());
        acc.monetary += txn.line_total;
    }

    debug!(customers = customers.len(), reference = %reference, "Aggregated RFM features");

    customers
        .into_iter()
        .filter_map(|(customer_id, acc)| {
            let last = acc.last_purchase?;
            // Whole days, floored; a purchase after the reference counts as today.
            let recency = (reference - last).num_days().max(0);
            Some(CustomerRfm {
                customer_id: customer_id.to_string(),
                recency: u32::try_from(recency).unwrap_or(u32::MAX),
                frequency: acc.invoices.len() as u32,
                monetary: acc.monetary,
            })
        })
        .collect()
}
