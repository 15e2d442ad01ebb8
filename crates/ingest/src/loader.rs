//! CSV transaction log loader.
//!
//! Reads the raw line-item table into `RawTransaction` rows without
//! interpreting any field. Expected CSV columns (StockCode optional):
//!   InvoiceNo, StockCode, Description, Quantity, InvoiceDate, UnitPrice,
//!   CustomerID, Country
//!
//! Fields are decoded lossily so that Latin-1 exports of the retail log load
//! without failing on accented product descriptions.

use serde::{Deserialize, Serialize};
use shopper_core::{ShopperError, ShopperResult};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One line item exactly as it appears in the transaction log. Every field
/// is optional text; interpretation happens in the cleaner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub invoice_no: Option<String>,
    pub stock_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub invoice_date: Option<String>,
    pub unit_price: Option<String>,
    pub customer_id: Option<String>,
    pub country: Option<String>,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    invoice_no: usize,
    stock_code: Option<usize>,
    description: usize,
    quantity: usize,
    invoice_date: usize,
    unit_price: usize,
    customer_id: usize,
    country: usize,
}

impl ColumnMap {
    fn from_headers(headers: &csv::ByteRecord) -> ShopperResult<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();
        let find = |name: &str| names.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                ShopperError::Data(format!("transaction log is missing column '{name}'"))
            })
        };

        Ok(Self {
            invoice_no: require("InvoiceNo")?,
            stock_code: find("StockCode"),
            description: require("Description")?,
            quantity: require("Quantity")?,
            invoice_date: require("InvoiceDate")?,
            unit_price: require("UnitPrice")?,
            customer_id: require("CustomerID")?,
            country: require("Country")?,
        })
    }

    fn extract(&self, record: &csv::ByteRecord) -> RawTransaction {
        let raw = |idx: usize| record.get(idx).map(|b| String::from_utf8_lossy(b));
        let field = |idx: usize| {
            raw(idx)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        RawTransaction {
            invoice_no: field(self.invoice_no),
            stock_code: self.stock_code.and_then(&field),
            // Descriptions are product identities; keep them byte-for-byte.
            description: raw(self.description)
                .map(|s| s.into_owned())
                .filter(|s| !s.is_empty()),
            quantity: field(self.quantity),
            invoice_date: field(self.invoice_date),
            unit_price: field(self.unit_price),
            customer_id: field(self.customer_id),
            country: field(self.country),
        }
    }
}

/// Load raw transactions from a CSV reader. Records the CSV layer cannot
/// decode are skipped; a header without the required columns is an error.
pub fn load_transactions<R: Read>(reader: R) -> ShopperResult<Vec<RawTransaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(csv_reader.byte_headers()?)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in csv_reader.byte_records() {
        match result {
            Ok(record) => rows.push(columns.extract(&record)),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping undecodable transaction row");
            }
        }
    }

    info!(rows = rows.len(), skipped, "Transaction log loaded");
    Ok(rows)
}

/// Load raw transactions from a CSV file path.
pub fn load_transactions_file(path: impl AsRef<Path>) -> ShopperResult<Vec<RawTransaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    debug!(path = %path.display(), "Opened transaction log");
    load_transactions(std::io::BufReader::new(file))
}
