use shopper_core::types::CustomerSegment;
use shopper_core::ShopperResult;
use std::path::Path;
use tracing::info;

use crate::{ensure_parent, staging_path};

pub const RFM_HEADERS: [&str; 6] = [
    "CustomerID",
    "Recency",
    "Frequency",
    "Monetary",
    "Cluster",
    "Segment",
];

/// Write the labeled RFM table as CSV, one row per customer. The header is
/// written even when there are no customers.
pub fn write_rfm_table(path: impl AsRef<Path>, customers: &[CustomerSegment]) -> ShopperResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let staging = staging_path(path);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&staging)?;
    writer.write_record(RFM_HEADERS)?;
    for customer in customers {
        writer.serialize(customer)?;
    }
    writer.flush()?;
    drop(writer);

    std::fs::rename(&staging, path)?;
    info!(path = %path.display(), customers = customers.len(), "RFM table written");
    Ok(())
}

/// Read a labeled RFM table written by [`write_rfm_table`].
pub fn read_rfm_table(path: impl AsRef<Path>) -> ShopperResult<Vec<CustomerSegment>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    let customers = reader
        .deserialize()
        .collect::<Result<Vec<CustomerSegment>, csv::Error>>()?;
    Ok(customers)
}
