use serde::{Deserialize, Serialize};
use shopper_core::types::{CustomerSegment, SegmentLabel};
use std::collections::BTreeMap;

/// Mean RFM values of every customer carrying one segment label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: SegmentLabel,
    pub customers: usize,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: f64,
}

/// Per-label means rounded to two decimals, ordered by label name.
/// Labels with no customers are omitted.
pub fn segment_summary(customers: &[CustomerSegment]) -> Vec<SegmentSummary> {
    // (count, recency, frequency, monetary) keyed by display name.
    let mut totals: BTreeMap<&'static str, (SegmentLabel, usize, f64, f64, f64)> = BTreeMap::new();
    for c in customers {
        let entry = totals
            .entry(c.segment.as_str())
            .or_insert((c.segment, 0, 0.0, 0.0, 0.0));
        entry.1 += 1;
        entry.2 += c.recency as f64;
        entry.3 += c.frequency as f64;
        entry.4 += c.monetary;
    }

    totals
        .into_values()
        .map(|(segment, n, r, f, m)| {
            let n_f = n as f64;
            SegmentSummary {
                segment,
                customers: n,
                mean_recency: round2(r / n_f),
                mean_frequency: round2(f / n_f),
                mean_monetary: round2(m / n_f),
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
