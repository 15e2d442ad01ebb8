use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix marking a cancelled invoice in the transaction log.
pub const CANCELLATION_MARKER: char = 'C';

/// A cleaned line item. Quantity and unit price are strictly positive and
/// the customer id is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub invoice_no: String,
    pub stock_code: Option<String>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub customer_id: String,
    pub invoice_date: NaiveDateTime,
    pub country: String,
    /// `quantity * unit_price`.
    pub line_total: f64,
}

/// Recency/Frequency/Monetary features for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Whole days between the customer's last purchase and the reference date.
    pub recency: u32,
    /// Number of distinct invoices.
    pub frequency: u32,
    /// Sum of line totals.
    pub monetary: f64,
}

/// Human-readable customer segment derived from a cluster's mean RFM values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentLabel {
    #[serde(rename = "High-Value")]
    HighValue,
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "At-Risk")]
    AtRisk,
    #[serde(rename = "Occasional")]
    Occasional,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; 4] = [
        SegmentLabel::HighValue,
        SegmentLabel::Regular,
        SegmentLabel::AtRisk,
        SegmentLabel::Occasional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentLabel::HighValue => "High-Value",
            SegmentLabel::Regular => "Regular",
            SegmentLabel::AtRisk => "At-Risk",
            SegmentLabel::Occasional => "Occasional",
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SegmentLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown segment label '{s}'"))
    }
}

/// An RFM record with its cluster assignment and segment label. This is the
/// row shape of the persisted RFM table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "Recency")]
    pub recency: u32,
    #[serde(rename = "Frequency")]
    pub frequency: u32,
    #[serde(rename = "Monetary")]
    pub monetary: f64,
    #[serde(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "Segment")]
    pub segment: SegmentLabel,
}

impl CustomerSegment {
    pub fn rfm(&self) -> CustomerRfm {
        CustomerRfm {
            customer_id: self.customer_id.clone(),
            recency: self.recency,
            frequency: self.frequency,
            monetary: self.monetary,
        }
    }
}

/// Square product-by-product cosine similarity table.
///
/// Products are held in strictly ascending order so lookups can binary
/// search; `scores` is row-major with `products.len()^2` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityTable {
    products: Vec<String>,
    scores: Vec<f64>,
}

impl SimilarityTable {
    pub fn from_parts(products: Vec<String>, scores: Vec<f64>) -> Result<Self, String> {
        let table = Self { products, scores };
        table.validate()?;
        Ok(table)
    }

    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Check the shape and ordering invariants. Tables coming off disk go
    /// through here before use.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.products.len();
        if self.scores.len() != n * n {
            return Err(format!(
                "similarity table has {} scores for {} products (expected {})",
                self.scores.len(),
                n,
                n * n
            ));
        }
        if let Some(pair) = self.products.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "product names are not strictly ascending at '{}' / '{}'",
                pair[0], pair[1]
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn index_of(&self, product: &str) -> Option<usize> {
        self.products
            .binary_search_by(|p| p.as_str().cmp(product))
            .ok()
    }

    pub fn contains(&self, product: &str) -> bool {
        self.index_of(product).is_some()
    }

    /// Similarities of product `i` against every product, in catalog order.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.products.len();
        &self.scores[i * n..(i + 1) * n]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.products.len() + j]
    }

    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }
}
