//! Item-item cosine similarity over the customer x product purchase matrix.

use ndarray::{Array1, Array2, Axis};
use shopper_core::types::{SimilarityTable, Transaction};
use std::collections::BTreeMap;
use tracing::info;

/// Total quantity bought per customer (rows) and product (columns). Both
/// axes are sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMatrix {
    pub customers: Vec<String>,
    pub products: Vec<String>,
    pub quantities: Array2<f64>,
}

impl ItemMatrix {
    pub fn quantity(&self, customer: &str, product: &str) -> Option<f64> {
        let row = self.customers.binary_search_by(|c| c.as_str().cmp(customer)).ok()?;
        let col = self.products.binary_search_by(|p| p.as_str().cmp(product)).ok()?;
        Some(self.quantities[[row, col]])
    }
}

/// Pivot transactions into a purchase matrix. Rows without a product
/// description carry no item identity and are left out.
pub fn build_item_matrix(transactions: &[Transaction]) -> ItemMatrix {
    let mut customers: BTreeMap<&str, usize> = BTreeMap::new();
    let mut products: BTreeMap<&str, usize> = BTreeMap::new();
    for txn in transactions.iter().filter(|t| !t.description.is_empty()) {
        customers.entry(txn.customer_id.as_str()).or_insert(0);
        products.entry(txn.description.as_str()).or_insert(0);
    }
    for (idx, slot) in customers.values_mut().enumerate() {
        *slot = idx;
    }
    for (idx, slot) in products.values_mut().enumerate() {
        *slot = idx;
    }

    let mut quantities = Array2::zeros((customers.len(), products.len()));
    for txn in transactions.iter().filter(|t| !t.description.is_empty()) {
        let row = customers[txn.customer_id.as_str()];
        let col = products[txn.description.as_str()];
        quantities[[row, col]] += txn.quantity as f64;
    }

    ItemMatrix {
        customers: customers.into_keys().map(str::to_string).collect(),
        products: products.into_keys().map(str::to_string).collect(),
        quantities,
    }
}

/// Cosine similarity between every pair of product columns. Pairs involving
/// a zero column score 0; the table is exactly symmetric with a unit
/// diagonal for purchased products.
pub fn cosine_similarity(matrix: &ItemMatrix) -> SimilarityTable {
    let n = matrix.products.len();
    let norms: Array1<f64> = matrix
        .quantities
        .axis_iter(Axis(1))
        .map(|col| col.dot(&col).sqrt())
        .collect();

    let mut normalized = matrix.quantities.clone();
    for (mut col, &norm) in normalized.axis_iter_mut(Axis(1)).zip(norms.iter()) {
        if norm > 0.0 {
            col.mapv_inplace(|v| v / norm);
        }
    }
    let gram = normalized.t().dot(&normalized);

    let mut scores = vec![0.0; n * n];
    for i in 0..n {
        scores[i * n + i] = if norms[i] > 0.0 { 1.0 } else { 0.0 };
        for j in (i + 1)..n {
            let sim = gram[[i, j]].clamp(-1.0, 1.0);
            scores[i * n + j] = sim;
            scores[j * n + i] = sim;
        }
    }

    SimilarityTable::from_parts(matrix.products.clone(), scores)
        .unwrap_or_else(|_| SimilarityTable::empty())
}

/// Build the product similarity table straight from cleaned transactions.
pub fn build_similarity(transactions: &[Transaction]) -> SimilarityTable {
    let matrix = build_item_matrix(transactions);
    let table = cosine_similarity(&matrix);
    info!(
        customers = matrix.customers.len(),
        products = table.len(),
        "Product similarity table built"
    );
    table
}
