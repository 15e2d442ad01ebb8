use chrono::NaiveDate;
use proptest::prelude::*;
use shopper_core::types::Transaction;
use shopper_personalization::{build_similarity, RecommendationEngine};
use std::sync::Arc;

fn purchase(customer: u8, product: u8, qty: u8) -> Transaction {
    Transaction {
        invoice_no: format!("INV-{customer}"),
        stock_code: None,
        description: format!("PRODUCT {product:02}"),
        quantity: qty as i64,
        unit_price: 1.25,
        customer_id: format!("{customer}"),
        invoice_date: NaiveDate::from_ymd_opt(2011, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        country: "United Kingdom".to_string(),
        line_total: qty as f64 * 1.25,
    }
}

fn purchases() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec((0u8..8, 0u8..12, 1u8..20), 1..60)
        .prop_map(|rows| rows.into_iter().map(|(c, p, q)| purchase(c, p, q)).collect())
}

proptest! {
    #[test]
    fn similarity_is_symmetric(txns in purchases()) {
        let table = build_similarity(&txns);
        let n = table.len();
        for i in 0..n {
            for j in 0..n {
                prop_assert!((table.get(i, j) - table.get(j, i)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn purchased_products_are_self_similar(txns in purchases()) {
        let table = build_similarity(&txns);
        for i in 0..table.len() {
            prop_assert!((table.get(i, i) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn scores_stay_in_unit_interval(txns in purchases()) {
        let table = build_similarity(&txns);
        for i in 0..table.len() {
            for &s in table.row(i) {
                prop_assert!((0.0..=1.0).contains(&s), "score {} out of range", s);
            }
        }
    }

    #[test]
    fn lookup_excludes_query_and_respects_count(txns in purchases(), n in 0usize..15) {
        let engine = RecommendationEngine::new(Arc::new(build_similarity(&txns)));
        for product in engine.products() {
            let recs = engine.similar_products(product, n);
            prop_assert!(!recs.contains(product));
            prop_assert!(recs.len() <= n);
            prop_assert!(recs.len() <= engine.products().len() - 1);
        }
    }

    #[test]
    fn lookup_scores_are_descending(txns in purchases()) {
        let engine = RecommendationEngine::new(Arc::new(build_similarity(&txns)));
        for product in engine.products() {
            let recs = engine.recommend(product, 5);
            for pair in recs.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}

#[test]
fn unknown_product_has_no_recommendations() {
    let txns = vec![purchase(1, 1, 2), purchase(1, 2, 2), purchase(2, 1, 1)];
    let engine = RecommendationEngine::new(Arc::new(build_similarity(&txns)));
    assert!(engine.similar_products("NOT IN CATALOG", 5).is_empty());
}
