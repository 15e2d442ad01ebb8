use shopper_core::AppConfig;
use shopper_ingest::load_transactions;
use shopper_personalization::RecommendationEngine;
use shopper_pipeline::PipelineRunner;
use shopper_storage::{load_similarity, read_rfm_table};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

const HEADER: &str =
    "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country\n";

const PRODUCTS: [&str; 6] = [
    "JUMBO BAG RED RETROSPOT",
    "LUNCH BAG BLACK SKULL",
    "PARTY BUNTING",
    "REGENCY CAKESTAND 3 TIER",
    "WHITE HANGING HEART T-LIGHT HOLDER",
    "WOODEN STAR CHRISTMAS SCANDINAVIAN",
];

/// A small retail log: twenty customers with different shopping rhythms
/// plus a few rows the cleaner must drop.
fn sample_log() -> String {
    let mut csv = String::from(HEADER);
    let mut invoice = 540_000;
    for c in 0..20u32 {
        let visits = 1 + c % 5;
        for v in 0..visits {
            invoice += 1;
            let day = 1 + (c * 3 + v * 7) % 28;
            for item in 0..2u32 {
                let product = PRODUCTS[((c + v + item * 2) % PRODUCTS.len() as u32) as usize];
                let qty = 1 + (c + item) % 12;
                let price = 1.25 + f64::from(c % 4);
                writeln!(
                    csv,
                    "{invoice},8512{item},{product},{qty},{}/{day}/2011 10:{:02},{price},{}.0,United Kingdom",
                    1 + c % 11,
                    v,
                    13_000 + c
                )
                .unwrap();
            }
        }
    }
    // Cancelled, anonymous and zero-price rows.
    csv.push_str("C540999,85120,PARTY BUNTING,-2,3/3/2011 9:00,4.95,13001.0,United Kingdom\n");
    csv.push_str("541000,85121,PARTY BUNTING,4,3/3/2011 9:05,4.95,,United Kingdom\n");
    csv.push_str("541001,85122,PARTY BUNTING,4,3/3/2011 9:10,0,13002.0,United Kingdom\n");
    csv
}

fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.data.input_path = dir.join("online_retail.csv").display().to_string();
    config.data.rfm_path = dir.join("out").join("rfm.csv").display().to_string();
    config.data.similarity_path = dir.join("out").join("similarity.bin").display().to_string();
    config
}

#[test]
fn pipeline_writes_both_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.data.input_path, sample_log()).unwrap();

    let report = PipelineRunner::new(config.clone()).run().unwrap();
    assert_eq!(report.dropped_rows, 3);
    assert_eq!(report.customers, 20);
    assert_eq!(report.products, PRODUCTS.len());
    assert!(report.clusters.len() <= 4);
    assert_eq!(
        report.clusters.iter().map(|c| c.size).sum::<usize>(),
        report.customers
    );

    let rfm = read_rfm_table(&config.data.rfm_path).unwrap();
    assert_eq!(rfm.len(), 20);
    for row in &rfm {
        assert!(row.frequency >= 1);
        assert!(row.monetary > 0.0);
        assert!(!row.customer_id.ends_with(".0"));
    }

    let table = load_similarity(&config.data.similarity_path).unwrap();
    assert_eq!(table.products(), &PRODUCTS[..]);

    let engine = RecommendationEngine::new(Arc::new(table));
    let recs = engine.similar_products("PARTY BUNTING", 5);
    assert_eq!(recs.len(), 5);
    assert!(!recs.iter().any(|p| p == "PARTY BUNTING"));
}

#[test]
fn reruns_are_deterministic() {
    let raw = load_transactions(sample_log().as_bytes()).unwrap();
    let runner = PipelineRunner::new(AppConfig::default());

    let first = runner.run_in_memory(&raw);
    let second = runner.run_in_memory(&raw);
    assert_eq!(first.customers, second.customers);
    assert_eq!(first.similarity, second.similarity);
    assert_eq!(first.report, second.report);
}

#[test]
fn persisted_tables_match_in_memory_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let log = sample_log();
    std::fs::write(&config.data.input_path, &log).unwrap();

    let runner = PipelineRunner::new(config.clone());
    runner.run().unwrap();
    let expected = runner.run_in_memory(&load_transactions(log.as_bytes()).unwrap());

    assert_eq!(read_rfm_table(&config.data.rfm_path).unwrap(), expected.customers);
    assert_eq!(load_similarity(&config.data.similarity_path).unwrap(), expected.similarity);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let err = PipelineRunner::new(config.clone()).run().unwrap_err();
    assert!(err.is_not_found());
    assert!(!Path::new(&config.data.rfm_path).exists());
}
