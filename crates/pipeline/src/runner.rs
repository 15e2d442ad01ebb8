//! Pipeline runner. Stages execute in a fixed order on one thread:
//! load -> clean -> RFM -> segmentation -> similarity -> persistence.

use chrono::NaiveDateTime;
use serde::Serialize;
use shopper_core::types::{CustomerSegment, SimilarityTable};
use shopper_core::{AppConfig, ShopperError, ShopperResult};
use shopper_ingest::{clean_transactions, load_transactions_file, RawTransaction};
use shopper_personalization::build_similarity;
use shopper_segmentation::{build_rfm_with_reference, reference_date, ClusterProfile, SegmentationEngine};
use shopper_storage::{save_similarity, write_rfm_table};
use std::time::Instant;
use tracing::{info, warn};

use crate::summary::{segment_summary, SegmentSummary};

/// Counts and per-segment figures from one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub dropped_rows: usize,
    pub reference_date: Option<NaiveDateTime>,
    pub customers: usize,
    pub products: usize,
    pub inertia: f64,
    pub clusters: Vec<ClusterProfile>,
    pub segments: Vec<SegmentSummary>,
}

/// Everything a run produces before it is written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub customers: Vec<CustomerSegment>,
    pub similarity: SimilarityTable,
    pub report: PipelineReport,
}

pub struct PipelineRunner {
    config: AppConfig,
    engine: SegmentationEngine,
}

impl PipelineRunner {
    pub fn new(config: AppConfig) -> Self {
        let engine = SegmentationEngine::from_config(&config.segmentation);
        Self { config, engine }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run every stage against the configured input file and overwrite the
    /// RFM and similarity tables.
    pub fn run(&self) -> ShopperResult<PipelineReport> {
        self.config.validate().map_err(ShopperError::Config)?;
        let data = &self.config.data;

        let start = Instant::now();
        let raw = load_transactions_file(&data.input_path)?;
        info!(
            path = %data.input_path,
            rows = raw.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: load"
        );

        let output = self.run_in_memory(&raw);

        let start = Instant::now();
        write_rfm_table(&data.rfm_path, &output.customers)?;
        save_similarity(&data.similarity_path, &output.similarity)?;
        info!(
            rfm_path = %data.rfm_path,
            similarity_path = %data.similarity_path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: persist"
        );

        Ok(output.report)
    }

    /// Clean, segment and build similarity without touching the filesystem.
    pub fn run_in_memory(&self, raw: &[RawTransaction]) -> PipelineOutput {
        let start = Instant::now();
        let cleaned = clean_transactions(raw);
        info!(
            kept = cleaned.transactions.len(),
            dropped = cleaned.dropped(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: clean"
        );
        let transactions = cleaned.transactions;
        if transactions.is_empty() {
            warn!("No valid transactions after cleaning; tables will be empty");
        }

        let start = Instant::now();
        let reference = reference_date(&transactions);
        let rfm = match reference {
            Some(reference) => build_rfm_with_reference(&transactions, reference),
            None => Vec::new(),
        };
        info!(
            customers = rfm.len(),
            reference = ?reference,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: rfm"
        );

        let start = Instant::now();
        let segmentation = self.engine.segment(&rfm);
        info!(
            clusters = segmentation.profiles.len(),
            inertia = segmentation.inertia,
            iterations = segmentation.iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: segmentation"
        );

        let start = Instant::now();
        let similarity = build_similarity(&transactions);
        info!(
            products = similarity.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage complete: similarity"
        );

        let report = PipelineReport {
            raw_rows: raw.len(),
            clean_rows: transactions.len(),
            dropped_rows: raw.len() - transactions.len(),
            reference_date: reference,
            customers: segmentation.customers.len(),
            products: similarity.len(),
            inertia: segmentation.inertia,
            segments: segment_summary(&segmentation.customers),
            clusters: segmentation.profiles,
        };

        PipelineOutput {
            customers: segmentation.customers,
            similarity,
            report,
        }
    }
}
