//! Shopper Spectrum: customer segmentation and product recommendations
//! for an online retail transaction log.
//!
//! `pipeline` builds the RFM and similarity tables, `serve` exposes the
//! lookup UI, and the remaining subcommands inspect the persisted tables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use shopper_api::ui::NOT_FOUND_MESSAGE;
use shopper_api::ApiServer;
use shopper_core::config::AppConfig;
use shopper_core::types::CustomerRfm;
use shopper_personalization::RecommendationEngine;
use shopper_pipeline::{PipelineReport, PipelineRunner};
use shopper_segmentation::{evaluate, ClusteringScores, EvaluationReport, KMeansParams};
use shopper_storage::{load_similarity, read_rfm_table};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "shopper-spectrum")]
#[command(about = "Customer segmentation and product recommendations for retail transaction logs")]
#[command(version)]
struct Cli {
    /// Config file (any format the config crate reads; extension optional)
    #[arg(long, global = true, default_value = AppConfig::DEFAULT_FILE)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the batch pipeline and overwrite both persisted tables
    Pipeline {
        /// Transaction log CSV (overrides config)
        #[arg(long, env = "SHOPPER_SPECTRUM__DATA__INPUT_PATH")]
        input: Option<String>,

        /// Output path for the labeled RFM table
        #[arg(long)]
        rfm_output: Option<String>,

        /// Output path for the product similarity table
        #[arg(long)]
        similarity_output: Option<String>,

        /// Clustering seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of clusters
        #[arg(long)]
        clusters: Option<usize>,
    },

    /// Score KMeans and DBSCAN on the persisted RFM table
    Evaluate {
        /// RFM table written by `pipeline`
        #[arg(long)]
        rfm: Option<String>,

        /// Largest k in the elbow sweep
        #[arg(long)]
        k_max: Option<usize>,
    },

    /// Print the products most similar to PRODUCT
    Recommend {
        /// Exact product description
        product: String,

        /// Number of recommendations
        #[arg(short, long)]
        n: Option<usize>,
    },

    /// List product names known to the similarity table
    Products {
        /// Print at most this many names
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Start the recommendation UI
    Serve {
        /// Bind address (overrides config)
        #[arg(long, env = "SHOPPER_SPECTRUM__API__HOST")]
        host: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long, env = "SHOPPER_SPECTRUM__API__HTTP_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shopper_spectrum=info,shopper_pipeline=info,shopper_api=info,tower_http=info"
                    .into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Commands::Pipeline {
            input,
            rfm_output,
            similarity_output,
            seed,
            clusters,
        } => cmd_pipeline(config, input, rfm_output, similarity_output, seed, clusters),
        Commands::Evaluate { rfm, k_max } => cmd_evaluate(config, rfm, k_max),
        Commands::Recommend { product, n } => cmd_recommend(config, &product, n),
        Commands::Products { limit } => cmd_products(config, limit),
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn cmd_pipeline(
    mut config: AppConfig,
    input: Option<String>,
    rfm_output: Option<String>,
    similarity_output: Option<String>,
    seed: Option<u64>,
    clusters: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(path) = input {
        config.data.input_path = path;
    }
    if let Some(path) = rfm_output {
        config.data.rfm_path = path;
    }
    if let Some(path) = similarity_output {
        config.data.similarity_path = path;
    }
    if let Some(seed) = seed {
        config.segmentation.seed = seed;
    }
    if let Some(k) = clusters {
        config.segmentation.n_clusters = k;
    }

    info!(
        input = %config.data.input_path,
        clusters = config.segmentation.n_clusters,
        seed = config.segmentation.seed,
        "Running pipeline"
    );

    let runner = PipelineRunner::new(config.clone());
    let report = runner
        .run()
        .with_context(|| format!("pipeline failed for {}", config.data.input_path))?;

    print_pipeline_report(&report);
    println!();
    println!("RFM table:        {}", config.data.rfm_path);
    println!("Similarity table: {}", config.data.similarity_path);
    Ok(())
}

fn print_pipeline_report(report: &PipelineReport) {
    println!("Pipeline complete");
    println!("  Rows read:       {}", report.raw_rows);
    println!("  Rows kept:       {}", report.clean_rows);
    println!("  Rows dropped:    {}", report.dropped_rows);
    if let Some(reference) = report.reference_date {
        println!("  Reference date:  {}", reference.format("%Y-%m-%d"));
    }
    println!("  Customers:       {}", report.customers);
    println!("  Products:        {}", report.products);
    println!("  Inertia:         {:.4}", report.inertia);
    println!();

    println!(
        "{:<12} {:>9} {:>10} {:>10} {:>12}",
        "Segment", "Customers", "Recency", "Frequency", "Monetary"
    );
    println!("{}", "-".repeat(57));
    for row in &report.segments {
        println!(
            "{:<12} {:>9} {:>10.2} {:>10.2} {:>12.2}",
            row.segment.as_str(),
            row.customers,
            row.mean_recency,
            row.mean_frequency,
            row.mean_monetary
        );
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn cmd_evaluate(
    mut config: AppConfig,
    rfm: Option<String>,
    k_max: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(path) = rfm {
        config.data.rfm_path = path;
    }
    if let Some(k) = k_max {
        config.evaluation.k_max = k;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let table = read_rfm_table(&config.data.rfm_path)
        .with_context(|| format!("failed to read RFM table {}", config.data.rfm_path))?;
    let records: Vec<CustomerRfm> = table.iter().map(|c| c.rfm()).collect();
    info!(customers = records.len(), "Evaluating clustering");

    let params = KMeansParams::from(&config.segmentation);
    let report = evaluate(&records, &config.evaluation, &params);
    print_evaluation_report(&report);
    Ok(())
}

fn print_evaluation_report(report: &EvaluationReport) {
    println!("Elbow (SSE by k)");
    for (k, sse) in &report.elbow {
        println!("  k={k:<3} {sse:>14.4}");
    }
    println!();

    print_scores(&report.kmeans);
    println!();
    print_scores(&report.dbscan);
    println!("  Cluster sizes:");
    for (label, size) in &report.dbscan_distribution {
        let name = if *label < 0 {
            "noise".to_string()
        } else {
            format!("cluster {label}")
        };
        println!("    {name:<12} {size}");
    }
}

fn print_scores(scores: &ClusteringScores) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    println!("{} evaluation", scores.name);
    println!("  Labels:            {}", scores.n_labels);
    println!("  Silhouette:        {}", fmt(scores.silhouette));
    println!("  Calinski-Harabasz: {}", fmt(scores.calinski_harabasz));
    println!("  Davies-Bouldin:    {}", fmt(scores.davies_bouldin));
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

fn load_engine(config: &AppConfig) -> anyhow::Result<RecommendationEngine> {
    let path = &config.data.similarity_path;
    let table = load_similarity(path).with_context(|| {
        format!("failed to load similarity table from {path}; run the pipeline first")
    })?;
    Ok(RecommendationEngine::new(Arc::new(table)))
}

fn cmd_recommend(config: AppConfig, product: &str, n: Option<usize>) -> anyhow::Result<()> {
    let engine = load_engine(&config)?;
    let n = n
        .unwrap_or(config.recommend.default_count)
        .min(config.recommend.max_count);

    let recommendations = engine.similar_products(product, n);
    if recommendations.is_empty() {
        println!("{NOT_FOUND_MESSAGE}");
        return Ok(());
    }

    println!("Top {} Recommended Products:", recommendations.len());
    for (i, name) in recommendations.iter().enumerate() {
        println!("{}. {name}", i + 1);
    }
    Ok(())
}

fn cmd_products(config: AppConfig, limit: Option<usize>) -> anyhow::Result<()> {
    let engine = load_engine(&config)?;
    let products = engine.products();
    let shown = limit.unwrap_or(products.len()).min(products.len());

    for name in &products[..shown] {
        println!("{name}");
    }
    if shown < products.len() {
        println!("... {} more", products.len() - shown);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

async fn cmd_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.api.host = host;
    }
    if let Some(port) = port {
        config.api.http_port = port;
    }

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        similarity_path = %config.data.similarity_path,
        "Shopper Spectrum UI starting up"
    );

    let server = ApiServer::from_config(config.clone())?;

    if config.metrics.enabled {
        if let Err(e) = server.start_metrics() {
            warn!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!(products = server.engine().products().len(), "Ready to serve lookups");

    // Blocks until shutdown
    server.start_http().await?;

    Ok(())
}
