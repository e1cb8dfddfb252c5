//! BasketForge: market basket analysis CLI
//!
//! This is the main entrypoint that orchestrates data loading, itemset mining,
//! rule generation, export and visualization.

use anyhow::Result;
use basketforge::advisor::transactions_for_support;
use basketforge::{export, load_transactions, viz, Args, CancelToken, PipelineContext};
use clap::Parser;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        println!("BasketForge - Market Basket Analysis");
        println!("====================================\n");
    }

    run_pipeline(&args)
}

/// RUST_LOG wins over the --verbose default
fn init_logging(verbose: bool) {
    let default_level = if verbose { "basketforge=debug" } else { "basketforge=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Market Basket Analysis ===\n");

    let start_time = Instant::now();

    // Step 1: Load and clean transactions
    if args.verbose {
        println!("Step 1: Loading transactions");
        println!("  Input file: {}", args.input);
    }

    let data_start = Instant::now();
    let data = load_transactions(
        &args.input,
        &args.column_mapping(),
        args.parse_quality_weights()?,
    )?;
    let data_time = data_start.elapsed();

    println!("✓ Data loaded: {} transactions", data.transactions.len());
    if args.verbose {
        println!("  Processing time: {:.2}s", data_time.as_secs_f64());
        println!("  Rows dropped during cleaning: {}", data.rows_dropped);
        println!("  Data quality score: {:.1}/100", data.quality.quality_score);
    }

    // Step 2: Encode and mine frequent itemsets
    let config = args.mining_config(data.transactions.len())?;
    if args.verbose {
        println!("\nStep 2: Mining frequent itemsets");
        println!("  Algorithm: {}", config.algorithm);
        println!("  Min support: {:.4}", config.min_support);
        println!(
            "  Itemsets must appear in at least {} transactions",
            transactions_for_support(config.min_support, data.transactions.len())
        );
        println!("  Max itemset length: {}", config.max_len);
    }

    let cancel = match args.timeout() {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::new(),
    };

    let mut context = PipelineContext::new(config)?;
    context.encode(&data.transactions)?;

    let mine_start = Instant::now();
    let itemset_count = context.mine(&cancel)?.len();
    let mine_time = mine_start.elapsed();

    println!("✓ Frequent itemsets found: {}", itemset_count);
    if args.verbose {
        println!("  Mining time: {:.2}s", mine_time.as_secs_f64());
    }

    // Step 3: Generate association rules
    if args.verbose {
        println!("\nStep 3: Generating association rules");
        println!("  Min confidence: {:.2}", context.config().min_confidence);
        println!("  Min lift: {:.2}", context.config().min_lift);
    }
    let rule_count = context.generate_rules()?.len();
    println!("✓ Association rules found: {}", rule_count);

    // Step 4: Export
    let written = export::export_results(&context, Path::new(&args.output_dir), args.json)?;
    println!("\n✓ Results exported");
    for path in &written {
        println!("  {}", path.display());
    }

    // Step 5: Charts and summary
    match &args.plot {
        Some(plot_path) => {
            let viz_start = Instant::now();
            viz::generate_visualization_report(&context, plot_path, args.top)?;
            if args.verbose {
                println!(
                    "\n  Visualization time: {:.2}s",
                    viz_start.elapsed().as_secs_f64()
                );
            }
            println!("\nRule plot saved to: {}", plot_path);
            println!(
                "Item support chart saved to: {}",
                viz::items_chart_path(plot_path)
            );
        }
        None => viz::print_analysis_summary(&context, args.top),
    }

    let total_time = start_time.elapsed();
    println!("\n=== Analysis Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}
