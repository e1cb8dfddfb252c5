//! Charts and console summaries of mining results using Plotters

use crate::itemset::FrequentItemsetTable;
use crate::pipeline::PipelineContext;
use crate::rules::{AssociationRule, RuleStrength};
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

/// Color per rule strength band
fn strength_color(strength: RuleStrength) -> RGBColor {
    match strength {
        RuleStrength::Moderate => BLUE,
        RuleStrength::Strong => GREEN,
        RuleStrength::VeryStrong => RED,
    }
}

/// Scatter plot of rules: support on x, confidence on y, colored by strength
///
/// # Arguments
/// * `rules` - Generated association rules
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_rule_scatter(
    rules: &[AssociationRule],
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title = plot_title.unwrap_or("Association Rules: Support vs Confidence (Colored by Lift)");

    let support_max = rules.iter().map(|r| r.support).fold(0.0, f64::max);
    let x_max = (support_max * 1.1).max(0.01);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("Support")
        .y_desc("Confidence")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for strength in [
        RuleStrength::Moderate,
        RuleStrength::Strong,
        RuleStrength::VeryStrong,
    ] {
        let color = strength_color(strength);
        let points: Vec<(f64, f64)> = rules
            .iter()
            .filter(|r| r.strength() == strength)
            .map(|r| (r.support, r.confidence))
            .collect();
        if points.is_empty() {
            continue;
        }

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|(x, y)| Circle::new((x, y), 4, color.filled())),
            )?
            .label(strength.to_string())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!("Rule scatter plot saved to: {}", output_path);

    Ok(())
}

/// Bar chart of the most supported single items
pub fn create_item_support_chart(
    table: &FrequentItemsetTable,
    output_path: &str,
    top_n: usize,
) -> crate::Result<()> {
    let mut singles: Vec<(String, f64)> = table
        .of_len(1)
        .map(|r| (table.item_names(&r.items).join(""), r.support))
        .collect();
    singles.sort_by(|a, b| b.1.total_cmp(&a.1));
    singles.truncate(top_n);

    let max_support = singles.iter().map(|(_, s)| *s).fold(0.0, f64::max);
    let bars = singles.len().max(1) as f64;

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Top Items by Support", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(bars - 0.5), 0f64..(max_support * 1.1).max(0.01))?;

    let label_for = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        singles
            .get(index as usize)
            .map(|(name, _)| shorten(name, 14))
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(singles.len().max(1))
        .x_label_formatter(&label_for)
        .y_desc("Support")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(singles.iter().enumerate().map(|(i, (_, support))| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *support)], BLUE.filled())
    }))?;

    root.present()?;
    info!("Item support chart saved to: {}", output_path);

    Ok(())
}

fn shorten(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let head: String = name.chars().take(max_chars - 1).collect();
        format!("{head}…")
    }
}

/// Print dataset, itemset and rule statistics to console
pub fn print_analysis_summary(context: &PipelineContext, top_n: usize) {
    if let Some(summary) = context.summary() {
        println!("\n=== Dataset ===");
        println!("Transactions: {}", summary.n_transactions);
        println!("Unique items: {}", summary.n_items);
        println!(
            "Average items per transaction: {:.2}",
            summary.avg_items_per_transaction
        );
        println!("Matrix density: {:.2}%", summary.density_pct);
    }

    let Some(table) = context.itemsets() else {
        return;
    };

    println!("\n=== Frequent Itemsets ===");
    if table.is_empty() {
        println!("No frequent itemsets found. Try lowering the support threshold.");
        return;
    }
    println!("Found: {}", table.len());
    for len in 1..=table.max_itemset_len() {
        println!("  Size {}: {}", len, table.of_len(len).count());
    }
    println!("\nTop itemsets:");
    println!("  {:<50} | Support", "Items");
    println!("  {:-<50}-|--------", "");
    for record in table.top_by_support(top_n) {
        println!(
            "  {:<50} | {:.4}",
            shorten(&table.item_names(&record.items).join(", "), 50),
            record.support
        );
    }

    let rules = context.rules().unwrap_or_default();
    println!("\n=== Association Rules ===");
    if rules.is_empty() {
        println!("No association rules found with current thresholds.");
        return;
    }
    println!("Found: {}", rules.len());
    let max_lift = rules.iter().map(|r| r.lift).fold(0.0, f64::max);
    println!("Max lift: {:.2}", max_lift);
    println!("\nTop rules:");
    println!(
        "  {:<50} | Support | Confidence |  Lift | Strength",
        "Rule"
    );
    println!("  {:-<50}-|---------|------------|-------|------------", "");
    for rule in rules.iter().take(top_n) {
        println!(
            "  {:<50} | {:7.4} | {:10.4} | {:5.2} | {}",
            shorten(&rule.describe(table), 50),
            rule.support,
            rule.confidence,
            rule.lift,
            rule.strength()
        );
    }
}

/// Path of the item support chart written beside the rule plot:
/// `rules.png` becomes `rules_items.png`
pub fn items_chart_path(base_output_path: &str) -> String {
    let base = Path::new(base_output_path);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rules".to_string());
    let extension = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    base.with_file_name(format!("{stem}_items.{extension}"))
        .to_string_lossy()
        .into_owned()
}

/// Write both charts next to `base_output_path` and print the summary
pub fn generate_visualization_report(
    context: &PipelineContext,
    base_output_path: &str,
    top_n: usize,
) -> crate::Result<()> {
    if let Some(rules) = context.rules() {
        create_rule_scatter(rules, base_output_path, None)?;
    }

    if let Some(table) = context.itemsets() {
        let items_path = items_chart_path(base_output_path);
        create_item_support_chart(table, &items_path, top_n)?;
    }

    print_analysis_summary(context, top_n);

    Ok(())
}
