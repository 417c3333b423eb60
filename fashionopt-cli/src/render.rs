//! Terminal rendering of statuses, messages and comparisons

use colored::*;
use fashionopt_coordinator::FinalReport;
use fashionopt_core::domain::message::Severity;
use fashionopt_core::domain::result::OptimizationResult;
use fashionopt_core::domain::simulation::{Algorithm, AlgorithmProgress, OverallStatus, SimulationStatus};
use fashionopt_core::lifecycle::ProgressSnapshot;
use fashionopt_core::reconcile::{COMPARISON_CHART_LIMIT, ComparisonView, top_products_by_profit};

/// Severity as a colored tag
pub fn severity_tag(severity: Severity) -> ColoredString {
    let tag = format!("[{}]", severity);
    match severity {
        Severity::Info => tag.blue(),
        Severity::Success => tag.green().bold(),
        Severity::Warning => tag.yellow().bold(),
        Severity::Error => tag.red().bold(),
    }
}

pub fn colorize_status(status: OverallStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        OverallStatus::Pending => label.yellow(),
        OverallStatus::Running => label.cyan(),
        OverallStatus::Completed => label.green(),
        OverallStatus::InvisibleSolution => label.yellow(),
        OverallStatus::ShelfSpaceError | OverallStatus::ValidationError | OverallStatus::Error => {
            label.red()
        }
    }
}

/// `GA 40.0% | ACO 20.0%`, with `--` for algorithms that have not reported
pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    Algorithm::ALL
        .iter()
        .map(|algorithm| {
            format!(
                "{} {}",
                algorithm.code(),
                percent(snapshot.algorithm(*algorithm))
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn percent(progress: &AlgorithmProgress) -> String {
    match progress.progress {
        Some(value) if progress.has_error => format!("{:.1}% (error)", value),
        Some(value) => format!("{:.1}%", value),
        None => "--".to_string(),
    }
}

/// Prints a polled status
pub fn print_status(status: &SimulationStatus) {
    if let Some(id) = &status.simulation_id {
        println!("{} {}", "Simulation".bold(), id.to_string().dimmed());
    }
    println!("  Status: {}", colorize_status(status.overall_status));

    for algorithm in Algorithm::ALL {
        let progress = status.algorithm(algorithm);
        let eta = progress
            .estimated_time_remaining
            .filter(|eta| *eta > 0.0)
            .map(|eta| format!(", ~{:.0}s remaining", eta))
            .unwrap_or_default();
        let state = if progress.finished { " (finished)" } else { "" };
        println!(
            "  {:<24} {}{}{}",
            algorithm.display_name(),
            percent(&progress),
            eta,
            state
        );
    }

    if let Some(message) = status.error_message.as_deref().filter(|m| !m.is_empty()) {
        println!();
        for line in message.lines() {
            println!("  {}", line.red());
        }
    }
}

/// Prints the single terminal message of a run
///
/// Algorithm errors were already shown as they surfaced.
pub fn print_final_report(report: &FinalReport) {
    println!();
    println!("{} {}", severity_tag(report.severity), report.message);
}

/// Prints a GA vs ACO comparison
pub fn print_comparison(view: &ComparisonView, ga: &OptimizationResult, aco: &OptimizationResult) {
    println!();
    println!("{}", "Algorithm comparison".bold());
    println!("{}", "─".repeat(72).dimmed());
    println!("  GA total profit:   {:>14.2}", view.ga_total_profit);
    println!("  ACO total profit:  {:>14.2}", view.aco_total_profit);
    println!(
        "  Difference:        {:>14.2} ({})",
        view.profit_difference,
        view.profit_diff_percent_label()
    );
    println!("  Better algorithm:  {}", view.better_algorithm.to_string().green().bold());

    if view.product_names.is_empty() {
        println!("{}", "─".repeat(72).dimmed());
        return;
    }

    println!();
    println!(
        "  {:<24} {:>12} {:>12} {:>12} {:>8}",
        "Product".bold(),
        "GA profit".bold(),
        "ACO profit".bold(),
        "Diff".bold(),
        "Qty diff".bold()
    );
    for diff in view.top_by_combined(COMPARISON_CHART_LIMIT) {
        let quantity = view
            .quantity_diff_by_product
            .iter()
            .find(|q| q.name == diff.name)
            .map(|q| q.difference)
            .unwrap_or(0.0);
        println!(
            "  {:<24} {:>12.2} {:>12.2} {:>12.2} {:>8.0}",
            truncate(&diff.name, 24),
            diff.ga_value,
            diff.aco_value,
            diff.difference,
            quantity
        );
    }

    for (label, result) in [("GA", ga), ("ACO", aco)] {
        let top = top_products_by_profit(result, 3);
        if top.is_empty() {
            continue;
        }
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        println!();
        println!("  Top {} products: {}", label, names.join(", "));
    }
    println!("{}", "─".repeat(72).dimmed());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
