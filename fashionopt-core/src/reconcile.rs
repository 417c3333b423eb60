//! GA / ACO result reconciliation
//!
//! Both optimizers produce product lists independently. [`reconcile`] joins
//! them by product name so the two runs can be compared side by side.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::domain::result::{CombinedResult, OptimizationResult, ProductOutcome};
use crate::domain::simulation::Algorithm;

/// How many products the comparison chart shows
pub const COMPARISON_CHART_LIMIT: usize = 8;

/// One product's value under each algorithm
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDiff {
    pub name: String,
    pub ga_value: f64,
    pub aco_value: f64,
    /// `ga_value - aco_value`
    pub difference: f64,
}

impl ProductDiff {
    fn new(name: &str, ga_value: f64, aco_value: f64) -> Self {
        Self {
            name: name.to_string(),
            ga_value,
            aco_value,
            difference: ga_value - aco_value,
        }
    }

    pub fn combined(&self) -> f64 {
        self.ga_value + self.aco_value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BetterAlgorithm {
    #[serde(rename = "GA")]
    Genetic,
    #[serde(rename = "ACO")]
    AntColony,
    Equal,
}

impl BetterAlgorithm {
    pub fn algorithm(self) -> Option<Algorithm> {
        match self {
            BetterAlgorithm::Genetic => Some(Algorithm::Genetic),
            BetterAlgorithm::AntColony => Some(Algorithm::AntColony),
            BetterAlgorithm::Equal => None,
        }
    }
}

impl fmt::Display for BetterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetterAlgorithm::Genetic => write!(f, "GA"),
            BetterAlgorithm::AntColony => write!(f, "ACO"),
            BetterAlgorithm::Equal => write!(f, "Equal"),
        }
    }
}

/// Side-by-side comparison of the two results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonView {
    pub ga_total_profit: f64,
    pub aco_total_profit: f64,
    /// Absolute difference between the two totals
    pub profit_difference: f64,
    pub better_algorithm: BetterAlgorithm,
    /// Relative to the smaller total, `None` when that total is zero
    pub profit_diff_percent: Option<f64>,
    /// Union of product names: GA order first, then ACO-only names
    pub product_names: Vec<String>,
    pub profit_diff_by_product: Vec<ProductDiff>,
    pub quantity_diff_by_product: Vec<ProductDiff>,
}

impl ComparisonView {
    /// Percentage difference for display, "N/A" when undefined
    pub fn profit_diff_percent_label(&self) -> String {
        match self.profit_diff_percent {
            Some(percent) => format!("{:.2}%", percent),
            None => "N/A".to_string(),
        }
    }

    /// Products with the highest GA + ACO profit
    pub fn top_by_combined(&self, limit: usize) -> Vec<&ProductDiff> {
        let mut rows: Vec<&ProductDiff> = self.profit_diff_by_product.iter().collect();
        sort_descending_by(&mut rows, |row| row.combined());
        rows.truncate(limit);
        rows
    }

    /// Products where the algorithms disagree most on profit
    pub fn largest_differences(&self, limit: usize) -> Vec<&ProductDiff> {
        let mut rows: Vec<&ProductDiff> = self.profit_diff_by_product.iter().collect();
        sort_descending_by(&mut rows, |row| row.difference.abs());
        rows.truncate(limit);
        rows
    }
}

/// Joins two results by product name
///
/// A product missing on one side counts as zero profit and zero quantity
/// there. When a name repeats inside one result, the first entry is used.
pub fn reconcile(ga: &OptimizationResult, aco: &OptimizationResult) -> ComparisonView {
    let product_names = union_names(ga, aco);

    let lookup = |result: &OptimizationResult, name: &str| -> (f64, f64) {
        result
            .product(name)
            .map(|p| (p.total_profit, p.quantity as f64))
            .unwrap_or((0.0, 0.0))
    };

    let mut profit_diff_by_product = Vec::with_capacity(product_names.len());
    let mut quantity_diff_by_product = Vec::with_capacity(product_names.len());
    for name in &product_names {
        let (ga_profit, ga_quantity) = lookup(ga, name);
        let (aco_profit, aco_quantity) = lookup(aco, name);
        profit_diff_by_product.push(ProductDiff::new(name, ga_profit, aco_profit));
        quantity_diff_by_product.push(ProductDiff::new(name, ga_quantity, aco_quantity));
    }

    let ga_total = ga.total_profit;
    let aco_total = aco.total_profit;

    let better_algorithm = match ga_total.partial_cmp(&aco_total) {
        Some(Ordering::Greater) => BetterAlgorithm::Genetic,
        Some(Ordering::Less) => BetterAlgorithm::AntColony,
        _ => BetterAlgorithm::Equal,
    };

    let profit_difference = (ga_total - aco_total).abs();
    let smaller = ga_total.min(aco_total);
    let profit_diff_percent = (smaller != 0.0).then(|| profit_difference / smaller * 100.0);

    ComparisonView {
        ga_total_profit: ga_total,
        aco_total_profit: aco_total,
        profit_difference,
        better_algorithm,
        profit_diff_percent,
        product_names,
        profit_diff_by_product,
        quantity_diff_by_product,
    }
}

/// Reconciles a combined result, treating a missing side as empty
pub fn reconcile_combined(combined: &CombinedResult) -> ComparisonView {
    reconcile(
        combined.result_or_empty(Algorithm::Genetic),
        combined.result_or_empty(Algorithm::AntColony),
    )
}

fn union_names(ga: &OptimizationResult, aco: &OptimizationResult) -> Vec<String> {
    let mut seen = HashSet::new();
    ga.products
        .iter()
        .chain(aco.products.iter())
        .filter(|p| seen.insert(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect()
}

/// Sorts strictly descending on `key`; equal keys keep their order
pub fn sort_descending_by<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

/// The `limit` most profitable products of one result
pub fn top_products_by_profit(result: &OptimizationResult, limit: usize) -> Vec<&ProductOutcome> {
    let mut products: Vec<&ProductOutcome> = result.products.iter().collect();
    sort_descending_by(&mut products, |p| p.total_profit);
    products.truncate(limit);
    products
}

/// The `limit` products with the largest quantity in one result
pub fn top_products_by_quantity(
    result: &OptimizationResult,
    limit: usize,
) -> Vec<&ProductOutcome> {
    let mut products: Vec<&ProductOutcome> = result.products.iter().collect();
    sort_descending_by(&mut products, |p| p.quantity as f64);
    products.truncate(limit);
    products
}
