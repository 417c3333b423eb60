//! Optimization result types

use serde::{Deserialize, Serialize};

use crate::domain::simulation::Algorithm;

/// Outcome for a single product chosen by an optimizer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOutcome {
    /// Unique key within one result
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub profit_per_unit: f64,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub total_cost: f64,
}

/// Final output of one optimizer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub product_count: usize,
    #[serde(default)]
    pub products: Vec<ProductOutcome>,
}

static EMPTY_RESULT: OptimizationResult = OptimizationResult {
    total_profit: 0.0,
    product_count: 0,
    products: Vec::new(),
};

impl OptimizationResult {
    pub fn new(total_profit: f64, products: Vec<ProductOutcome>) -> Self {
        Self {
            total_profit,
            product_count: products.len(),
            products,
        }
    }

    /// First product with the given name
    pub fn product(&self, name: &str) -> Option<&ProductOutcome> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Zero or negative total profit marks an infeasible ("invisible") solution
    pub fn is_profitable(&self) -> bool {
        self.total_profit > 0.0
    }
}

/// Results of both optimizers for one simulation
///
/// Each side stays `None` until that optimizer finishes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    #[serde(default)]
    pub ga_result: Option<OptimizationResult>,
    #[serde(default)]
    pub ant_colony_result: Option<OptimizationResult>,
}

impl CombinedResult {
    pub fn new(ga_result: OptimizationResult, ant_colony_result: OptimizationResult) -> Self {
        Self {
            ga_result: Some(ga_result),
            ant_colony_result: Some(ant_colony_result),
        }
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<&OptimizationResult> {
        match algorithm {
            Algorithm::Genetic => self.ga_result.as_ref(),
            Algorithm::AntColony => self.ant_colony_result.as_ref(),
        }
    }

    /// The algorithm's result, or an empty one if it never reported
    pub fn result_or_empty(&self, algorithm: Algorithm) -> &OptimizationResult {
        self.get(algorithm).unwrap_or(&EMPTY_RESULT)
    }

    pub fn set(&mut self, algorithm: Algorithm, result: OptimizationResult) {
        match algorithm {
            Algorithm::Genetic => self.ga_result = Some(result),
            Algorithm::AntColony => self.ant_colony_result = Some(result),
        }
    }
}
