//! Simulation request DTOs
//!
//! The same field names are used by the client when it builds the multipart
//! submission and by the server when it reads it back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const FIELD_PRODUCTION_BUDGET: &str = "productionBudget";
pub const FIELD_MARKETING_BUDGET: &str = "marketingBudget";
pub const FIELD_LOGISTICS_BUDGET: &str = "logisticsBudget";
pub const FIELD_DISCOUNT_BASE: &str = "discountBase";
pub const FIELD_SHELF_SPACE: &str = "shelfSpace";
pub const FIELD_CHROMOSOME_BITS: &str = "chromosomeBits";

/// Largest accepted discount base (a percentage)
pub const MAX_DISCOUNT_BASE: f64 = 100.0;

/// Rejected simulation parameters, listing every violated rule
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .problems.join(" "))]
pub struct ParametersError {
    pub problems: Vec<String>,
}

/// Which uploaded-file column feeds each optimizer input
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "colName")]
    pub name: String,
    #[serde(rename = "colPrice")]
    pub price: String,
    #[serde(rename = "colCp")]
    pub production_cost: String,
    #[serde(rename = "colCm")]
    pub marketing_cost: String,
    #[serde(rename = "colCl")]
    pub logistics_cost: String,
    #[serde(rename = "colShelfCost")]
    pub shelf_cost: String,
    #[serde(rename = "colAge")]
    pub age: String,
    #[serde(rename = "colStock")]
    pub stock: String,
    #[serde(rename = "colShelf")]
    pub shelf: String,
    #[serde(rename = "colDemand")]
    pub demand: String,
}

impl ColumnMapping {
    /// `(form field, label, column)` for every mapping, in form order
    pub fn entries(&self) -> [(&'static str, &'static str, &str); 10] {
        [
            ("colName", "Product Name", self.name.as_str()),
            ("colPrice", "Price", self.price.as_str()),
            ("colCp", "Production Cost", self.production_cost.as_str()),
            ("colCm", "Marketing Cost", self.marketing_cost.as_str()),
            ("colCl", "Logistics Cost", self.logistics_cost.as_str()),
            ("colShelfCost", "Shelf Cost", self.shelf_cost.as_str()),
            ("colAge", "Age", self.age.as_str()),
            ("colStock", "Stock", self.stock.as_str()),
            ("colShelf", "Shelf Space", self.shelf.as_str()),
            ("colDemand", "Demand", self.demand.as_str()),
        ]
    }

    /// Builds a mapping from form fields; absent fields become empty strings
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            name: get("colName"),
            price: get("colPrice"),
            production_cost: get("colCp"),
            marketing_cost: get("colCm"),
            logistics_cost: get("colCl"),
            shelf_cost: get("colShelfCost"),
            age: get("colAge"),
            stock: get("colStock"),
            shelf: get("colShelf"),
            demand: get("colDemand"),
        }
    }

    fn problems(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|(_, _, column)| column.trim().is_empty() || *column == "null")
            .map(|(_, label, _)| format!("Column mapping for '{}' is required.", label))
            .collect()
    }
}

/// Numeric configuration and column mapping of one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub production_budget: f64,
    pub marketing_budget: f64,
    pub logistics_budget: f64,
    pub discount_base: f64,
    pub shelf_space: f64,
    pub chromosome_bits: u32,
    #[serde(flatten)]
    pub columns: ColumnMapping,
}

impl SimulationParameters {
    /// Reads parameters back from submitted form fields
    ///
    /// Missing or unparsable numbers are reported together with any other
    /// violated rule.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, ParametersError> {
        let mut problems = Vec::new();

        let mut number = |key: &str, label: &str| -> f64 {
            match fields.get(key).map(|v| v.trim()) {
                None | Some("") => {
                    problems.push(format!("{} is required.", label));
                    0.0
                }
                Some(raw) => raw.parse::<f64>().unwrap_or_else(|_| {
                    problems.push(format!("{} must be a valid number.", label));
                    0.0
                }),
            }
        };

        let production_budget = number(FIELD_PRODUCTION_BUDGET, "Production Budget");
        let marketing_budget = number(FIELD_MARKETING_BUDGET, "Marketing Budget");
        let logistics_budget = number(FIELD_LOGISTICS_BUDGET, "Logistics Budget");
        let discount_base = number(FIELD_DISCOUNT_BASE, "Discount Base");
        let shelf_space = number(FIELD_SHELF_SPACE, "Shelf Space Storage");
        let chromosome_bits = number(FIELD_CHROMOSOME_BITS, "Chromosome Bits");

        if chromosome_bits.fract() != 0.0 {
            problems.push("Chromosome Bits must be a whole number.".to_string());
        } else if chromosome_bits < 0.0 {
            problems.push("Chromosome Bits must be at least 1.".to_string());
        } else if chromosome_bits > f64::from(u32::MAX) {
            problems.push("Chromosome Bits is out of range.".to_string());
        }

        if !problems.is_empty() {
            return Err(ParametersError { problems });
        }

        Ok(Self {
            production_budget,
            marketing_budget,
            logistics_budget,
            discount_base,
            shelf_space,
            chromosome_bits: chromosome_bits as u32,
            columns: ColumnMapping::from_fields(fields),
        })
    }

    /// Flattens the parameters into multipart form fields
    pub fn to_form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (FIELD_PRODUCTION_BUDGET, self.production_budget.to_string()),
            (FIELD_MARKETING_BUDGET, self.marketing_budget.to_string()),
            (FIELD_LOGISTICS_BUDGET, self.logistics_budget.to_string()),
            (FIELD_DISCOUNT_BASE, self.discount_base.to_string()),
            (FIELD_SHELF_SPACE, self.shelf_space.to_string()),
            (FIELD_CHROMOSOME_BITS, self.chromosome_bits.to_string()),
        ];
        fields.extend(
            self.columns
                .entries()
                .iter()
                .map(|(field, _, column)| (*field, column.to_string())),
        );
        fields
    }

    /// Checks every range and mapping rule
    pub fn validate(&self) -> Result<(), ParametersError> {
        let mut problems = Vec::new();

        let minimums = [
            ("Production Budget", self.production_budget),
            ("Marketing Budget", self.marketing_budget),
            ("Logistics Budget", self.logistics_budget),
            ("Discount Base", self.discount_base),
            ("Shelf Space Storage", self.shelf_space),
        ];
        for (label, value) in minimums {
            if !value.is_finite() {
                problems.push(format!("{} must be a valid number.", label));
            } else if value < 0.0 {
                problems.push(format!("{} must be at least 0.", label));
            }
        }

        if self.discount_base > MAX_DISCOUNT_BASE {
            problems.push(format!(
                "Discount Base must not exceed {}.",
                MAX_DISCOUNT_BASE
            ));
        }

        if self.chromosome_bits < 1 {
            problems.push("Chromosome Bits must be at least 1.".to_string());
        }

        problems.extend(self.columns.problems());

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ParametersError { problems })
        }
    }
}

/// Everything the client uploads to start one simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSubmission {
    /// Original name of the uploaded product file
    pub file_name: String,
    pub file: Vec<u8>,
    pub parameters: SimulationParameters,
}

impl SimulationSubmission {
    pub fn new(file_name: impl Into<String>, file: Vec<u8>, parameters: SimulationParameters) -> Self {
        Self {
            file_name: file_name.into(),
            file,
            parameters,
        }
    }

    /// Checks the file and every parameter rule before anything is sent
    pub fn validate(&self) -> Result<(), ParametersError> {
        let mut problems = Vec::new();
        if self.file.is_empty() {
            problems.push("Please upload a product file first.".to_string());
        }
        if let Err(err) = self.parameters.validate() {
            problems.extend(err.problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ParametersError { problems })
        }
    }
}
