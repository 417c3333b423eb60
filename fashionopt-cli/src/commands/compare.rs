//! Compare command handler
//!
//! Reconciles two saved optimizer results without talking to the server.

use anyhow::{Context, Result};
use fashionopt_core::domain::result::OptimizationResult;
use fashionopt_core::reconcile::reconcile;
use std::path::Path;

use crate::render;

pub async fn compare_files(ga: &Path, aco: &Path) -> Result<()> {
    let ga = read_result(ga).await?;
    let aco = read_result(aco).await?;

    let view = reconcile(&ga, &aco);
    render::print_comparison(&view, &ga, &aco);
    Ok(())
}

async fn read_result(path: &Path) -> Result<OptimizationResult> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_result(&raw).with_context(|| format!("{} is not a valid optimizer result", path.display()))
}

fn parse_result(raw: &str) -> Result<OptimizationResult> {
    let mut result: OptimizationResult = serde_json::from_str(raw)?;
    if result.product_count == 0 {
        result.product_count = result.products.len();
    }
    Ok(result)
}
