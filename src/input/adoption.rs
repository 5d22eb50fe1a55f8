//! Code for reading the per-scenario adoption targets.
use super::*;
use crate::adoption::AdoptionTargets;
use crate::model::ScenarioID;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize, PartialEq, Debug)]
struct AdoptionTargetRaw {
    year: u32,
    value: f64,
}

/// Get the name of the adoption file for the given scenario
fn adoption_file_name(scenario: &ScenarioID) -> String {
    format!("{scenario}_adoption.csv")
}

/// Read the adoption targets for a scenario from the model directory.
///
/// The file has `year`, `region`, `interval` and `value` columns. Only the year and value are used.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario` - The scenario whose file to read
/// * `years` - The simulated years. Rows for other years are ignored.
///
/// # Returns
///
/// The target adoption percentage for each simulated year.
pub fn read_adoption_targets(
    model_dir: &Path,
    scenario: &ScenarioID,
    years: &[u32],
) -> Result<AdoptionTargets> {
    let file_path = model_dir.join(adoption_file_name(scenario));
    let targets_csv = read_csv(&file_path)?;
    read_adoption_targets_from_iter(targets_csv, years).with_context(|| input_err_msg(&file_path))
}

fn read_adoption_targets_from_iter<I>(iter: I, years: &[u32]) -> Result<AdoptionTargets>
where
    I: Iterator<Item = AdoptionTargetRaw>,
{
    let simulated: HashSet<u32> = years.iter().copied().collect();
    let mut targets = AdoptionTargets::new();
    for target in iter.filter(|target| simulated.contains(&target.year)) {
        ensure!(
            (0.0..=100.0).contains(&target.value),
            "Adoption target for {} must be between 0 and 100 (got {})",
            target.year,
            target.value
        );
        ensure!(
            targets.insert(target.year, target.value).is_none(),
            "Duplicate adoption target for year {}",
            target.year
        );
    }

    for year in years {
        ensure!(
            targets.contains_key(year),
            "Missing adoption target for year {year}"
        );
    }

    Ok(targets)
}
