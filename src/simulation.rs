//! Functionality for running the simulation.
use crate::adoption::{adoption_cap, desirability_percentage, percentage_annual_increase};
use crate::asset::Asset;
use crate::model::{Model, ScenarioID};
use crate::network::NetworkManager;
use crate::output::ResultsWriter;
use crate::technology::Technology;
use anyhow::{Context, Result, ensure};
use itertools::iproduct;
use log::{debug, error, info};
use std::path::Path;

pub mod interventions;
use interventions::{Policy, decide_interventions};

/// Run the simulation for every combination of scenario, technology and policy.
///
/// Each combination starts from a fresh copy of the model's assets. If a combination fails, the
/// error is logged and the remaining combinations still run.
///
/// # Arguments
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
pub fn run(model: &Model, output_path: &Path) -> Result<()> {
    let params = &model.parameters;
    let combinations = iproduct!(&params.scenarios, &params.technologies, &params.policies);

    let mut failed = Vec::new();
    let mut total = 0;
    for (scenario, technology, policy) in combinations {
        total += 1;
        info!("Running scenario: {scenario}, technology: {technology}, policy: {policy}");
        if let Err(err) = run_combination(model, scenario, *technology, *policy, output_path) {
            error!("Run failed for {scenario}/{technology}/{policy}: {err:?}");
            failed.push(format!("{scenario}/{technology}/{policy}"));
        }
    }

    ensure!(
        failed.is_empty(),
        "{} of {total} simulation runs failed: {}",
        failed.len(),
        failed.join(", ")
    );

    Ok(())
}

/// Run the year loop for a single combination
fn run_combination(
    model: &Model,
    scenario: &ScenarioID,
    technology: Technology,
    policy: Policy,
    output_path: &Path,
) -> Result<()> {
    let params = &model.parameters;
    let targets = model.adoption_targets(scenario)?;
    let mut network = NetworkManager::new(model.assets.clone(), model.technology_speeds())?;
    let writer = ResultsWriter::create(
        output_path,
        scenario,
        technology,
        policy,
        params.base_year,
        model.monthly_revenue(technology),
        params.finance,
    )?;

    for year in model.iter_years() {
        let target = *targets
            .get(&year)
            .with_context(|| format!("No adoption target for {year}"))?;

        // Update which assets want the technology
        let current = desirability_percentage(network.assets());
        let increase = percentage_annual_increase(target, current);
        let newly_desirable = network.update_adoption_desirability(increase)?;
        debug!(
            "{year}: adoption {current:.1}% -> target {target:.1}%, {} assets newly desirable",
            newly_desirable.len()
        );

        // Only assets without the technology are candidates for upgrade
        let cap = adoption_cap(network.assets(), technology);
        let candidates: Vec<Asset> = network
            .assets()
            .iter()
            .filter(|asset| !asset.has_technology(technology))
            .cloned()
            .collect();
        let plan =
            decide_interventions(&candidates, year, technology, policy, &params.funding, cap)?;

        network
            .upgrade(&plan.interventions)
            .with_context(|| format!("Failed to apply upgrades for {year}"))?;
        info!(
            "{year}: {} assets upgraded to {technology} (remaining budget: {}, remaining match \
            funding: {})",
            plan.interventions.len(),
            plan.remaining_budget,
            plan.remaining_match_funding
        );

        writer
            .write_year(year, &network, &plan.interventions)
            .with_context(|| format!("Failed to write results for {year}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, model};
    use crate::units::Money;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    #[rstest]
    fn test_run(model: Model) {
        let dir = tempdir().unwrap();
        run(&model, dir.path()).unwrap();

        let scenario_dir = dir.path().join("baseline");
        for prefix in ["decisions", "spend", "exchange", "lad"] {
            assert!(
                scenario_dir
                    .join(format!("{prefix}_fttp_s1_market_based_roll_out.csv"))
                    .is_file()
            );
        }

        // One row per exchange per year, plus a header
        let lines = read_lines(&scenario_dir.join("exchange_fttp_s1_market_based_roll_out.csv"));
        assert_eq!(lines.len(), 1 + 2 * 2);
    }

    #[rstest]
    fn test_run_decisions(model: Model) {
        let dir = tempdir().unwrap();
        run(&model, dir.path()).unwrap();

        // 2020: 50% target => A and B become desirable (cap 130). A (benefit 10, cost 100) is
        // funded, then B would take premises passed to the cap so the scan stops.
        // 2021: A already has FTTP (cap 180). B (cost 200) is funded, leaving 50, which C (cost
        // 50) does not fit under.
        let lines = read_lines(
            &dir.path()
                .join("baseline")
                .join("decisions_fttp_s1_market_based_roll_out.csv"),
        );
        assert_eq!(
            lines,
            [
                "asset_id,year,technology,policy",
                "A,2020,fttp,s1_market_based_roll_out",
                "B,2021,fttp,s1_market_based_roll_out",
            ]
        );
    }

    #[rstest]
    fn test_run_isolates_failures(mut model: Model) {
        // No adoption data for the second scenario
        model.parameters.scenarios.push("missing".into());

        let dir = tempdir().unwrap();
        assert_error!(
            run(&model, dir.path()),
            "1 of 2 simulation runs failed: missing/fttp/s1_market_based_roll_out"
        );

        // The first scenario still completed
        assert!(
            dir.path()
                .join("baseline")
                .join("decisions_fttp_s1_market_based_roll_out.csv")
                .is_file()
        );
    }

    #[rstest]
    fn test_run_skips_already_upgraded(mut model: Model) {
        // A has the highest benefit but already has FTTP, so it is never bought again.
        // 2020: A and B become desirable (cap 130 + 50 upgraded). B (cost 200) is funded, leaving
        // 50, so C (cost 50) does not fit.
        // 2021: C is funded from a fresh budget.
        model.assets[0].technologies.fttp = true;

        let dir = tempdir().unwrap();
        run(&model, dir.path()).unwrap();
        let lines = read_lines(
            &dir.path()
                .join("baseline")
                .join("decisions_fttp_s1_market_based_roll_out.csv"),
        );
        assert_eq!(
            lines,
            [
                "asset_id,year,technology,policy",
                "B,2020,fttp,s1_market_based_roll_out",
                "C,2021,fttp,s1_market_based_roll_out",
            ]
        );
    }

    #[rstest]
    fn test_run_no_budget(mut model: Model) {
        model.parameters.funding.annual_budget = Money(0.0);

        let dir = tempdir().unwrap();
        run(&model, dir.path()).unwrap();
        let lines = read_lines(
            &dir.path()
                .join("baseline")
                .join("decisions_fttp_s1_market_based_roll_out.csv"),
        );
        assert_eq!(lines, ["asset_id,year,technology,policy"]);
    }
}
