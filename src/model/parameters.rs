//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::asset::AssetGranularity;
use crate::finance::FinanceParameters;
use crate::id::define_id_type;
use crate::input::{input_err_msg, read_toml};
use crate::simulation::interventions::{FundingPools, Policy};
use crate::technology::{PerTechnology, Technology};
use crate::units::{Mbps, Money};
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

define_id_type! {ScenarioID}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_timestep_increment, u32, 1);

/// Speed and revenue for a single technology
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TechnologyParameters {
    /// Line speed provided to premises
    pub speed: Mbps,
    /// Revenue per premises per month
    pub monthly_revenue: Money,
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The first simulated year
    pub base_year: u32,
    /// The last simulated year (inclusive)
    pub end_year: u32,
    /// Number of years between simulated years
    #[serde(default = "default_timestep_increment")]
    pub timestep_increment: u32,
    /// The kind of network node the assets represent
    #[serde(default)]
    pub asset_granularity: AssetGranularity,
    /// Adoption scenarios to simulate
    pub scenarios: Vec<ScenarioID>,
    /// Technologies to simulate
    pub technologies: Vec<Technology>,
    /// Policies to simulate
    pub policies: Vec<Policy>,
    /// Funding available each year
    pub funding: FundingPools,
    /// Parameters for calculating revenue
    pub finance: FinanceParameters,
    /// Speed and revenue for every technology
    pub technology: PerTechnology<TechnologyParameters>,
}

/// Check that the simulated years are valid
fn check_years(base_year: u32, end_year: u32, timestep_increment: u32) -> Result<()> {
    ensure!(
        end_year >= base_year,
        "end_year ({end_year}) cannot be before base_year ({base_year})"
    );
    ensure!(timestep_increment > 0, "timestep_increment cannot be zero");

    Ok(())
}

/// Check that a list parameter is non-empty and contains no duplicates
fn check_list<T>(name: &str, values: &[T]) -> Result<()>
where
    T: Eq + std::hash::Hash + std::fmt::Display,
{
    ensure!(!values.is_empty(), "`{name}` is empty");
    if let Some(duplicate) = values.iter().duplicates().next() {
        bail!("`{name}` contains duplicate entry: {duplicate}");
    }

    Ok(())
}

/// Check that scenario names can safely be used as file names
fn check_scenario_names(scenarios: &[ScenarioID]) -> Result<()> {
    for scenario in scenarios {
        ensure!(
            !scenario.0.is_empty()
                && scenario
                    .0
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
            "Invalid scenario name: \"{scenario}\". Names may only contain letters, numbers, \
            underscores and hyphens."
        );
    }

    Ok(())
}

/// Check that the funding pools are valid
fn check_funding(funding: &FundingPools) -> Result<()> {
    for (name, value) in [
        ("annual_budget", funding.annual_budget),
        ("subsidy", funding.subsidy),
        ("telco_match_funding", funding.telco_match_funding),
    ] {
        ensure!(
            value.is_finite() && value >= Money(0.0),
            "{name} must be a finite number greater than or equal to zero"
        );
    }
    ensure!(
        funding.service_obligation_capacity.is_finite()
            && funding.service_obligation_capacity >= 0.0,
        "service_obligation_capacity must be a finite number greater than or equal to zero"
    );

    if funding.subsidy > Money(0.0) || funding.service_obligation_capacity > 0.0 {
        warn!(
            "subsidy and service_obligation_capacity are reported but do not yet affect which \
            assets are upgraded"
        );
    }

    Ok(())
}

/// Check that the finance parameters are valid
fn check_finance(finance: &FinanceParameters) -> Result<()> {
    ensure!(
        finance.months_per_year > 0,
        "months_per_year cannot be zero"
    );
    ensure!(finance.payback_period > 0, "payback_period cannot be zero");
    ensure!(
        (0.0..=1.0).contains(&finance.profit_margin.value()),
        "profit_margin must be between 0 and 1"
    );

    Ok(())
}

/// Check that the speed and revenue of each technology are valid
fn check_technology_parameters(parameters: &PerTechnology<TechnologyParameters>) -> Result<()> {
    for (technology, params) in parameters.iter() {
        ensure!(
            params.speed.is_finite() && params.speed > Mbps(0.0),
            "Speed for {technology} must be a finite number greater than zero"
        );
        ensure!(
            params.monthly_revenue.is_finite() && params.monthly_revenue >= Money(0.0),
            "Monthly revenue for {technology} must be a finite number greater than or equal to \
            zero"
        );
    }

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(self.base_year, self.end_year, self.timestep_increment)?;
        check_list("scenarios", &self.scenarios)?;
        check_scenario_names(&self.scenarios)?;
        check_list("technologies", &self.technologies)?;
        check_list("policies", &self.policies)?;
        check_funding(&self.funding)?;
        check_finance(&self.finance)?;
        check_technology_parameters(&self.technology)?;

        Ok(())
    }

    /// Iterate over the simulated years, from `base_year` to `end_year` inclusive
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + use<> {
        (self.base_year..=self.end_year).step_by(self.timestep_increment as usize)
    }
}
