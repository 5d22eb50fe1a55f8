//! The model represents the static input data provided by the user.
use crate::adoption::AdoptionTargets;
use crate::asset::Asset;
use crate::technology::{PerTechnology, Technology};
use crate::units::{Mbps, Money};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{ModelParameters, ScenarioID, TechnologyParameters};

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The asset population, in file order
    pub assets: Vec<Asset>,
    /// Target adoption percentage for each simulated year, by scenario
    pub adoption_targets: HashMap<ScenarioID, AdoptionTargets>,
}

impl Model {
    /// Iterate over the model's simulated years
    pub fn iter_years(&self) -> impl Iterator<Item = u32> {
        self.parameters.iter_years()
    }

    /// The speed provided by each technology
    pub fn technology_speeds(&self) -> PerTechnology<Mbps> {
        PerTechnology::from_fn(|technology| self.parameters.technology.get(technology).speed)
    }

    /// Monthly revenue per premises for the given technology
    pub fn monthly_revenue(&self, technology: Technology) -> Money {
        self.parameters.technology.get(technology).monthly_revenue
    }

    /// Get the adoption targets for the given scenario
    pub fn adoption_targets(&self, scenario: &ScenarioID) -> Result<&AdoptionTargets> {
        self.adoption_targets
            .get(scenario)
            .with_context(|| format!("No adoption data for scenario {scenario}"))
    }
}
