//! The module responsible for writing output data to disk.
use crate::asset::AssetID;
use crate::finance::{FinanceParameters, benefit_cost_ratio, revenue};
use crate::model::ScenarioID;
use crate::network::{Granularity, NetworkManager};
use crate::simulation::interventions::{DeploymentType, Intervention, Policy};
use crate::technology::Technology;
use crate::units::{Dimensionless, Mbps, Money};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "broadband_rollout_results";

/// Get the default output directory for the model specified at `model_dir`.
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, optionally overwriting existing data.
///
/// # Arguments
///
/// * `output_dir` - The output directory to create
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// `true` if the output dir contained existing data that was deleted, `false` if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the decisions CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DecisionRow {
    asset_id: AssetID,
    year: u32,
    technology: Technology,
    policy: Policy,
}

/// Represents a row in the spend CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SpendRow {
    asset_id: AssetID,
    year: u32,
    technology: Technology,
    policy: Policy,
    spend_type: DeploymentType,
    revenue: Money,
    cost: Money,
    bcr_ratio: Dimensionless,
}

/// Represents a row in the exchange or LAD CSV file.
///
/// The first column is named after the granularity, so the header is written separately.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AreaRow {
    #[serde(alias = "exchange", alias = "lad")]
    id: Rc<str>,
    year: u32,
    technology: Technology,
    policy: Policy,
    average_capacity: Mbps,
    fttp: f64,
    fttdp: f64,
    fttc: f64,
    docsis3: f64,
    adsl: f64,
    total_prems: u64,
}

const DECISIONS_HEADER: [&str; 4] = ["asset_id", "year", "technology", "policy"];

const SPEND_HEADER: [&str; 8] = [
    "asset_id",
    "year",
    "technology",
    "policy",
    "spend_type",
    "revenue",
    "cost",
    "bcr_ratio",
];

/// Column names for [`AreaRow`], after the first
const AREA_HEADER: [&str; 10] = [
    "year",
    "technology",
    "policy",
    "average_capacity",
    "fttp",
    "fttdp",
    "fttc",
    "docsis3",
    "adsl",
    "total_prems",
];

/// Writes the results of a single (scenario, technology, policy) run.
///
/// Files live in a per-scenario subfolder. They are reopened each year: truncated with a header in
/// the base year, appended to in later years.
pub struct ResultsWriter {
    output_path: PathBuf,
    technology: Technology,
    policy: Policy,
    base_year: u32,
    monthly_revenue: Money,
    finance: FinanceParameters,
}

impl ResultsWriter {
    /// Create a writer, creating the scenario folder if needed.
    ///
    /// # Arguments
    ///
    /// * `output_path` - Root output folder
    /// * `scenario` - The adoption scenario being run
    /// * `technology` - The technology being deployed
    /// * `policy` - The policy in use
    /// * `base_year` - The first simulated year
    /// * `monthly_revenue` - Revenue per premises per month for `technology`
    /// * `finance` - Parameters for calculating revenue
    pub fn create(
        output_path: &Path,
        scenario: &ScenarioID,
        technology: Technology,
        policy: Policy,
        base_year: u32,
        monthly_revenue: Money,
        finance: FinanceParameters,
    ) -> Result<Self> {
        let output_path = output_path.join(&*scenario.0);
        fs::create_dir_all(&output_path).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

        Ok(Self {
            output_path,
            technology,
            policy,
            base_year,
            monthly_revenue,
            finance,
        })
    }

    /// The path to the output file with the given prefix
    fn file_path(&self, prefix: &str) -> PathBuf {
        self.output_path
            .join(format!("{prefix}_{}_{}.csv", self.technology, self.policy))
    }

    /// Open an output file for the given year, writing `header` if this is the base year
    fn open<'a, I>(&self, prefix: &str, year: u32, header: I) -> Result<csv::Writer<File>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let file_path = self.file_path(prefix);
        let first = year == self.base_year;
        let file = if first {
            File::create(&file_path)
        } else {
            OpenOptions::new().append(true).open(&file_path)
        }
        .with_context(|| format!("Could not open {}", file_path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if first {
            writer.write_record(header)?;
        }

        Ok(writer)
    }

    /// Write all results for a year
    ///
    /// # Arguments
    ///
    /// * `year` - The simulated year
    /// * `network` - The network, after this year's upgrades
    /// * `interventions` - This year's interventions
    pub fn write_year(
        &self,
        year: u32,
        network: &NetworkManager,
        interventions: &[Intervention],
    ) -> Result<()> {
        self.write_decisions(year, interventions)?;
        self.write_spend(year, network, interventions)?;
        self.write_area(year, network, Granularity::Exchange)?;
        self.write_area(year, network, Granularity::Lad)?;

        Ok(())
    }

    fn write_decisions(&self, year: u32, interventions: &[Intervention]) -> Result<()> {
        let mut writer = self.open("decisions", year, DECISIONS_HEADER)?;
        for intervention in interventions {
            writer.serialize(DecisionRow {
                asset_id: intervention.asset_id.clone(),
                year,
                technology: intervention.technology,
                policy: intervention.policy,
            })?;
        }
        writer.flush()?;

        Ok(())
    }

    fn write_spend(
        &self,
        year: u32,
        network: &NetworkManager,
        interventions: &[Intervention],
    ) -> Result<()> {
        let mut writer = self.open("spend", year, SPEND_HEADER)?;
        for intervention in interventions {
            let asset = network
                .get(&intervention.asset_id)
                .with_context(|| format!("Unknown asset ID: {}", intervention.asset_id))?;
            let revenue = revenue(asset.total_prems, self.monthly_revenue, &self.finance);
            writer.serialize(SpendRow {
                asset_id: intervention.asset_id.clone(),
                year,
                technology: intervention.technology,
                policy: intervention.policy,
                spend_type: intervention.deployment_type,
                revenue,
                cost: intervention.cost,
                bcr_ratio: benefit_cost_ratio(revenue, intervention.cost),
            })?;
        }
        writer.flush()?;

        Ok(())
    }

    fn write_area(&self, year: u32, network: &NetworkManager, granularity: Granularity) -> Result<()> {
        let name = granularity.to_string();
        let header = std::iter::once(name.as_str()).chain(AREA_HEADER);
        let mut writer = self.open(&name, year, header)?;

        let capacity = network.capacity(granularity);
        for (coverage, capacity) in network.coverage(granularity).into_iter().zip(capacity) {
            let pct = coverage.percentage_of_premises;
            writer.serialize(AreaRow {
                id: coverage.id,
                year,
                technology: self.technology,
                policy: self.policy,
                average_capacity: capacity.average_capacity,
                fttp: pct.fttp,
                fttdp: pct.fttdp,
                fttc: pct.fttc,
                docsis3: pct.docsis3,
                adsl: pct.adsl,
                total_prems: coverage.sum_of_premises,
            })?;
        }
        writer.flush()?;

        Ok(())
    }
}
