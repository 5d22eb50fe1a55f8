//! Code for reading [`Asset`]s and their rollout data from CSV files.
use super::*;
use crate::asset::{Asset, AssetID, ExchangeID, Rollout};
use crate::geotype::Geotype;
use crate::technology::{PerTechnology, Technology};
use crate::units::Money;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const ASSETS_FILE_NAME: &str = "assets.csv";
const ASSET_ROLLOUT_FILE_NAME: &str = "asset_rollout.csv";

#[derive(Deserialize, PartialEq, Debug)]
struct AssetRaw {
    id: String,
    exchange_id: String,
    lad_id: String,
    total_prems: u32,
    line_length: Option<f64>,
    geotype: Option<Geotype>,
    #[serde(deserialize_with = "deserialise_flag")]
    fttp: bool,
    #[serde(deserialize_with = "deserialise_flag")]
    fttdp: bool,
    #[serde(deserialize_with = "deserialise_flag")]
    fttc: bool,
    #[serde(deserialize_with = "deserialise_flag")]
    docsis3: bool,
    #[serde(deserialize_with = "deserialise_flag")]
    adsl: bool,
    #[serde(default, deserialize_with = "deserialise_flag")]
    adoption_desirability: bool,
}

#[derive(Deserialize, PartialEq, Debug)]
struct AssetRolloutRaw {
    asset_id: String,
    technology: Technology,
    cost: Money,
    benefit: f64,
}

/// Read assets and their rollout data from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `technologies` - The technologies to be simulated. Every asset needs rollout data for each.
///
/// # Returns
///
/// The assets, in the order they appear in the file.
pub fn read_assets(model_dir: &Path, technologies: &[Technology]) -> Result<Vec<Asset>> {
    let file_path = model_dir.join(ASSETS_FILE_NAME);
    let assets_csv = read_csv(&file_path)?;
    let mut assets =
        read_assets_from_iter(assets_csv).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(ASSET_ROLLOUT_FILE_NAME);
    let rollout_csv = read_csv(&file_path)?;
    read_asset_rollout_from_iter(rollout_csv, &mut assets, technologies)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(assets.into_values().collect())
}

/// Process assets from an iterator.
///
/// Assets without an explicit geotype are classified using the total premises at their exchange
/// and their line length.
fn read_assets_from_iter<I>(iter: I) -> Result<IndexMap<AssetID, Asset>>
where
    I: Iterator<Item = AssetRaw>,
{
    let raw_assets: Vec<AssetRaw> = iter.collect();

    let mut exchange_premises: HashMap<&str, u64> = HashMap::new();
    for asset in &raw_assets {
        *exchange_premises.entry(&asset.exchange_id).or_default() += u64::from(asset.total_prems);
    }

    let mut assets = IndexMap::with_capacity(raw_assets.len());
    for asset in &raw_assets {
        let geotype = match (asset.geotype, asset.line_length) {
            (Some(geotype), _) => geotype,
            (None, Some(line_length)) => {
                ensure!(
                    line_length.is_finite() && line_length >= 0.0,
                    "Invalid line length for asset {}",
                    asset.id
                );
                Geotype::classify(exchange_premises[asset.exchange_id.as_str()], line_length)
            }
            (None, None) => bail!(
                "Asset {} must have either a geotype or a line length",
                asset.id
            ),
        };

        let id = AssetID::new(&asset.id);
        let asset = Asset {
            id: id.clone(),
            exchange_id: ExchangeID::new(&asset.exchange_id),
            lad_id: asset.lad_id.as_str().into(),
            total_prems: asset.total_prems,
            technologies: PerTechnology {
                fttp: asset.fttp,
                fttdp: asset.fttdp,
                fttc: asset.fttc,
                docsis3: asset.docsis3,
                adsl: asset.adsl,
            },
            rollout: PerTechnology::default(),
            adoption_desirability: asset.adoption_desirability,
            geotype,
        };

        ensure!(
            assets.insert(id.clone(), asset).is_none(),
            "Duplicate asset ID: {id}"
        );
    }

    Ok(assets)
}

/// Attach rollout data to assets.
///
/// Returns an error if any asset lacks rollout data for one of the simulated technologies.
fn read_asset_rollout_from_iter<I>(
    iter: I,
    assets: &mut IndexMap<AssetID, Asset>,
    technologies: &[Technology],
) -> Result<()>
where
    I: Iterator<Item = AssetRolloutRaw>,
{
    for rollout in iter {
        let asset = assets
            .get_mut(rollout.asset_id.as_str())
            .with_context(|| format!("Unknown asset ID: {}", rollout.asset_id))?;
        ensure!(
            rollout.cost.is_finite() && rollout.cost >= Money(0.0),
            "Invalid cost for asset {}: must be a finite number greater than or equal to zero",
            asset.id
        );
        ensure!(
            rollout.benefit.is_finite(),
            "Invalid benefit for asset {}: must be a finite number",
            asset.id
        );

        let entry = asset.rollout.get_mut(rollout.technology);
        ensure!(
            entry.is_none(),
            "Duplicate rollout data for asset {} and technology {}",
            asset.id,
            rollout.technology
        );
        *entry = Some(Rollout {
            cost: rollout.cost,
            benefit: rollout.benefit,
        });
    }

    for asset in assets.values() {
        for technology in technologies {
            asset.rollout(*technology)?;
        }
    }

    Ok(())
}
