//! Tracks which assets' premises want to adopt the technology being rolled out.
//!
//! Each simulated year the scenario supplies a target adoption percentage. The gap between this
//! and the current percentage determines how many more assets become "adoption desirable".
use crate::asset::{Asset, AssetID};
use crate::technology::Technology;
use itertools::Itertools;
use std::collections::HashMap;

/// Target adoption percentage (0-100) for each simulated year
pub type AdoptionTargets = HashMap<u32, f64>;

/// Percentage of all premises served by assets which are adoption desirable.
///
/// Returns zero if there are no premises.
pub fn desirability_percentage(assets: &[Asset]) -> f64 {
    let total = total_premises(assets.iter());
    if total == 0 {
        return 0.0;
    }

    let desirable = total_premises(assets.iter().filter(|a| a.adoption_desirability));
    desirable as f64 / total as f64 * 100.0
}

/// The number of percentage points desirability must rise by to meet the year's target.
///
/// The result is rounded to one decimal place.
pub fn percentage_annual_increase(target_percentage: f64, current_percentage: f64) -> f64 {
    ((target_percentage - current_percentage) * 10.0).round() / 10.0
}

/// Choose which assets become adoption desirable this year.
///
/// Assets not yet flagged are visited in ascending ID order and chosen until the premises they
/// serve reach `percentage_annual_increase` percent of all premises. A non-positive increase
/// selects nothing.
///
/// # Returns
///
/// The IDs of the chosen assets, in the order chosen.
pub fn select_newly_desirable(assets: &[Asset], percentage_annual_increase: f64) -> Vec<AssetID> {
    if percentage_annual_increase <= 0.0 {
        return Vec::new();
    }

    let required = percentage_annual_increase / 100.0 * total_premises(assets.iter()) as f64;
    let mut accumulated = 0.0;
    let mut ids = Vec::new();
    for asset in assets
        .iter()
        .filter(|a| !a.adoption_desirability)
        .sorted_by(|a, b| a.id.cmp(&b.id))
    {
        if accumulated >= required {
            break;
        }
        accumulated += f64::from(asset.total_prems);
        ids.push(asset.id.clone());
    }

    ids
}

/// The maximum number of premises a policy may address this year.
///
/// This is the premises at adoption-desirable assets plus the premises at assets which already
/// have `technology`.
pub fn adoption_cap(assets: &[Asset], technology: Technology) -> u64 {
    let desirable = total_premises(assets.iter().filter(|a| a.adoption_desirability));
    let upgraded = total_premises(assets.iter().filter(|a| a.has_technology(technology)));

    desirable + upgraded
}

fn total_premises<'a, I>(assets: I) -> u64
where
    I: Iterator<Item = &'a Asset>,
{
    assets.map(|asset| u64::from(asset.total_prems)).sum()
}
