//! The network model: owns the asset population and reports on it.
use crate::adoption::select_newly_desirable;
use crate::asset::{Asset, AssetID};
use crate::simulation::interventions::Intervention;
use crate::technology::PerTechnology;
use crate::units::Mbps;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;
use strum::Display;

/// The geographical units which results can be aggregated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Granularity {
    /// Group assets by the exchange which serves them
    #[strum(serialize = "exchange")]
    Exchange,
    /// Group assets by local authority district
    #[strum(serialize = "lad")]
    Lad,
}

/// Technology coverage for a single geographical unit
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSummary {
    /// The ID of the unit (exchange or LAD)
    pub id: Rc<str>,
    /// Percentage of premises with each technology
    pub percentage_of_premises: PerTechnology<f64>,
    /// Total premises in the unit
    pub sum_of_premises: u64,
}

/// Average capacity for a single geographical unit
#[derive(Debug, Clone, PartialEq)]
pub struct CapacitySummary {
    /// The ID of the unit (exchange or LAD)
    pub id: Rc<str>,
    /// Premises-weighted average speed
    pub average_capacity: Mbps,
}

/// Owns the asset population for a single simulation run.
///
/// Technology flags are only ever set, never cleared.
#[derive(Debug, Clone)]
pub struct NetworkManager {
    assets: Vec<Asset>,
    index: HashMap<AssetID, usize>,
    speeds: PerTechnology<Mbps>,
}

impl NetworkManager {
    /// Create a new network from the given assets.
    ///
    /// # Arguments
    ///
    /// * `assets` - The asset population
    /// * `speeds` - The speed provided by each technology
    pub fn new(assets: Vec<Asset>, speeds: PerTechnology<Mbps>) -> Result<Self> {
        let mut index = HashMap::with_capacity(assets.len());
        for (idx, asset) in assets.iter().enumerate() {
            ensure!(
                index.insert(asset.id.clone(), idx).is_none(),
                "Duplicate asset ID: {}",
                asset.id
            );
        }

        Ok(Self {
            assets,
            index,
            speeds,
        })
    }

    /// All assets in the network, in load order
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Look up an asset by ID
    pub fn get(&self, id: &AssetID) -> Option<&Asset> {
        self.index.get(id).map(|idx| &self.assets[*idx])
    }

    fn get_mut(&mut self, id: &AssetID) -> Result<&mut Asset> {
        let idx = *self
            .index
            .get(id)
            .with_context(|| format!("Unknown asset ID: {id}"))?;

        Ok(&mut self.assets[idx])
    }

    /// Flag assets whose premises now want the target technology.
    ///
    /// # Arguments
    ///
    /// * `percentage_annual_increase` - Percentage points by which desirability should grow
    ///
    /// # Returns
    ///
    /// The IDs of the newly flagged assets.
    pub fn update_adoption_desirability(
        &mut self,
        percentage_annual_increase: f64,
    ) -> Result<Vec<AssetID>> {
        let ids = select_newly_desirable(&self.assets, percentage_annual_increase);
        for id in &ids {
            self.get_mut(id)?.adoption_desirability = true;
        }

        Ok(ids)
    }

    /// Apply interventions to the network, in the order given.
    ///
    /// Each intervention sets its technology flag on the target asset. Other flags are untouched.
    pub fn upgrade(&mut self, interventions: &[Intervention]) -> Result<()> {
        for intervention in interventions {
            let asset = self.get_mut(&intervention.asset_id)?;
            *asset.technologies.get_mut(intervention.technology) = true;
        }

        Ok(())
    }

    /// Percentage of premises with each technology, grouped by the given granularity.
    ///
    /// Units are returned in the order in which they are first encountered.
    pub fn coverage(&self, granularity: Granularity) -> Vec<CoverageSummary> {
        self.group_by(granularity)
            .into_iter()
            .map(|(id, assets)| {
                let sum_of_premises: u64 = assets.iter().map(|a| u64::from(a.total_prems)).sum();
                let percentage_of_premises = PerTechnology::from_fn(|technology| {
                    let with_technology: u64 = assets
                        .iter()
                        .filter(|a| a.has_technology(technology))
                        .map(|a| u64::from(a.total_prems))
                        .sum();
                    percentage(with_technology, sum_of_premises)
                });

                CoverageSummary {
                    id,
                    percentage_of_premises,
                    sum_of_premises,
                }
            })
            .collect()
    }

    /// Premises-weighted average capacity, grouped by the given granularity.
    ///
    /// Units are returned in the order in which they are first encountered.
    pub fn capacity(&self, granularity: Granularity) -> Vec<CapacitySummary> {
        self.group_by(granularity)
            .into_iter()
            .map(|(id, assets)| {
                let mut premises = 0.0;
                let mut weighted = 0.0;
                for asset in assets {
                    let prems = f64::from(asset.total_prems);
                    premises += prems;
                    weighted += prems * asset.capacity(&self.speeds).value();
                }
                let average = if premises > 0.0 {
                    weighted / premises
                } else {
                    0.0
                };

                CapacitySummary {
                    id,
                    average_capacity: Mbps(average),
                }
            })
            .collect()
    }

    fn group_by(&self, granularity: Granularity) -> IndexMap<Rc<str>, Vec<&Asset>> {
        let mut groups: IndexMap<Rc<str>, Vec<&Asset>> = IndexMap::new();
        for asset in &self.assets {
            let key = match granularity {
                Granularity::Exchange => &asset.exchange_id.0,
                Granularity::Lad => &asset.lad_id.0,
            };
            groups.entry(Rc::clone(key)).or_default().push(asset);
        }

        groups
    }
}

/// `part` as a percentage of `total`, or zero if `total` is zero
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
