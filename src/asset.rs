//! Assets are the physical network nodes (exchanges, cabinets or distribution points) which can be
//! upgraded to newer broadband technologies.
use crate::geotype::Geotype;
use crate::id::define_id_type;
use crate::technology::{PerTechnology, Technology};
use crate::units::{Mbps, Money};
use anyhow::{Context, Result};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

define_id_type! {AssetID}
define_id_type! {ExchangeID}
define_id_type! {LadID}

/// The kind of network node which the model's assets represent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum AssetGranularity {
    /// Distribution points (the default)
    #[default]
    #[string = "distribution"]
    Distribution,
    /// Street cabinets
    #[string = "cabinet"]
    Cabinet,
    /// Local exchanges
    #[string = "exchange"]
    Exchange,
}

impl AssetGranularity {
    /// The name used for this granularity in model files
    pub fn name(self) -> &'static str {
        match self {
            Self::Distribution => "distribution",
            Self::Cabinet => "cabinet",
            Self::Exchange => "exchange",
        }
    }
}

/// The cost of upgrading an asset to a technology and the benefit of doing so
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollout {
    /// Cost of the upgrade
    pub cost: Money,
    /// Score used to rank upgrades (higher is better)
    pub benefit: f64,
}

/// A network asset
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Unique identifier
    pub id: AssetID,
    /// The exchange which serves this asset
    pub exchange_id: ExchangeID,
    /// The local authority district the asset is in
    pub lad_id: LadID,
    /// Number of premises served
    pub total_prems: u32,
    /// Technologies currently present among the premises served
    pub technologies: PerTechnology<bool>,
    /// Cost and benefit of upgrading to each technology, where known
    pub rollout: PerTechnology<Option<Rollout>>,
    /// Whether the premises served currently want the target technology
    pub adoption_desirability: bool,
    /// Classification fixed when the asset is loaded
    pub geotype: Geotype,
}

impl Asset {
    /// Whether the asset already has the given technology
    pub fn has_technology(&self, technology: Technology) -> bool {
        *self.technologies.get(technology)
    }

    /// Get the rollout cost and benefit for the given technology.
    ///
    /// Returns an error if the asset has no rollout data for the technology.
    pub fn rollout(&self, technology: Technology) -> Result<&Rollout> {
        self.rollout
            .get(technology)
            .as_ref()
            .with_context(|| format!("Asset {} has no rollout data for {technology}", self.id))
    }

    /// The speed available at this asset.
    ///
    /// This is the speed of the fastest technology present or, if there is none, the baseline
    /// speed for the asset's geotype.
    pub fn capacity(&self, speeds: &PerTechnology<Mbps>) -> Mbps {
        self.technologies
            .iter()
            .filter(|(_, present)| **present)
            .map(|(technology, _)| *speeds.get(technology))
            .max_by(Mbps::total_cmp)
            .unwrap_or_else(|| self.geotype.baseline_speed())
    }
}
