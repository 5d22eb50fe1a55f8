//! Broadband access technologies and per-technology lookup tables.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A fixed broadband access technology which can be deployed at an asset
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Technology {
    /// Fibre to the premises
    Fttp,
    /// Fibre to the distribution point (G.fast)
    Fttdp,
    /// Fibre to the cabinet
    Fttc,
    /// Cable (DOCSIS 3.0)
    Docsis3,
    /// Copper (ADSL)
    Adsl,
}

/// A value for every [`Technology`].
///
/// Each technology has its own typed field, so lookups go through [`PerTechnology::get`] rather
/// than by name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerTechnology<T> {
    /// Value for FTTP
    pub fttp: T,
    /// Value for FTTdp
    pub fttdp: T,
    /// Value for FTTC
    pub fttc: T,
    /// Value for DOCSIS3
    pub docsis3: T,
    /// Value for ADSL
    pub adsl: T,
}

impl<T> PerTechnology<T> {
    /// Create a new table by calling `f` for each technology
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Technology) -> T,
    {
        Self {
            fttp: f(Technology::Fttp),
            fttdp: f(Technology::Fttdp),
            fttc: f(Technology::Fttc),
            docsis3: f(Technology::Docsis3),
            adsl: f(Technology::Adsl),
        }
    }

    /// Get the value for the given technology
    pub fn get(&self, technology: Technology) -> &T {
        match technology {
            Technology::Fttp => &self.fttp,
            Technology::Fttdp => &self.fttdp,
            Technology::Fttc => &self.fttc,
            Technology::Docsis3 => &self.docsis3,
            Technology::Adsl => &self.adsl,
        }
    }

    /// Get a mutable reference to the value for the given technology
    pub fn get_mut(&mut self, technology: Technology) -> &mut T {
        match technology {
            Technology::Fttp => &mut self.fttp,
            Technology::Fttdp => &mut self.fttdp,
            Technology::Fttc => &mut self.fttc,
            Technology::Docsis3 => &mut self.docsis3,
            Technology::Adsl => &mut self.adsl,
        }
    }

    /// Iterate over technologies and their values, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Technology, &T)> {
        Technology::iter().map(|technology| (technology, self.get(technology)))
    }
}
