//! General functions related to finance.
use crate::units::{Dimensionless, Money};
use serde::Deserialize;

/// Parameters used to estimate the revenue an upgrade will bring in
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FinanceParameters {
    /// Number of billing months in a year
    #[serde(default = "default_months_per_year")]
    pub months_per_year: u32,
    /// Number of years over which revenue is counted
    pub payback_period: u32,
    /// Proportion of revenue which is profit
    pub profit_margin: Dimensionless,
}

fn default_months_per_year() -> u32 {
    12
}

/// Revenue expected from upgrading an asset serving `premises` premises.
///
/// # Arguments
///
/// * `premises` - Number of premises served by the asset
/// * `monthly_revenue` - Revenue per premises per month for the deployed technology
/// * `params` - Finance parameters for the model
pub fn revenue(premises: u32, monthly_revenue: Money, params: &FinanceParameters) -> Money {
    let months = f64::from(params.months_per_year) * f64::from(params.payback_period);

    monthly_revenue * Dimensionless(f64::from(premises) * months) * params.profit_margin
}

/// The benefit-cost ratio for an upgrade.
///
/// Zero-cost upgrades are given a ratio of zero.
pub fn benefit_cost_ratio(revenue: Money, cost: Money) -> Dimensionless {
    if cost == Money(0.0) {
        return Dimensionless(0.0);
    }

    revenue / cost
}
