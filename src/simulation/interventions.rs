//! Code for deciding which assets to upgrade each year.
//!
//! Assets are funded greedily in priority order. As soon as the next asset in the ranking cannot be
//! afforded (or would take the year over the adoption cap) the scan for that funding pool stops:
//! lower-ranked assets are never funded in its place, even if they would fit.
use crate::asset::{Asset, AssetID};
use crate::technology::Technology;
use crate::units::Money;
use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator};

/// A funding policy determining how upgrades are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Policy {
    /// Upgrades are funded purely from the market budget, most beneficial first
    #[strum(serialize = "s1_market_based_roll_out")]
    MarketBasedRollOut,
    /// Market rollout, then match-funded upgrades of the cheapest remaining assets
    #[strum(serialize = "s2_rural_based_subsidy")]
    RuralBasedSubsidy,
    /// Market rollout, then match-funded upgrades of the most expensive remaining assets
    #[strum(serialize = "s3_outside_in_subsidy")]
    OutsideInSubsidy,
}

/// The error returned when a policy name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicyError(pub String);

impl fmt::Display for UnknownPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown policy: {}", self.0)
    }
}

impl std::error::Error for UnknownPolicyError {}

impl FromStr for Policy {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::iter()
            .find(|policy| policy.to_string() == s)
            .ok_or_else(|| UnknownPolicyError(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Policy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The attribute used to rank assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingVariable {
    /// Rank by the benefit of upgrading
    RolloutBenefits,
    /// Rank by the cost of upgrading
    RolloutCosts,
}

/// How an upgrade was paid for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum DeploymentType {
    /// Funded from the annual market budget
    #[string = "market_based"]
    MarketBased,
    /// Funded from the telco match-funding pool
    #[string = "subsidy_based"]
    SubsidyBased,
}

/// A decision to upgrade an asset
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    /// The asset to upgrade
    pub asset_id: AssetID,
    /// The technology to deploy
    pub technology: Technology,
    /// The policy under which the decision was made
    pub policy: Policy,
    /// Which funding pool paid for the upgrade
    pub deployment_type: DeploymentType,
    /// The cost of the upgrade
    pub cost: Money,
}

/// Funding available for upgrades in a single year
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FundingPools {
    /// Annual capital budget for market-based rollout
    pub annual_budget: Money,
    /// Annual government subsidy.
    ///
    /// Carried for reporting; upgrades are not drawn from it.
    pub subsidy: Money,
    /// Annual budget available for match-funded (subsidy-based) upgrades
    pub telco_match_funding: Money,
    /// Universal service obligation (Mbps).
    ///
    /// Carried for reporting; not yet used when choosing upgrades.
    pub service_obligation_capacity: f64,
}

/// The outcome of deciding interventions for a single year
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionPlan {
    /// Chosen interventions, in the order they were chosen
    pub interventions: Vec<Intervention>,
    /// Market budget left over
    pub remaining_budget: Money,
    /// Match funding left over
    pub remaining_match_funding: Money,
}

impl InterventionPlan {
    /// A plan with no interventions, leaving all funding unspent
    fn empty(funding: &FundingPools) -> Self {
        Self {
            interventions: Vec::new(),
            remaining_budget: funding.annual_budget,
            remaining_match_funding: funding.telco_match_funding,
        }
    }
}

/// Rank assets by the given variable.
///
/// The sort is stable, so assets with equal values keep their input order.
fn rank_assets<'a>(
    assets: &'a [Asset],
    ranking_variable: RankingVariable,
    technology: Technology,
    descending: bool,
) -> Result<Vec<&'a Asset>> {
    let mut ranked: Vec<(f64, &Asset)> = assets
        .iter()
        .map(|asset| {
            let rollout = asset.rollout(technology)?;
            let key = match ranking_variable {
                RankingVariable::RolloutBenefits => rollout.benefit,
                RankingVariable::RolloutCosts => rollout.cost.value(),
            };
            Ok((key, asset))
        })
        .collect::<Result<_>>()?;

    if descending {
        ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    } else {
        ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    }

    Ok(ranked.into_iter().map(|(_, asset)| asset).collect())
}

/// Running state for a single call to [`decide_interventions`]
struct Planner {
    technology: Technology,
    policy: Policy,
    interventions: Vec<Intervention>,
    upgraded_ids: HashSet<AssetID>,
    premises_passed: u64,
    budget: Money,
    match_funding: Money,
}

impl Planner {
    fn new(technology: Technology, policy: Policy, funding: &FundingPools) -> Self {
        Self {
            technology,
            policy,
            interventions: Vec::new(),
            upgraded_ids: HashSet::new(),
            premises_passed: 0,
            budget: funding.annual_budget,
            match_funding: funding.telco_match_funding,
        }
    }

    fn commit(&mut self, asset: &Asset, deployment_type: DeploymentType, cost: Money) {
        self.interventions.push(Intervention {
            asset_id: asset.id.clone(),
            technology: self.technology,
            policy: self.policy,
            deployment_type,
            cost,
        });
        self.upgraded_ids.insert(asset.id.clone());
        self.premises_passed += u64::from(asset.total_prems);
    }

    /// Fund the most beneficial assets from the market budget, within the adoption cap
    fn market_pass(&mut self, assets: &[Asset], adoption_cap: u64) -> Result<()> {
        let ranked = rank_assets(
            assets,
            RankingVariable::RolloutBenefits,
            self.technology,
            true,
        )?;

        for asset in ranked {
            if self.upgraded_ids.contains(&asset.id) {
                continue;
            }

            let cost = asset.rollout(self.technology)?.cost;
            if self.premises_passed + u64::from(asset.total_prems) < adoption_cap
                && cost < self.budget
            {
                self.budget -= cost;
                self.commit(asset, DeploymentType::MarketBased, cost);
            } else {
                debug!("Market rollout stopped at asset {}", asset.id);
                break;
            }
        }

        Ok(())
    }

    /// Fund assets not already upgraded from the match-funding pool, ranked by cost
    fn subsidy_pass(&mut self, assets: &[Asset], most_expensive_first: bool) -> Result<()> {
        let ranked = rank_assets(
            assets,
            RankingVariable::RolloutCosts,
            self.technology,
            most_expensive_first,
        )?;

        for asset in ranked {
            if self.upgraded_ids.contains(&asset.id) {
                continue;
            }

            let cost = asset.rollout(self.technology)?.cost;
            if cost < self.match_funding {
                self.match_funding -= cost;
                self.commit(asset, DeploymentType::SubsidyBased, cost);
            } else {
                debug!("Subsidised rollout stopped at asset {}", asset.id);
                break;
            }
        }

        Ok(())
    }

    fn into_plan(self) -> InterventionPlan {
        InterventionPlan {
            interventions: self.interventions,
            remaining_budget: self.budget,
            remaining_match_funding: self.match_funding,
        }
    }
}

/// Decide which assets to upgrade this year.
///
/// # Arguments
///
/// * `assets` - Candidate assets
/// * `year` - The year being simulated
/// * `technology` - The technology being deployed
/// * `policy` - How upgrades are prioritised and funded
/// * `funding` - Funding available this year
/// * `adoption_cap` - Upper limit on premises upgraded from the market budget
///
/// # Returns
///
/// The chosen interventions along with any unspent funding, or an error if an asset has no rollout
/// data for `technology`.
pub fn decide_interventions(
    assets: &[Asset],
    year: u32,
    technology: Technology,
    policy: Policy,
    funding: &FundingPools,
    adoption_cap: u64,
) -> Result<InterventionPlan> {
    debug!(
        "Deciding {technology} interventions for {year} under {policy} \
        (budget: {}, match funding: {}, subsidy: {}, USO: {} Mbps, adoption cap: {adoption_cap})",
        funding.annual_budget,
        funding.telco_match_funding,
        funding.subsidy,
        funding.service_obligation_capacity
    );

    let mut planner = Planner::new(technology, policy, funding);
    planner.market_pass(assets, adoption_cap)?;
    match policy {
        Policy::MarketBasedRollOut => {}
        Policy::RuralBasedSubsidy => planner.subsidy_pass(assets, false)?,
        Policy::OutsideInSubsidy => planner.subsidy_pass(assets, true)?,
    }

    Ok(planner.into_plan())
}

/// Decide interventions for a policy given by name.
///
/// An unrecognised policy name is not an error: a warning is logged and no upgrades are made.
pub fn decide_interventions_by_name(
    assets: &[Asset],
    year: u32,
    technology: Technology,
    policy_name: &str,
    funding: &FundingPools,
    adoption_cap: u64,
) -> Result<InterventionPlan> {
    match policy_name.parse() {
        Ok(policy) => decide_interventions(assets, year, technology, policy, funding, adoption_cap),
        Err(err) => {
            warn!("{err}. No upgrades built");
            Ok(InterventionPlan::empty(funding))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{asset_with_rollout, assert_error, funding, three_assets};
    use itertools::Itertools;
    use rstest::rstest;

    const TECH: Technology = Technology::Fttp;

    fn selected(plan: &InterventionPlan) -> Vec<&str> {
        plan.interventions
            .iter()
            .map(|i| &*i.asset_id.0)
            .collect()
    }

    fn total_cost(plan: &InterventionPlan) -> Money {
        plan.interventions
            .iter()
            .fold(Money(0.0), |acc, i| acc + i.cost)
    }

    /// Assets with costs 10, 50 and 100 (in that input order) and equal benefit
    fn cost_ladder() -> Vec<Asset> {
        vec![
            asset_with_rollout("cheap", 10, 10.0, 1.0),
            asset_with_rollout("mid", 10, 50.0, 1.0),
            asset_with_rollout("dear", 10, 100.0, 1.0),
        ]
    }

    #[test]
    fn test_policy_names() {
        for policy in Policy::iter() {
            assert_eq!(policy.to_string().parse::<Policy>().unwrap(), policy);
        }
        assert_eq!(
            "s4_magic".parse::<Policy>().unwrap_err(),
            UnknownPolicyError("s4_magic".into())
        );
    }

    #[test]
    fn test_policy_deserialise() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: Policy,
        }

        let w: Wrapper = toml::from_str("policy = \"s2_rural_based_subsidy\"").unwrap();
        assert_eq!(w.policy, Policy::RuralBasedSubsidy);
        assert!(toml::from_str::<Wrapper>("policy = \"nonsense\"").is_err());
    }

    #[rstest]
    fn test_end_to_end_market_scenario(three_assets: Vec<Asset>, mut funding: FundingPools) {
        funding.annual_budget = Money(250.0);
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            1000,
        )
        .unwrap();

        // A is funded; B costs more than the 150 left, so the scan stops and C is never reached
        assert_eq!(
            plan.interventions,
            [Intervention {
                asset_id: "A".into(),
                technology: TECH,
                policy: Policy::MarketBasedRollOut,
                deployment_type: DeploymentType::MarketBased,
                cost: Money(100.0),
            }]
        );
        assert_eq!(plan.remaining_budget, Money(150.0));
    }

    #[rstest]
    fn test_early_exit(mut funding: FundingPools) {
        let assets = vec![
            asset_with_rollout("cheap_low_benefit", 10, 10.0, 1.0),
            asset_with_rollout("expensive_high_benefit", 10, 1000.0, 10.0),
            asset_with_rollout("cheap_low_benefit_2", 10, 10.0, 0.5),
        ];
        funding.annual_budget = Money(500.0);
        let plan = decide_interventions(
            &assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            1000,
        )
        .unwrap();
        assert!(plan.interventions.is_empty());
    }

    #[rstest]
    fn test_adoption_cap_stops_scan(three_assets: Vec<Asset>, mut funding: FundingPools) {
        funding.annual_budget = Money(1e6);

        // A has 50 premises: 0 + 50 < 51 is OK, but adding B (80) is not
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            51,
        )
        .unwrap();
        assert_eq!(selected(&plan), ["A"]);

        // The cap is a strict upper bound
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            50,
        )
        .unwrap();
        assert!(plan.interventions.is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(99.0)]
    #[case(250.0)]
    #[case(301.0)]
    #[case(351.0)]
    #[case(1e9)]
    fn test_budget_never_exceeded(
        three_assets: Vec<Asset>,
        mut funding: FundingPools,
        #[case] budget: f64,
    ) {
        funding.annual_budget = Money(budget);
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            u64::MAX,
        )
        .unwrap();
        assert!(total_cost(&plan) <= Money(budget));
        assert_eq!(plan.remaining_budget, Money(budget) - total_cost(&plan));
    }

    #[rstest]
    fn test_cost_equal_to_budget_not_funded(three_assets: Vec<Asset>, mut funding: FundingPools) {
        funding.annual_budget = Money(100.0);
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            u64::MAX,
        )
        .unwrap();
        assert!(plan.interventions.is_empty());
    }

    #[rstest]
    fn test_ties_keep_input_order(mut funding: FundingPools) {
        funding.annual_budget = Money(25.0);
        let plan = decide_interventions(
            &cost_ladder(),
            2020,
            TECH,
            Policy::MarketBasedRollOut,
            &funding,
            u64::MAX,
        )
        .unwrap();

        // All benefits are equal, so "cheap" (first in input) is visited first, then "mid" fails
        assert_eq!(selected(&plan), ["cheap"]);
    }

    #[rstest]
    #[case(Policy::RuralBasedSubsidy, 61.0, &["cheap", "mid"])]
    #[case(Policy::RuralBasedSubsidy, 60.0, &["cheap"])] // 50 < 50 fails
    #[case(Policy::OutsideInSubsidy, 61.0, &[])] // 100 < 61 fails immediately
    #[case(Policy::OutsideInSubsidy, 150.0, &["dear"])] // 50 < 50 fails
    #[case(Policy::OutsideInSubsidy, 151.0, &["dear", "mid"])] // 10 < 1 fails
    #[case(Policy::OutsideInSubsidy, 161.0, &["dear", "mid", "cheap"])]
    fn test_subsidy_ranking_direction(
        mut funding: FundingPools,
        #[case] policy: Policy,
        #[case] match_funding: f64,
        #[case] expected: &[&str],
    ) {
        // No market budget, so every upgrade comes from the subsidy pass
        funding.annual_budget = Money(0.0);
        funding.telco_match_funding = Money(match_funding);
        let plan =
            decide_interventions(&cost_ladder(), 2020, TECH, policy, &funding, u64::MAX).unwrap();

        assert_eq!(selected(&plan), expected);
        assert!(
            plan.interventions
                .iter()
                .all(|i| i.deployment_type == DeploymentType::SubsidyBased)
        );
    }

    #[rstest]
    #[case(Policy::RuralBasedSubsidy)]
    #[case(Policy::OutsideInSubsidy)]
    fn test_no_double_upgrade(
        three_assets: Vec<Asset>,
        mut funding: FundingPools,
        #[case] policy: Policy,
    ) {
        // Market pass funds A only; match funding could pay for everything
        funding.annual_budget = Money(150.0);
        funding.telco_match_funding = Money(1e6);
        let plan = decide_interventions(&three_assets, 2020, TECH, policy, &funding, u64::MAX)
            .unwrap();

        let (market, subsidy): (Vec<_>, Vec<_>) = plan
            .interventions
            .iter()
            .partition(|i| i.deployment_type == DeploymentType::MarketBased);
        assert_eq!(market.iter().map(|i| &*i.asset_id.0).collect_vec(), ["A"]);
        assert!(subsidy.iter().all(|i| &*i.asset_id.0 != "A"));
        assert_eq!(subsidy.len(), 2);
        assert!(plan.interventions.iter().map(|i| &i.asset_id).all_unique());
        assert_eq!(plan.remaining_budget, Money(50.0));
        assert_eq!(plan.remaining_match_funding, Money(1e6 - 250.0));
    }

    #[rstest]
    fn test_subsidy_pass_ignores_adoption_cap(three_assets: Vec<Asset>, mut funding: FundingPools) {
        funding.annual_budget = Money(1e6);
        funding.telco_match_funding = Money(1e6);
        let plan = decide_interventions(
            &three_assets,
            2020,
            TECH,
            Policy::RuralBasedSubsidy,
            &funding,
            0,
        )
        .unwrap();

        // Cheapest first: C (50), A (100), B (200)
        assert_eq!(selected(&plan), ["C", "A", "B"]);
    }

    #[rstest]
    #[case(Policy::MarketBasedRollOut)]
    #[case(Policy::RuralBasedSubsidy)]
    #[case(Policy::OutsideInSubsidy)]
    fn test_empty_assets(funding: FundingPools, #[case] policy: Policy) {
        let plan = decide_interventions(&[], 2020, TECH, policy, &funding, 1000).unwrap();
        assert!(plan.interventions.is_empty());
        assert_eq!(plan.remaining_budget, funding.annual_budget);
        assert_eq!(plan.remaining_match_funding, funding.telco_match_funding);
    }

    #[rstest]
    fn test_missing_rollout_data(three_assets: Vec<Asset>, funding: FundingPools) {
        assert_error!(
            decide_interventions(
                &three_assets,
                2020,
                Technology::Adsl,
                Policy::MarketBasedRollOut,
                &funding,
                1000
            ),
            "Asset A has no rollout data for adsl"
        );
    }

    #[rstest]
    fn test_decide_by_name(three_assets: Vec<Asset>, mut funding: FundingPools) {
        funding.annual_budget = Money(250.0);
        let plan = decide_interventions_by_name(
            &three_assets,
            2020,
            TECH,
            "s1_market_based_roll_out",
            &funding,
            1000,
        )
        .unwrap();
        assert_eq!(selected(&plan), ["A"]);

        // Unknown policies build nothing rather than failing
        let plan =
            decide_interventions_by_name(&three_assets, 2020, TECH, "s9_unknown", &funding, 1000)
                .unwrap();
        assert_eq!(plan, InterventionPlan::empty(&funding));
    }
}
