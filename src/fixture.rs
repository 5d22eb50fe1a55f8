//! Fixtures for tests
use crate::adoption::AdoptionTargets;
use crate::asset::{Asset, AssetGranularity, Rollout};
use crate::finance::FinanceParameters;
use crate::geotype::Geotype;
use crate::model::{Model, ModelParameters, ScenarioID, TechnologyParameters};
use crate::network::NetworkManager;
use crate::simulation::interventions::{FundingPools, Policy};
use crate::technology::{PerTechnology, Technology};
use crate::units::{Dimensionless, Mbps, Money};
use rstest::fixture;
use std::collections::HashMap;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Create an asset in exchange `EX1` with no technologies and FTTP rollout data
pub fn asset_with_rollout(id: &str, total_prems: u32, cost: f64, benefit: f64) -> Asset {
    Asset {
        id: id.into(),
        exchange_id: "EX1".into(),
        lad_id: "E07000008".into(),
        total_prems,
        technologies: PerTechnology::default(),
        rollout: PerTechnology {
            fttp: Some(Rollout {
                cost: Money(cost),
                benefit,
            }),
            ..Default::default()
        },
        adoption_desirability: false,
        geotype: Geotype::Above3kShort,
    }
}

#[fixture]
pub fn asset() -> Asset {
    let mut asset = asset_with_rollout("asset1", 10, 100.0, 1.0);
    asset.rollout.fttdp = Some(Rollout {
        cost: Money(60.0),
        benefit: 0.5,
    });
    asset
}

#[fixture]
pub fn technology_speeds() -> PerTechnology<Mbps> {
    PerTechnology {
        fttp: Mbps(1000.0),
        fttdp: Mbps(300.0),
        fttc: Mbps(80.0),
        docsis3: Mbps(200.0),
        adsl: Mbps(24.0),
    }
}

/// Three assets in the same LAD.
///
/// | id | premises | exchange | FTTP cost | FTTP benefit |
/// |----|----------|----------|-----------|--------------|
/// | A  | 50       | EX1      | 100       | 10           |
/// | B  | 80       | EX1      | 200       | 8            |
/// | C  | 30       | EX2      | 50        | 5            |
///
/// A already has ADSL. None are adoption desirable.
#[fixture]
pub fn three_assets() -> Vec<Asset> {
    let mut a = asset_with_rollout("A", 50, 100.0, 10.0);
    a.technologies.adsl = true;
    let b = asset_with_rollout("B", 80, 200.0, 8.0);
    let mut c = asset_with_rollout("C", 30, 50.0, 5.0);
    c.exchange_id = "EX2".into();

    vec![a, b, c]
}

#[fixture]
pub fn funding() -> FundingPools {
    FundingPools {
        annual_budget: Money(250.0),
        subsidy: Money(0.0),
        telco_match_funding: Money(0.0),
        service_obligation_capacity: 0.0,
    }
}

#[fixture]
pub fn network(three_assets: Vec<Asset>, technology_speeds: PerTechnology<Mbps>) -> NetworkManager {
    NetworkManager::new(three_assets, technology_speeds).unwrap()
}

#[fixture]
pub fn model(
    three_assets: Vec<Asset>,
    technology_speeds: PerTechnology<Mbps>,
    funding: FundingPools,
) -> Model {
    let technology = PerTechnology::from_fn(|technology| TechnologyParameters {
        speed: *technology_speeds.get(technology),
        monthly_revenue: Money(20.0),
    });
    let parameters = ModelParameters {
        base_year: 2020,
        end_year: 2021,
        timestep_increment: 1,
        asset_granularity: AssetGranularity::Distribution,
        scenarios: vec!["baseline".into()],
        technologies: vec![Technology::Fttp],
        policies: vec![Policy::MarketBasedRollOut],
        funding,
        finance: FinanceParameters {
            months_per_year: 12,
            payback_period: 4,
            profit_margin: Dimensionless(0.5),
        },
        technology,
    };

    Model {
        model_path: PathBuf::from("model"),
        parameters,
        assets: three_assets,
        adoption_targets: HashMap::from([(
            ScenarioID::from("baseline"),
            AdoptionTargets::from([(2020, 50.0), (2021, 50.0)]),
        )]),
    }
}
