use serde::Serialize;

use super::engine::project_scenario;
use super::types::{CostAssumptions, EngineError, PlanInputs, ProjectionResult, VehicleKind};

#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub name: String,
    pub assumptions: CostAssumptions,
}

impl VehicleSpec {
    pub fn with_defaults(kind: VehicleKind) -> Self {
        Self {
            name: kind.label().to_string(),
            assumptions: kind.default_assumptions(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResult {
    pub name: String,
    pub projection: ProjectionResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxAdvantage {
    pub lower_tax_vehicle: String,
    pub higher_tax_vehicle: String,
    pub savings: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Per-vehicle projections in the caller's listing order.
    pub results: Vec<VehicleResult>,
    pub winner: String,
    pub metric: &'static str,
    pub tax_advantage: Option<TaxAdvantage>,
}

/// Projects every vehicle against the same plan and ranks by net monthly
/// pension. Ties keep the first-listed vehicle, so the ranking is stable
/// across identical recomputes.
pub fn compare_vehicles(
    inputs: &PlanInputs,
    vehicles: &[VehicleSpec],
) -> Result<ComparisonResult, EngineError> {
    if vehicles.is_empty() {
        return Err(EngineError::InvalidInput(
            "at least one vehicle is required for a comparison".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        results.push(VehicleResult {
            name: vehicle.name.clone(),
            projection: project_scenario(inputs, &vehicle.assumptions)?,
        });
    }

    let mut winner = 0;
    for (idx, candidate) in results.iter().enumerate().skip(1) {
        if candidate.projection.net_monthly_pension
            > results[winner].projection.net_monthly_pension
        {
            winner = idx;
        }
    }

    let tax_advantage = tax_advantage(&results);
    Ok(ComparisonResult {
        winner: results[winner].name.clone(),
        metric: "netMonthlyPension",
        results,
        tax_advantage,
    })
}

/// Difference in lifetime tax between the cheapest- and dearest-taxed
/// vehicles, always framed as a non-negative saving. Omitted when there is
/// nothing to save or nothing to compare.
pub fn tax_advantage(results: &[VehicleResult]) -> Option<TaxAdvantage> {
    if results.len() < 2 {
        return None;
    }

    let mut lowest = 0;
    let mut highest = 0;
    for (idx, candidate) in results.iter().enumerate().skip(1) {
        if candidate.projection.total_tax_paid < results[lowest].projection.total_tax_paid {
            lowest = idx;
        }
        if candidate.projection.total_tax_paid > results[highest].projection.total_tax_paid {
            highest = idx;
        }
    }

    let savings =
        results[highest].projection.total_tax_paid - results[lowest].projection.total_tax_paid;
    if savings <= 0.0 {
        return None;
    }
    Some(TaxAdvantage {
        lower_tax_vehicle: results[lowest].name.clone(),
        higher_tax_vehicle: results[highest].name.clone(),
        savings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PayoutMode, TaxTreatment};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn sample_inputs() -> PlanInputs {
        PlanInputs {
            current_age: 35,
            retirement_age: 67,
            monthly_contribution: 300.0,
            initial_capital: 0.0,
            target_capital: None,
            payout_start_age: 67,
            payout_end_age: 87,
            payout_mode: PayoutMode::Annuity,
            annuity_rate: 0.035,
            safe_withdrawal_rate: 0.04,
            payout_horizon_years: 20,
        }
    }

    fn standard_trio() -> Vec<VehicleSpec> {
        vec![
            VehicleSpec::with_defaults(VehicleKind::FundLinkedInsurance),
            VehicleSpec::with_defaults(VehicleKind::DirectFund),
            VehicleSpec::with_defaults(VehicleKind::GuaranteedRateInsurance),
        ]
    }

    #[test]
    fn winner_has_the_maximum_net_monthly_pension() {
        let comparison =
            compare_vehicles(&sample_inputs(), &standard_trio()).expect("valid comparison");
        let winning = comparison
            .results
            .iter()
            .find(|r| r.name == comparison.winner)
            .expect("winner must be among the results");
        for result in &comparison.results {
            assert!(
                winning.projection.net_monthly_pension >= result.projection.net_monthly_pension
            );
        }
        assert_eq!(comparison.metric, "netMonthlyPension");
    }

    #[test]
    fn results_preserve_the_callers_listing_order() {
        let comparison =
            compare_vehicles(&sample_inputs(), &standard_trio()).expect("valid comparison");
        let names: Vec<&str> = comparison.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Fondspolice",
                "ETF-Sparplan",
                "Klassische Rentenversicherung"
            ]
        );
    }

    #[test]
    fn tie_break_keeps_the_first_listed_vehicle() {
        let mut twin_a = VehicleSpec::with_defaults(VehicleKind::FundLinkedInsurance);
        twin_a.name = "Tarif A".to_string();
        let mut twin_b = VehicleSpec::with_defaults(VehicleKind::FundLinkedInsurance);
        twin_b.name = "Tarif B".to_string();

        let comparison =
            compare_vehicles(&sample_inputs(), &[twin_a, twin_b]).expect("valid comparison");
        assert_eq!(comparison.winner, "Tarif A");
    }

    #[test]
    fn empty_vehicle_list_is_rejected() {
        assert!(matches!(
            compare_vehicles(&sample_inputs(), &[]),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn tax_advantage_names_the_cheaper_vehicle_and_is_non_negative() {
        let comparison =
            compare_vehicles(&sample_inputs(), &standard_trio()).expect("valid comparison");
        let advantage = comparison.tax_advantage.expect("trio has differing taxes");
        assert!(advantage.savings > 0.0);
        assert_ne!(advantage.lower_tax_vehicle, advantage.higher_tax_vehicle);

        let by_name = |name: &str| {
            comparison
                .results
                .iter()
                .find(|r| r.name == name)
                .expect("named vehicle present")
                .projection
                .total_tax_paid
        };
        assert!(by_name(&advantage.lower_tax_vehicle) <= by_name(&advantage.higher_tax_vehicle));
    }

    #[test]
    fn tax_advantage_is_omitted_for_identical_vehicles() {
        let mut twin_a = VehicleSpec::with_defaults(VehicleKind::DirectFund);
        twin_a.name = "ETF A".to_string();
        let mut twin_b = VehicleSpec::with_defaults(VehicleKind::DirectFund);
        twin_b.name = "ETF B".to_string();

        let comparison =
            compare_vehicles(&sample_inputs(), &[twin_a, twin_b]).expect("valid comparison");
        assert!(comparison.tax_advantage.is_none());
    }

    #[test]
    fn tax_advantage_is_omitted_for_a_single_vehicle() {
        let solo = [VehicleSpec::with_defaults(VehicleKind::DirectFund)];
        let comparison = compare_vehicles(&sample_inputs(), &solo).expect("valid comparison");
        assert!(comparison.tax_advantage.is_none());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_winner_is_never_dominated(
            return_a_bp in 0u32..1_200,
            return_b_bp in 0u32..1_200,
            return_c_bp in 0u32..1_200,
            cost_bp in 0u32..200
        ) {
            let make = |name: &str, return_bp: u32| {
                let mut vehicle = VehicleSpec::with_defaults(VehicleKind::DirectFund);
                vehicle.name = name.to_string();
                vehicle.assumptions = CostAssumptions {
                    expected_annual_return: return_bp as f64 / 10_000.0,
                    annual_cost_rate: cost_bp as f64 / 10_000.0,
                    tax_treatment: TaxTreatment::AnnualCapitalGains,
                    tax_rate: 0.26375,
                    ertragsanteil_fraction: None,
                };
                vehicle
            };
            let vehicles = [
                make("A", return_a_bp),
                make("B", return_b_bp),
                make("C", return_c_bp),
            ];

            let comparison = compare_vehicles(&sample_inputs(), &vehicles)
                .expect("valid comparison");
            let winning_pension = comparison
                .results
                .iter()
                .find(|r| r.name == comparison.winner)
                .expect("winner present")
                .projection
                .net_monthly_pension;
            for result in &comparison.results {
                prop_assert!(winning_pension >= result.projection.net_monthly_pension);
            }
            prop_assert_eq!(comparison.results.len(), 3);
        }
    }
}
