mod compare;
mod engine;
mod goal;
mod types;

pub use compare::{
    ComparisonResult, TaxAdvantage, VehicleResult, VehicleSpec, compare_vehicles, tax_advantage,
};
pub use engine::{
    MAX_HORIZON_YEARS, future_value, monthly_payout, net_accumulation_growth, net_payout,
    project_scenario,
};
pub use goal::required_monthly_contribution;
pub use types::{
    CostAssumptions, EngineError, PayoutMode, PlanInputs, ProjectionResult, TaxTreatment,
    VehicleKind,
};
