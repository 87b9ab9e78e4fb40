use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PayoutMode {
    Annuity,
    FlexibleWithdrawal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxTreatment {
    /// Partial-income taxation of the payout; accumulation is untaxed.
    Ertragsanteil,
    /// Abgeltungssteuer on gains as they accrue; the payout is untaxed.
    AnnualCapitalGains,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VehicleKind {
    FundLinkedInsurance,
    DirectFund,
    GuaranteedRateInsurance,
}

impl VehicleKind {
    pub fn label(self) -> &'static str {
        match self {
            VehicleKind::FundLinkedInsurance => "Fondspolice",
            VehicleKind::DirectFund => "ETF-Sparplan",
            VehicleKind::GuaranteedRateInsurance => "Klassische Rentenversicherung",
        }
    }

    /// Market-typical assumptions per vehicle; callers may override any field.
    pub fn default_assumptions(self) -> CostAssumptions {
        match self {
            VehicleKind::FundLinkedInsurance => CostAssumptions {
                expected_annual_return: 0.06,
                annual_cost_rate: 0.013,
                tax_treatment: TaxTreatment::Ertragsanteil,
                tax_rate: 0.30,
                ertragsanteil_fraction: Some(0.17),
            },
            VehicleKind::DirectFund => CostAssumptions {
                expected_annual_return: 0.07,
                annual_cost_rate: 0.003,
                tax_treatment: TaxTreatment::AnnualCapitalGains,
                tax_rate: 0.26375,
                ertragsanteil_fraction: None,
            },
            VehicleKind::GuaranteedRateInsurance => CostAssumptions {
                expected_annual_return: 0.025,
                annual_cost_rate: 0.008,
                tax_treatment: TaxTreatment::Ertragsanteil,
                tax_rate: 0.30,
                ertragsanteil_fraction: Some(0.17),
            },
        }
    }
}

/// One user plan, snapshotted per recompute. All rates are decimal fractions
/// (0.065 = 6.5%); percent forms exist only at the CLI/API boundary.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub monthly_contribution: f64,
    pub initial_capital: f64,
    pub target_capital: Option<f64>,
    pub payout_start_age: u32,
    pub payout_end_age: u32,
    pub payout_mode: PayoutMode,
    pub annuity_rate: f64,
    pub safe_withdrawal_rate: f64,
    /// Payout years over which Ertragsanteil tax is aggregated. An explicit
    /// policy assumption, deliberately not derived from the payout ages.
    pub payout_horizon_years: u32,
}

impl PlanInputs {
    pub fn withdrawal_rate(&self) -> f64 {
        match self.payout_mode {
            PayoutMode::Annuity => self.annuity_rate,
            PayoutMode::FlexibleWithdrawal => self.safe_withdrawal_rate,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CostAssumptions {
    pub expected_annual_return: f64,
    pub annual_cost_rate: f64,
    pub tax_treatment: TaxTreatment,
    /// Personal marginal rate (Ertragsanteil) or statutory capital-gains rate.
    pub tax_rate: f64,
    pub ertragsanteil_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub final_capital: f64,
    pub gross_monthly_pension: f64,
    pub net_monthly_pension: f64,
    pub total_tax_paid: f64,
    pub effective_net_annual_return: f64,
    pub target_capital_reached: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidInput(String),
    InvalidRange(String),
    MissingParameter(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            EngineError::MissingParameter(name) => write!(f, "missing parameter: {name}"),
        }
    }
}

impl std::error::Error for EngineError {}
