use super::types::{CostAssumptions, EngineError, PlanInputs, ProjectionResult, TaxTreatment};

/// Hard cap on any accumulation horizon, matching the original form validation.
pub const MAX_HORIZON_YEARS: u32 = 100;

const MONTHS_PER_YEAR: u32 = 12;

/// Future value of an initial lump sum plus a monthly contribution stream,
/// compounded monthly. The monthly rate is `annual_rate / 12` by plain
/// division; this intentionally matches the product's established convention
/// rather than the geometric conversion.
pub fn future_value(
    initial_capital: f64,
    monthly_contribution: f64,
    annual_rate: f64,
    years: u32,
) -> Result<f64, EngineError> {
    if !initial_capital.is_finite() || initial_capital < 0.0 {
        return Err(EngineError::InvalidInput(
            "initialCapital must be a finite value >= 0".to_string(),
        ));
    }
    if !monthly_contribution.is_finite() || monthly_contribution < 0.0 {
        return Err(EngineError::InvalidInput(
            "monthlyContribution must be a finite value >= 0".to_string(),
        ));
    }
    if !annual_rate.is_finite() {
        return Err(EngineError::InvalidInput(
            "annualRate must be finite".to_string(),
        ));
    }
    if years > MAX_HORIZON_YEARS {
        return Err(EngineError::InvalidRange(format!(
            "horizon of {years} years exceeds the {MAX_HORIZON_YEARS}-year cap"
        )));
    }

    let monthly_rate = annual_rate / MONTHS_PER_YEAR as f64;
    let months = years * MONTHS_PER_YEAR;
    if monthly_rate == 0.0 {
        return Ok(initial_capital + monthly_contribution * months as f64);
    }

    let growth = (1.0 + monthly_rate).powi(months as i32);
    Ok(initial_capital * growth + monthly_contribution * ((growth - 1.0) / monthly_rate))
}

/// Converts accumulated capital into a gross monthly payout: the rate is an
/// annual percentage of capital split evenly across twelve months. Not a
/// life-contingent annuity price; mortality is out of scope.
pub fn monthly_payout(capital: f64, withdrawal_rate: f64) -> Result<f64, EngineError> {
    if !capital.is_finite() || capital < 0.0 {
        return Err(EngineError::InvalidInput(
            "capital must be a finite value >= 0".to_string(),
        ));
    }
    if !withdrawal_rate.is_finite() || !(0.0..=1.0).contains(&withdrawal_rate) {
        return Err(EngineError::InvalidInput(
            "withdrawalRate must lie between 0 and 1".to_string(),
        ));
    }
    Ok(capital * withdrawal_rate / MONTHS_PER_YEAR as f64)
}

/// Net monthly payout after the payout-phase tax of the selected treatment.
/// Under Ertragsanteil only the statutory fraction of each payout is taxable;
/// under annual capital-gains taxation the payout is already net because the
/// capital grew net of tax.
pub fn net_payout(
    gross_monthly: f64,
    treatment: TaxTreatment,
    tax_rate: f64,
    ertragsanteil_fraction: Option<f64>,
) -> Result<f64, EngineError> {
    if !gross_monthly.is_finite() || gross_monthly < 0.0 {
        return Err(EngineError::InvalidInput(
            "grossMonthlyAmount must be a finite value >= 0".to_string(),
        ));
    }
    if !tax_rate.is_finite() || !(0.0..=1.0).contains(&tax_rate) {
        return Err(EngineError::InvalidInput(
            "taxRate must lie between 0 and 1".to_string(),
        ));
    }

    match treatment {
        TaxTreatment::Ertragsanteil => {
            let Some(fraction) = ertragsanteil_fraction else {
                return Err(EngineError::MissingParameter("ertragsanteilFraction"));
            };
            if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                return Err(EngineError::InvalidInput(
                    "ertragsanteilFraction must lie between 0 and 1".to_string(),
                ));
            }
            Ok(gross_monthly - gross_monthly * fraction * tax_rate)
        }
        TaxTreatment::AnnualCapitalGains => Ok(gross_monthly),
    }
}

/// Accumulation-phase growth rate net of tax. Annual capital-gains taxation
/// drags positive growth by the statutory rate as gains accrue; losses carry
/// no relief. Ertragsanteil leaves accumulation untaxed.
pub fn net_accumulation_growth(
    gross_annual_return: f64,
    treatment: TaxTreatment,
    tax_rate: f64,
) -> f64 {
    match treatment {
        TaxTreatment::Ertragsanteil => gross_annual_return,
        TaxTreatment::AnnualCapitalGains => {
            if gross_annual_return > 0.0 {
                gross_annual_return * (1.0 - tax_rate)
            } else {
                gross_annual_return
            }
        }
    }
}

/// Full projection for one vehicle: cost- and tax-netted growth, monthly
/// compounding to payout start, capital-to-pension conversion, payout-phase
/// tax, and the aggregated tax bill over the relevant horizon.
pub fn project_scenario(
    inputs: &PlanInputs,
    assumptions: &CostAssumptions,
) -> Result<ProjectionResult, EngineError> {
    validate_inputs(inputs)?;
    validate_assumptions(assumptions)?;

    let cost_net_return = assumptions.expected_annual_return - assumptions.annual_cost_rate;
    let net_annual_return = net_accumulation_growth(
        cost_net_return,
        assumptions.tax_treatment,
        assumptions.tax_rate,
    );

    let years = inputs.retirement_age - inputs.current_age;
    let final_capital = future_value(
        inputs.initial_capital,
        inputs.monthly_contribution,
        net_annual_return,
        years,
    )?;

    let gross_monthly_pension = monthly_payout(final_capital, inputs.withdrawal_rate())?;
    let net_monthly_pension = net_payout(
        gross_monthly_pension,
        assumptions.tax_treatment,
        assumptions.tax_rate,
        assumptions.ertragsanteil_fraction,
    )?;

    let total_tax_paid = match assumptions.tax_treatment {
        TaxTreatment::AnnualCapitalGains => accumulation_tax_total(
            inputs,
            cost_net_return,
            net_annual_return,
            assumptions.tax_rate,
            years,
        )?,
        TaxTreatment::Ertragsanteil => {
            (gross_monthly_pension - net_monthly_pension)
                * MONTHS_PER_YEAR as f64
                * inputs.payout_horizon_years as f64
        }
    };

    Ok(ProjectionResult {
        final_capital,
        gross_monthly_pension,
        net_monthly_pension,
        total_tax_paid,
        effective_net_annual_return: net_annual_return,
        target_capital_reached: inputs.target_capital.map(|target| final_capital >= target),
    })
}

/// Walks the net-growth capital path year by year; each year's tax is the
/// pre-tax (cost-netted) gain on that path times the statutory rate.
fn accumulation_tax_total(
    inputs: &PlanInputs,
    pre_tax_rate: f64,
    net_rate: f64,
    tax_rate: f64,
    years: u32,
) -> Result<f64, EngineError> {
    let annual_contribution = inputs.monthly_contribution * MONTHS_PER_YEAR as f64;
    let mut capital = inputs.initial_capital;
    let mut total_tax = 0.0;
    for _ in 0..years {
        let pre_tax_end = future_value(capital, inputs.monthly_contribution, pre_tax_rate, 1)?;
        let gain = pre_tax_end - capital - annual_contribution;
        if gain > 0.0 {
            total_tax += gain * tax_rate;
        }
        capital = future_value(capital, inputs.monthly_contribution, net_rate, 1)?;
    }
    Ok(total_tax)
}

pub(super) fn validate_inputs(inputs: &PlanInputs) -> Result<(), EngineError> {
    if inputs.retirement_age <= inputs.current_age {
        return Err(EngineError::InvalidRange(
            "retirementAge must be greater than currentAge".to_string(),
        ));
    }
    if inputs.payout_start_age != inputs.retirement_age {
        return Err(EngineError::InvalidRange(
            "payoutStartAge must match retirementAge".to_string(),
        ));
    }
    if inputs.payout_end_age <= inputs.payout_start_age {
        return Err(EngineError::InvalidRange(
            "payoutEndAge must be greater than payoutStartAge".to_string(),
        ));
    }
    if !inputs.monthly_contribution.is_finite() || inputs.monthly_contribution < 0.0 {
        return Err(EngineError::InvalidInput(
            "monthlyContribution must be a finite value >= 0".to_string(),
        ));
    }
    if !inputs.initial_capital.is_finite() || inputs.initial_capital < 0.0 {
        return Err(EngineError::InvalidInput(
            "initialCapital must be a finite value >= 0".to_string(),
        ));
    }
    if let Some(target) = inputs.target_capital {
        if !target.is_finite() || target < 0.0 {
            return Err(EngineError::InvalidInput(
                "targetCapital must be a finite value >= 0".to_string(),
            ));
        }
    }
    if !inputs.withdrawal_rate().is_finite() || !(0.0..=1.0).contains(&inputs.withdrawal_rate()) {
        return Err(EngineError::InvalidInput(
            "payout rate must lie between 0 and 1".to_string(),
        ));
    }
    if inputs.payout_horizon_years == 0 {
        return Err(EngineError::InvalidInput(
            "payoutHorizonYears must be >= 1".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn validate_assumptions(assumptions: &CostAssumptions) -> Result<(), EngineError> {
    if !assumptions.expected_annual_return.is_finite() {
        return Err(EngineError::InvalidInput(
            "expectedAnnualReturn must be finite".to_string(),
        ));
    }
    if !assumptions.annual_cost_rate.is_finite() || assumptions.annual_cost_rate < 0.0 {
        return Err(EngineError::InvalidInput(
            "annualCostRate must be a finite value >= 0".to_string(),
        ));
    }
    if !assumptions.tax_rate.is_finite() || !(0.0..=1.0).contains(&assumptions.tax_rate) {
        return Err(EngineError::InvalidInput(
            "taxRate must lie between 0 and 1".to_string(),
        ));
    }
    Ok(())
}
