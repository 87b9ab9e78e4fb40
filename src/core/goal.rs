use super::engine::{future_value, net_accumulation_growth, validate_assumptions, validate_inputs};
use super::types::{CostAssumptions, EngineError, PlanInputs};

/// Monthly contribution needed to reach `target_capital` by retirement,
/// holding the plan's lump sum and the vehicle's net growth fixed. Returns
/// zero when the lump sum alone already reaches the target.
pub fn required_monthly_contribution(
    inputs: &PlanInputs,
    assumptions: &CostAssumptions,
    target_capital: f64,
) -> Result<f64, EngineError> {
    validate_inputs(inputs)?;
    validate_assumptions(assumptions)?;
    if !target_capital.is_finite() || target_capital < 0.0 {
        return Err(EngineError::InvalidInput(
            "targetCapital must be a finite value >= 0".to_string(),
        ));
    }

    let cost_net_return = assumptions.expected_annual_return - assumptions.annual_cost_rate;
    let net_annual_return = net_accumulation_growth(
        cost_net_return,
        assumptions.tax_treatment,
        assumptions.tax_rate,
    );

    let years = inputs.retirement_age - inputs.current_age;
    let lump_sum_value = future_value(inputs.initial_capital, 0.0, net_annual_return, years)?;
    if lump_sum_value >= target_capital {
        return Ok(0.0);
    }

    // Invert the annuity leg of the future-value formula.
    let monthly_rate = net_annual_return / 12.0;
    let months = years * 12;
    let annuity_factor = if monthly_rate == 0.0 {
        months as f64
    } else {
        ((1.0 + monthly_rate).powi(months as i32) - 1.0) / monthly_rate
    };
    Ok((target_capital - lump_sum_value) / annuity_factor)
}
