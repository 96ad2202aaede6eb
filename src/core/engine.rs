use super::solver::required_monthly_contribution;
use super::types::{
    CapitalRequirement, Inputs, PlanError, PlanResult, SavingsPlan, TaxBufferPolicy,
    WealthTaxConfig, WithdrawalStrategy,
};

const CONSERVATIVE_RATE: f64 = 0.03;
const MODERATE_RATE: f64 = 0.04;
const AGGRESSIVE_RATE: f64 = 0.05;

const FIXED_POINT_ITERATIONS: u32 = 5;
const FIXED_POINT_TOLERANCE: f64 = 1e-3;

/// Upper bound on the target age accepted by the planner.
pub const MAX_TARGET_AGE: u32 = 120;

/// Progressive wealth tax on `wealth`. The exempt threshold and bracket
/// bounds double for partners; each band taxes only the taxable wealth
/// falling inside it, so liability at exactly a bound equals the sum of the
/// lower full bands.
pub fn wealth_tax(wealth: f64, has_partner: bool, config: &WealthTaxConfig) -> f64 {
    let scale = if has_partner { 2.0 } else { 1.0 };
    let taxable = (wealth - config.exempt_threshold * scale).max(0.0);

    let mut tax = 0.0;
    let mut band_start = 0.0;
    for bracket in &config.brackets {
        let in_band = match bracket.upper_bound {
            Some(bound) => {
                let band_width = (bound * scale - band_start).max(0.0);
                (taxable - band_start).clamp(0.0, band_width)
            }
            None => (taxable - band_start).max(0.0),
        };
        tax += in_band * bracket.rate.clamp(0.0, 1.0);
        match bracket.upper_bound {
            Some(bound) => band_start = bound * scale,
            None => break,
        }
    }
    tax
}

/// Annual withdrawal rate for the chosen strategy. Positivity is checked by
/// the caller; strategies only map to a number here.
pub fn withdrawal_rate(
    strategy: WithdrawalStrategy,
    real_return: f64,
    historical_benchmark_rate: f64,
) -> f64 {
    match strategy {
        WithdrawalStrategy::MatchRealReturn => real_return,
        WithdrawalStrategy::HistoricalBenchmark => historical_benchmark_rate,
        WithdrawalStrategy::Conservative => CONSERVATIVE_RATE,
        WithdrawalStrategy::Moderate => MODERATE_RATE,
        WithdrawalStrategy::Aggressive => AGGRESSIVE_RATE,
        WithdrawalStrategy::Custom(rate) => rate,
    }
}

/// Capital required to draw `monthly_income_goal` (net of the fixed benefit)
/// at `withdrawal_rate`, plus a buffer for the wealth tax on that capital.
///
/// Callers must pass a positive, finite `withdrawal_rate`. A benefit that
/// already covers the goal floors the requirement at zero.
pub fn resolve_capital_requirement(
    monthly_income_goal: f64,
    monthly_benefit: f64,
    withdrawal_rate: f64,
    has_partner: bool,
    tax: &WealthTaxConfig,
    policy: TaxBufferPolicy,
) -> CapitalRequirement {
    let annual_need = (monthly_income_goal - monthly_benefit) * 12.0;
    if annual_need <= 0.0 {
        return CapitalRequirement::ZERO;
    }

    let base_capital = annual_need / withdrawal_rate;
    match policy {
        TaxBufferPolicy::SinglePass => {
            let tax_buffer = wealth_tax(base_capital, has_partner, tax) / withdrawal_rate;
            CapitalRequirement {
                base_capital,
                tax_buffer,
                total_capital: base_capital + tax_buffer,
            }
        }
        TaxBufferPolicy::FixedPoint => {
            let mut total = base_capital;
            let mut last_step = 0.0;
            for _ in 0..FIXED_POINT_ITERATIONS {
                let next = (annual_need + wealth_tax(total, has_partner, tax)) / withdrawal_rate;
                last_step = (next - total).abs();
                total = next;
            }
            if last_step > FIXED_POINT_TOLERANCE * total.max(1.0) {
                log::warn!(
                    "tax buffer fixed point still moving {last_step:.2} after \
                     {FIXED_POINT_ITERATIONS} iterations (total {total:.2})"
                );
            }
            CapitalRequirement {
                base_capital,
                tax_buffer: total - base_capital,
                total_capital: total,
            }
        }
    }
}

/// Runs the full plan: validates inputs, picks the withdrawal rate, sizes the
/// required capital and solves for the monthly contribution, then derives the
/// display figures (income verification round trip included).
pub fn run_plan(inputs: &Inputs) -> Result<PlanResult, PlanError> {
    validate(inputs)?;

    let real_return = inputs.real_annual_return();
    let rate = withdrawal_rate(
        inputs.withdrawal_strategy,
        real_return,
        inputs.historical_benchmark_rate,
    );
    if !rate.is_finite() || rate <= 0.0 {
        return Err(PlanError::NonPositiveWithdrawalRate(rate));
    }

    let monthly_benefit = inputs.state_benefit.monthly_benefit(inputs.household);
    let capital = resolve_capital_requirement(
        inputs.monthly_income_goal,
        monthly_benefit,
        rate,
        inputs.household.has_partner,
        &inputs.wealth_tax,
        inputs.tax_buffer_policy,
    );

    let savings = SavingsPlan {
        required_monthly_contribution: required_monthly_contribution(
            capital.total_capital,
            inputs.initial_investment,
            real_return,
            inputs.years_to_target(),
        ),
    };

    let annual_wealth_tax = wealth_tax(
        capital.total_capital,
        inputs.household.has_partner,
        &inputs.wealth_tax,
    );
    let monthly_pre_tax_income = capital.total_capital * rate / 12.0;
    let monthly_after_tax_income = monthly_pre_tax_income - annual_wealth_tax / 12.0;

    Ok(PlanResult {
        years_to_target: inputs.years_to_target(),
        real_annual_return: real_return,
        withdrawal_rate: rate,
        monthly_state_benefit: monthly_benefit,
        annual_need_from_capital: ((inputs.monthly_income_goal - monthly_benefit) * 12.0).max(0.0),
        base_capital: capital.base_capital,
        tax_buffer: capital.tax_buffer,
        total_capital: capital.total_capital,
        annual_wealth_tax,
        required_monthly_contribution: savings.required_monthly_contribution,
        monthly_pre_tax_income,
        monthly_after_tax_income,
    })
}

fn validate(inputs: &Inputs) -> Result<(), PlanError> {
    if inputs.target_age <= inputs.current_age {
        return Err(PlanError::TargetAgeNotAfterCurrent {
            current: inputs.current_age,
            target: inputs.target_age,
        });
    }
    if inputs.target_age > MAX_TARGET_AGE {
        return Err(PlanError::TargetAgeAboveMaximum(inputs.target_age));
    }

    for (name, value) in [
        ("monthly income goal", inputs.monthly_income_goal),
        ("initial investment", inputs.initial_investment),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(PlanError::NegativeAmount { name });
        }
    }

    if !inputs.nominal_annual_return.is_finite() || inputs.nominal_annual_return <= -1.0 {
        return Err(PlanError::ReturnOutOfDomain);
    }
    if !inputs.annual_inflation.is_finite() || inputs.annual_inflation <= -1.0 {
        return Err(PlanError::InflationOutOfDomain);
    }
    if !inputs.historical_benchmark_rate.is_finite() || inputs.historical_benchmark_rate <= 0.0 {
        return Err(PlanError::InvalidBenchmarkRate);
    }

    inputs.wealth_tax.validate()?;

    for (name, value) in [
        ("state benefit (single)", inputs.state_benefit.monthly_single),
        (
            "state benefit (per partner)",
            inputs.state_benefit.monthly_per_partner,
        ),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(PlanError::NegativeAmount { name });
        }
    }

    Ok(())
}
