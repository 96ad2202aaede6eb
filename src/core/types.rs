use serde::Serialize;
use thiserror::Error;

/// How the annual withdrawal rate is chosen once the capital goal is reached.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WithdrawalStrategy {
    /// Match the real (inflation-adjusted) return, preserving capital value.
    MatchRealReturn,
    /// Configured S&P 500 historical rate, used as-is (nominal).
    HistoricalBenchmark,
    Conservative,
    Moderate,
    Aggressive,
    Custom(f64),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxBufferPolicy {
    /// Tax the base capital once and add the buffer without re-taxing it.
    SinglePass,
    /// Iterate until the buffer itself is accounted for as taxable wealth.
    FixedPoint,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HouseholdProfile {
    pub has_partner: bool,
    pub include_state_benefit: bool,
}

/// One marginal band. `upper_bound` is the band's upper edge of taxable
/// wealth for a single person; `None` marks the open-ended top band.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TaxBracket {
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

/// Progressive wealth-tax schedule. The exempt threshold and every bracket
/// bound double for fiscal partners.
#[derive(Clone, Debug, PartialEq)]
pub struct WealthTaxConfig {
    pub exempt_threshold: f64,
    pub brackets: Vec<TaxBracket>,
}

impl Default for WealthTaxConfig {
    /// 2024 Dutch Box 3 rates: assumed returns of 6.04% / 5.53% / 5.80%
    /// taxed at 32% give the effective rates below.
    fn default() -> Self {
        Self {
            exempt_threshold: 57_000.0,
            brackets: vec![
                TaxBracket {
                    upper_bound: Some(100_000.0),
                    rate: 0.0193,
                },
                TaxBracket {
                    upper_bound: Some(1_000_000.0),
                    rate: 0.0177,
                },
                TaxBracket {
                    upper_bound: None,
                    rate: 0.0186,
                },
            ],
        }
    }
}

impl WealthTaxConfig {
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.exempt_threshold.is_finite() || self.exempt_threshold < 0.0 {
            return Err(PlanError::InvalidTaxSchedule {
                reason: "exempt threshold must be finite and >= 0",
            });
        }
        if self.brackets.is_empty() {
            return Err(PlanError::InvalidTaxSchedule {
                reason: "at least one bracket is required",
            });
        }
        let mut previous_bound = 0.0;
        for bracket in &self.brackets {
            if !bracket.rate.is_finite() || !(0.0..=1.0).contains(&bracket.rate) {
                return Err(PlanError::InvalidTaxSchedule {
                    reason: "bracket rates must be between 0 and 1",
                });
            }
            if let Some(bound) = bracket.upper_bound {
                if !bound.is_finite() || bound <= previous_bound {
                    return Err(PlanError::InvalidTaxSchedule {
                        reason: "bracket bounds must be finite and strictly increasing",
                    });
                }
                previous_bound = bound;
            }
        }
        // Wealth above a finite top bound would go untaxed.
        if self
            .brackets
            .last()
            .is_some_and(|bracket| bracket.upper_bound.is_some())
        {
            return Err(PlanError::InvalidTaxSchedule {
                reason: "the top bracket must be open-ended",
            });
        }
        Ok(())
    }
}

/// Fixed monthly state-pension benefit (AOW), 2024 rates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateBenefitConfig {
    pub monthly_single: f64,
    pub monthly_per_partner: f64,
}

impl Default for StateBenefitConfig {
    fn default() -> Self {
        Self {
            monthly_single: 1_452.06,
            monthly_per_partner: 994.81,
        }
    }
}

impl StateBenefitConfig {
    pub fn monthly_benefit(&self, household: HouseholdProfile) -> f64 {
        if !household.include_state_benefit {
            return 0.0;
        }
        if household.has_partner {
            self.monthly_per_partner * 2.0
        } else {
            self.monthly_single
        }
    }
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub current_age: u32,
    pub target_age: u32,
    pub monthly_income_goal: f64,
    pub initial_investment: f64,
    pub nominal_annual_return: f64,
    pub annual_inflation: f64,
    pub withdrawal_strategy: WithdrawalStrategy,
    pub tax_buffer_policy: TaxBufferPolicy,
    pub household: HouseholdProfile,
    pub wealth_tax: WealthTaxConfig,
    pub state_benefit: StateBenefitConfig,
    pub historical_benchmark_rate: f64,
}

impl Inputs {
    pub fn years_to_target(&self) -> u32 {
        self.target_age.saturating_sub(self.current_age)
    }

    pub fn real_annual_return(&self) -> f64 {
        (1.0 + self.nominal_annual_return) / (1.0 + self.annual_inflation) - 1.0
    }
}

/// Capital needed to sustain the income goal at the selected withdrawal rate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRequirement {
    pub base_capital: f64,
    pub tax_buffer: f64,
    pub total_capital: f64,
}

impl CapitalRequirement {
    pub const ZERO: Self = Self {
        base_capital: 0.0,
        tax_buffer: 0.0,
        total_capital: 0.0,
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPlan {
    pub required_monthly_contribution: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub years_to_target: u32,
    pub real_annual_return: f64,
    pub withdrawal_rate: f64,
    pub monthly_state_benefit: f64,
    pub annual_need_from_capital: f64,
    pub base_capital: f64,
    pub tax_buffer: f64,
    pub total_capital: f64,
    pub annual_wealth_tax: f64,
    pub required_monthly_contribution: f64,
    pub monthly_pre_tax_income: f64,
    pub monthly_after_tax_income: f64,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlanError {
    #[error("target age {target} must be greater than current age {current}")]
    TargetAgeNotAfterCurrent { current: u32, target: u32 },
    #[error("target age {0} exceeds the supported maximum of 120")]
    TargetAgeAboveMaximum(u32),
    #[error("{name} must be finite and >= 0")]
    NegativeAmount { name: &'static str },
    #[error("nominal annual return must be finite and greater than -100%")]
    ReturnOutOfDomain,
    #[error("annual inflation must be finite and greater than -100%")]
    InflationOutOfDomain,
    #[error("withdrawal rate must be positive, got {0}")]
    NonPositiveWithdrawalRate(f64),
    #[error("historical benchmark rate must be finite and positive")]
    InvalidBenchmarkRate,
    #[error("invalid wealth tax schedule: {reason}")]
    InvalidTaxSchedule { reason: &'static str },
}
