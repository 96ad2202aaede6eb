mod engine;
mod solver;
mod types;

pub use engine::{MAX_TARGET_AGE, resolve_capital_requirement, run_plan, wealth_tax, withdrawal_rate};
pub use solver::required_monthly_contribution;
pub use types::{
    CapitalRequirement, HouseholdProfile, Inputs, PlanError, PlanResult, SavingsPlan,
    StateBenefitConfig, TaxBracket, TaxBufferPolicy, WealthTaxConfig, WithdrawalStrategy,
};
