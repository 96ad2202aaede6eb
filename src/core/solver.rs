/// A monthly rate closer to zero than this is treated as exactly zero; the
/// annuity denominator `fv_factor - 1` is singular there.
const ZERO_RATE_EPS: f64 = 1e-12;

/// Fixed monthly contribution needed so that `current`, compounding at
/// `annual_rate` (converted to an equivalent monthly rate) over
/// `years * 12` months with equal end-of-month contributions, reaches
/// `goal`. Never negative: a goal already covered by growth needs nothing.
///
/// Rates at or below -100%, and the zero-rate singularity, fall back to
/// linear amortization `(goal - current) / months`.
pub fn required_monthly_contribution(goal: f64, current: f64, annual_rate: f64, years: u32) -> f64 {
    // u64 months: a u32 year count times 12 must not wrap.
    let months = u64::from(years) * 12;
    if months == 0 {
        return (goal - current).max(0.0);
    }

    if annual_rate <= -1.0 {
        return ((goal - current) / months as f64).max(0.0);
    }

    let monthly_rate = (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0;
    if monthly_rate.abs() < ZERO_RATE_EPS {
        return ((goal - current) / months as f64).max(0.0);
    }

    let fv_factor = (1.0 + monthly_rate).powf(months as f64);
    ((goal - current * fv_factor) * monthly_rate / (fv_factor - 1.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn compound_with_contributions(current: f64, contribution: f64, annual_rate: f64, years: u32) -> f64 {
        let monthly_rate = (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0;
        let mut balance = current;
        for _ in 0..years * 12 {
            balance = balance * (1.0 + monthly_rate) + contribution;
        }
        balance
    }

    #[test]
    fn zero_rate_uses_linear_amortization() {
        let contribution = required_monthly_contribution(100_000.0, 0.0, 0.0, 10);
        assert_close(contribution, 100_000.0 / 120.0, 1e-9);
    }

    #[test]
    fn total_loss_rate_uses_linear_amortization() {
        let contribution = required_monthly_contribution(120_000.0, 20_000.0, -1.5, 5);
        assert_close(contribution, 100_000.0 / 60.0, 1e-9);
    }

    #[test]
    fn goal_covered_by_growth_needs_no_contribution() {
        // 50k at 12% for 20 years grows far past 100k on its own.
        let contribution = required_monthly_contribution(100_000.0, 50_000.0, 0.12, 20);
        assert_close(contribution, 0.0, 0.0);
    }

    #[test]
    fn goal_below_current_needs_no_contribution_at_zero_rate() {
        let contribution = required_monthly_contribution(10_000.0, 50_000.0, 0.0, 3);
        assert_close(contribution, 0.0, 0.0);
    }

    #[test]
    fn extreme_horizon_stays_finite() {
        // Month count far beyond any u32 * 12 wrap; growth dwarfs the goal.
        let from_zero = required_monthly_contribution(1_000_000.0, 0.0, 0.05, 400_000_000);
        assert!(from_zero.is_finite());
        assert!(from_zero >= 0.0);

        let with_balance = required_monthly_contribution(1_000_000.0, 50_000.0, 0.05, 400_000_000);
        assert_close(with_balance, 0.0, 0.0);
    }

    #[test]
    fn oracle_one_year_from_zero_matches_hand_calculation() {
        // monthly rate = 1.12^(1/12) - 1 ~= 0.0094887929
        // contribution = 1000 * mr / (1.12 - 1)
        let contribution = required_monthly_contribution(1_000.0, 0.0, 0.12, 1);
        assert_close(contribution, 79.0733, 1e-3);
    }

    #[test]
    fn computed_contribution_reproduces_goal_exactly() {
        let goal = 500_000.0;
        let current = 50_000.0;
        let rate = 0.0625;
        let years = 18;
        let contribution = required_monthly_contribution(goal, current, rate, years);
        assert!(contribution > 0.0);
        let reached = compound_with_contributions(current, contribution, rate, years);
        assert_close(reached, goal, goal * 1e-9);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_contribution_is_never_negative(
            goal in 0.0f64..5_000_000.0,
            current in 0.0f64..2_000_000.0,
            rate_bp in -20_000i32..5_000,
            years in 1u32..60
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let contribution = required_monthly_contribution(goal, current, rate, years);
            prop_assert!(contribution.is_finite());
            prop_assert!(contribution >= 0.0);
        }

        #[test]
        fn prop_round_trip_compounding_reproduces_goal(
            goal in 1_000.0f64..5_000_000.0,
            current in 0.0f64..2_000_000.0,
            rate_bp in -5_000i32..3_000,
            years in 1u32..50
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let monthly_rate = (1.0 + rate).powf(1.0 / 12.0) - 1.0;
            let fv_factor = (1.0 + monthly_rate).powi(years as i32 * 12);
            prop_assume!(monthly_rate.abs() >= 1e-9);
            prop_assume!(goal > current * fv_factor);

            let contribution = required_monthly_contribution(goal, current, rate, years);
            let reached = compound_with_contributions(current, contribution, rate, years);
            prop_assert!((reached - goal).abs() <= goal.max(1.0) * 1e-6);
        }

        #[test]
        fn prop_larger_starting_balance_never_needs_more(
            goal in 1_000.0f64..5_000_000.0,
            current in 0.0f64..2_000_000.0,
            extra in 0.0f64..500_000.0,
            rate_bp in -5_000i32..3_000,
            years in 1u32..50
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let lower = required_monthly_contribution(goal, current + extra, rate, years);
            let higher = required_monthly_contribution(goal, current, rate, years);
            prop_assert!(lower <= higher + 1e-9);
        }
    }
}
