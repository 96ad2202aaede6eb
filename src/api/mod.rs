use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    HouseholdProfile, Inputs, MAX_TARGET_AGE, PlanResult, StateBenefitConfig, TaxBracket,
    TaxBufferPolicy, WealthTaxConfig, WithdrawalStrategy, run_plan,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliWithdrawalStrategy {
    MatchRealReturn,
    HistoricalBenchmark,
    Conservative,
    Moderate,
    Aggressive,
    Custom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxBufferPolicy {
    SinglePass,
    FixedPoint,
}

impl From<CliTaxBufferPolicy> for TaxBufferPolicy {
    fn from(value: CliTaxBufferPolicy) -> Self {
        match value {
            CliTaxBufferPolicy::SinglePass => TaxBufferPolicy::SinglePass,
            CliTaxBufferPolicy::FixedPoint => TaxBufferPolicy::FixedPoint,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiWithdrawalStrategy {
    #[serde(alias = "matchRealReturn", alias = "match_real_return")]
    MatchRealReturn,
    #[serde(alias = "historicalBenchmark", alias = "historical_benchmark", alias = "sp500")]
    HistoricalBenchmark,
    Conservative,
    Moderate,
    Aggressive,
    Custom,
}

impl From<ApiWithdrawalStrategy> for CliWithdrawalStrategy {
    fn from(value: ApiWithdrawalStrategy) -> Self {
        match value {
            ApiWithdrawalStrategy::MatchRealReturn => CliWithdrawalStrategy::MatchRealReturn,
            ApiWithdrawalStrategy::HistoricalBenchmark => CliWithdrawalStrategy::HistoricalBenchmark,
            ApiWithdrawalStrategy::Conservative => CliWithdrawalStrategy::Conservative,
            ApiWithdrawalStrategy::Moderate => CliWithdrawalStrategy::Moderate,
            ApiWithdrawalStrategy::Aggressive => CliWithdrawalStrategy::Aggressive,
            ApiWithdrawalStrategy::Custom => CliWithdrawalStrategy::Custom,
        }
    }
}

impl From<WithdrawalStrategy> for ApiWithdrawalStrategy {
    fn from(value: WithdrawalStrategy) -> Self {
        match value {
            WithdrawalStrategy::MatchRealReturn => ApiWithdrawalStrategy::MatchRealReturn,
            WithdrawalStrategy::HistoricalBenchmark => ApiWithdrawalStrategy::HistoricalBenchmark,
            WithdrawalStrategy::Conservative => ApiWithdrawalStrategy::Conservative,
            WithdrawalStrategy::Moderate => ApiWithdrawalStrategy::Moderate,
            WithdrawalStrategy::Aggressive => ApiWithdrawalStrategy::Aggressive,
            WithdrawalStrategy::Custom(_) => ApiWithdrawalStrategy::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTaxBufferPolicy {
    #[serde(alias = "singlePass", alias = "single_pass")]
    SinglePass,
    #[serde(alias = "fixedPoint", alias = "fixed_point", alias = "iterative")]
    FixedPoint,
}

impl From<ApiTaxBufferPolicy> for CliTaxBufferPolicy {
    fn from(value: ApiTaxBufferPolicy) -> Self {
        match value {
            ApiTaxBufferPolicy::SinglePass => CliTaxBufferPolicy::SinglePass,
            ApiTaxBufferPolicy::FixedPoint => CliTaxBufferPolicy::FixedPoint,
        }
    }
}

impl From<TaxBufferPolicy> for ApiTaxBufferPolicy {
    fn from(value: TaxBufferPolicy) -> Self {
        match value {
            TaxBufferPolicy::SinglePass => ApiTaxBufferPolicy::SinglePass,
            TaxBufferPolicy::FixedPoint => ApiTaxBufferPolicy::FixedPoint,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    current_age: Option<u32>,
    target_age: Option<u32>,
    monthly_income_goal: Option<f64>,
    initial_investment: Option<f64>,
    annual_return: Option<f64>,
    inflation_rate: Option<f64>,

    withdrawal_strategy: Option<ApiWithdrawalStrategy>,
    custom_withdrawal_rate: Option<f64>,
    tax_buffer_policy: Option<ApiTaxBufferPolicy>,

    has_partner: Option<bool>,
    #[serde(alias = "includeAow")]
    include_state_benefit: Option<bool>,

    historical_benchmark_rate: Option<f64>,
    tax_exempt_threshold: Option<f64>,
    tax_bracket1_limit: Option<f64>,
    tax_bracket2_limit: Option<f64>,
    tax_bracket1_rate: Option<f64>,
    tax_bracket2_rate: Option<f64>,
    tax_bracket3_rate: Option<f64>,
    benefit_monthly_single: Option<f64>,
    benefit_monthly_partner: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "vrij",
    about = "Dutch financial freedom planner (Box 3 wealth tax buffer + AOW offset)"
)]
struct Cli {
    #[arg(long, default_value_t = 30)]
    current_age: u32,
    #[arg(long, default_value_t = 50, help = "Age when the income goal must be sustainable")]
    target_age: u32,
    #[arg(
        long,
        default_value_t = 5_000.0,
        help = "Monthly after-tax income goal in euros"
    )]
    monthly_income_goal: f64,
    #[arg(
        long,
        default_value_t = 50_000.0,
        help = "Current investment portfolio in euros"
    )]
    initial_investment: f64,
    #[arg(long, default_value_t = 12.0, help = "Expected annual return in percent")]
    annual_return: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliWithdrawalStrategy::MatchRealReturn,
        help = "How the post-goal annual withdrawal rate is chosen"
    )]
    withdrawal_strategy: CliWithdrawalStrategy,
    #[arg(
        long,
        help = "Annual withdrawal rate in percent; required with --withdrawal-strategy=custom"
    )]
    custom_withdrawal_rate: Option<f64>,
    #[arg(
        long,
        value_enum,
        default_value_t = CliTaxBufferPolicy::FixedPoint,
        help = "Single-pass tax buffer, or iterate until the buffer is itself taxed"
    )]
    tax_buffer_policy: CliTaxBufferPolicy,
    #[arg(long, help = "Double tax thresholds and use the per-person AOW rate")]
    has_partner: bool,
    #[arg(long, help = "Offset the income goal with the monthly AOW benefit")]
    include_state_benefit: bool,
    #[arg(
        long,
        default_value_t = 10.2,
        help = "S&P 500 historical benchmark withdrawal rate in percent"
    )]
    historical_benchmark_rate: f64,
    #[arg(
        long,
        default_value_t = 57_000.0,
        help = "Box 3 tax-free threshold per person"
    )]
    tax_exempt_threshold: f64,
    #[arg(
        long,
        default_value_t = 100_000.0,
        help = "Upper bound of the first Box 3 band (taxable wealth, per person)"
    )]
    tax_bracket1_limit: f64,
    #[arg(
        long,
        default_value_t = 1_000_000.0,
        help = "Upper bound of the second Box 3 band (taxable wealth, per person)"
    )]
    tax_bracket2_limit: f64,
    #[arg(
        long,
        default_value_t = 1.93,
        help = "Effective rate of the first Box 3 band in percent"
    )]
    tax_bracket1_rate: f64,
    #[arg(
        long,
        default_value_t = 1.77,
        help = "Effective rate of the second Box 3 band in percent"
    )]
    tax_bracket2_rate: f64,
    #[arg(
        long,
        default_value_t = 1.86,
        help = "Effective rate of the top Box 3 band in percent"
    )]
    tax_bracket3_rate: f64,
    #[arg(long, default_value_t = 1_452.06, help = "Monthly AOW for singles")]
    benefit_monthly_single: f64,
    #[arg(
        long,
        default_value_t = 994.81,
        help = "Monthly AOW per person for couples"
    )]
    benefit_monthly_partner: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    withdrawal_strategy: ApiWithdrawalStrategy,
    tax_buffer_policy: ApiTaxBufferPolicy,
    capital_depletion_risk: bool,
    plan: PlanResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if cli.target_age <= cli.current_age {
        return Err("--target-age must be > --current-age".to_string());
    }
    if cli.target_age > MAX_TARGET_AGE {
        return Err(format!("--target-age must be <= {MAX_TARGET_AGE}"));
    }

    for (name, value) in [
        ("--monthly-income-goal", cli.monthly_income_goal),
        ("--initial-investment", cli.initial_investment),
        ("--benefit-monthly-single", cli.benefit_monthly_single),
        ("--benefit-monthly-partner", cli.benefit_monthly_partner),
        ("--tax-exempt-threshold", cli.tax_exempt_threshold),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if !cli.annual_return.is_finite() || cli.annual_return <= -100.0 {
        return Err("--annual-return must be > -100".to_string());
    }

    if !cli.inflation_rate.is_finite() || cli.inflation_rate <= -100.0 {
        return Err("--inflation-rate must be > -100".to_string());
    }

    if !cli.historical_benchmark_rate.is_finite() || cli.historical_benchmark_rate <= 0.0 {
        return Err("--historical-benchmark-rate must be > 0".to_string());
    }

    for (name, rate) in [
        ("--tax-bracket1-rate", cli.tax_bracket1_rate),
        ("--tax-bracket2-rate", cli.tax_bracket2_rate),
        ("--tax-bracket3-rate", cli.tax_bracket3_rate),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    if cli.tax_bracket1_limit <= 0.0 || cli.tax_bracket2_limit <= cli.tax_bracket1_limit {
        return Err(
            "--tax-bracket1-limit and --tax-bracket2-limit must be positive and increasing"
                .to_string(),
        );
    }

    let withdrawal_strategy = match cli.withdrawal_strategy {
        CliWithdrawalStrategy::MatchRealReturn => WithdrawalStrategy::MatchRealReturn,
        CliWithdrawalStrategy::HistoricalBenchmark => WithdrawalStrategy::HistoricalBenchmark,
        CliWithdrawalStrategy::Conservative => WithdrawalStrategy::Conservative,
        CliWithdrawalStrategy::Moderate => WithdrawalStrategy::Moderate,
        CliWithdrawalStrategy::Aggressive => WithdrawalStrategy::Aggressive,
        CliWithdrawalStrategy::Custom => {
            let Some(rate) = cli.custom_withdrawal_rate else {
                return Err(
                    "--custom-withdrawal-rate is required when --withdrawal-strategy=custom"
                        .to_string(),
                );
            };
            if !rate.is_finite() || rate <= 0.0 || rate > 100.0 {
                return Err("--custom-withdrawal-rate must be between 0 and 100".to_string());
            }
            WithdrawalStrategy::Custom(rate / 100.0)
        }
    };

    Ok(Inputs {
        current_age: cli.current_age,
        target_age: cli.target_age,
        monthly_income_goal: cli.monthly_income_goal,
        initial_investment: cli.initial_investment,
        nominal_annual_return: cli.annual_return / 100.0,
        annual_inflation: cli.inflation_rate / 100.0,
        withdrawal_strategy,
        tax_buffer_policy: cli.tax_buffer_policy.into(),
        household: HouseholdProfile {
            has_partner: cli.has_partner,
            include_state_benefit: cli.include_state_benefit,
        },
        wealth_tax: WealthTaxConfig {
            exempt_threshold: cli.tax_exempt_threshold,
            brackets: vec![
                TaxBracket {
                    upper_bound: Some(cli.tax_bracket1_limit),
                    rate: cli.tax_bracket1_rate / 100.0,
                },
                TaxBracket {
                    upper_bound: Some(cli.tax_bracket2_limit),
                    rate: cli.tax_bracket2_rate / 100.0,
                },
                TaxBracket {
                    upper_bound: None,
                    rate: cli.tax_bracket3_rate / 100.0,
                },
            ],
        },
        state_benefit: StateBenefitConfig {
            monthly_single: cli.benefit_monthly_single,
            monthly_per_partner: cli.benefit_monthly_partner,
        },
        historical_benchmark_rate: cli.historical_benchmark_rate / 100.0,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("vrij HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

/// One-shot mode: build a plan from the CLI flags and return it as JSON.
pub fn run_cli_plan() -> Result<String, String> {
    let cli = Cli::parse();
    let inputs = build_inputs(cli)?;
    let plan = run_plan(&inputs).map_err(|e| e.to_string())?;
    let response = build_plan_response(&inputs, plan);
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let plan = match run_plan(&inputs) {
        Ok(plan) => plan,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    json_response(StatusCode::OK, build_plan_response(&inputs, plan))
}

fn build_plan_response(inputs: &Inputs, plan: PlanResult) -> PlanResponse {
    // Advisory only: drawing faster than the real return erodes capital.
    let capital_depletion_risk = matches!(
        inputs.withdrawal_strategy,
        WithdrawalStrategy::Custom(_)
    ) && plan.withdrawal_rate > plan.real_annual_return;

    PlanResponse {
        withdrawal_strategy: inputs.withdrawal_strategy.into(),
        tax_buffer_policy: inputs.tax_buffer_policy.into(),
        capital_depletion_risk,
        plan,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: PlanPayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.target_age {
        cli.target_age = v;
    }
    if let Some(v) = payload.monthly_income_goal {
        cli.monthly_income_goal = v;
    }
    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }

    if let Some(v) = payload.withdrawal_strategy {
        cli.withdrawal_strategy = v.into();
    }
    if let Some(v) = payload.custom_withdrawal_rate {
        cli.custom_withdrawal_rate = Some(v);
    }
    if let Some(v) = payload.tax_buffer_policy {
        cli.tax_buffer_policy = v.into();
    }

    if let Some(v) = payload.has_partner {
        cli.has_partner = v;
    }
    if let Some(v) = payload.include_state_benefit {
        cli.include_state_benefit = v;
    }

    if let Some(v) = payload.historical_benchmark_rate {
        cli.historical_benchmark_rate = v;
    }
    if let Some(v) = payload.tax_exempt_threshold {
        cli.tax_exempt_threshold = v;
    }
    if let Some(v) = payload.tax_bracket1_limit {
        cli.tax_bracket1_limit = v;
    }
    if let Some(v) = payload.tax_bracket2_limit {
        cli.tax_bracket2_limit = v;
    }
    if let Some(v) = payload.tax_bracket1_rate {
        cli.tax_bracket1_rate = v;
    }
    if let Some(v) = payload.tax_bracket2_rate {
        cli.tax_bracket2_rate = v;
    }
    if let Some(v) = payload.tax_bracket3_rate {
        cli.tax_bracket3_rate = v;
    }
    if let Some(v) = payload.benefit_monthly_single {
        cli.benefit_monthly_single = v;
    }
    if let Some(v) = payload.benefit_monthly_partner {
        cli.benefit_monthly_partner = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 30,
        target_age: 50,
        monthly_income_goal: 5_000.0,
        initial_investment: 50_000.0,
        annual_return: 12.0,
        inflation_rate: 3.0,
        withdrawal_strategy: CliWithdrawalStrategy::MatchRealReturn,
        custom_withdrawal_rate: None,
        tax_buffer_policy: CliTaxBufferPolicy::FixedPoint,
        has_partner: false,
        include_state_benefit: false,
        historical_benchmark_rate: 10.2,
        tax_exempt_threshold: 57_000.0,
        tax_bracket1_limit: 100_000.0,
        tax_bracket2_limit: 1_000_000.0,
        tax_bracket1_rate: 1.93,
        tax_bracket2_rate: 1.77,
        tax_bracket3_rate: 1.86,
        benefit_monthly_single: 1_452.06,
        benefit_monthly_partner: 994.81,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_converts_percent_units() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        assert_approx(inputs.nominal_annual_return, 0.12);
        assert_approx(inputs.annual_inflation, 0.03);
        assert_approx(inputs.historical_benchmark_rate, 0.102);
        assert_approx(inputs.wealth_tax.brackets[0].rate, 0.0193);
        assert_approx(inputs.wealth_tax.brackets[1].rate, 0.0177);
        assert_approx(inputs.wealth_tax.brackets[2].rate, 0.0186);
        assert_eq!(inputs.wealth_tax.brackets[0].upper_bound, Some(100_000.0));
        assert_eq!(inputs.wealth_tax.brackets[2].upper_bound, None);
    }

    #[test]
    fn build_inputs_rejects_target_age_not_after_current() {
        let mut cli = sample_cli();
        cli.target_age = 30;
        let err = build_inputs(cli).expect_err("must reject age order");
        assert!(err.contains("--target-age"));
    }

    #[test]
    fn build_inputs_rejects_unbounded_target_age() {
        let mut cli = sample_cli();
        cli.target_age = 400_000_000;
        let err = build_inputs(cli).expect_err("must reject an absurd target age");
        assert!(err.contains("--target-age"));
    }

    #[test]
    fn build_inputs_requires_rate_for_custom_strategy() {
        let mut cli = sample_cli();
        cli.withdrawal_strategy = CliWithdrawalStrategy::Custom;
        cli.custom_withdrawal_rate = None;
        let err = build_inputs(cli).expect_err("must require a custom rate");
        assert!(err.contains("--custom-withdrawal-rate"));

        let mut cli = sample_cli();
        cli.withdrawal_strategy = CliWithdrawalStrategy::Custom;
        cli.custom_withdrawal_rate = Some(0.0);
        let err = build_inputs(cli).expect_err("must reject a zero custom rate");
        assert!(err.contains("--custom-withdrawal-rate"));
    }

    #[test]
    fn build_inputs_converts_custom_rate_to_fraction() {
        let mut cli = sample_cli();
        cli.withdrawal_strategy = CliWithdrawalStrategy::Custom;
        cli.custom_withdrawal_rate = Some(4.0);
        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.withdrawal_strategy, WithdrawalStrategy::Custom(0.04));
    }

    #[test]
    fn build_inputs_rejects_bad_bracket_order() {
        let mut cli = sample_cli();
        cli.tax_bracket1_limit = 1_000_000.0;
        cli.tax_bracket2_limit = 100_000.0;
        let err = build_inputs(cli).expect_err("must reject bracket order");
        assert!(err.contains("--tax-bracket1-limit"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_bracket_rate() {
        let mut cli = sample_cli();
        cli.tax_bracket2_rate = 150.0;
        let err = build_inputs(cli).expect_err("must reject rate over 100");
        assert!(err.contains("--tax-bracket2-rate"));
    }

    #[test]
    fn inputs_from_json_parses_web_keys() {
        let json = r#"{
          "currentAge": 35,
          "targetAge": 55,
          "monthlyIncomeGoal": 4200,
          "initialInvestment": 80000,
          "annualReturn": 8,
          "inflationRate": 2,
          "withdrawalStrategy": "historical-benchmark",
          "taxBufferPolicy": "single-pass",
          "hasPartner": true,
          "includeAow": true
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_eq!(inputs.current_age, 35);
        assert_eq!(inputs.target_age, 55);
        assert_approx(inputs.monthly_income_goal, 4_200.0);
        assert_approx(inputs.initial_investment, 80_000.0);
        assert_approx(inputs.nominal_annual_return, 0.08);
        assert_approx(inputs.annual_inflation, 0.02);
        assert_eq!(
            inputs.withdrawal_strategy,
            WithdrawalStrategy::HistoricalBenchmark
        );
        assert_eq!(inputs.tax_buffer_policy, TaxBufferPolicy::SinglePass);
        assert!(inputs.household.has_partner);
        assert!(inputs.household.include_state_benefit);
    }

    #[test]
    fn inputs_from_json_parses_custom_strategy() {
        let json = r#"{
          "withdrawalStrategy": "custom",
          "customWithdrawalRate": 3.5
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");
        assert_eq!(inputs.withdrawal_strategy, WithdrawalStrategy::Custom(0.035));
    }

    #[test]
    fn inputs_from_json_rejects_unknown_strategy() {
        let err = inputs_from_json(r#"{"withdrawalStrategy": "yolo"}"#)
            .expect_err("must reject unknown strategy");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn plan_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let plan = run_plan(&inputs).expect("plan should solve");
        let response = build_plan_response(&inputs, plan);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"withdrawalStrategy\":\"match-real-return\""));
        assert!(json.contains("\"taxBufferPolicy\":\"fixed-point\""));
        assert!(json.contains("\"capitalDepletionRisk\":false"));
        assert!(json.contains("\"baseCapital\""));
        assert!(json.contains("\"taxBuffer\""));
        assert!(json.contains("\"totalCapital\""));
        assert!(json.contains("\"requiredMonthlyContribution\""));
        assert!(json.contains("\"monthlyAfterTaxIncome\""));
    }

    #[test]
    fn depletion_risk_flags_custom_rate_above_real_return() {
        let mut cli = sample_cli();
        cli.withdrawal_strategy = CliWithdrawalStrategy::Custom;
        cli.custom_withdrawal_rate = Some(20.0);
        let inputs = build_inputs(cli).expect("valid inputs");
        let plan = run_plan(&inputs).expect("plan should solve");
        let response = build_plan_response(&inputs, plan);
        assert!(response.capital_depletion_risk);

        // Preset strategies never raise the advisory flag.
        let mut cli = sample_cli();
        cli.withdrawal_strategy = CliWithdrawalStrategy::HistoricalBenchmark;
        let inputs = build_inputs(cli).expect("valid inputs");
        let plan = run_plan(&inputs).expect("plan should solve");
        assert!(!build_plan_response(&inputs, plan).capital_depletion_risk);
    }
}
