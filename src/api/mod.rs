use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ComparisonResult, CostAssumptions, PayoutMode, PlanInputs, ProjectionResult, TaxAdvantage,
    TaxTreatment, VehicleKind, VehicleResult, VehicleSpec, compare_vehicles, project_scenario,
    required_monthly_contribution,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPayoutMode {
    Annuity,
    FlexibleWithdrawal,
}

impl From<CliPayoutMode> for PayoutMode {
    fn from(value: CliPayoutMode) -> Self {
        match value {
            CliPayoutMode::Annuity => PayoutMode::Annuity,
            CliPayoutMode::FlexibleWithdrawal => PayoutMode::FlexibleWithdrawal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxTreatment {
    Ertragsanteil,
    AnnualCapitalGains,
}

impl From<CliTaxTreatment> for TaxTreatment {
    fn from(value: CliTaxTreatment) -> Self {
        match value {
            CliTaxTreatment::Ertragsanteil => TaxTreatment::Ertragsanteil,
            CliTaxTreatment::AnnualCapitalGains => TaxTreatment::AnnualCapitalGains,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPayoutMode {
    Annuity,
    #[serde(alias = "flexibleWithdrawal", alias = "flexible_withdrawal")]
    FlexibleWithdrawal,
}

impl From<ApiPayoutMode> for CliPayoutMode {
    fn from(value: ApiPayoutMode) -> Self {
        match value {
            ApiPayoutMode::Annuity => CliPayoutMode::Annuity,
            ApiPayoutMode::FlexibleWithdrawal => CliPayoutMode::FlexibleWithdrawal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTaxTreatment {
    Ertragsanteil,
    #[serde(alias = "annualCapitalGains", alias = "abgeltungssteuer")]
    AnnualCapitalGains,
}

impl From<ApiTaxTreatment> for CliTaxTreatment {
    fn from(value: ApiTaxTreatment) -> Self {
        match value {
            ApiTaxTreatment::Ertragsanteil => CliTaxTreatment::Ertragsanteil,
            ApiTaxTreatment::AnnualCapitalGains => CliTaxTreatment::AnnualCapitalGains,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiVehicleKind {
    #[serde(alias = "fundLinkedInsurance", alias = "fondspolice")]
    FundLinkedInsurance,
    #[serde(alias = "directFund", alias = "etf", alias = "etf-sparplan")]
    DirectFund,
    #[serde(alias = "guaranteedRateInsurance", alias = "klassik")]
    GuaranteedRateInsurance,
}

impl From<ApiVehicleKind> for VehicleKind {
    fn from(value: ApiVehicleKind) -> Self {
        match value {
            ApiVehicleKind::FundLinkedInsurance => VehicleKind::FundLinkedInsurance,
            ApiVehicleKind::DirectFund => VehicleKind::DirectFund,
            ApiVehicleKind::GuaranteedRateInsurance => VehicleKind::GuaranteedRateInsurance,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rentenrechner",
    about = "German private pension projection and comparison engine"
)]
struct Cli {
    #[arg(long, default_value_t = 35)]
    current_age: u32,
    #[arg(long, default_value_t = 67)]
    retirement_age: u32,
    #[arg(long, default_value_t = 300.0)]
    monthly_contribution: f64,
    #[arg(long, default_value_t = 0.0)]
    initial_capital: f64,
    #[arg(long, help = "Optional capital goal at retirement")]
    target_capital: Option<f64>,
    #[arg(long, help = "Payout start age; defaults to --retirement-age")]
    payout_start_age: Option<u32>,
    #[arg(long, default_value_t = 85)]
    payout_end_age: u32,
    #[arg(long, value_enum, default_value_t = CliPayoutMode::Annuity)]
    payout_mode: CliPayoutMode,
    #[arg(
        long,
        default_value_t = 3.5,
        help = "Annuity conversion rate in percent of capital per year"
    )]
    annuity_rate: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Safe withdrawal rate in percent per year"
    )]
    safe_withdrawal_rate: f64,
    #[arg(
        long,
        default_value_t = 20,
        help = "Assumed payout years used to aggregate payout-phase tax"
    )]
    payout_horizon_years: u32,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Expected gross annual return in percent"
    )]
    expected_return: f64,
    #[arg(
        long,
        default_value_t = 1.3,
        help = "Annual costs (TER plus management fee) in percent"
    )]
    cost_rate: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliTaxTreatment::Ertragsanteil,
        help = "Tax regime: Ertragsanteil at payout or annual capital gains during accumulation"
    )]
    tax_treatment: CliTaxTreatment,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Personal marginal rate or statutory capital-gains rate in percent"
    )]
    tax_rate: f64,
    #[arg(
        long,
        help = "Taxable share of each payout in percent; required for --tax-treatment=ertragsanteil"
    )]
    ertragsanteil: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    request_seq: Option<u64>,

    current_age: Option<u32>,
    retirement_age: Option<u32>,
    monthly_contribution: Option<f64>,
    initial_capital: Option<f64>,
    target_capital: Option<f64>,
    payout_start_age: Option<u32>,
    payout_end_age: Option<u32>,
    payout_mode: Option<ApiPayoutMode>,
    annuity_rate: Option<f64>,
    safe_withdrawal_rate: Option<f64>,
    payout_horizon_years: Option<u32>,

    expected_return: Option<f64>,
    cost_rate: Option<f64>,
    tax_treatment: Option<ApiTaxTreatment>,
    tax_rate: Option<f64>,
    ertragsanteil: Option<f64>,

    vehicles: Option<Vec<VehiclePayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehiclePayload {
    name: Option<String>,
    kind: Option<ApiVehicleKind>,
    expected_return: Option<f64>,
    cost_rate: Option<f64>,
    tax_treatment: Option<ApiTaxTreatment>,
    tax_rate: Option<f64>,
    ertragsanteil: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: PlanInputs,
    assumptions: CostAssumptions,
    vehicles: Vec<VehicleSpec>,
    request_seq: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    request_seq: Option<u64>,
    years_to_retirement: u32,
    projection: ProjectionResult,
    required_monthly_contribution: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    request_seq: Option<u64>,
    winner: String,
    metric: &'static str,
    results: Vec<VehicleResult>,
    tax_advantage: Option<TaxAdvantage>,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: &'static str,
    endpoints: [&'static str; 2],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<(PlanInputs, CostAssumptions), String> {
    if cli.retirement_age <= cli.current_age {
        return Err("--retirement-age must be > --current-age".to_string());
    }

    let payout_start_age = cli.payout_start_age.unwrap_or(cli.retirement_age);
    if payout_start_age != cli.retirement_age {
        return Err("--payout-start-age must match --retirement-age".to_string());
    }

    if cli.payout_end_age <= payout_start_age {
        return Err("--payout-end-age must be > --payout-start-age".to_string());
    }

    if !cli.monthly_contribution.is_finite() || cli.monthly_contribution < 0.0 {
        return Err("--monthly-contribution must be >= 0".to_string());
    }

    if !cli.initial_capital.is_finite() || cli.initial_capital < 0.0 {
        return Err("--initial-capital must be >= 0".to_string());
    }

    if let Some(target) = cli.target_capital {
        if !target.is_finite() || target < 0.0 {
            return Err("--target-capital must be >= 0".to_string());
        }
    }

    if cli.payout_horizon_years == 0 {
        return Err("--payout-horizon-years must be > 0".to_string());
    }

    for (name, rate) in [
        ("--annuity-rate", cli.annuity_rate),
        ("--safe-withdrawal-rate", cli.safe_withdrawal_rate),
        ("--cost-rate", cli.cost_rate),
        ("--tax-rate", cli.tax_rate),
    ] {
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    if !cli.expected_return.is_finite() || !(-100.0..=100.0).contains(&cli.expected_return) {
        return Err("--expected-return must be between -100 and 100".to_string());
    }

    if let Some(fraction) = cli.ertragsanteil {
        if !fraction.is_finite() || !(0.0..=100.0).contains(&fraction) {
            return Err("--ertragsanteil must be between 0 and 100".to_string());
        }
    }

    if cli.tax_treatment == CliTaxTreatment::Ertragsanteil && cli.ertragsanteil.is_none() {
        return Err(
            "--ertragsanteil is required when --tax-treatment=ertragsanteil".to_string(),
        );
    }

    let inputs = PlanInputs {
        current_age: cli.current_age,
        retirement_age: cli.retirement_age,
        monthly_contribution: cli.monthly_contribution,
        initial_capital: cli.initial_capital,
        target_capital: cli.target_capital,
        payout_start_age,
        payout_end_age: cli.payout_end_age,
        payout_mode: cli.payout_mode.into(),
        annuity_rate: cli.annuity_rate / 100.0,
        safe_withdrawal_rate: cli.safe_withdrawal_rate / 100.0,
        payout_horizon_years: cli.payout_horizon_years,
    };
    let assumptions = CostAssumptions {
        expected_annual_return: cli.expected_return / 100.0,
        annual_cost_rate: cli.cost_rate / 100.0,
        tax_treatment: cli.tax_treatment.into(),
        tax_rate: cli.tax_rate / 100.0,
        ertragsanteil_fraction: cli.ertragsanteil.map(|v| v / 100.0),
    };
    Ok((inputs, assumptions))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(info_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Rentenrechner HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn info_handler() -> Response {
    json_response(
        StatusCode::OK,
        ServiceInfo {
            service: "rentenrechner",
            endpoints: ["/api/project", "/api/compare"],
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    compare_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let projection = match project_scenario(&request.inputs, &request.assumptions) {
        Ok(projection) => projection,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let required = match request.inputs.target_capital {
        Some(target) => {
            match required_monthly_contribution(&request.inputs, &request.assumptions, target) {
                Ok(required) => Some(required),
                Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
            }
        }
        None => None,
    };

    json_response(
        StatusCode::OK,
        ProjectResponse {
            request_seq: request.request_seq,
            years_to_retirement: request.inputs.retirement_age - request.inputs.current_age,
            projection,
            required_monthly_contribution: required,
        },
    )
}

fn compare_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let comparison = match compare_vehicles(&request.inputs, &request.vehicles) {
        Ok(comparison) => comparison,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    json_response(
        StatusCode::OK,
        build_compare_response(request.request_seq, comparison),
    )
}

fn build_compare_response(request_seq: Option<u64>, comparison: ComparisonResult) -> CompareResponse {
    CompareResponse {
        request_seq,
        winner: comparison.winner,
        metric: comparison.metric,
        results: comparison.results,
        tax_advantage: comparison.tax_advantage,
    }
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.target_capital {
        cli.target_capital = Some(v);
    }
    if let Some(v) = payload.payout_start_age {
        cli.payout_start_age = Some(v);
    }
    if let Some(v) = payload.payout_end_age {
        cli.payout_end_age = v;
    }
    if let Some(v) = payload.payout_mode {
        cli.payout_mode = v.into();
    }
    if let Some(v) = payload.annuity_rate {
        cli.annuity_rate = v;
    }
    if let Some(v) = payload.safe_withdrawal_rate {
        cli.safe_withdrawal_rate = v;
    }
    if let Some(v) = payload.payout_horizon_years {
        cli.payout_horizon_years = v;
    }
    if let Some(v) = payload.expected_return {
        cli.expected_return = v;
    }
    if let Some(v) = payload.cost_rate {
        cli.cost_rate = v;
    }
    if let Some(v) = payload.tax_treatment {
        cli.tax_treatment = v.into();
    }
    if let Some(v) = payload.tax_rate {
        cli.tax_rate = v;
    }
    if let Some(v) = payload.ertragsanteil {
        cli.ertragsanteil = Some(v);
    }

    let request_seq = payload.request_seq;
    let vehicle_payloads = payload.vehicles;
    let (inputs, assumptions) = build_inputs(cli)?;
    let vehicles = match vehicle_payloads {
        Some(payloads) => build_vehicles(payloads, assumptions)?,
        None => default_vehicle_trio(),
    };

    Ok(ApiRequest {
        inputs,
        assumptions,
        vehicles,
        request_seq,
    })
}

fn default_vehicle_trio() -> Vec<VehicleSpec> {
    vec![
        VehicleSpec::with_defaults(VehicleKind::FundLinkedInsurance),
        VehicleSpec::with_defaults(VehicleKind::DirectFund),
        VehicleSpec::with_defaults(VehicleKind::GuaranteedRateInsurance),
    ]
}

fn build_vehicles(
    payloads: Vec<VehiclePayload>,
    plan_assumptions: CostAssumptions,
) -> Result<Vec<VehicleSpec>, String> {
    let mut vehicles = Vec::with_capacity(payloads.len());
    for (idx, payload) in payloads.into_iter().enumerate() {
        vehicles.push(build_vehicle(idx, payload, plan_assumptions)?);
    }
    Ok(vehicles)
}

fn build_vehicle(
    idx: usize,
    payload: VehiclePayload,
    plan_assumptions: CostAssumptions,
) -> Result<VehicleSpec, String> {
    // Kind-less vehicles start from the plan-level assumptions instead of a
    // catalogue default.
    let kind = payload.kind.map(VehicleKind::from);
    let mut assumptions = kind
        .map(VehicleKind::default_assumptions)
        .unwrap_or(plan_assumptions);

    if let Some(v) = payload.expected_return {
        if !v.is_finite() || !(-100.0..=100.0).contains(&v) {
            return Err(format!(
                "vehicles[{idx}].expectedReturn must be between -100 and 100"
            ));
        }
        assumptions.expected_annual_return = v / 100.0;
    }
    if let Some(v) = payload.cost_rate {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            return Err(format!("vehicles[{idx}].costRate must be between 0 and 100"));
        }
        assumptions.annual_cost_rate = v / 100.0;
    }
    if let Some(v) = payload.tax_treatment {
        assumptions.tax_treatment = TaxTreatment::from(CliTaxTreatment::from(v));
    }
    if let Some(v) = payload.tax_rate {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            return Err(format!("vehicles[{idx}].taxRate must be between 0 and 100"));
        }
        assumptions.tax_rate = v / 100.0;
    }
    if let Some(v) = payload.ertragsanteil {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            return Err(format!(
                "vehicles[{idx}].ertragsanteil must be between 0 and 100"
            ));
        }
        assumptions.ertragsanteil_fraction = Some(v / 100.0);
    }

    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| kind.map(|k| k.label().to_string()))
        .unwrap_or_else(|| format!("Vehicle {}", idx + 1));

    Ok(VehicleSpec { name, assumptions })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 35,
        retirement_age: 67,
        monthly_contribution: 300.0,
        initial_capital: 0.0,
        target_capital: None,
        payout_start_age: None,
        payout_end_age: 85,
        payout_mode: CliPayoutMode::Annuity,
        annuity_rate: 3.5,
        safe_withdrawal_rate: 4.0,
        payout_horizon_years: 20,
        expected_return: 6.0,
        cost_rate: 1.3,
        tax_treatment: CliTaxTreatment::Ertragsanteil,
        tax_rate: 30.0,
        ertragsanteil: Some(17.0),
    }
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
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

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
    fn build_inputs_converts_percent_to_fractions() {
        let (inputs, assumptions) = build_inputs(sample_cli()).expect("valid inputs");

        assert_approx(inputs.annuity_rate, 0.035);
        assert_approx(inputs.safe_withdrawal_rate, 0.04);
        assert_approx(assumptions.expected_annual_return, 0.06);
        assert_approx(assumptions.annual_cost_rate, 0.013);
        assert_approx(assumptions.tax_rate, 0.30);
        assert_approx(
            assumptions.ertragsanteil_fraction.expect("fraction present"),
            0.17,
        );
    }

    #[test]
    fn build_inputs_defaults_payout_start_to_retirement_age() {
        let mut cli = sample_cli();
        cli.retirement_age = 63;
        cli.payout_start_age = None;

        let (inputs, _) = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.payout_start_age, 63);
    }

    #[test]
    fn build_inputs_rejects_retirement_before_current_age() {
        let mut cli = sample_cli();
        cli.current_age = 67;
        cli.retirement_age = 67;

        let err = build_inputs(cli).expect_err("must reject inverted ages");
        assert!(err.contains("--retirement-age"));
    }

    #[test]
    fn build_inputs_rejects_disagreeing_payout_start() {
        let mut cli = sample_cli();
        cli.payout_start_age = Some(65);

        let err = build_inputs(cli).expect_err("must reject mismatched payout start");
        assert!(err.contains("--payout-start-age"));
    }

    #[test]
    fn build_inputs_requires_ertragsanteil_fraction() {
        let mut cli = sample_cli();
        cli.tax_treatment = CliTaxTreatment::Ertragsanteil;
        cli.ertragsanteil = None;

        let err = build_inputs(cli).expect_err("must require the statutory fraction");
        assert!(err.contains("--ertragsanteil"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_tax_rate() {
        let mut cli = sample_cli();
        cli.tax_rate = 130.0;

        let err = build_inputs(cli).expect_err("must reject rate above 100 percent");
        assert!(err.contains("--tax-rate"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "requestSeq": 17,
          "currentAge": 40,
          "retirementAge": 65,
          "monthlyContribution": 450,
          "initialCapital": 20000,
          "targetCapital": 300000,
          "payoutEndAge": 88,
          "payoutMode": "flexible-withdrawal",
          "safeWithdrawalRate": 3.5,
          "payoutHorizonYears": 25,
          "expectedReturn": 6.5,
          "costRate": 0.8,
          "taxTreatment": "annual-capital-gains",
          "taxRate": 26.375
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_eq!(request.request_seq, Some(17));
        assert_eq!(inputs.current_age, 40);
        assert_eq!(inputs.retirement_age, 65);
        assert_eq!(inputs.payout_start_age, 65);
        assert_eq!(inputs.payout_end_age, 88);
        assert_approx(inputs.monthly_contribution, 450.0);
        assert_approx(inputs.initial_capital, 20_000.0);
        assert_approx(inputs.target_capital.expect("target present"), 300_000.0);
        assert_eq!(inputs.payout_mode, PayoutMode::FlexibleWithdrawal);
        assert_approx(inputs.safe_withdrawal_rate, 0.035);
        assert_eq!(inputs.payout_horizon_years, 25);
        assert_approx(request.assumptions.expected_annual_return, 0.065);
        assert_approx(request.assumptions.annual_cost_rate, 0.008);
        assert_eq!(
            request.assumptions.tax_treatment,
            TaxTreatment::AnnualCapitalGains
        );
        assert_approx(request.assumptions.tax_rate, 0.26375);
    }

    #[test]
    fn api_request_defaults_to_the_standard_vehicle_trio() {
        let request = api_request_from_json("{}").expect("defaults should parse");
        let names: Vec<&str> = request.vehicles.iter().map(|v| v.name.as_str()).collect();
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
    fn api_request_builds_custom_vehicles_with_overrides() {
        let json = r#"{
          "vehicles": [
            { "kind": "direct-fund", "costRate": 0.2 },
            { "name": "Hausrat-Police", "kind": "fondspolice", "expectedReturn": 5.5 },
            { "name": "Eigenbau", "taxTreatment": "annual-capital-gains", "taxRate": 26.375 }
          ]
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        assert_eq!(request.vehicles.len(), 3);

        assert_eq!(request.vehicles[0].name, "ETF-Sparplan");
        assert_approx(request.vehicles[0].assumptions.annual_cost_rate, 0.002);

        assert_eq!(request.vehicles[1].name, "Hausrat-Police");
        assert_approx(request.vehicles[1].assumptions.expected_annual_return, 0.055);

        // Kind-less vehicle inherits the plan-level assumptions, not a
        // catalogue default.
        assert_eq!(request.vehicles[2].name, "Eigenbau");
        assert_approx(request.vehicles[2].assumptions.expected_annual_return, 0.06);
        assert_approx(request.vehicles[2].assumptions.annual_cost_rate, 0.013);
        assert_eq!(
            request.vehicles[2].assumptions.tax_treatment,
            TaxTreatment::AnnualCapitalGains
        );
    }

    #[test]
    fn api_request_rejects_out_of_range_vehicle_override() {
        let json = r#"{ "vehicles": [ { "kind": "etf", "taxRate": 120 } ] }"#;
        let err = api_request_from_json(json).expect_err("must reject bad override");
        assert!(err.contains("vehicles[0].taxRate"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = api_request_from_json(r#"{ "requestSeq": 3, "targetCapital": 250000 }"#)
            .expect("json should parse");
        let projection =
            project_scenario(&request.inputs, &request.assumptions).expect("valid scenario");
        let required =
            required_monthly_contribution(&request.inputs, &request.assumptions, 250_000.0)
                .expect("solvable goal");
        let response = ProjectResponse {
            request_seq: request.request_seq,
            years_to_retirement: request.inputs.retirement_age - request.inputs.current_age,
            projection,
            required_monthly_contribution: Some(required),
        };

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"requestSeq\":3"));
        assert!(json.contains("\"yearsToRetirement\":32"));
        assert!(json.contains("\"finalCapital\""));
        assert!(json.contains("\"grossMonthlyPension\""));
        assert!(json.contains("\"netMonthlyPension\""));
        assert!(json.contains("\"totalTaxPaid\""));
        assert!(json.contains("\"effectiveNetAnnualReturn\""));
        assert!(json.contains("\"targetCapitalReached\""));
        assert!(json.contains("\"requiredMonthlyContribution\""));
    }

    #[test]
    fn compare_response_serialization_contains_expected_fields() {
        let request = api_request_from_json(r#"{ "requestSeq": 9 }"#).expect("json should parse");
        let comparison =
            compare_vehicles(&request.inputs, &request.vehicles).expect("valid comparison");
        let response = build_compare_response(request.request_seq, comparison);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"requestSeq\":9"));
        assert!(json.contains("\"winner\""));
        assert!(json.contains("\"metric\":\"netMonthlyPension\""));
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"taxAdvantage\""));
    }
}
