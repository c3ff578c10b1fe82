use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_apr_core::loan::metrics::{self, LoanInput};
use loan_apr_core::loan::report::LoanResult;
use loan_apr_core::time_value;
use loan_apr_core::SolverConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct RateInput {
    principal: Decimal,
    payment: Decimal,
    periods: u32,
    #[serde(default)]
    solver: SolverConfig,
}

// ---------------------------------------------------------------------------
// Loan metrics
// ---------------------------------------------------------------------------

/// Summary and detail mappings, or `{"Error": message}`. Malformed input is
/// reported the same way rather than thrown.
#[napi]
pub fn compute_loan_metrics(input_json: String) -> NapiResult<String> {
    let result = match serde_json::from_str::<LoanInput>(&input_json) {
        Ok(input) => metrics::compute_loan_metrics(&input),
        Err(e) => LoanResult::error(e.to_string()),
    };
    serde_json::to_string(&result).map_err(to_napi_error)
}

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::calculate_loan_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rate solver
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_periodic_rate(input_json: String) -> NapiResult<String> {
    let input: RateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let solution =
        time_value::solve_periodic_rate(input.principal, input.payment, input.periods, &input.solver)
            .map_err(to_napi_error)?;
    serde_json::to_string(&solution).map_err(to_napi_error)
}
