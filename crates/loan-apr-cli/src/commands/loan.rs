use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use loan_apr_core::loan::metrics::{self, LoanInput};
use loan_apr_core::loan::report::LoanResult;
use loan_apr_core::time_value;
use loan_apr_core::{LoanAprError, PaymentFrequency, SolverConfig};

use crate::input;

/// Newton-Raphson overrides shared by every loan command
#[derive(Args)]
pub struct SolverArgs {
    /// Starting periodic rate for the solver
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,

    /// Stop once successive rates differ by less than this
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Hard cap on solver iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

impl SolverArgs {
    fn apply(&self, mut config: SolverConfig) -> SolverConfig {
        if let Some(guess) = self.guess {
            config = config.with_guess(guess);
        }
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance);
        }
        if let Some(max_iterations) = self.max_iterations {
            config = config.with_max_iterations(max_iterations);
        }
        config
    }
}

/// Arguments for loan metrics
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount advanced
    #[arg(long, default_value = "225000")]
    pub principal: Decimal,

    /// Level payment per period
    #[arg(long, default_value = "8156.25")]
    pub payment: Decimal,

    /// Number of payments
    #[arg(long, default_value_t = 32)]
    pub periods: u32,

    /// Payment frequency (Monthly or Weekly)
    #[arg(long, default_value = "Monthly")]
    pub frequency: String,

    #[command(flatten)]
    pub solver: SolverArgs,
}

/// Arguments for the periodic rate solve
#[derive(Args)]
pub struct RateArgs {
    /// Loan amount advanced
    #[arg(long)]
    pub principal: Decimal,

    /// Level payment per period
    #[arg(long)]
    pub payment: Decimal,

    /// Number of payments
    #[arg(long)]
    pub periods: u32,

    #[command(flatten)]
    pub solver: SolverArgs,
}

/// Loan input from `--input`, piped stdin, or flags, in that order.
/// Solver flags override whatever the JSON input carries.
fn resolve_input(args: &LoanArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let loan: LoanInput = if let Some(ref path) = args.input {
        debug!(path = %path, "reading loan from file");
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        debug!("reading loan from stdin");
        serde_json::from_value(data)?
    } else {
        let frequency: PaymentFrequency = args.frequency.parse()?;
        LoanInput::new(args.principal, args.payment, args.periods, frequency)
    };

    let solver = args.solver.apply(loan.solver);
    Ok(loan.with_solver(solver))
}

pub fn run_metrics(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = match resolve_input(&args) {
        Ok(loan) => metrics::compute_loan_metrics(&loan),
        // Domain failures (e.g. an unsupported --frequency) are part of the report
        Err(e) if e.is::<LoanAprError>() => LoanResult::error(e.to_string()),
        Err(e) => return Err(e),
    };
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = resolve_input(&args)?;
    let result = metrics::calculate_loan_metrics(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.solver.apply(SolverConfig::default());
    let solution =
        time_value::solve_periodic_rate(args.principal, args.payment, args.periods, &config)?;
    Ok(serde_json::to_value(solution)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_solver_flags_override_only_given_fields() {
        let args = SolverArgs {
            guess: None,
            tolerance: Some(dec!(0.0001)),
            max_iterations: Some(50),
        };
        let config = args.apply(SolverConfig::default());
        assert_eq!(config.guess, dec!(0.01));
        assert_eq!(config.tolerance, dec!(0.0001));
        assert_eq!(config.max_iterations, 50);
    }

    #[test]
    fn test_rate_command_output() {
        let args = RateArgs {
            principal: dec!(225000),
            payment: dec!(8156.25),
            periods: 32,
            solver: SolverArgs {
                guess: None,
                tolerance: None,
                max_iterations: None,
            },
        };
        let value = run_rate(args).unwrap();
        assert!(value["rate"].as_str().unwrap().starts_with("0.0092"));
        assert!(value["iterations"].as_u64().unwrap() >= 1);
    }
}
