use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::LoanAprError;
use crate::loan::report::{build_report, LoanResult};
use crate::time_value::solve_periodic_rate;
use crate::types::*;
use crate::LoanAprResult;

/// A fixed-payment loan to analyse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount advanced to the borrower
    pub principal: Money,
    /// Level payment made every period
    pub payment: Money,
    /// Number of payments, counted in `frequency` periods
    pub periods: u32,
    #[serde(default)]
    pub frequency: PaymentFrequency,
    /// Newton-Raphson overrides; defaults when omitted
    #[serde(default)]
    pub solver: SolverConfig,
}

impl LoanInput {
    pub fn new(principal: Money, payment: Money, periods: u32, frequency: PaymentFrequency) -> Self {
        Self {
            principal,
            payment,
            periods,
            frequency,
            solver: SolverConfig::default(),
        }
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    fn validate(&self) -> LoanAprResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanAprError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.payment <= Decimal::ZERO {
            return Err(LoanAprError::InvalidInput {
                field: "payment".into(),
                reason: "Payment must be positive".into(),
            });
        }
        if self.periods == 0 {
            return Err(LoanAprError::InvalidInput {
                field: "periods".into(),
                reason: "At least one payment is required".into(),
            });
        }
        Ok(())
    }
}

/// Raw loan figures, rates as decimals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanMetricsOutput {
    pub frequency: PaymentFrequency,
    /// Rate per payment period implied by the annuity equation
    pub periodic_rate: Rate,
    /// Periodic rate times periods per year
    pub apr: Rate,
    /// Periodic rate compounded over a year
    pub apy: Rate,
    /// Cost per month. Equal to the payment for monthly loans; for weekly
    /// loans, total repayment over `periods / (52/12)` months.
    pub monthly_cost: Money,
    pub total_repayment: Money,
    pub total_interest: Money,
    /// Total repayment over principal, minus one
    pub premium: Rate,
    pub solver_iterations: u32,
}

/// Solve the periodic rate of a level-payment loan and annualise it.
pub fn calculate_loan_metrics(
    input: &LoanInput,
) -> LoanAprResult<ComputationOutput<LoanMetricsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.validate()?;

    let periods = Decimal::from(input.periods);
    let total_repayment = input.payment.checked_mul(periods).ok_or_else(|| {
        LoanAprError::ArithmeticOverflow {
            context: "total repayment".into(),
        }
    })?;

    let solution =
        solve_periodic_rate(input.principal, input.payment, input.periods, &input.solver)?;
    let rate = solution.rate;

    let (apy, apr) = annualise(rate, input.frequency)?;
    let monthly_cost =
        equivalent_monthly_cost(input.frequency, input.payment, total_repayment, input.periods)?;

    if rate < Decimal::ZERO {
        warnings.push(
            "Implied periodic rate is negative: total repayment does not cover the principal"
                .into(),
        );
    }
    if input.frequency == PaymentFrequency::Weekly {
        warnings.push(
            "Monthly cost for weekly payments is total repayment over periods / (52/12) months"
                .into(),
        );
    }

    let total_interest = total_repayment - input.principal;
    let premium = total_repayment
        .checked_div(input.principal)
        .ok_or_else(|| LoanAprError::ArithmeticOverflow {
            context: "premium".into(),
        })?
        - Decimal::ONE;

    debug!(
        frequency = %input.frequency,
        %rate,
        %apr,
        %apy,
        iterations = solution.iterations,
        "loan metrics computed"
    );

    let output = LoanMetricsOutput {
        frequency: input.frequency,
        periodic_rate: rate,
        apr,
        apy,
        monthly_cost,
        total_repayment,
        total_interest,
        premium,
        solver_iterations: solution.iterations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan APR/APY: Newton-Raphson on the annuity present-value equation",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "payment": input.payment.to_string(),
            "periods": input.periods,
            "frequency": input.frequency.label(),
            "periods_per_year": input.frequency.periods_per_year(),
            "solver": input.solver,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Report for an already-typed loan. Never fails: any error becomes
/// [`LoanResult::Error`] carrying its message.
pub fn compute_loan_metrics(input: &LoanInput) -> LoanResult {
    match calculate_loan_metrics(input) {
        Ok(output) => LoanResult::Report(build_report(&output.result)),
        Err(e) => {
            warn!(error = %e, "loan metrics failed");
            LoanResult::error(e.to_string())
        }
    }
}

/// Report for the four raw inputs a presentation layer collects.
///
/// `frequency` is `"Monthly"` or `"Weekly"`; anything else yields an
/// "Unsupported frequency" error result.
pub fn compute_metrics(principal: Money, payment: Money, periods: u32, frequency: &str) -> LoanResult {
    match frequency.parse::<PaymentFrequency>() {
        Ok(frequency) => {
            compute_loan_metrics(&LoanInput::new(principal, payment, periods, frequency))
        }
        Err(e) => {
            warn!(error = %e, "loan metrics failed");
            LoanResult::error(e.to_string())
        }
    }
}

/// (APY, APR) for a periodic rate
fn annualise(rate: Rate, frequency: PaymentFrequency) -> LoanAprResult<(Rate, Rate)> {
    let per_year = frequency.periods_per_year();
    let overflow = || LoanAprError::ArithmeticOverflow {
        context: format!("{} annualisation", frequency.label().to_lowercase()),
    };

    let apy = (Decimal::ONE + rate)
        .checked_powi(i64::from(per_year))
        .ok_or_else(overflow)?
        - Decimal::ONE;
    let apr = rate.checked_mul(Decimal::from(per_year)).ok_or_else(overflow)?;
    Ok((apy, apr))
}

fn equivalent_monthly_cost(
    frequency: PaymentFrequency,
    payment: Money,
    total_repayment: Money,
    periods: u32,
) -> LoanAprResult<Money> {
    match frequency {
        PaymentFrequency::Monthly => Ok(payment),
        PaymentFrequency::Weekly => {
            let weeks_per_month = Decimal::from(52) / Decimal::from(12);
            let months = Decimal::from(periods) / weeks_per_month;
            total_repayment
                .checked_div(months)
                .ok_or_else(|| LoanAprError::DivisionByZero {
                    context: "weekly monthly-equivalent cost".into(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reference_loan(frequency: PaymentFrequency) -> LoanInput {
        LoanInput::new(dec!(225000), dec!(8156.25), 32, frequency)
    }

    #[test]
    fn test_monthly_totals() {
        let out = calculate_loan_metrics(&reference_loan(PaymentFrequency::Monthly)).unwrap();
        let m = &out.result;
        assert_eq!(m.total_repayment, dec!(261000));
        assert_eq!(m.total_interest, dec!(36000));
        assert_eq!(m.premium, dec!(0.16));
        assert_eq!(m.monthly_cost, dec!(8156.25));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_monthly_annualisation() {
        let out = calculate_loan_metrics(&reference_loan(PaymentFrequency::Monthly)).unwrap();
        let m = &out.result;
        assert_eq!(m.apr, m.periodic_rate * dec!(12));
        assert_eq!(m.apy, (Decimal::ONE + m.periodic_rate).powi(12) - Decimal::ONE);
    }

    #[test]
    fn test_weekly_annualisation() {
        let out = calculate_loan_metrics(&reference_loan(PaymentFrequency::Weekly)).unwrap();
        let m = &out.result;
        assert_eq!(m.apr, m.periodic_rate * dec!(52));
        assert_eq!(m.apy, (Decimal::ONE + m.periodic_rate).powi(52) - Decimal::ONE);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_weekly_cost_is_monthly_equivalent() {
        // 32 weekly payments = 32 / (52/12) months; 261,000 spread over them
        let out = calculate_loan_metrics(&reference_loan(PaymentFrequency::Weekly)).unwrap();
        assert!((out.result.monthly_cost - dec!(35343.75)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_negative_rate_warns() {
        let input = LoanInput::new(dec!(1000), dec!(90), 10, PaymentFrequency::Monthly);
        let out = calculate_loan_metrics(&input).unwrap();
        assert!(out.result.periodic_rate < Decimal::ZERO);
        assert!(out.result.total_interest < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_validation_errors_name_field() {
        let bad = [
            (LoanInput::new(dec!(0), dec!(100), 12, PaymentFrequency::Monthly), "principal"),
            (LoanInput::new(dec!(1000), dec!(-5), 12, PaymentFrequency::Monthly), "payment"),
            (LoanInput::new(dec!(1000), dec!(100), 0, PaymentFrequency::Monthly), "periods"),
        ];
        for (input, expected) in bad {
            match calculate_loan_metrics(&input) {
                Err(LoanAprError::InvalidInput { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_compute_metrics_daily_is_error_result() {
        let result = compute_metrics(dec!(225000), dec!(8156.25), 32, "Daily");
        let message = result.error_message().unwrap();
        assert!(message.contains("Unsupported frequency"), "{message}");
    }

    #[test]
    fn test_compute_metrics_convergence_failure_is_error_result() {
        let input = reference_loan(PaymentFrequency::Monthly)
            .with_solver(SolverConfig::default().with_max_iterations(1));
        let result = compute_loan_metrics(&input);
        assert!(result.error_message().unwrap().contains("Failed to converge"));
    }

    #[test]
    fn test_input_json_defaults() {
        let input: LoanInput = serde_json::from_str(
            r#"{"principal": "225000", "payment": "8156.25", "periods": 32}"#,
        )
        .unwrap();
        assert_eq!(input.frequency, PaymentFrequency::Monthly);
        assert_eq!(input.solver, SolverConfig::default());
    }
}
