use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LoanAprError;
use crate::types::{Money, Rate, SolverConfig};
use crate::LoanAprResult;

const RATE_SOLVER: &str = "periodic rate (Newton-Raphson)";

/// Outcome of a periodic rate solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSolution {
    /// Per-period rate equating the payment stream's present value to the principal
    pub rate: Rate,
    /// Newton steps taken, including the converging one
    pub iterations: u32,
}

/// Present value of `periods` level payments at `rate` per period.
///
/// A zero rate is the straight-line limit `payment * periods`.
pub fn annuity_present_value(rate: Rate, periods: u32, payment: Money) -> LoanAprResult<Money> {
    if rate.is_zero() {
        return Ok(payment * Decimal::from(periods));
    }

    let factor = growth_factor(rate, periods).ok_or_else(|| LoanAprError::ArithmeticOverflow {
        context: "annuity growth factor".into(),
    })?;
    if factor.is_zero() {
        return Err(LoanAprError::DivisionByZero {
            context: "annuity growth factor".into(),
        });
    }

    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    Ok(payment * annuity_factor)
}

/// Level payment that amortises `principal` over `periods` at `rate`.
pub fn annuity_payment(rate: Rate, periods: u32, principal: Money) -> LoanAprResult<Money> {
    if periods == 0 {
        return Err(LoanAprError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = growth_factor(rate, periods).ok_or_else(|| LoanAprError::ArithmeticOverflow {
        context: "annuity growth factor".into(),
    })?;
    if factor.is_zero() {
        return Err(LoanAprError::DivisionByZero {
            context: "annuity growth factor".into(),
        });
    }

    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    if annuity_factor.is_zero() {
        return Err(LoanAprError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    Ok(principal / annuity_factor)
}

/// Periodic rate implied by a level-payment loan, using default solver settings.
pub fn periodic_rate(principal: Money, payment: Money, periods: u32) -> LoanAprResult<Rate> {
    solve_periodic_rate(principal, payment, periods, &SolverConfig::default()).map(|s| s.rate)
}

/// Solve `principal = payment * (1 - (1+r)^-periods) / r` for `r` using Newton-Raphson.
///
/// Iterates `r <- r - f(r) / f'(r)` from `config.guess`, with
/// `f'(r) = payment * ((1+r)^-n * (n*r + 1) - 1) / r^2`, and returns the new
/// iterate as soon as a step moves the rate by less than `config.tolerance`.
/// `config.max_iterations` is a hard cap; running out of steps is a
/// [`LoanAprError::ConvergenceFailure`].
///
/// The iteration runs in `f64`: on long terms `(1+r)^n` leaves the Decimal
/// range long before the iterate settles. Inputs and the converged rate cross
/// the boundary as Decimal. The equation is singular at `r = 0`; a step that
/// is not finite (zero rate, zero slope) ends in `ConvergenceFailure`. The
/// returned rate is not bounded: a payment too small to amortise the
/// principal yields a negative rate.
pub fn solve_periodic_rate(
    principal: Money,
    payment: Money,
    periods: u32,
    config: &SolverConfig,
) -> LoanAprResult<RateSolution> {
    config.validate()?;
    if periods == 0 {
        return Err(LoanAprError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    let principal = to_float(principal, "principal")?;
    let payment = to_float(payment, "payment")?;
    let tolerance = to_float(config.tolerance, "tolerance")?;
    let mut rate = to_float(config.guess, "guess")?;
    let mut last_delta = 0.0_f64;

    for i in 0..config.max_iterations {
        let next = newton_step(rate, principal, payment, periods);
        if !next.is_finite() {
            warn!(iteration = i + 1, rate, "periodic rate step is not finite");
            return Err(LoanAprError::ConvergenceFailure {
                function: RATE_SOLVER.into(),
                iterations: i + 1,
                last_delta: to_decimal_delta(last_delta),
            });
        }

        last_delta = (next - rate).abs();
        if last_delta < tolerance {
            debug!(iterations = i + 1, rate = next, "periodic rate converged");
            let rate = Decimal::from_f64(next).ok_or_else(|| LoanAprError::ArithmeticOverflow {
                context: format!("periodic rate {next:e} outside the decimal range"),
            })?;
            return Ok(RateSolution {
                rate,
                iterations: i + 1,
            });
        }
        rate = next;
    }

    warn!(
        iterations = config.max_iterations,
        last_delta, "periodic rate did not converge"
    );
    Err(LoanAprError::ConvergenceFailure {
        function: RATE_SOLVER.into(),
        iterations: config.max_iterations,
        last_delta: to_decimal_delta(last_delta),
    })
}

/// One Newton update of the annuity equation. NaN or infinite when a term is
/// undefined.
fn newton_step(rate: f64, principal: f64, payment: f64, periods: u32) -> f64 {
    let n = f64::from(periods);
    // (1+r)^-n
    let discount = (1.0 + rate).powf(-n);
    let pv = payment * (1.0 - discount) / rate;
    // d/dr of the annuity factor: ((1+r)^-n (n r + 1) - 1) / r^2
    let derivative = payment * (discount * (n * rate + 1.0) - 1.0) / (rate * rate);
    rate - (pv - principal) / derivative
}

fn to_float(value: Decimal, field: &str) -> LoanAprResult<f64> {
    value.to_f64().ok_or_else(|| LoanAprError::InvalidInput {
        field: field.into(),
        reason: format!("{value} is not representable as f64"),
    })
}

fn to_decimal_delta(delta: f64) -> Decimal {
    Decimal::from_f64(delta).unwrap_or(Decimal::MAX)
}

/// (1+r)^n, `None` on overflow
fn growth_factor(rate: Rate, periods: u32) -> Option<Decimal> {
    Decimal::ONE
        .checked_add(rate)?
        .checked_powi(i64::from(periods))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_annuity_pv_basic() {
        let result = annuity_present_value(dec!(0.08), 10, dec!(100)).unwrap();
        // 100 * (1 - 1/1.08^10) / 0.08 = ~671
        assert!((result - dec!(671)).abs() < dec!(2.0));
    }

    #[test]
    fn test_annuity_pv_zero_rate() {
        let result = annuity_present_value(Decimal::ZERO, 12, dec!(50)).unwrap();
        assert_eq!(result, dec!(600));
    }

    #[test]
    fn test_annuity_payment_inverts_pv() {
        let payment = annuity_payment(dec!(0.01), 24, dec!(10000)).unwrap();
        let pv = annuity_present_value(dec!(0.01), 24, payment).unwrap();
        assert!((pv - dec!(10000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_annuity_payment_zero_periods() {
        assert!(matches!(
            annuity_payment(dec!(0.01), 0, dec!(1000)),
            Err(LoanAprError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_solve_recovers_known_rate() {
        let payment = annuity_payment(dec!(0.02), 36, dec!(50000)).unwrap();
        let solution =
            solve_periodic_rate(dec!(50000), payment, 36, &SolverConfig::default()).unwrap();
        assert!((solution.rate - dec!(0.02)).abs() < dec!(0.000001));
        assert!(solution.iterations >= 1);
    }

    #[test]
    fn test_solve_reference_loan() {
        let rate = periodic_rate(dec!(225000), dec!(8156.25), 32).unwrap();
        // 32 payments of 8,156.25 against 225,000 imply roughly 0.9% a month
        assert!(rate > dec!(0.008) && rate < dec!(0.010), "rate = {rate}");
        let pv = annuity_present_value(rate, 32, dec!(8156.25)).unwrap();
        assert!((pv - dec!(225000)).abs() < dec!(1));
    }

    #[test]
    fn test_solve_negative_rate_passes_through() {
        // 10 payments of 90 never repay 1,000
        let rate = periodic_rate(dec!(1000), dec!(90), 10).unwrap();
        assert!(rate < Decimal::ZERO, "rate = {rate}");
    }

    #[test]
    fn test_solve_zero_guess_fails_to_converge() {
        let config = SolverConfig::default().with_guess(Decimal::ZERO);
        let err = solve_periodic_rate(dec!(225000), dec!(8156.25), 32, &config).unwrap_err();
        assert!(matches!(err, LoanAprError::ConvergenceFailure { .. }));
        assert!(err.to_string().starts_with("Failed to converge"));
    }

    #[test]
    fn test_solve_iteration_cap_is_hard() {
        let config = SolverConfig::default().with_max_iterations(1);
        let err = solve_periodic_rate(dec!(225000), dec!(8156.25), 32, &config).unwrap_err();
        match err {
            LoanAprError::ConvergenceFailure { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("expected convergence failure, got {other:?}"),
        }
    }

    #[test]
    fn test_solve_zero_periods_rejected() {
        let err = solve_periodic_rate(dec!(1000), dec!(100), 0, &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoanAprError::InvalidInput { .. }));
    }
}
