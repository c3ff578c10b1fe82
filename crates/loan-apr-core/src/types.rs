use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanAprError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// How often the loan is repaid.
///
/// Parsed from the strings `"Monthly"` and `"Weekly"` (case-insensitive).
/// Anything else is rejected with [`LoanAprError::UnsupportedFrequency`],
/// including when it arrives through serde.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Weekly,
}

impl PaymentFrequency {
    /// Compounding periods per year used for annualisation.
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Weekly => 52,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "Monthly",
            PaymentFrequency::Weekly => "Weekly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentFrequency {
    type Err = LoanAprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            _ => Err(LoanAprError::UnsupportedFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for PaymentFrequency {
    type Error = LoanAprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentFrequency> for String {
    fn from(frequency: PaymentFrequency) -> Self {
        frequency.label().to_string()
    }
}

/// Newton-Raphson settings for the periodic rate solver.
///
/// Every field has a serde default, so a JSON input can override just the
/// ones it cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting rate for the iteration
    pub guess: Rate,
    /// Iteration stops once successive rates differ by less than this
    pub tolerance: Decimal,
    /// Hard cap on Newton steps
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            guess: dec!(0.01),
            tolerance: dec!(0.000001),
            max_iterations: 1000,
        }
    }
}

impl SolverConfig {
    pub fn with_guess(mut self, guess: Rate) -> Self {
        self.guess = guess;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Reject settings the iteration cannot honour. The guess is not
    /// checked: a singular guess is a convergence failure, not bad input.
    pub fn validate(&self) -> Result<(), LoanAprError> {
        if self.tolerance <= Decimal::ZERO {
            return Err(LoanAprError::InvalidInput {
                field: "tolerance".into(),
                reason: "Tolerance must be positive".into(),
            });
        }
        if self.max_iterations == 0 {
            return Err(LoanAprError::InvalidInput {
                field: "max_iterations".into(),
                reason: "Iteration cap must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
