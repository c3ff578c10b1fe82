use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::loan::metrics::LoanMetricsOutput;
use crate::types::{Money, Rate};

pub const MONTHLY_COST: &str = "Monthly Cost";
pub const TOTAL_REPAYMENT: &str = "Total Repayment";
pub const APY: &str = "APY (Annual Percentage Yield)";
pub const APR: &str = "APR";
pub const TOTAL_INTEREST: &str = "Total Interest Paid";
pub const PREMIUM: &str = "Premium";

/// A labelled, display-ready figure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

/// Ordered label → value mapping. Serialises as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSection {
    lines: Vec<ReportLine>,
}

impl ReportSection {
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.lines.push(ReportLine {
            label: label.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.value.as_str())
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Serialize for ReportSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.lines.len()))?;
        for line in &self.lines {
            map.serialize_entry(&line.label, &line.value)?;
        }
        map.end()
    }
}

/// Headline figures plus the detailed breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanReport {
    pub summary: ReportSection,
    pub detail: ReportSection,
}

/// What the presentation layer receives: a report, or the failure message.
///
/// The error variant serialises as `{"Error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoanResult {
    Report(LoanReport),
    Error {
        #[serde(rename = "Error")]
        message: String,
    },
}

impl LoanResult {
    pub fn error(message: impl Into<String>) -> Self {
        LoanResult::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoanResult::Error { .. })
    }

    pub fn report(&self) -> Option<&LoanReport> {
        match self {
            LoanResult::Report(report) => Some(report),
            LoanResult::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoanResult::Report(_) => None,
            LoanResult::Error { message } => Some(message),
        }
    }
}

/// Render computed figures into the summary and detail sections.
pub fn build_report(figures: &LoanMetricsOutput) -> LoanReport {
    let mut summary = ReportSection::default();
    summary.push(MONTHLY_COST, format_currency(figures.monthly_cost));
    summary.push(TOTAL_REPAYMENT, format_currency(figures.total_repayment));
    summary.push(APY, format_percent(figures.apy, 2));
    summary.push(APR, format_percent(figures.apr, 2));

    let mut detail = ReportSection::default();
    detail.push(TOTAL_INTEREST, format_currency(figures.total_interest));
    detail.push(PREMIUM, format_percent(figures.premium, 2));
    detail.push(
        periodic_rate_label(figures.frequency.label()),
        format_percent(figures.periodic_rate, 4),
    );

    LoanReport { summary, detail }
}

/// "Monthly Interest Rate", "Weekly Interest Rate"
pub fn periodic_rate_label(frequency: &str) -> String {
    format!("{frequency} Interest Rate")
}

/// `$` followed by the amount with thousands separators and two decimals.
/// The sign follows the currency symbol: `$-1,234.50`.
pub fn format_currency(amount: Money) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("${}{}.{cents}", sign(amount), group_thousands(whole))
}

/// Rate as a percentage with `decimals` places: 0.16 → "16.00%".
///
/// The decimal point is shifted in the rendered digits rather than
/// multiplying by 100, so any representable rate formats.
pub fn format_percent(rate: Rate, decimals: u32) -> String {
    let places = decimals + 2;
    let rounded = rate.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
    let digits = format!("{:.*}", places as usize, rounded.abs()).replace('.', "");

    let (whole, fraction) = digits.split_at(digits.len() - decimals as usize);
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    if fraction.is_empty() {
        format!("{}{whole}%", sign(rate))
    } else {
        format!("{}{whole}.{fraction}%", sign(rate))
    }
}

/// Sign of the unrounded value, so -0.001 still renders as "-0.00"
fn sign(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    }
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(dec!(261000)), "$261,000.00");
        assert_eq!(format_currency(dec!(8156.25)), "$8,156.25");
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
        assert_eq!(format_currency(dec!(0.5)), "$0.50");
    }

    #[test]
    fn test_format_currency_negative_sign_after_symbol() {
        assert_eq!(format_currency(dec!(-1234.5)), "$-1,234.50");
        assert_eq!(format_currency(dec!(-0.001)), "$-0.00");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(0.16), 2), "16.00%");
        assert_eq!(format_percent(dec!(0.0092569), 4), "0.9257%");
        assert_eq!(format_percent(dec!(-0.2245), 2), "-22.45%");
        assert_eq!(format_percent(dec!(-0.00000001), 2), "-0.00%");
        assert_eq!(format_percent(Decimal::ZERO, 2), "0.00%");
        assert_eq!(format_percent(dec!(0.125), 0), "12%");
    }

    #[test]
    fn test_format_percent_beyond_hundredfold_range() {
        // Anything above ~7.9e26 cannot be multiplied by 100 as a Decimal
        let apy = Decimal::from_i128_with_scale(12_345_678_901_234_567_890_123_456_789, 1);
        assert_eq!(
            format_percent(apy, 2),
            "123456789012345678901234567890.00%"
        );
        assert_eq!(format_percent(Decimal::MAX, 2), format!("{}00.00%", Decimal::MAX));
        assert_eq!(format_percent(Decimal::MIN, 4), format!("{}00.0000%", Decimal::MIN));
    }

    #[test]
    fn test_section_preserves_order_in_json() {
        let mut section = ReportSection::default();
        section.push("Zeta", "1");
        section.push("Alpha", "2");
        let json = serde_json::to_string(&section).unwrap();
        assert_eq!(json, r#"{"Zeta":"1","Alpha":"2"}"#);
        assert_eq!(section.get("Alpha"), Some("2"));
        assert_eq!(section.get("Missing"), None);
    }

    #[test]
    fn test_error_result_shape() {
        let result = LoanResult::error("Unsupported frequency: Daily");
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"Error":"Unsupported frequency: Daily"}"#);
        assert!(result.is_error());
        assert!(result.report().is_none());
    }
}
