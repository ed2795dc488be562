use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{types::*, AuraResult};

/// DSCR below this multiple is flagged as critically low.
const DSCR_CRITICAL: Multiple = dec!(0.5);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRatiosInput {
    pub ebitda: Money,
    /// Annual principal plus interest payments.
    pub debt_service: Money,
    pub total_debt: Money,
    pub ebit: Money,
    pub interest_expense: Money,
}

/// The three headline credit ratios. `None` means the denominator was zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub dscr: Option<Multiple>,
    pub leverage_ratio: Option<Multiple>,
    pub interest_coverage: Option<Multiple>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioBand {
    Strong,
    Adequate,
    Weak,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioReading {
    pub value: Option<Multiple>,
    /// Two-decimal display form, e.g. "1.67x", or "n/a".
    pub display: String,
    pub band: RatioBand,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRatiosOutput {
    pub ratios: FinancialRatios,
    pub dscr: RatioReading,
    pub leverage: RatioReading,
    pub interest_coverage: RatioReading,
}

// ---------------------------------------------------------------------------
// Ratio primitives
// ---------------------------------------------------------------------------

/// Debt service coverage: EBITDA / annual debt service.
pub fn dscr(ebitda: Money, debt_service: Money) -> Option<Multiple> {
    ratio(ebitda, debt_service)
}

/// Leverage: total debt / EBITDA.
pub fn leverage(total_debt: Money, ebitda: Money) -> Option<Multiple> {
    ratio(total_debt, ebitda)
}

/// Interest coverage: EBIT / interest expense.
pub fn interest_coverage(ebit: Money, interest_expense: Money) -> Option<Multiple> {
    ratio(ebit, interest_expense)
}

/// `None` only for a zero denominator; an overflowing quotient saturates.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(saturating_div(numerator, denominator))
    }
}

/// Division that clamps to `Decimal::MAX`/`Decimal::MIN` instead of panicking.
/// The denominator must be non-zero.
pub(crate) fn saturating_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

/// Render a ratio for display: two decimals with an `x` suffix.
pub fn format_multiple(value: Option<Multiple>) -> String {
    match value {
        Some(v) => format!("{:.2}x", v.round_dp(2)),
        None => "n/a".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute DSCR, leverage and interest coverage and grade each one.
///
/// Never fails on zero denominators; those ratios come back as `None` and are
/// graded `Unavailable`. Suspicious inputs produce warnings only.
pub fn calculate_ratios(
    input: &FinancialRatiosInput,
) -> AuraResult<ComputationOutput<FinancialRatiosOutput>> {
    let start = Instant::now();
    let warnings = screen_inputs(input);

    let ratios = FinancialRatios {
        dscr: dscr(input.ebitda, input.debt_service),
        leverage_ratio: leverage(input.total_debt, input.ebitda),
        interest_coverage: interest_coverage(input.ebit, input.interest_expense),
    };

    let output = FinancialRatiosOutput {
        dscr: grade_dscr(ratios.dscr),
        leverage: grade_leverage(ratios.leverage_ratio),
        interest_coverage: grade_interest_coverage(ratios.interest_coverage),
        ratios,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "dscr": "EBITDA / annual debt service",
        "leverage": "total debt / EBITDA",
        "interest_coverage": "EBIT / interest expense",
        "zero_denominator": "ratio unavailable",
    });

    Ok(with_metadata(
        "Headline credit ratios",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn screen_inputs(input: &FinancialRatiosInput) -> Vec<String> {
    let mut warnings = Vec::new();

    if input.ebitda < Decimal::ZERO {
        warnings.push("EBITDA cannot be negative for this analysis".into());
    }
    if input.debt_service < Decimal::ZERO {
        warnings.push("Debt service cannot be negative".into());
    }
    if input.total_debt < Decimal::ZERO {
        warnings.push("Total debt cannot be negative".into());
    }
    if input.ebit < Decimal::ZERO {
        warnings.push("EBIT is negative - indicates operating losses".into());
    }
    if input.interest_expense < Decimal::ZERO {
        warnings.push("Interest expense cannot be negative".into());
    }
    if input.debt_service > Decimal::ZERO && input.ebitda > Decimal::ZERO {
        let coverage = saturating_div(input.ebitda, input.debt_service);
        if coverage < DSCR_CRITICAL {
            warnings.push(format!("DSCR of {:.2} is critically low", coverage.round_dp(2)));
        }
    }

    warnings
}

fn grade_dscr(value: Option<Multiple>) -> RatioReading {
    let (band, comment) = match value {
        None => (RatioBand::Unavailable, "Ratio unavailable (no debt service)"),
        Some(v) if v >= dec!(1.25) => (RatioBand::Strong, "Strong debt service capacity"),
        Some(v) if v >= dec!(1.0) => (RatioBand::Adequate, "Adequate but tight coverage"),
        Some(_) => (RatioBand::Weak, "Insufficient debt coverage"),
    };
    reading(value, band, comment)
}

fn grade_leverage(value: Option<Multiple>) -> RatioReading {
    // Lower is better for leverage.
    let (band, comment) = match value {
        None => (RatioBand::Unavailable, "Ratio unavailable (zero EBITDA)"),
        Some(v) if v <= dec!(3.0) => (RatioBand::Strong, "Conservative leverage"),
        Some(v) if v <= dec!(5.0) => (RatioBand::Adequate, "Moderate leverage"),
        Some(_) => (RatioBand::Weak, "High leverage risk"),
    };
    reading(value, band, comment)
}

fn grade_interest_coverage(value: Option<Multiple>) -> RatioReading {
    let (band, comment) = match value {
        None => (RatioBand::Unavailable, "Ratio unavailable (no interest expense)"),
        Some(v) if v >= dec!(3.0) => (RatioBand::Strong, "Strong interest coverage"),
        Some(v) if v >= dec!(1.5) => (RatioBand::Adequate, "Adequate coverage"),
        Some(_) => (RatioBand::Weak, "Weak interest coverage"),
    };
    reading(value, band, comment)
}

fn reading(value: Option<Multiple>, band: RatioBand, comment: &str) -> RatioReading {
    RatioReading {
        value,
        display: format_multiple(value),
        band,
        comment: comment.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
