use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::{types::*, AuraError, AuraResult, ValidationErrors};
use super::ratios::saturating_div;

/// Scores strictly above this are at least moderate risk.
pub const MODERATE_RISK_THRESHOLD: u32 = 35;

/// Scores strictly above this are high risk.
pub const HIGH_RISK_THRESHOLD: u32 = 60;

const LOW_REVENUE_POINTS: u32 = 30;
const MODERATE_REVENUE_POINTS: u32 = 15;
const HIGH_LTV_POINTS: u32 = 25;
const MODERATE_LTV_POINTS: u32 = 10;
const VOLATILE_SECTOR_POINTS: u32 = 20;
const WORKING_CAPITAL_POINTS: u32 = 10;

const LOW_REVENUE_CEILING: Money = dec!(10);
const MODERATE_REVENUE_CEILING: Money = dec!(50);
const HIGH_LTV_FLOOR: Percent = dec!(50);
const MODERATE_LTV_FLOOR: Percent = dec!(25);

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    Manufacturing,
    #[serde(rename = "IT Services")]
    ItServices,
    Healthcare,
    Energy,
    Retail,
    Construction,
    Hospitality,
    Finance,
    #[serde(rename = "Real Estate")]
    RealEstate,
}

impl Industry {
    pub const ALL: [Industry; 9] = [
        Industry::Manufacturing,
        Industry::ItServices,
        Industry::Healthcare,
        Industry::Energy,
        Industry::Retail,
        Industry::Construction,
        Industry::Hospitality,
        Industry::Finance,
        Industry::RealEstate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturing => "Manufacturing",
            Self::ItServices => "IT Services",
            Self::Healthcare => "Healthcare",
            Self::Energy => "Energy",
            Self::Retail => "Retail",
            Self::Construction => "Construction",
            Self::Hospitality => "Hospitality",
            Self::Finance => "Finance",
            Self::RealEstate => "Real Estate",
        }
    }

    /// Sectors scored as volatile.
    pub fn is_volatile(&self) -> bool {
        matches!(self, Self::Energy | Self::Hospitality | Self::Retail)
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| AuraError::InvalidInput {
                field: "industry".into(),
                reason: format!("Unknown industry '{wanted}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanPurpose {
    #[serde(rename = "Working Capital")]
    WorkingCapital,
    #[serde(rename = "Equipment Purchase")]
    EquipmentPurchase,
    Expansion,
    Acquisition,
    Refinancing,
    #[serde(rename = "Real Estate")]
    RealEstate,
}

impl LoanPurpose {
    pub const ALL: [LoanPurpose; 6] = [
        LoanPurpose::WorkingCapital,
        LoanPurpose::EquipmentPurchase,
        LoanPurpose::Expansion,
        LoanPurpose::Acquisition,
        LoanPurpose::Refinancing,
        LoanPurpose::RealEstate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkingCapital => "Working Capital",
            Self::EquipmentPurchase => "Equipment Purchase",
            Self::Expansion => "Expansion",
            Self::Acquisition => "Acquisition",
            Self::Refinancing => "Refinancing",
            Self::RealEstate => "Real Estate",
        }
    }
}

impl fmt::Display for LoanPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanPurpose {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| AuraError::InvalidInput {
                field: "purpose".into(),
                reason: format!("Unknown loan purpose '{wanted}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "LOW RISK")]
    Low,
    #[serde(rename = "MODERATE RISK")]
    Moderate,
    #[serde(rename = "HIGH RISK")]
    High,
}

impl RiskLevel {
    /// Both thresholds are exclusive: 35 is low, 60 is moderate.
    pub fn from_score(score: u32) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MODERATE_RISK_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::High => "Proceed with caution",
            Self::Moderate => "Proceed with standard terms",
            Self::Low => "Proceed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW RISK",
            Self::Moderate => "MODERATE RISK",
            Self::High => "HIGH RISK",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input / Output structs
// ---------------------------------------------------------------------------

/// Raw loan application as captured from a form or JSON payload.
///
/// Nothing is trusted here; [`CompanyProfile::from_application`] checks every
/// field and reports all problems together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyApplication {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub revenue: Option<Money>,
    pub loan_amount: Option<Money>,
    pub purpose: Option<String>,
    pub years_in_business: Option<i64>,
    pub employees: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub industry: Industry,
    /// Annual revenue, $M.
    pub annual_revenue: Money,
    /// Requested facility, $M.
    pub loan_amount: Money,
    pub purpose: LoanPurpose,
    pub years_in_business: u32,
    pub employee_count: u32,
}

/// Points contributed by each scoring rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub revenue: u32,
    pub leverage: u32,
    pub industry: u32,
    pub purpose: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.revenue + self.leverage + self.industry + self.purpose
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    /// One entry per rule, in rule order: revenue, leverage, industry, purpose.
    pub factors: Vec<String>,
    pub recommendation: String,
    pub breakdown: ScoreBreakdown,
    /// Loan as a percentage of annual revenue; `None` when revenue is zero.
    pub loan_to_revenue_pct: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysisOutput {
    pub profile: CompanyProfile,
    pub assessment: RiskAssessment,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl CompanyProfile {
    /// Validate a raw application, collecting every violation.
    pub fn from_application(app: &CompanyApplication) -> AuraResult<Self> {
        let mut errors = ValidationErrors::new();

        let name = app
            .company_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            errors.push("company_name", "Company name is required");
        }

        let industry = match app.industry.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("industry", "Industry is required");
                None
            }
            Some(raw) => match raw.parse::<Industry>() {
                Ok(i) => Some(i),
                Err(_) => {
                    errors.push("industry", format!("Unknown industry '{raw}'"));
                    None
                }
            },
        };

        let purpose = match app.purpose.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("purpose", "Loan purpose is required");
                None
            }
            Some(raw) => match raw.parse::<LoanPurpose>() {
                Ok(p) => Some(p),
                Err(_) => {
                    errors.push("purpose", format!("Unknown loan purpose '{raw}'"));
                    None
                }
            },
        };

        let revenue = app.revenue.unwrap_or(Decimal::ZERO);
        if revenue <= Decimal::ZERO {
            errors.push("revenue", "Revenue must be greater than 0");
        }

        let loan_amount = app.loan_amount.unwrap_or(Decimal::ZERO);
        if loan_amount <= Decimal::ZERO {
            errors.push("loan_amount", "Loan amount must be greater than 0");
        }

        let years = app.years_in_business.unwrap_or(0);
        if years < 0 {
            errors.push("years_in_business", "Years in business cannot be negative");
        }

        let employees = app.employees.unwrap_or(0);
        if employees < 0 {
            errors.push("employees", "Employee count cannot be negative");
        }

        let years_in_business = u32::try_from(years.max(0)).unwrap_or_else(|_| {
            errors.push("years_in_business", "Years in business is out of range");
            0
        });
        let employee_count = u32::try_from(employees.max(0)).unwrap_or_else(|_| {
            errors.push("employees", "Employee count is out of range");
            0
        });

        match (industry, purpose) {
            (Some(industry), Some(purpose)) if errors.is_empty() => Ok(CompanyProfile {
                name,
                industry,
                annual_revenue: revenue,
                loan_amount,
                purpose,
                years_in_business,
                employee_count,
            }),
            _ => Err(AuraError::Validation(errors)),
        }
    }

    /// Loan as a percentage of revenue, `None` when revenue is not positive.
    /// Saturates at `Decimal::MAX` when the percentage does not fit.
    pub fn loan_to_revenue_pct(&self) -> Option<Percent> {
        if self.annual_revenue > Decimal::ZERO {
            let share = saturating_div(self.loan_amount, self.annual_revenue);
            Some(share.checked_mul(dec!(100)).unwrap_or(Decimal::MAX))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a validated profile. Pure: identical profiles give identical output.
pub fn score_company(profile: &CompanyProfile) -> RiskAssessment {
    let mut breakdown = ScoreBreakdown::default();
    let mut factors: Vec<String> = Vec::with_capacity(4);

    // Revenue band
    let revenue = profile.annual_revenue;
    if revenue < LOW_REVENUE_CEILING {
        breakdown.revenue = LOW_REVENUE_POINTS;
        factors.push("Low revenue base (<$10M)".into());
    } else if revenue < MODERATE_REVENUE_CEILING {
        breakdown.revenue = MODERATE_REVENUE_POINTS;
        factors.push("Moderate revenue ($10M-$50M)".into());
    } else {
        factors.push("Strong revenue base (>$50M)".into());
    }

    // Loan-to-revenue
    let loan_to_revenue_pct = profile.loan_to_revenue_pct();
    if let Some(ltv) = loan_to_revenue_pct {
        let shown = format_pct(ltv);
        if ltv > HIGH_LTV_FLOOR {
            breakdown.leverage = HIGH_LTV_POINTS;
            factors.push(format!("High loan-to-revenue ratio ({shown}%)"));
        } else if ltv > MODERATE_LTV_FLOOR {
            breakdown.leverage = MODERATE_LTV_POINTS;
            factors.push(format!("Moderate leverage ({shown}%)"));
        } else {
            factors.push(format!("Conservative leverage ({shown}%)"));
        }
    }

    // Industry
    if profile.industry.is_volatile() {
        breakdown.industry = VOLATILE_SECTOR_POINTS;
        factors.push(format!("{} sector volatility", profile.industry));
    } else {
        factors.push(format!("{} sector stability", profile.industry));
    }

    // Purpose
    if profile.purpose == LoanPurpose::WorkingCapital {
        breakdown.purpose = WORKING_CAPITAL_POINTS;
        factors.push("Working capital refinancing risk".into());
    }

    let score = breakdown.total();
    let level = RiskLevel::from_score(score);

    RiskAssessment {
        score,
        level,
        factors,
        recommendation: level.recommendation().to_string(),
        breakdown,
        loan_to_revenue_pct,
    }
}

/// Validate an application and score it, wrapped in the standard envelope.
pub fn analyze_risk(
    application: &CompanyApplication,
) -> AuraResult<ComputationOutput<RiskAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let profile = CompanyProfile::from_application(application)?;
    let assessment = score_company(&profile);

    if let Some(ltv) = assessment.loan_to_revenue_pct {
        if ltv > dec!(100) {
            warnings.push(format!(
                "Loan amount (${}M) exceeds annual revenue (${}M)",
                profile.loan_amount, profile.annual_revenue
            ));
        }
    }
    if profile.years_in_business == 0 {
        warnings.push("No operating history recorded; years in business is zero.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "moderate_threshold": MODERATE_RISK_THRESHOLD,
        "high_threshold": HIGH_RISK_THRESHOLD,
        "volatile_sectors": ["Energy", "Hospitality", "Retail"],
        "score_cap": "none",
    });

    Ok(with_metadata(
        "Additive point-based credit risk scoring",
        &assumptions,
        warnings,
        elapsed,
        RiskAnalysisOutput {
            profile,
            assessment,
        },
    ))
}

/// One-decimal percentage, rounding half away from zero.
pub fn format_pct(value: Percent) -> String {
    format!(
        "{:.1}",
        value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile(revenue: Decimal, loan: Decimal) -> CompanyProfile {
        CompanyProfile {
            name: "Acme Fabrication".to_string(),
            industry: Industry::Manufacturing,
            annual_revenue: revenue,
            loan_amount: loan,
            purpose: LoanPurpose::Expansion,
            years_in_business: 12,
            employee_count: 80,
        }
    }

    fn application() -> CompanyApplication {
        CompanyApplication {
            company_name: Some("Acme Fabrication".into()),
            industry: Some("Manufacturing".into()),
            revenue: Some(dec!(25)),
            loan_amount: Some(dec!(5)),
            purpose: Some("Expansion".into()),
            years_in_business: Some(5),
            employees: Some(50),
        }
    }

    #[test]
    fn test_revenue_bands() {
        // Loan kept tiny so leverage adds nothing
        assert_eq!(score_company(&profile(dec!(9.99), dec!(0.1))).breakdown.revenue, 30);
        assert_eq!(score_company(&profile(dec!(10), dec!(0.1))).breakdown.revenue, 15);
        assert_eq!(score_company(&profile(dec!(49.9), dec!(0.1))).breakdown.revenue, 15);
        assert_eq!(score_company(&profile(dec!(50), dec!(0.1))).breakdown.revenue, 0);
    }

    #[test]
    fn test_ltv_boundaries_use_strict_comparisons() {
        let at_fifty = score_company(&profile(dec!(100), dec!(50)));
        assert_eq!(at_fifty.breakdown.leverage, 10);
        assert_eq!(at_fifty.factors[1], "Moderate leverage (50.0%)");

        let at_twenty_five = score_company(&profile(dec!(100), dec!(25)));
        assert_eq!(at_twenty_five.breakdown.leverage, 0);
        assert_eq!(at_twenty_five.factors[1], "Conservative leverage (25.0%)");

        let above_fifty = score_company(&profile(dec!(100), dec!(50.1)));
        assert_eq!(above_fifty.breakdown.leverage, 25);
        assert_eq!(above_fifty.factors[1], "High loan-to-revenue ratio (50.1%)");
    }

    #[test]
    fn test_ltv_percentage_one_decimal() {
        // 1 / 3 = 33.333...%
        let a = score_company(&profile(dec!(60), dec!(20)));
        assert_eq!(a.factors[1], "Moderate leverage (33.3%)");
    }

    #[test]
    fn test_zero_revenue_skips_leverage_rule() {
        let a = score_company(&profile(Decimal::ZERO, dec!(5)));
        assert_eq!(a.loan_to_revenue_pct, None);
        assert_eq!(a.factors.len(), 2);
        assert_eq!(a.score, 30);
    }

    #[test]
    fn test_level_thresholds_are_exclusive() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(35), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(36), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
    }

    #[test]
    fn test_recommendation_per_level() {
        assert_eq!(RiskLevel::High.recommendation(), "Proceed with caution");
        assert_eq!(RiskLevel::Moderate.recommendation(), "Proceed with standard terms");
        assert_eq!(RiskLevel::Low.recommendation(), "Proceed");
    }

    #[test]
    fn test_factor_order_is_fixed() {
        let p = CompanyProfile {
            industry: Industry::Retail,
            purpose: LoanPurpose::WorkingCapital,
            ..profile(dec!(30), dec!(9))
        };
        let a = score_company(&p);
        assert_eq!(
            a.factors,
            vec![
                "Moderate revenue ($10M-$50M)".to_string(),
                "Moderate leverage (30.0%)".to_string(),
                "Retail sector volatility".to_string(),
                "Working capital refinancing risk".to_string(),
            ]
        );
        assert_eq!(a.score, 15 + 10 + 20 + 10);
        assert_eq!(a.level, RiskLevel::Moderate);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let p = profile(dec!(12), dec!(7));
        let first = serde_json::to_string(&score_company(&p)).unwrap();
        let second = serde_json::to_string(&score_company(&p)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_more_revenue_never_raises_score() {
        let loan = dec!(8);
        let mut previous = u32::MAX;
        for revenue in [dec!(1), dec!(5), dec!(10), dec!(16), dec!(32), dec!(50), dec!(200)] {
            let score = score_company(&profile(revenue, loan)).score;
            assert!(score <= previous, "score rose to {score} at revenue {revenue}");
            previous = score;
        }
    }

    #[test]
    fn test_industry_and_purpose_parse_case_insensitively() {
        assert_eq!("it services".parse::<Industry>().unwrap(), Industry::ItServices);
        assert_eq!(" Real Estate ".parse::<Industry>().unwrap(), Industry::RealEstate);
        assert_eq!(
            "working capital".parse::<LoanPurpose>().unwrap(),
            LoanPurpose::WorkingCapital
        );
        assert!("Mining".parse::<Industry>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&Industry::ItServices).unwrap();
        assert_eq!(json, "\"IT Services\"");
        let level = serde_json::to_string(&RiskLevel::Moderate).unwrap();
        assert_eq!(level, "\"MODERATE RISK\"");
    }

    #[test]
    fn test_validation_collects_every_error() {
        let app = CompanyApplication {
            company_name: Some("   ".into()),
            industry: None,
            revenue: Some(Decimal::ZERO),
            loan_amount: Some(dec!(-1)),
            purpose: Some("Expansion".into()),
            years_in_business: Some(-2),
            employees: None,
        };
        match CompanyProfile::from_application(&app).unwrap_err() {
            AuraError::Validation(errors) => {
                assert_eq!(errors.len(), 5);
                assert!(errors.has_field("company_name"));
                assert!(errors.has_field("industry"));
                assert!(errors.has_field("revenue"));
                assert!(errors.has_field("loan_amount"));
                assert!(errors.has_field("years_in_business"));
            }
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_industry_is_a_validation_error() {
        let mut app = application();
        app.industry = Some("Mining".into());
        match CompanyProfile::from_application(&app).unwrap_err() {
            AuraError::Validation(errors) => {
                assert_eq!(errors.issues[0].message, "Unknown industry 'Mining'");
            }
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_analyze_risk_wraps_profile_and_assessment() {
        let out = analyze_risk(&application()).unwrap();
        let r = &out.result;
        assert_eq!(r.profile.industry, Industry::Manufacturing);
        // 15 (moderate revenue) + 0 (20% ltv) + 0 + 0
        assert_eq!(r.assessment.score, 15);
        assert_eq!(r.assessment.level, RiskLevel::Low);
        assert!(out.warnings.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_loan_above_revenue_is_a_warning() {
        let mut app = application();
        app.loan_amount = Some(dec!(30));
        let out = analyze_risk(&app).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("exceeds annual revenue")));
    }
}
