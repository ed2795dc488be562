use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::risk::{CompanyProfile, LoanPurpose, RiskAssessment, RiskLevel};
use crate::AuraError;

pub const AMORTIZATION: &str = "Quarterly principal payments";
pub const COLLATERAL: &str = "First lien on all company assets";

// ---------------------------------------------------------------------------
// Term menus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tenor {
    #[serde(rename = "3 years")]
    ThreeYears,
    #[serde(rename = "5 years")]
    FiveYears,
    #[serde(rename = "7 years")]
    SevenYears,
}

impl Tenor {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => Self::ThreeYears,
            RiskLevel::Moderate => Self::FiveYears,
            RiskLevel::Low => Self::SevenYears,
        }
    }

    pub fn years(&self) -> u32 {
        match self {
            Self::ThreeYears => 3,
            Self::FiveYears => 5,
            Self::SevenYears => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeYears => "3 years",
            Self::FiveYears => "5 years",
            Self::SevenYears => "7 years",
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenor {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "3" | "3y" | "3 years" => Ok(Self::ThreeYears),
            "5" | "5y" | "5 years" => Ok(Self::FiveYears),
            "7" | "7y" | "7 years" => Ok(Self::SevenYears),
            other => Err(AuraError::InvalidInput {
                field: "tenor".into(),
                reason: format!("'{other}' is not one of 3, 5 or 7 years"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Margin {
    #[serde(rename = "SOFR + 350 bps")]
    Sofr350,
    #[serde(rename = "SOFR + 250 bps")]
    Sofr250,
    #[serde(rename = "SOFR + 175 bps")]
    Sofr175,
}

impl Margin {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => Self::Sofr350,
            RiskLevel::Moderate => Self::Sofr250,
            RiskLevel::Low => Self::Sofr175,
        }
    }

    pub fn basis_points(&self) -> u32 {
        match self {
            Self::Sofr350 => 350,
            Self::Sofr250 => 250,
            Self::Sofr175 => 175,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sofr350 => "SOFR + 350 bps",
            Self::Sofr250 => "SOFR + 250 bps",
            Self::Sofr175 => "SOFR + 175 bps",
        }
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Margin {
    type Err = AuraError;

    /// Accepts a bare spread ("250") or the full label ("SOFR + 250 bps").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "350" => Ok(Self::Sofr350),
            "250" => Ok(Self::Sofr250),
            "175" => Ok(Self::Sofr175),
            _ => Err(AuraError::InvalidInput {
                field: "margin".into(),
                reason: format!("'{}' is not one of 175, 250 or 350 bps", s.trim()),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Covenant {
    #[serde(rename = "Debt Service Coverage Ratio (DSCR) > 1.2x")]
    MinimumDscr,
    #[serde(rename = "Minimum liquidity of $2M at all times")]
    MinimumLiquidity,
    #[serde(rename = "Quarterly financial reporting required")]
    QuarterlyReporting,
    #[serde(rename = "No dividends without lender approval")]
    DividendRestriction,
    #[serde(rename = "Maximum Capital Expenditure limit")]
    CapexLimit,
    #[serde(rename = "No additional acquisitions without lender approval")]
    AcquisitionRestriction,
    #[serde(rename = "Inventory turnover monitoring")]
    InventoryTurnover,
}

impl Covenant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinimumDscr => "Debt Service Coverage Ratio (DSCR) > 1.2x",
            Self::MinimumLiquidity => "Minimum liquidity of $2M at all times",
            Self::QuarterlyReporting => "Quarterly financial reporting required",
            Self::DividendRestriction => "No dividends without lender approval",
            Self::CapexLimit => "Maximum Capital Expenditure limit",
            Self::AcquisitionRestriction => "No additional acquisitions without lender approval",
            Self::InventoryTurnover => "Inventory turnover monitoring",
        }
    }
}

impl fmt::Display for Covenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input / Output structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub tenor: Tenor,
    pub margin: Margin,
    pub amortization: String,
    pub collateral: String,
    pub covenants: Vec<Covenant>,
}

/// Manual replacements for the suggested tenor or margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenor: Option<Tenor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
}

impl TermOverrides {
    pub fn is_empty(&self) -> bool {
        self.tenor.is_none() && self.margin.is_none()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Structure loan terms from the risk score and the loan purpose.
///
/// The tier is re-derived from `assessment.score` so terms always follow the
/// score thresholds even if the stored level was edited.
pub fn generate_terms(profile: &CompanyProfile, assessment: &RiskAssessment) -> LoanTerms {
    let level = RiskLevel::from_score(assessment.score);

    let mut covenants = vec![Covenant::MinimumDscr];

    if level >= RiskLevel::Moderate {
        covenants.push(Covenant::MinimumLiquidity);
        covenants.push(Covenant::QuarterlyReporting);
    }
    if level == RiskLevel::High {
        covenants.push(Covenant::DividendRestriction);
        covenants.push(Covenant::CapexLimit);
    }

    match profile.purpose {
        LoanPurpose::Acquisition => covenants.push(Covenant::AcquisitionRestriction),
        LoanPurpose::WorkingCapital => covenants.push(Covenant::InventoryTurnover),
        _ => {}
    }

    LoanTerms {
        tenor: Tenor::for_level(level),
        margin: Margin::for_level(level),
        amortization: AMORTIZATION.to_string(),
        collateral: COLLATERAL.to_string(),
        covenants,
    }
}

/// Generate terms, then apply any manual tenor/margin overrides.
pub fn generate_terms_with_overrides(
    profile: &CompanyProfile,
    assessment: &RiskAssessment,
    overrides: &TermOverrides,
) -> LoanTerms {
    let mut terms = generate_terms(profile, assessment);
    if let Some(tenor) = overrides.tenor {
        terms.tenor = tenor;
    }
    if let Some(margin) = overrides.margin {
        terms.margin = margin;
    }
    terms
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::risk::{score_company, Industry, ScoreBreakdown};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn profile(purpose: LoanPurpose) -> CompanyProfile {
        CompanyProfile {
            name: "Northwind Traders".to_string(),
            industry: Industry::Finance,
            annual_revenue: dec!(80),
            loan_amount: dec!(10),
            purpose,
            years_in_business: 20,
            employee_count: 300,
        }
    }

    fn assessment(score: u32) -> RiskAssessment {
        let level = RiskLevel::from_score(score);
        RiskAssessment {
            score,
            level,
            factors: vec![],
            recommendation: level.recommendation().to_string(),
            breakdown: ScoreBreakdown::default(),
            loan_to_revenue_pct: None,
        }
    }

    #[test]
    fn test_tenor_and_margin_step_function() {
        let p = profile(LoanPurpose::Expansion);
        let cases = [
            (0, Tenor::SevenYears, Margin::Sofr175),
            (35, Tenor::SevenYears, Margin::Sofr175),
            (36, Tenor::FiveYears, Margin::Sofr250),
            (60, Tenor::FiveYears, Margin::Sofr250),
            (61, Tenor::ThreeYears, Margin::Sofr350),
            (120, Tenor::ThreeYears, Margin::Sofr350),
        ];
        for (score, tenor, margin) in cases {
            let t = generate_terms(&p, &assessment(score));
            assert_eq!(t.tenor, tenor, "tenor at score {score}");
            assert_eq!(t.margin, margin, "margin at score {score}");
        }
    }

    #[test]
    fn test_low_risk_has_only_base_covenant() {
        let t = generate_terms(&profile(LoanPurpose::Expansion), &assessment(10));
        assert_eq!(t.covenants, vec![Covenant::MinimumDscr]);
        assert_eq!(t.amortization, "Quarterly principal payments");
        assert_eq!(t.collateral, "First lien on all company assets");
    }

    #[test]
    fn test_high_risk_covenant_order() {
        let t = generate_terms(&profile(LoanPurpose::WorkingCapital), &assessment(85));
        assert_eq!(
            t.covenants,
            vec![
                Covenant::MinimumDscr,
                Covenant::MinimumLiquidity,
                Covenant::QuarterlyReporting,
                Covenant::DividendRestriction,
                Covenant::CapexLimit,
                Covenant::InventoryTurnover,
            ]
        );
    }

    #[test]
    fn test_acquisition_always_restricts_acquisitions() {
        for score in [0, 35, 36, 60, 61, 90] {
            let t = generate_terms(&profile(LoanPurpose::Acquisition), &assessment(score));
            assert!(
                t.covenants.contains(&Covenant::AcquisitionRestriction),
                "missing at score {score}"
            );
        }
    }

    #[test]
    fn test_terms_follow_score_not_stored_level() {
        let mut a = assessment(70);
        a.level = RiskLevel::Low;
        let t = generate_terms(&profile(LoanPurpose::Expansion), &a);
        assert_eq!(t.tenor, Tenor::ThreeYears);
    }

    #[test]
    fn test_overrides_replace_only_tenor_and_margin() {
        let p = profile(LoanPurpose::Expansion);
        let a = score_company(&p);
        let overrides = TermOverrides {
            tenor: Some(Tenor::FiveYears),
            margin: None,
        };
        let t = generate_terms_with_overrides(&p, &a, &overrides);
        let base = generate_terms(&p, &a);
        assert_eq!(t.tenor, Tenor::FiveYears);
        assert_eq!(t.margin, base.margin);
        assert_eq!(t.covenants, base.covenants);
    }

    #[test]
    fn test_covenants_serialize_as_text() {
        let json = serde_json::to_value(Covenant::MinimumDscr).unwrap();
        assert_eq!(json, "Debt Service Coverage Ratio (DSCR) > 1.2x");
        assert!(Covenant::MinimumDscr.as_str().contains("DSCR > 1.2x"));
    }

    #[test]
    fn test_parse_tenor_and_margin() {
        assert_eq!("5 years".parse::<Tenor>().unwrap(), Tenor::FiveYears);
        assert_eq!("7".parse::<Tenor>().unwrap(), Tenor::SevenYears);
        assert!("10 years".parse::<Tenor>().is_err());
        assert_eq!("SOFR + 250 bps".parse::<Margin>().unwrap(), Margin::Sofr250);
        assert_eq!("175".parse::<Margin>().unwrap(), Margin::Sofr175);
        assert!("200".parse::<Margin>().is_err());
        for off_menu in ["150", "SOFR + 300 bps"] {
            assert!(off_menu.parse::<Margin>().is_err());
        }
    }
}
