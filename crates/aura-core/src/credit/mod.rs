//! Credit engine: headline ratios, point-based risk scoring and term structuring.

pub mod ratios;
pub mod risk;
pub mod terms;

pub use ratios::{calculate_ratios, FinancialRatios, FinancialRatiosInput};
pub use risk::{
    analyze_risk, score_company, CompanyApplication, CompanyProfile, Industry, LoanPurpose,
    RiskAssessment, RiskLevel,
};
pub use terms::{generate_terms, generate_terms_with_overrides, Covenant, LoanTerms, Margin, Tenor, TermOverrides};
