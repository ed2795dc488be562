use chrono::{DateTime, Utc};
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use aura_core::credit::{
    CompanyApplication, CompanyProfile, FinancialRatiosInput, LoanTerms, RiskAssessment,
    TermOverrides,
};
use aura_core::explain::{CreditCase, ExplanationProvider, TemplateExplainer};
use aura_core::identity::Role;
use aura_core::termsheet::{DocumentFormat, TermSheet};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct TermsRequest {
    profile: CompanyProfile,
    assessment: RiskAssessment,
    #[serde(default)]
    overrides: TermOverrides,
}

#[derive(Deserialize)]
struct CaseRequest {
    profile: CompanyProfile,
    assessment: RiskAssessment,
    terms: LoanTerms,
}

#[derive(Deserialize)]
struct TermSheetRequest {
    profile: CompanyProfile,
    assessment: RiskAssessment,
    #[serde(default)]
    overrides: TermOverrides,
    /// Falls back to the template explanation when absent.
    explanation: Option<String>,
    generated_by: String,
    /// Role of `generated_by`; only managers and admins may author sheets.
    role: String,
    generated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Credit
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_risk(input_json: String) -> NapiResult<String> {
    let input: CompanyApplication = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = aura_core::credit::analyze_risk(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_ratios(input_json: String) -> NapiResult<String> {
    let input: FinancialRatiosInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = aura_core::credit::calculate_ratios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_terms(input_json: String) -> NapiResult<String> {
    let input: TermsRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let terms = aura_core::credit::generate_terms_with_overrides(
        &input.profile,
        &input.assessment,
        &input.overrides,
    );
    serde_json::to_string(&terms).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Explanations and documents
// ---------------------------------------------------------------------------

#[napi]
pub fn explain_template(input_json: String) -> NapiResult<String> {
    let input: CaseRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let case = CreditCase::new(&input.profile, &input.assessment, &input.terms);
    Ok(TemplateExplainer.explain(&case))
}

/// Render a term sheet as plain text. `generated_at` defaults to now.
///
/// The other entry points are pure computations and leave authorization to
/// the host; this one checks the caller's `role` before rendering.
#[napi]
pub fn render_term_sheet_text(input_json: String) -> NapiResult<String> {
    let input: TermSheetRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let role: Role = input.role.parse().map_err(to_napi_error)?;
    aura_core::termsheet::authorize(role).map_err(to_napi_error)?;
    let terms = aura_core::credit::generate_terms_with_overrides(
        &input.profile,
        &input.assessment,
        &input.overrides,
    );
    let explanation = input.explanation.unwrap_or_else(|| {
        TemplateExplainer.explain(&CreditCase::new(&input.profile, &input.assessment, &terms))
    });
    let sheet = TermSheet::new(
        input.profile,
        input.assessment,
        terms,
        explanation,
        input.generated_by,
        input.generated_at.unwrap_or_else(Utc::now),
    );
    String::from_utf8(sheet.render(DocumentFormat::Text)).map_err(to_napi_error)
}
