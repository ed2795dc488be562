//! Narrative explanations of a credit decision.
//!
//! Every strategy implements [`ExplanationProvider`] and always returns text;
//! strategies that depend on an outside service fall back to the
//! deterministic [`template::TemplateExplainer`] instead of failing.

pub mod assisted;
pub mod template;

#[cfg(feature = "llm")]
pub mod openai;

use crate::credit::{CompanyProfile, LoanTerms, RiskAssessment};

pub use assisted::{AssistedExplainer, GenerationRequest, TextGenerator};
pub use template::TemplateExplainer;

/// The three inputs every explanation is built from.
#[derive(Debug, Clone, Copy)]
pub struct CreditCase<'a> {
    pub profile: &'a CompanyProfile,
    pub assessment: &'a RiskAssessment,
    pub terms: &'a LoanTerms,
}

impl<'a> CreditCase<'a> {
    pub fn new(
        profile: &'a CompanyProfile,
        assessment: &'a RiskAssessment,
        terms: &'a LoanTerms,
    ) -> Self {
        Self {
            profile,
            assessment,
            terms,
        }
    }
}

pub trait ExplanationProvider {
    /// Strategy name for logs and audit records.
    fn name(&self) -> &'static str;

    /// Produce the explanation text. Never fails.
    fn explain(&self, case: &CreditCase<'_>) -> String;
}

impl<T: ExplanationProvider + ?Sized> ExplanationProvider for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn explain(&self, case: &CreditCase<'_>) -> String {
        (**self).explain(case)
    }
}
