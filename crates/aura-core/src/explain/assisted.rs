use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::template::TemplateExplainer;
use super::{CreditCase, ExplanationProvider};
use crate::{AuraError, AuraResult};

/// Role context sent ahead of every prompt.
pub const SYSTEM_ROLE: &str =
    "You are an expert commercial credit analyst with 20 years of experience in corporate lending.";

/// Output constraints sent ahead of every prompt.
pub const SYSTEM_CONSTRAINTS: &str =
    "Use professional banking terminology. Be concise but thorough. Do not invent figures that \
     are not present in the application.";

/// A single request to an external text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fixed system instructions: role context, then constraints.
    pub system: [String; 2],
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: [SYSTEM_ROLE.to_string(), SYSTEM_CONSTRAINTS.to_string()],
            prompt: prompt.into(),
        }
    }
}

/// External text-generation collaborator.
pub trait TextGenerator {
    fn name(&self) -> &'static str;

    /// Blocking request/response. No retries are expected from implementors.
    fn generate(&self, request: &GenerationRequest) -> AuraResult<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn generate(&self, request: &GenerationRequest) -> AuraResult<String> {
        (**self).generate(request)
    }
}

/// Explanation written by an external generator, with the template as a
/// silent fallback on any failure.
pub struct AssistedExplainer<G> {
    generator: Result<G, AuraError>,
    template: TemplateExplainer,
}

impl<G: TextGenerator> AssistedExplainer<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator: Ok(generator),
            template: TemplateExplainer,
        }
    }

    /// Build from a fallible generator constructor, e.g. one that reads an API
    /// key from the environment. A construction error is kept and logged on
    /// every explanation instead of being surfaced.
    pub fn from_result(generator: AuraResult<G>) -> Self {
        Self {
            generator,
            template: TemplateExplainer,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.generator.is_ok()
    }

    fn try_generate(&self, case: &CreditCase<'_>) -> AuraResult<String> {
        let generator = self
            .generator
            .as_ref()
            .map_err(|e| AuraError::ExternalService(format!("generator unavailable: {e}")))?;

        let request = GenerationRequest::new(build_prompt(case));
        let text = generator.generate(&request)?;
        if text.trim().is_empty() {
            return Err(AuraError::ExternalService(format!(
                "{} returned an empty response",
                generator.name()
            )));
        }
        debug!(provider = generator.name(), chars = text.len(), "explanation generated");
        Ok(text)
    }
}

impl<G: TextGenerator> ExplanationProvider for AssistedExplainer<G> {
    fn name(&self) -> &'static str {
        "assisted"
    }

    fn explain(&self, case: &CreditCase<'_>) -> String {
        match self.try_generate(case) {
            Ok(text) => text,
            Err(cause) => {
                warn!(%cause, company = %case.profile.name, "text generation failed, using template explanation");
                self.template.explain(case)
            }
        }
    }
}

/// Structured prompt carrying the profile, the assessment and the terms.
pub fn build_prompt(case: &CreditCase<'_>) -> String {
    let p = case.profile;
    let a = case.assessment;
    let t = case.terms;

    let mut prompt = String::with_capacity(1024);
    let _ = write!(
        prompt,
        "Analyze the following loan application and provide a detailed, professional \
         explanation of the credit decision.\n\n\
         Company Information:\n\
         - Name: {name}\n\
         - Industry: {industry}\n\
         - Annual Revenue: ${revenue}M\n\
         - Years in Business: {years}\n\
         - Employees: {employees}\n\
         - Loan Amount Requested: ${loan}M\n\
         - Purpose: {purpose}\n\n\
         Risk Assessment:\n\
         - Risk Level: {level}\n\
         - Risk Score: {score}/100\n\
         - Key Risk Factors:\n",
        name = p.name,
        industry = p.industry,
        revenue = p.annual_revenue.normalize(),
        years = p.years_in_business,
        employees = p.employee_count,
        loan = p.loan_amount.normalize(),
        purpose = p.purpose,
        level = a.level,
        score = a.score,
    );
    for factor in &a.factors {
        let _ = writeln!(prompt, "  - {factor}");
    }

    let covenants: Vec<&str> = t.covenants.iter().map(|c| c.as_str()).collect();
    let _ = write!(
        prompt,
        "\nProposed Loan Terms:\n\
         - Tenor: {tenor}\n\
         - Interest Rate: {margin}\n\
         - Amortization: {amortization}\n\
         - Collateral: {collateral}\n\
         - Covenants: {covenants}\n\n\
         Please provide:\n\
         1. Executive Summary (2-3 sentences)\n\
         2. Detailed Risk Analysis\n\
         3. Rationale for Each Term (Tenor, Interest Rate, Covenants)\n\
         4. Final Recommendation\n",
        tenor = t.tenor,
        margin = t.margin,
        amortization = t.amortization,
        collateral = t.collateral,
        covenants = covenants.join(", "),
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::risk::{score_company, CompanyProfile, Industry, LoanPurpose};
    use crate::credit::terms::generate_terms;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    struct Scripted {
        reply: AuraResult<String>,
        seen: RefCell<Vec<GenerationRequest>>,
    }

    impl Scripted {
        fn replying(reply: AuraResult<String>) -> Self {
            Self {
                reply,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn generate(&self, request: &GenerationRequest) -> AuraResult<String> {
            self.seen.borrow_mut().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AuraError::ExternalService(e.to_string())),
            }
        }
    }

    fn with_case<R>(f: impl FnOnce(&CreditCase<'_>) -> R) -> R {
        let profile = CompanyProfile {
            name: "Harbor Freight Lines".to_string(),
            industry: Industry::Energy,
            annual_revenue: dec!(40),
            loan_amount: dec!(12),
            purpose: LoanPurpose::Acquisition,
            years_in_business: 9,
            employee_count: 140,
        };
        let assessment = score_company(&profile);
        let terms = generate_terms(&profile, &assessment);
        f(&CreditCase::new(&profile, &assessment, &terms))
    }

    #[test]
    fn test_generated_text_is_returned() {
        let explainer = AssistedExplainer::new(Scripted::replying(Ok("Approve.".into())));
        let text = with_case(|case| explainer.explain(case));
        assert_eq!(text, "Approve.");
    }

    #[test]
    fn test_request_carries_two_system_instructions_and_all_inputs() {
        let generator = Scripted::replying(Ok("ok".into()));
        let explainer = AssistedExplainer::new(generator);
        with_case(|case| explainer.explain(case));

        let generator = explainer.generator.as_ref().unwrap();
        let seen = generator.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system[0], SYSTEM_ROLE);
        assert_eq!(seen[0].system[1], SYSTEM_CONSTRAINTS);
        let prompt = &seen[0].prompt;
        assert!(prompt.contains("- Name: Harbor Freight Lines"));
        assert!(prompt.contains("- Risk Score: 45/100"));
        assert!(prompt.contains("Energy sector volatility"));
        assert!(prompt.contains("No additional acquisitions without lender approval"));
    }

    #[test]
    fn test_service_error_falls_back_to_template() {
        let explainer = AssistedExplainer::new(Scripted::replying(Err(
            AuraError::ExternalService("connection refused".into()),
        )));
        let (text, expected) = with_case(|case| (explainer.explain(case), TemplateExplainer.explain(case)));
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_response_falls_back_to_template() {
        let explainer = AssistedExplainer::new(Scripted::replying(Ok("   \n".into())));
        let text = with_case(|case| explainer.explain(case));
        assert!(text.contains("## Credit Decision Analysis"));
    }

    #[test]
    fn test_missing_credential_falls_back_to_template() {
        let explainer: AssistedExplainer<Scripted> = AssistedExplainer::from_result(Err(
            AuraError::MissingCredential("OPENAI_API_KEY".into()),
        ));
        assert!(!explainer.is_connected());
        let text = with_case(|case| explainer.explain(case));
        assert!(text.contains("### Final Recommendation"));
    }
}
