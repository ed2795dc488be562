use std::fmt::Write;

use super::{CreditCase, ExplanationProvider};
use crate::credit::risk::{format_pct, RiskLevel};

/// Deterministic, rule-based credit narrative in markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }
}

impl ExplanationProvider for TemplateExplainer {
    fn name(&self) -> &'static str {
        "template"
    }

    fn explain(&self, case: &CreditCase<'_>) -> String {
        render(case)
    }
}

fn render(case: &CreditCase<'_>) -> String {
    let profile = case.profile;
    let assessment = case.assessment;
    let terms = case.terms;
    let tier = RiskLevel::from_score(assessment.score);
    let name = profile.name.as_str();

    let ltv = profile
        .loan_to_revenue_pct()
        .map(|v| format!("{}%", format_pct(v)))
        .unwrap_or_else(|| "n/a".to_string());

    let mut out = String::with_capacity(4096);

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "\n## Credit Decision Analysis\n\n\
         ### Executive Summary\n\n\
         Based on our comprehensive analysis of **{name}**, we have assessed the credit risk as \
         **{level}** with a risk score of **{score}/100**. The proposed loan structure balances \
         risk mitigation with competitive market terms appropriate for the {industry} sector.\n\n\
         ---\n\n\
         ### Detailed Risk Analysis\n\n\
         **Company Profile:**\n\
         - {name} operates in the {industry} industry with annual revenue of ${revenue}M\n\
         - The company is seeking ${loan}M for {purpose}\n\
         - Loan-to-revenue ratio: {ltv}\n\n\
         **Key Risk Factors:**\n\n",
        level = assessment.level,
        score = assessment.score,
        industry = profile.industry,
        revenue = profile.annual_revenue.normalize(),
        loan = profile.loan_amount.normalize(),
        purpose = profile.purpose,
    );

    for factor in &assessment.factors {
        let _ = writeln!(out, "- {factor}");
    }

    let _ = write!(
        out,
        "\n\n---\n\n### Term Structure Rationale\n\n#### 1. Tenor: {}\n\n",
        terms.tenor
    );
    out.push_str(tenor_rationale(tier));

    let _ = write!(out, "\n\n#### 2. Interest Rate: {}\n\n", terms.margin);
    out.push_str(margin_rationale(tier));

    out.push_str(
        "\n\n#### 3. Financial Covenants\n\n\
         The covenant package serves multiple purposes:\n\n\
         **Monitoring & Control:**\n",
    );
    for covenant in &terms.covenants {
        let _ = writeln!(out, "- {covenant}");
    }

    out.push_str(
        "\n\nThese covenants provide:\n\
         - Early warning indicators of financial deterioration\n\
         - Triggers for lender intervention if necessary\n\
         - Incentives for maintaining financial discipline\n\
         - Protection of lender's security position\n\n\
         ---\n\n\
         ### Collateral & Security\n\n\
         **First lien position on all company assets** provides:\n\
         - Priority claim in event of default\n\
         - Comprehensive asset coverage\n\
         - Enhanced recovery prospects\n\
         - Negotiating leverage for covenant modifications\n\n\
         ---\n\n\
         ### Final Recommendation\n\n",
    );
    out.push_str(&recommendation(tier, name));

    out.push_str(
        "\n\n---\n\n\
         *This analysis was generated by AURA's Credit Decision Engine, incorporating \
         quantitative risk models and qualitative credit assessment methodologies.*\n",
    );

    out
}

fn tenor_rationale(tier: RiskLevel) -> &'static str {
    match tier {
        RiskLevel::High => {
            "The shorter tenor is appropriate given the elevated risk profile. This structure:\n\
             - Reduces long-term exposure to credit risk\n\
             - Allows for more frequent covenant monitoring\n\
             - Enables earlier principal recovery\n\
             - Provides flexibility to reassess terms at maturity\n"
        }
        RiskLevel::Moderate => {
            "A moderate tenor balances several considerations:\n\
             - Provides adequate time for business performance\n\
             - Maintains reasonable payment obligations\n\
             - Allows for comprehensive monitoring\n\
             - Aligns with industry standard for similar credits\n"
        }
        RiskLevel::Low => {
            "The extended tenor reflects the strong credit profile:\n\
             - Demonstrates lender confidence in long-term viability\n\
             - Provides borrower with strategic flexibility\n\
             - Supports business planning and investment\n\
             - Competitive positioning in the market\n"
        }
    }
}

fn margin_rationale(tier: RiskLevel) -> &'static str {
    match tier {
        RiskLevel::High => {
            "The premium pricing reflects:\n\
             - Higher probability of default\n\
             - Industry volatility considerations\n\
             - Elevated leverage metrics\n\
             - Need for risk-adjusted returns\n\
             - Compensation for intensive monitoring requirements\n"
        }
        RiskLevel::Moderate => {
            "Market-standard pricing for moderate-risk commercial credits:\n\
             - Competitive with peer transactions\n\
             - Appropriate for the risk-return profile\n\
             - Reflects current market conditions\n\
             - Balances borrower affordability with lender requirements\n"
        }
        RiskLevel::Low => {
            "Favorable pricing reflecting strong credit fundamentals:\n\
             - Low probability of default\n\
             - Strong financial metrics\n\
             - Stable industry characteristics\n\
             - Conservative leverage position\n\
             - Established operating history\n"
        }
    }
}

fn recommendation(tier: RiskLevel, name: &str) -> String {
    match tier {
        RiskLevel::High => format!(
            "**Proceed with Enhanced Monitoring**\n\n\
             While {name} presents elevated risk, the proposed structure incorporates \
             appropriate safeguards:\n\
             - Shorter tenor limits exposure\n\
             - Premium pricing compensates for risk\n\
             - Stringent covenants enable close monitoring\n\
             - Strong collateral position protects downside\n\n\
             **Conditions Precedent:**\n\
             - Completion of full due diligence\n\
             - Satisfactory legal documentation\n\
             - Environmental assessment (if applicable)\n\
             - Insurance requirements confirmation\n\
             - Personal guarantees (if required)\n\n\
             **Ongoing Monitoring:**\n\
             - Quarterly financial statement review\n\
             - Annual site visits\n\
             - Covenant compliance testing\n\
             - Industry trend analysis\n"
        ),
        RiskLevel::Moderate => format!(
            "**Proceed with Standard Terms**\n\n\
             {name} represents an acceptable credit risk with moderate fundamentals. The \
             proposed terms are appropriate for the risk profile:\n\
             - Balanced tenor and pricing\n\
             - Standard covenant package\n\
             - Adequate collateral coverage\n\
             - Routine monitoring requirements\n\n\
             **Conditions Precedent:**\n\
             - Standard due diligence completion\n\
             - Execution of loan documentation\n\
             - Insurance verification\n\
             - Legal opinions\n\n\
             **Ongoing Monitoring:**\n\
             - Semi-annual financial reviews\n\
             - Annual covenant testing\n\
             - Periodic management discussions\n"
        ),
        RiskLevel::Low => format!(
            "**Proceed - Recommended Credit**\n\n\
             {name} represents a high-quality credit with strong fundamentals:\n\
             - Low default probability\n\
             - Stable cash flows\n\
             - Conservative financial management\n\
             - Favorable industry dynamics\n\n\
             The proposed terms reflect this strong profile while maintaining prudent credit \
             standards.\n\n\
             **Conditions Precedent:**\n\
             - Customary due diligence\n\
             - Standard documentation\n\
             - Insurance confirmation\n\n\
             **Ongoing Monitoring:**\n\
             - Annual financial review\n\
             - Covenant compliance verification\n\
             - Relationship management meetings\n"
        ),
    }
}
