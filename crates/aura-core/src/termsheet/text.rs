use std::fmt::Write;

use super::{DocumentFormat, DocumentRenderer, TermSheet, DISCLAIMER, DRAFT_STATUS};

/// Plain-text term sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl DocumentRenderer for TextRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn render(&self, sheet: &TermSheet) -> Vec<u8> {
        render_text(sheet).into_bytes()
    }
}

pub fn render_text(sheet: &TermSheet) -> String {
    let p = &sheet.profile;
    let a = &sheet.assessment;
    let t = &sheet.terms;

    let mut out = String::with_capacity(2048);
    let _ = write!(
        out,
        "TERM SHEET\n\
         Document ID: {id}\n\
         Generated: {generated}\n\
         Generated by: {author}\n\
         Status: {status}\n\n\
         BORROWER INFORMATION\n\
         Company Name: {name}\n\
         Industry: {industry}\n\
         Annual Revenue: ${revenue}M\n\n\
         LOAN DETAILS\n\
         Loan Amount: ${loan}M\n\
         Purpose: {purpose}\n\n\
         PROPOSED TERMS\n\
         Tenor: {tenor}\n\
         Interest Rate: {margin}\n\
         Amortization: {amortization}\n\
         Collateral: {collateral}\n\n\
         FINANCIAL COVENANTS\n",
        id = sheet.document_id,
        generated = sheet.generated_at.format("%Y-%m-%d %H:%M"),
        author = sheet.generated_by,
        status = DRAFT_STATUS,
        name = p.name,
        industry = p.industry,
        revenue = p.annual_revenue.normalize(),
        loan = p.loan_amount.normalize(),
        purpose = p.purpose,
        tenor = t.tenor,
        margin = t.margin,
        amortization = t.amortization,
        collateral = t.collateral,
    );
    for covenant in &t.covenants {
        let _ = writeln!(out, "- {covenant}");
    }

    let _ = write!(
        out,
        "\nRISK ASSESSMENT\n\
         Risk Level: {}\n\
         Risk Score: {}/100\n\
         Recommendation: {}\n",
        a.level, a.score, a.recommendation
    );

    if !sheet.explanation.trim().is_empty() {
        let _ = write!(out, "\nCREDIT ANALYSIS\n{}\n", sheet.explanation.trim());
    }

    let _ = write!(out, "\nIMPORTANT DISCLAIMER\n{DISCLAIMER}\n");
    out
}
