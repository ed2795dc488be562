//! Term-sheet documents and their renderers.

pub mod pdf;
pub mod text;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credit::{CompanyProfile, LoanTerms, RiskAssessment};
use crate::identity::Role;
use crate::{AuraError, AuraResult};

pub use pdf::PdfRenderer;
pub use text::TextRenderer;

/// Status line printed on every generated sheet.
pub const DRAFT_STATUS: &str = "DRAFT - FOR DISCUSSION PURPOSES ONLY";

pub const DISCLAIMER: &str = "This term sheet is indicative only and does not constitute a \
    commitment to lend. Final terms are subject to satisfactory completion of due diligence, \
    credit approval, documentation, and fulfillment of conditions precedent. This document is \
    confidential and intended solely for the use of the addressee. AURA system recommendations \
    are for guidance purposes and all credit decisions require human oversight and approval.";

/// Role check for every entry point that produces a term sheet.
pub fn authorize(role: Role) -> AuraResult<()> {
    role.require(Role::Manager, "generate term sheet")
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSheet {
    /// `AURA-<yyyymmddHHMMSS>` of the generation time.
    pub document_id: String,
    pub generated_at: DateTime<Utc>,
    /// Display name of the author.
    pub generated_by: String,
    pub profile: CompanyProfile,
    pub assessment: RiskAssessment,
    pub terms: LoanTerms,
    pub explanation: String,
}

impl TermSheet {
    pub fn new(
        profile: CompanyProfile,
        assessment: RiskAssessment,
        terms: LoanTerms,
        explanation: String,
        generated_by: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            document_id: document_id(generated_at),
            generated_at,
            generated_by: generated_by.into(),
            profile,
            assessment,
            terms,
            explanation,
        }
    }

    /// Download name, e.g. `AURA_TermSheet_Acme_Corp.pdf`. Anything outside
    /// `[A-Za-z0-9_-]` in the company name becomes `_`, so the name is always
    /// a single path component.
    pub fn file_name(&self, format: DocumentFormat) -> String {
        let stem: String = self
            .profile
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("AURA_TermSheet_{}.{}", stem, format.extension())
    }

    pub fn render(&self, format: DocumentFormat) -> Vec<u8> {
        match format {
            DocumentFormat::Text => TextRenderer.render(self),
            DocumentFormat::Pdf => PdfRenderer::default().render(self),
        }
    }
}

pub fn document_id(at: DateTime<Utc>) -> String {
    format!("AURA-{}", at.format("%Y%m%d%H%M%S"))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
}

impl DocumentFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            other => Err(AuraError::InvalidInput {
                field: "format".into(),
                reason: format!("Unsupported document format '{other}'"),
            }),
        }
    }
}

pub trait DocumentRenderer {
    fn format(&self) -> DocumentFormat;

    fn render(&self, sheet: &TermSheet) -> Vec<u8>;
}
