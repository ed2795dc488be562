use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuraError, AuraResult, ValidationErrors};

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 8] = ["pdf", "xlsx", "xls", "csv", "jpg", "png", "jpeg", "docx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Financial Statements")]
    FinancialStatements,
    #[serde(rename = "Balance Sheet")]
    BalanceSheet,
    #[serde(rename = "Income Statement")]
    IncomeStatement,
    #[serde(rename = "Cash Flow Statement")]
    CashFlowStatement,
    #[serde(rename = "Tax Returns")]
    TaxReturns,
    #[serde(rename = "Bank Statements")]
    BankStatements,
    #[serde(rename = "Business Plan")]
    BusinessPlan,
    #[serde(rename = "Legal Documents")]
    LegalDocuments,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 9] = [
        Self::FinancialStatements,
        Self::BalanceSheet,
        Self::IncomeStatement,
        Self::CashFlowStatement,
        Self::TaxReturns,
        Self::BankStatements,
        Self::BusinessPlan,
        Self::LegalDocuments,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialStatements => "Financial Statements",
            Self::BalanceSheet => "Balance Sheet",
            Self::IncomeStatement => "Income Statement",
            Self::CashFlowStatement => "Cash Flow Statement",
            Self::TaxReturns => "Tax Returns",
            Self::BankStatements => "Bank Statements",
            Self::BusinessPlan => "Business Plan",
            Self::LegalDocuments => "Legal Documents",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| AuraError::InvalidInput {
                field: "document_type".into(),
                reason: format!("Unknown document type '{}'", s.trim()),
            })
    }
}

/// Bookkeeping entry for an accepted upload. File contents are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub company: String,
    pub document_type: DocumentType,
    pub filename: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Check size and extension, reporting both problems when both apply.
pub fn validate_upload(filename: &str, size_bytes: u64) -> AuraResult<()> {
    let mut errors = ValidationErrors::new();

    if filename.trim().is_empty() {
        errors.push("filename", "No file selected");
        return errors.into_result();
    }

    if size_bytes > MAX_UPLOAD_BYTES {
        let mb = size_bytes as f64 / 1024.0 / 1024.0;
        errors.push(
            "file_size",
            format!("File size ({mb:.2}MB) exceeds maximum allowed (10MB)"),
        );
    }

    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        errors.push(
            "filename",
            format!(
                "File type '.{extension}' not allowed. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        );
    }

    errors.into_result()
}
