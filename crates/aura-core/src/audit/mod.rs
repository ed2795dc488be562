//! Append-only audit trail of completed operations.
//!
//! Writes never fail the operation being audited: [`AuditLog::append`]
//! reports an [`AppendOutcome`] and the caller decides whether to surface it.
//! Reads are strict and return [`crate::AuraError::Persistence`] on a broken
//! store.

pub mod query;
pub mod store;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AuraError, AuraResult};

pub use query::{summarize, AuditQuery, AuditSummary, SortOrder, TimeWindow};
pub use store::{JsonFileAuditLog, MemoryAuditLog};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "Risk Analysis")]
    RiskAnalysis,
    #[serde(rename = "Term Sheet Generated")]
    TermSheetGenerated,
    #[serde(rename = "Submitted for Approval")]
    SubmittedForApproval,
    Approved,
    Rejected,
    #[serde(rename = "Document Upload")]
    DocumentUpload,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        Self::RiskAnalysis,
        Self::TermSheetGenerated,
        Self::SubmittedForApproval,
        Self::Approved,
        Self::Rejected,
        Self::DocumentUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskAnalysis => "Risk Analysis",
            Self::TermSheetGenerated => "Term Sheet Generated",
            Self::SubmittedForApproval => "Submitted for Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::DocumentUpload => "Document Upload",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuraError;

    /// Accepts the display label in any case, or a kebab/snake form such as
    /// `risk-analysis`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|a| normalize(a.as_str()) == wanted)
            .ok_or_else(|| AuraError::InvalidInput {
                field: "action".into(),
                reason: format!("Unknown audit action '{}'", s.trim()),
            })
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One audit entry. Extra fields are stored flat next to the fixed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "user")]
    pub actor: String,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuditRecord {
    pub fn new(timestamp: DateTime<Utc>, actor: impl Into<String>, action: AuditAction) -> Self {
        Self {
            timestamp,
            actor: actor.into(),
            action,
            company: None,
            extra: Map::new(),
        }
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Attach an extra field. Values that fail to serialize are stored as null.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.extra.insert(key.to_string(), value);
        self
    }
}

/// Result of an append. Never an error: the audited operation has already
/// happened by the time it is logged.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AppendOutcome {
    Recorded,
    NotRecorded(String),
}

impl AppendOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}

pub trait AuditLog {
    fn append(&mut self, record: AuditRecord) -> AppendOutcome;

    /// Every record, in append order.
    fn records(&self) -> AuraResult<Vec<AuditRecord>>;

    fn query(&self, query: &AuditQuery, now: DateTime<Utc>) -> AuraResult<Vec<AuditRecord>> {
        Ok(query.apply(self.records()?, now))
    }
}

impl<T: AuditLog + ?Sized> AuditLog for Box<T> {
    fn append(&mut self, record: AuditRecord) -> AppendOutcome {
        (**self).append(record)
    }

    fn records(&self) -> AuraResult<Vec<AuditRecord>> {
        (**self).records()
    }
}
