use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::credit::{CompanyProfile, RiskAssessment, RiskLevel};
use crate::identity::{Identity, Role};
use crate::types::{Money, Percent};
use crate::{AuraError, AuraResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: u32,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
    pub company_name: String,
    pub loan_amount: Money,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    pub profile: CompanyProfile,
    pub assessment: RiskAssessment,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Approved as a share of all requests, `None` while the queue is empty.
    pub approval_rate: Option<Percent>,
}

/// Session-scoped approval queue. Ids are 1-based submission positions.
///
/// A queue opened with [`ApprovalQueue::open`] remembers its file and
/// [`ApprovalQueue::commit`] writes it back; an in-memory queue commits as a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalQueue {
    requests: Vec<ApprovalRequest>,
    #[serde(skip)]
    backing: Option<PathBuf>,
}

impl ApprovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a queue saved with [`ApprovalQueue::save`]. A missing file is an
    /// empty queue.
    pub fn load(path: &Path) -> AuraResult<Self> {
        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                AuraError::Persistence(format!("{} is not a valid approval queue: {e}", path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AuraError::Persistence(format!("cannot read {}: {e}", path.display()))),
        }
    }

    /// Load from `path` and keep it as the commit target.
    pub fn open(path: impl Into<PathBuf>) -> AuraResult<Self> {
        let path = path.into();
        let mut queue = Self::load(&path)?;
        queue.backing = Some(path);
        Ok(queue)
    }

    pub fn backing_path(&self) -> Option<&Path> {
        self.backing.as_deref()
    }

    /// Write the queue to its backing file, if it has one.
    pub fn commit(&self) -> AuraResult<()> {
        match &self.backing {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }

    /// Replace `path` atomically: write a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> AuraResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AuraError::Persistence(format!("cannot create {}: {e}", parent.display())))?;
        }
        let body = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .map_err(|e| AuraError::Persistence(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AuraError::Persistence(format!("cannot replace {}: {e}", path.display()))
        })
    }

    pub fn submit(
        &mut self,
        profile: CompanyProfile,
        assessment: RiskAssessment,
        submitted_by: &Identity,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> &ApprovalRequest {
        let id = self.requests.len() as u32 + 1;
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.requests.push(ApprovalRequest {
            id,
            submitted_at: now,
            submitted_by: submitted_by.username.clone(),
            company_name: profile.name.clone(),
            loan_amount: profile.loan_amount,
            risk_score: assessment.score,
            risk_level: assessment.level,
            status: ApprovalStatus::Pending,
            notes,
            decided_by: None,
            decided_at: None,
            profile,
            assessment,
        });
        &self.requests[self.requests.len() - 1]
    }

    pub fn approve(&mut self, id: u32, decider: &Identity, now: DateTime<Utc>) -> AuraResult<&ApprovalRequest> {
        self.decide(id, decider, ApprovalStatus::Approved, now)
    }

    pub fn reject(&mut self, id: u32, decider: &Identity, now: DateTime<Utc>) -> AuraResult<&ApprovalRequest> {
        self.decide(id, decider, ApprovalStatus::Rejected, now)
    }

    fn decide(
        &mut self,
        id: u32,
        decider: &Identity,
        outcome: ApprovalStatus,
        now: DateTime<Utc>,
    ) -> AuraResult<&ApprovalRequest> {
        let verb = match outcome {
            ApprovalStatus::Approved => "approve",
            _ => "reject",
        };
        decider.role.require(Role::Manager, verb)?;

        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AuraError::NotFound(format!("approval request #{id}")))?;
        if !request.is_pending() {
            return Err(AuraError::InvalidState(format!(
                "approval request #{id} is already {}",
                request.status
            )));
        }

        request.status = outcome;
        request.decided_by = Some(decider.username.clone());
        request.decided_at = Some(now);
        Ok(request)
    }

    pub fn get(&self, id: u32) -> Option<&ApprovalRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn all(&self) -> &[ApprovalRequest] {
        &self.requests
    }

    pub fn pending(&self) -> impl Iterator<Item = &ApprovalRequest> {
        self.requests.iter().filter(|r| r.is_pending())
    }

    /// The last `limit` decided requests, in submission order.
    pub fn recent_decisions(&self, limit: usize) -> Vec<&ApprovalRequest> {
        let decided: Vec<&ApprovalRequest> = self.requests.iter().filter(|r| !r.is_pending()).collect();
        let skip = decided.len().saturating_sub(limit);
        decided.into_iter().skip(skip).collect()
    }

    pub fn stats(&self) -> ApprovalStats {
        let count = |s: ApprovalStatus| self.requests.iter().filter(|r| r.status == s).count();
        let total = self.requests.len();
        let approved = count(ApprovalStatus::Approved);
        let approval_rate = if total == 0 {
            None
        } else {
            Some(Decimal::from(approved as u64) / Decimal::from(total as u64) * dec!(100))
        };
        ApprovalStats {
            total,
            pending: count(ApprovalStatus::Pending),
            approved,
            rejected: count(ApprovalStatus::Rejected),
            approval_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
