use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{AppendOutcome, AuditLog, AuditRecord};
use crate::{AuraError, AuraResult};

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    records: Vec<AuditRecord>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&mut self, record: AuditRecord) -> AppendOutcome {
        self.records.push(record);
        AppendOutcome::Recorded
    }

    fn records(&self) -> AuraResult<Vec<AuditRecord>> {
        Ok(self.records.clone())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Audit log kept as one JSON array on disk.
///
/// A missing file reads as an empty log. A file that exists but does not
/// parse is never overwritten: appends report `NotRecorded` until it is fixed.
#[derive(Debug, Clone)]
pub struct JsonFileAuditLog {
    path: PathBuf,
}

impl JsonFileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> AuraResult<Vec<AuditRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AuraError::Persistence(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            AuraError::Persistence(format!("{} is not a valid audit log: {e}", self.path.display()))
        })
    }

    /// Write to a sibling temp file, then rename over the target.
    fn store(&self, records: &[AuditRecord]) -> AuraResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AuraError::Persistence(format!("cannot create {}: {e}", parent.display())))?;
        }
        let body = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .map_err(|e| AuraError::Persistence(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AuraError::Persistence(format!("cannot replace {}: {e}", self.path.display())))
    }
}

impl AuditLog for JsonFileAuditLog {
    fn append(&mut self, record: AuditRecord) -> AppendOutcome {
        let action = record.action;
        let result = self.load().and_then(|mut records| {
            records.push(record);
            self.store(&records)
        });
        match result {
            Ok(()) => {
                debug!(%action, path = %self.path.display(), "audit record written");
                AppendOutcome::Recorded
            }
            Err(e) => {
                warn!(%action, error = %e, "audit record not written");
                AppendOutcome::NotRecorded(e.to_string())
            }
        }
    }

    fn records(&self) -> AuraResult<Vec<AuditRecord>> {
        self.load()
    }
}
