use chrono::Utc;
use clap::Args;
use serde_json::Value;

use aura_core::audit::{summarize, AuditAction, AuditLog, AuditQuery, SortOrder, TimeWindow};

use crate::session::Session;

/// Arguments for querying the audit trail
#[derive(Args)]
pub struct AuditArgs {
    /// Only records by this username
    #[arg(long)]
    pub actor: Option<String>,

    /// Only records of this action, e.g. approved or "Term Sheet Generated"
    #[arg(long)]
    pub action: Option<AuditAction>,

    /// Time window: all, today, 7d or 30d
    #[arg(long, default_value = "all")]
    pub window: TimeWindow,

    /// Sort order: newest or oldest
    #[arg(long, default_value = "newest")]
    pub order: SortOrder,

    /// Print summary statistics for the matching records
    #[arg(long)]
    pub summary: bool,

    /// Maximum number of records to print
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run_audit(args: AuditArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    session.authenticate()?;
    let now = Utc::now();
    let query = AuditQuery {
        actor: args.actor,
        action: args.action,
        window: args.window,
        order: args.order,
    };

    let mut records = session.audit_log().query(&query, now)?;
    if args.summary {
        return Ok(serde_json::to_value(summarize(&records, now))?);
    }
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    Ok(serde_json::to_value(records)?)
}
