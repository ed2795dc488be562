use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::{json, Value};

use aura_core::credit::{score_company, CompanyProfile};
use aura_core::workflow::DocumentType;

use super::credit::ApplicationArgs;
use crate::session::{report_audit, Session};

/// Arguments for submitting an application for approval
#[derive(Args)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub application: ApplicationArgs,

    /// Notes for the approving manager
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for approving or rejecting a pending request
#[derive(Args)]
pub struct DecisionArgs {
    /// Approval request id
    pub id: u32,
}

/// Arguments for listing the approval queue
#[derive(Args)]
pub struct ApprovalsArgs {
    /// Only show pending requests
    #[arg(long)]
    pub pending: bool,

    /// Show queue statistics instead of requests
    #[arg(long, conflicts_with_all = ["pending", "recent"])]
    pub stats: bool,

    /// Show the N most recent decisions
    #[arg(long)]
    pub recent: Option<usize>,
}

/// Arguments for recording a supporting document
#[derive(Args)]
pub struct UploadArgs {
    /// Path of the document to record
    pub file: PathBuf,

    /// Borrower the document belongs to
    #[arg(long)]
    pub company: String,

    /// Document type, e.g. "Financial Statements" or bank-statements
    #[arg(long, default_value = "Other")]
    pub document_type: DocumentType,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run_submit(args: SubmitArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    let identity = session.authenticate()?;
    let application = args.application.application()?;
    let profile = CompanyProfile::from_application(&application)?;
    let assessment = score_company(&profile);

    let mut queue = session.open_queue()?;
    let mut desk = session.desk();
    let submitted =
        desk.submit_for_approval(&mut queue, &identity, profile, assessment, args.notes, Utc::now())?;
    report_audit(&submitted.audit);

    Ok(serde_json::to_value(submitted.value)?)
}

pub fn run_approve(args: DecisionArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    decide(args.id, session, true)
}

pub fn run_reject(args: DecisionArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    decide(args.id, session, false)
}

fn decide(id: u32, session: &Session, approve: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let identity = session.authenticate()?;
    let mut queue = session.open_queue()?;
    let mut desk = session.desk();

    let decided = if approve {
        desk.approve(&mut queue, &identity, id, Utc::now())?
    } else {
        desk.reject(&mut queue, &identity, id, Utc::now())?
    };
    report_audit(&decided.audit);

    Ok(serde_json::to_value(decided.value)?)
}

pub fn run_approvals(args: ApprovalsArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    session.authenticate()?;
    let queue = session.open_queue()?;

    if args.stats {
        return Ok(serde_json::to_value(queue.stats())?);
    }
    if let Some(limit) = args.recent {
        return Ok(serde_json::to_value(queue.recent_decisions(limit))?);
    }

    let rows: Vec<Value> = queue
        .all()
        .iter()
        .filter(|r| !args.pending || r.is_pending())
        .map(|r| {
            json!({
                "id": r.id,
                "company": r.company_name,
                "loan_amount": r.loan_amount,
                "risk_score": r.risk_score,
                "risk_level": r.risk_level,
                "status": r.status,
                "submitted_by": r.submitted_by,
                "submitted_at": r.submitted_at,
                "decided_by": r.decided_by,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

pub fn run_upload(args: UploadArgs, session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    let identity = session.authenticate()?;
    let metadata = fs::metadata(&args.file)
        .map_err(|e| format!("Failed to read '{}': {}", args.file.display(), e))?;
    if !metadata.is_file() {
        return Err(format!("Not a file: {}", args.file.display()).into());
    }
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut desk = session.desk();
    let recorded = desk.record_upload(
        &identity,
        &args.company,
        args.document_type,
        &filename,
        metadata.len(),
        args.notes,
        Utc::now(),
    )?;
    report_audit(&recorded.audit);

    Ok(serde_json::to_value(recorded.value)?)
}
