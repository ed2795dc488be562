use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::{json, Value};
use tracing::debug;

use aura_core::credit::{score_company, CompanyProfile, Margin, Tenor, TermOverrides};
use aura_core::termsheet::DocumentFormat;

use super::credit::ApplicationArgs;
use crate::session::{report_audit, Session};

/// Arguments for term sheet generation
#[derive(Args)]
pub struct TermSheetArgs {
    #[command(flatten)]
    pub application: ApplicationArgs,

    /// Replace the suggested tenor (3, 5 or 7 years)
    #[arg(long)]
    pub tenor: Option<Tenor>,

    /// Replace the suggested margin, e.g. "SOFR + 250 bps" or 250
    #[arg(long)]
    pub margin: Option<Margin>,

    /// Document format: pdf or txt
    #[arg(long, default_value = "pdf")]
    pub format: DocumentFormat,

    /// Output path (defaults to AURA_TermSheet_<company>.<ext> in the working directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run_term_sheet(
    args: TermSheetArgs,
    session: &Session,
) -> Result<Value, Box<dyn std::error::Error>> {
    let identity = session.authenticate()?;
    let application = args.application.application()?;

    let profile = CompanyProfile::from_application(&application)?;
    let assessment = score_company(&profile);
    let overrides = TermOverrides {
        tenor: args.tenor,
        margin: args.margin,
    };

    let mut desk = session.desk();
    let generated = desk.generate_term_sheet(&identity, profile, assessment, &overrides, Utc::now())?;
    report_audit(&generated.audit);
    let sheet = generated.value;

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(sheet.file_name(args.format)));
    let bytes = sheet.render(args.format);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &bytes)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "term sheet written");

    Ok(json!({
        "document_id": sheet.document_id,
        "company": sheet.profile.name,
        "format": args.format,
        "mime_type": args.format.mime_type(),
        "path": path.display().to_string(),
        "bytes": bytes.len(),
        "risk_score": sheet.assessment.score,
        "risk_level": sheet.assessment.level,
        "tenor": sheet.terms.tenor,
        "margin": sheet.terms.margin,
        "covenants": sheet.terms.covenants,
        "generated_by": sheet.generated_by,
        "generated_at": sheet.generated_at,
    }))
}
