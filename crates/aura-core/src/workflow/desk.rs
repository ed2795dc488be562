use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::approvals::{ApprovalQueue, ApprovalRequest};
use super::uploads::{validate_upload, DocumentType, UploadRecord};
use crate::audit::{AppendOutcome, AuditAction, AuditLog, AuditRecord};
use crate::credit::risk::{analyze_risk, CompanyApplication, RiskAnalysisOutput};
use crate::credit::terms::generate_terms_with_overrides;
use crate::credit::{CompanyProfile, RiskAssessment, TermOverrides};
use crate::explain::{CreditCase, ExplanationProvider};
use crate::identity::Identity;
use crate::termsheet::{self, TermSheet};
use crate::types::ComputationOutput;
use crate::{AuraError, AuraResult, ValidationErrors};

/// A completed operation together with the outcome of its audit write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audited<T> {
    pub value: T,
    pub audit: AppendOutcome,
}

/// Threads each request through validation, the credit engine, explanation
/// and the audit trail. Session state such as the approval queue stays with
/// the caller.
pub struct OriginationDesk<L, E> {
    audit: L,
    explainer: E,
}

impl<L: AuditLog, E: ExplanationProvider> OriginationDesk<L, E> {
    pub fn new(audit: L, explainer: E) -> Self {
        Self { audit, explainer }
    }

    pub fn audit_log(&self) -> &L {
        &self.audit
    }

    pub fn explainer(&self) -> &E {
        &self.explainer
    }

    pub fn into_parts(self) -> (L, E) {
        (self.audit, self.explainer)
    }

    fn record(&mut self, record: AuditRecord) -> AppendOutcome {
        self.audit.append(record)
    }

    /// Validate and score an application. Any role may analyse.
    pub fn analyze(
        &mut self,
        actor: &Identity,
        application: &CompanyApplication,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<ComputationOutput<RiskAnalysisOutput>>> {
        let output = analyze_risk(application)?;
        let profile = &output.result.profile;
        let assessment = &output.result.assessment;
        info!(
            company = %profile.name,
            score = assessment.score,
            level = %assessment.level,
            "risk analysis completed"
        );

        let audit = self.record(
            AuditRecord::new(now, &actor.username, AuditAction::RiskAnalysis)
                .company(&profile.name)
                .with("risk_score", assessment.score)
                .with("risk_level", assessment.level),
        );
        Ok(Audited { value: output, audit })
    }

    /// Structure terms, explain them and assemble the term sheet.
    /// Requires manager or admin.
    pub fn generate_term_sheet(
        &mut self,
        actor: &Identity,
        profile: CompanyProfile,
        assessment: RiskAssessment,
        overrides: &TermOverrides,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<TermSheet>> {
        termsheet::authorize(actor.role)?;

        let terms = generate_terms_with_overrides(&profile, &assessment, overrides);
        let explanation = self
            .explainer
            .explain(&CreditCase::new(&profile, &assessment, &terms));
        let sheet = TermSheet::new(
            profile,
            assessment,
            terms,
            explanation,
            actor.display_name.clone(),
            now,
        );
        info!(
            company = %sheet.profile.name,
            document_id = %sheet.document_id,
            explainer = self.explainer.name(),
            "term sheet generated"
        );

        let audit = self.record(
            AuditRecord::new(now, &actor.username, AuditAction::TermSheetGenerated)
                .company(&sheet.profile.name)
                .with("tenor", sheet.terms.tenor)
                .with("margin", sheet.terms.margin)
                .with("document_id", &sheet.document_id)
                .with("overridden", !overrides.is_empty()),
        );
        Ok(Audited { value: sheet, audit })
    }

    /// Queue a scored application. The queue is committed before the
    /// submission is audited; a failed commit leaves the queue unchanged.
    pub fn submit_for_approval(
        &mut self,
        queue: &mut ApprovalQueue,
        actor: &Identity,
        profile: CompanyProfile,
        assessment: RiskAssessment,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<ApprovalRequest>> {
        let request = committed(queue, |q| {
            Ok(q.submit(profile, assessment, actor, notes, now).clone())
        })?;
        info!(id = request.id, company = %request.company_name, "submitted for approval");
        let audit = self.record(
            AuditRecord::new(now, &actor.username, AuditAction::SubmittedForApproval)
                .company(&request.company_name)
                .with("request_id", request.id),
        );
        Ok(Audited { value: request, audit })
    }

    pub fn approve(
        &mut self,
        queue: &mut ApprovalQueue,
        actor: &Identity,
        id: u32,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<ApprovalRequest>> {
        let request = committed(queue, |q| q.approve(id, actor, now).cloned())?;
        Ok(self.record_decision(actor, AuditAction::Approved, request, now))
    }

    pub fn reject(
        &mut self,
        queue: &mut ApprovalQueue,
        actor: &Identity,
        id: u32,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<ApprovalRequest>> {
        let request = committed(queue, |q| q.reject(id, actor, now).cloned())?;
        Ok(self.record_decision(actor, AuditAction::Rejected, request, now))
    }

    fn record_decision(
        &mut self,
        actor: &Identity,
        action: AuditAction,
        request: ApprovalRequest,
        now: DateTime<Utc>,
    ) -> Audited<ApprovalRequest> {
        info!(id = request.id, company = %request.company_name, %action, "approval decided");
        let audit = self.record(
            AuditRecord::new(now, &actor.username, action)
                .company(&request.company_name)
                .with("request_id", request.id),
        );
        Audited { value: request, audit }
    }

    /// Validate and record a document upload. Only metadata is kept.
    #[allow(clippy::too_many_arguments)]
    pub fn record_upload(
        &mut self,
        actor: &Identity,
        company: &str,
        document_type: DocumentType,
        filename: &str,
        size_bytes: u64,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AuraResult<Audited<UploadRecord>> {
        let company = company.trim();
        if company.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push("company", "Company name is required");
            return Err(AuraError::Validation(errors));
        }
        validate_upload(filename, size_bytes)?;

        let upload = UploadRecord {
            uploaded_at: now,
            uploaded_by: actor.username.clone(),
            company: company.to_string(),
            document_type,
            filename: filename.trim().to_string(),
            file_size: size_bytes,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };
        let audit = self.record(
            AuditRecord::new(now, &actor.username, AuditAction::DocumentUpload)
                .company(&upload.company)
                .with("document_type", upload.document_type)
                .with("filename", &upload.filename),
        );
        Ok(Audited { value: upload, audit })
    }
}

/// Apply `change` to the queue and commit it, restoring the previous state
/// if either step fails.
fn committed<T>(
    queue: &mut ApprovalQueue,
    change: impl FnOnce(&mut ApprovalQueue) -> AuraResult<T>,
) -> AuraResult<T> {
    let snapshot = queue.clone();
    let value = change(queue)?;
    if let Err(e) = queue.commit() {
        *queue = snapshot;
        return Err(e);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::credit::Tenor;
    use crate::explain::TemplateExplainer;
    use crate::identity::Role;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn who(role: Role) -> Identity {
        Identity {
            username: role.as_str().to_string(),
            role,
            display_name: format!("{role} user"),
            email: None,
        }
    }

    fn application() -> CompanyApplication {
        CompanyApplication {
            company_name: Some("Acme Corp".into()),
            industry: Some("Manufacturing".into()),
            revenue: Some(dec!(25)),
            loan_amount: Some(dec!(5)),
            purpose: Some("Expansion".into()),
            years_in_business: Some(8),
            employees: Some(120),
        }
    }

    fn desk() -> OriginationDesk<MemoryAuditLog, TemplateExplainer> {
        OriginationDesk::new(MemoryAuditLog::new(), TemplateExplainer)
    }

    #[test]
    fn test_analyze_records_score() {
        let mut desk = desk();
        let out = desk.analyze(&who(Role::Analyst), &application(), now()).unwrap();
        assert_eq!(out.audit, AppendOutcome::Recorded);
        assert_eq!(out.value.result.assessment.score, 15);

        let records = desk.audit_log().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::RiskAnalysis);
        assert_eq!(records[0].extra["risk_score"], 15);
        assert_eq!(records[0].extra["risk_level"], "LOW RISK");
    }

    #[test]
    fn test_invalid_application_is_not_audited() {
        let mut desk = desk();
        let bad = CompanyApplication {
            company_name: None,
            ..application()
        };
        assert!(desk.analyze(&who(Role::Admin), &bad, now()).is_err());
        assert!(desk.audit_log().is_empty());
    }

    #[test]
    fn test_analyst_cannot_generate_term_sheet() {
        let mut desk = desk();
        let analysis = desk.analyze(&who(Role::Analyst), &application(), now()).unwrap().value;
        let err = desk
            .generate_term_sheet(
                &who(Role::Analyst),
                analysis.result.profile,
                analysis.result.assessment,
                &TermOverrides::default(),
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, AuraError::PermissionDenied { .. }));
        assert_eq!(desk.audit_log().len(), 1);
    }

    #[test]
    fn test_term_sheet_with_override() {
        let mut desk = desk();
        let analysis = desk.analyze(&who(Role::Manager), &application(), now()).unwrap().value;
        let overrides = TermOverrides {
            tenor: Some(Tenor::FiveYears),
            margin: None,
        };
        let sheet = desk
            .generate_term_sheet(
                &who(Role::Manager),
                analysis.result.profile,
                analysis.result.assessment,
                &overrides,
                now(),
            )
            .unwrap();
        assert_eq!(sheet.value.terms.tenor, Tenor::FiveYears);
        assert_eq!(sheet.value.generated_by, "manager user");
        assert!(sheet.value.explanation.contains("Acme Corp"));

        let last = desk.audit_log().records().unwrap().pop().unwrap();
        assert_eq!(last.action, AuditAction::TermSheetGenerated);
        assert_eq!(last.extra["tenor"], "5 years");
        assert_eq!(last.extra["overridden"], true);
        assert_eq!(last.extra["document_id"], "AURA-20250701120000");
    }

    #[test]
    fn test_approval_round_trip_is_audited() {
        let mut desk = desk();
        let mut queue = ApprovalQueue::new();
        let analysis = desk.analyze(&who(Role::Analyst), &application(), now()).unwrap().value;
        let submitted = desk
            .submit_for_approval(
                &mut queue,
                &who(Role::Analyst),
                analysis.result.profile,
                analysis.result.assessment,
                None,
                now(),
            )
            .unwrap();
        assert_eq!(submitted.value.id, 1);

        assert!(desk.approve(&mut queue, &who(Role::Analyst), 1, now()).is_err());
        desk.approve(&mut queue, &who(Role::Admin), 1, now()).unwrap();
        assert!(desk.reject(&mut queue, &who(Role::Admin), 1, now()).is_err());

        let actions: Vec<AuditAction> = desk
            .audit_log()
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::RiskAnalysis,
                AuditAction::SubmittedForApproval,
                AuditAction::Approved
            ]
        );
    }

    #[test]
    fn test_upload_validation_and_audit() {
        let mut desk = desk();
        let analyst = who(Role::Analyst);

        let err = desk
            .record_upload(&analyst, " ", DocumentType::BalanceSheet, "bs.pdf", 100, None, now())
            .unwrap_err();
        assert!(err.to_string().contains("Company name is required"));

        assert!(desk
            .record_upload(&analyst, "Acme Corp", DocumentType::Other, "run.sh", 100, None, now())
            .is_err());

        let ok = desk
            .record_upload(
                &analyst,
                "Acme Corp",
                DocumentType::TaxReturns,
                "2024-returns.pdf",
                4096,
                Some("signed copy".into()),
                now(),
            )
            .unwrap();
        assert_eq!(ok.value.notes.as_deref(), Some("signed copy"));

        let records = desk.audit_log().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extra["document_type"], "Tax Returns");
        assert_eq!(records[0].extra["filename"], "2024-returns.pdf");
    }

    #[test]
    fn test_failed_queue_commit_is_not_audited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approvals.json");
        let mut desk = desk();
        let mut queue = ApprovalQueue::open(&path).unwrap();
        let analysis = desk.analyze(&who(Role::Analyst), &application(), now()).unwrap().value;

        let submitted = desk
            .submit_for_approval(
                &mut queue,
                &who(Role::Analyst),
                analysis.result.profile.clone(),
                analysis.result.assessment.clone(),
                None,
                now(),
            )
            .unwrap();
        assert_eq!(submitted.value.id, 1);

        // A directory where the queue file should be makes every commit fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = desk
            .approve(&mut queue, &who(Role::Manager), 1, now())
            .unwrap_err();
        assert!(matches!(err, AuraError::Persistence(_)));
        assert!(queue.get(1).unwrap().is_pending());

        let err = desk
            .submit_for_approval(
                &mut queue,
                &who(Role::Analyst),
                analysis.result.profile,
                analysis.result.assessment,
                None,
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, AuraError::Persistence(_)));
        assert_eq!(queue.len(), 1);

        let actions: Vec<AuditAction> = desk
            .audit_log()
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, vec![AuditAction::RiskAnalysis, AuditAction::SubmittedForApproval]);
    }
}
