use aura_core::audit::{
    summarize, AppendOutcome, AuditAction, AuditLog, AuditQuery, JsonFileAuditLog, SortOrder,
    TimeWindow,
};
use aura_core::credit::{CompanyApplication, TermOverrides};
use aura_core::explain::{AssistedExplainer, GenerationRequest, TemplateExplainer, TextGenerator};
use aura_core::identity::{IdentityProvider, StaticIdentityProvider, UserAccount};
use aura_core::termsheet::DocumentFormat;
use aura_core::workflow::{ApprovalQueue, ApprovalStatus, DocumentType, OriginationDesk};
use aura_core::{AuraError, AuraResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn users() -> StaticIdentityProvider {
    let account = |username: &str, role: &str, name: &str| UserAccount {
        username: username.into(),
        password: "secret".into(),
        role: role.into(),
        display_name: name.into(),
        email: Some(format!("{username}@bank.example")),
    };
    StaticIdentityProvider::new(vec![
        account("admin", "Admin", "Alex Admin"),
        account("manager", "manager", "Morgan Manager"),
        account("analyst", "ANALYST", "Avery Analyst"),
    ])
    .unwrap()
}

fn application() -> CompanyApplication {
    CompanyApplication {
        company_name: Some("Gulf Coast Energy".into()),
        industry: Some("Energy".into()),
        revenue: Some(dec!(5)),
        loan_amount: Some(dec!(5)),
        purpose: Some("Working Capital".into()),
        years_in_business: Some(2),
        employees: Some(40),
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 10, 15, 45, 0).unwrap()
}

struct Offline;

impl TextGenerator for Offline {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn generate(&self, _request: &GenerationRequest) -> AuraResult<String> {
        Err(AuraError::ExternalService("connection refused".into()))
    }
}

// ===========================================================================
// Full origination flow against a file-backed audit log
// ===========================================================================

#[test]
fn test_origination_flow_is_fully_audited() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("data").join("audit_log.json");
    let directory = users();
    let analyst = directory.authenticate("analyst", "secret").unwrap();
    let manager = directory.authenticate("manager", "secret").unwrap();

    let mut desk = OriginationDesk::new(JsonFileAuditLog::new(&log_path), TemplateExplainer);
    let queue_path = dir.path().join("data").join("approvals.json");
    let mut queue = ApprovalQueue::open(&queue_path).unwrap();

    let analysis = desk.analyze(&analyst, &application(), start()).unwrap();
    assert_eq!(analysis.audit, AppendOutcome::Recorded);
    let profile = analysis.value.result.profile;
    let assessment = analysis.value.result.assessment;
    assert_eq!(assessment.score, 85);

    let sheet = desk
        .generate_term_sheet(
            &manager,
            profile.clone(),
            assessment.clone(),
            &TermOverrides::default(),
            start() + Duration::minutes(5),
        )
        .unwrap()
        .value;
    assert_eq!(sheet.terms.covenants.len(), 6);
    assert_eq!(sheet.generated_by, "Morgan Manager");
    assert_eq!(sheet.file_name(DocumentFormat::Pdf), "AURA_TermSheet_Gulf_Coast_Energy.pdf");
    let text = String::from_utf8(sheet.render(DocumentFormat::Text)).unwrap();
    assert!(text.contains("Risk Score: 85/100"));
    assert!(sheet.render(DocumentFormat::Pdf).starts_with(b"%PDF-1.4"));

    let request = desk
        .submit_for_approval(&mut queue, &analyst, profile, assessment, Some("Seasonal".into()), start() + Duration::minutes(10))
        .unwrap()
        .value;
    let decided = desk
        .approve(&mut queue, &manager, request.id, start() + Duration::minutes(20))
        .unwrap()
        .value;
    assert_eq!(decided.status, ApprovalStatus::Approved);
    assert_eq!(
        ApprovalQueue::open(&queue_path).unwrap().get(request.id).unwrap().status,
        ApprovalStatus::Approved
    );

    let upload = desk
        .record_upload(
            &analyst,
            "Gulf Coast Energy",
            DocumentType::BankStatements,
            "statements-q2.pdf",
            250_000,
            None,
            start() + Duration::minutes(30),
        )
        .unwrap();
    assert!(upload.audit.is_recorded());

    let reopened = JsonFileAuditLog::new(&log_path);
    let records = reopened.records().unwrap();
    let actions: Vec<AuditAction> = records.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::RiskAnalysis,
            AuditAction::TermSheetGenerated,
            AuditAction::SubmittedForApproval,
            AuditAction::Approved,
            AuditAction::DocumentUpload,
        ]
    );
    assert!(records.iter().all(|r| r.company.as_deref() == Some("Gulf Coast Energy")));

    let now = start() + Duration::hours(1);
    let by_analyst = reopened
        .query(
            &AuditQuery {
                actor: Some("analyst".into()),
                window: TimeWindow::Today,
                order: SortOrder::NewestFirst,
                ..Default::default()
            },
            now,
        )
        .unwrap();
    assert_eq!(by_analyst.len(), 3);
    assert_eq!(by_analyst[0].action, AuditAction::DocumentUpload);

    let summary = summarize(&records, now);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.distinct_actors, 2);
    assert_eq!(summary.today, 5);
}

#[test]
fn test_audit_failure_does_not_fail_the_operation() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("audit_log.json");
    std::fs::write(&log_path, "[{\"broken\": ").unwrap();
    let analyst = users().authenticate("analyst", "secret").unwrap();

    let mut desk = OriginationDesk::new(JsonFileAuditLog::new(&log_path), TemplateExplainer);
    let analysis = desk.analyze(&analyst, &application(), start()).unwrap();

    assert!(matches!(analysis.audit, AppendOutcome::NotRecorded(_)));
    assert_eq!(analysis.value.result.assessment.score, 85);
    assert!(matches!(desk.audit_log().records(), Err(AuraError::Persistence(_))));
}

#[test]
fn test_unreachable_generator_still_produces_term_sheet() {
    let manager = users().authenticate("manager", "secret").unwrap();
    let mut desk = OriginationDesk::new(
        aura_core::audit::MemoryAuditLog::new(),
        AssistedExplainer::new(Offline),
    );
    let analysis = desk.analyze(&manager, &application(), start()).unwrap().value;
    let sheet = desk
        .generate_term_sheet(
            &manager,
            analysis.result.profile,
            analysis.result.assessment,
            &TermOverrides::default(),
            start(),
        )
        .unwrap()
        .value;
    assert!(sheet.explanation.contains("## Credit Decision Analysis"));
    assert!(sheet.explanation.contains("**Proceed with Enhanced Monitoring**"));
}

#[test]
fn test_wrong_password_is_rejected() {
    assert!(matches!(
        users().authenticate("admin", "guess"),
        Err(AuraError::AuthenticationFailed(_))
    ));
}
