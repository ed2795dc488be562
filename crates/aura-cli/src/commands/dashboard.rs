use chrono::Utc;
use serde_json::Value;

use aura_core::audit::AuditLog;
use aura_core::workflow::portfolio_summary;

use crate::session::Session;

/// Portfolio metrics from the audit trail and the approval queue.
pub fn run_dashboard(session: &Session) -> Result<Value, Box<dyn std::error::Error>> {
    session.authenticate()?;
    let records = session.audit_log().records()?;
    let queue = session.open_queue()?;
    let summary = portfolio_summary(&records, &queue, Utc::now());
    Ok(serde_json::to_value(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StorageConfig};
    use aura_core::audit::{AuditAction, AuditRecord, JsonFileAuditLog};
    use aura_core::credit::{score_company, CompanyProfile, Industry, LoanPurpose};
    use aura_core::identity::{Identity, Role, UserAccount};
    use aura_core::workflow::ApprovalQueue;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dashboard_reads_both_stores() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            audit_log: dir.path().join("audit_log.json"),
            approvals: dir.path().join("approvals.json"),
        };

        let mut log = JsonFileAuditLog::new(&storage.audit_log);
        let outcome = log.append(AuditRecord::new(Utc::now(), "analyst", AuditAction::RiskAnalysis));
        assert!(outcome.is_recorded());

        let analyst = Identity {
            username: "analyst".into(),
            role: Role::Analyst,
            display_name: "Avery Analyst".into(),
            email: None,
        };
        let profile = CompanyProfile {
            name: "Lakeside Builders".into(),
            industry: Industry::Construction,
            annual_revenue: dec!(20),
            loan_amount: dec!(4.5),
            purpose: LoanPurpose::EquipmentPurchase,
            years_in_business: 9,
            employee_count: 60,
        };
        let assessment = score_company(&profile);
        let mut queue = ApprovalQueue::new();
        queue.submit(profile, assessment, &analyst, None, Utc::now());
        queue.save(&storage.approvals).unwrap();

        let config = Config {
            storage,
            users: vec![UserAccount {
                username: "analyst".into(),
                password: "pw".into(),
                role: "Analyst".into(),
                display_name: "Avery Analyst".into(),
                email: None,
            }],
            ..Config::default()
        };
        let session = Session::new(config, Some("analyst".into()), Some("pw".into()));

        let out = run_dashboard(&session).unwrap();
        assert_eq!(out["risk_analyses"], 1);
        assert_eq!(out["approvals"]["pending"], 1);
        assert_eq!(out["volume_by_status"]["Pending"], "4.5");
        assert_eq!(out["applications_by_industry"]["Construction"], 1);
        assert_eq!(out["daily_activity"].as_array().unwrap().len(), 1);
    }
}
