use std::error::Error;

use aura_core::audit::{AppendOutcome, JsonFileAuditLog};
use aura_core::explain::openai::OpenAi;
use aura_core::explain::{AssistedExplainer, ExplanationProvider, TemplateExplainer};
use aura_core::identity::{Identity, IdentityProvider, StaticIdentityProvider};
use aura_core::workflow::{ApprovalQueue, OriginationDesk};
use colored::Colorize;
use tracing::debug;

use crate::config::Config;

pub type Desk = OriginationDesk<JsonFileAuditLog, Box<dyn ExplanationProvider>>;

/// Everything a command needs beyond its own arguments.
pub struct Session {
    pub config: Config,
    user: Option<String>,
    password: Option<String>,
}

impl Session {
    pub fn new(config: Config, user: Option<String>, password: Option<String>) -> Self {
        Self {
            config,
            user,
            password,
        }
    }

    pub fn authenticate(&self) -> Result<Identity, Box<dyn Error>> {
        let provider = StaticIdentityProvider::new(self.config.users.clone())?;
        if provider.is_empty() {
            return Err("No users configured; add a `users` section to aura.yaml".into());
        }
        let user = self
            .user
            .as_deref()
            .ok_or("--user is required (or set AURA_USER)")?;
        let password = self
            .password
            .as_deref()
            .ok_or("--password is required (or set AURA_PASSWORD)")?;

        let identity = provider.authenticate(user, password)?;
        debug!(user = %identity.username, role = %identity.role, "authenticated");
        Ok(identity)
    }

    pub fn audit_log(&self) -> JsonFileAuditLog {
        JsonFileAuditLog::new(&self.config.storage.audit_log)
    }

    pub fn explainer(&self) -> Box<dyn ExplanationProvider> {
        if self.config.llm.enabled {
            let generator = OpenAi::from_env(self.config.llm.settings.clone());
            Box::new(AssistedExplainer::from_result(generator))
        } else {
            Box::new(TemplateExplainer)
        }
    }

    pub fn desk(&self) -> Desk {
        OriginationDesk::new(self.audit_log(), self.explainer())
    }

    /// The approval queue, bound to its storage file so desk operations
    /// commit it before they are audited.
    pub fn open_queue(&self) -> Result<ApprovalQueue, Box<dyn Error>> {
        Ok(ApprovalQueue::open(&self.config.storage.approvals)?)
    }
}

/// Audit write failures never fail a command; they are reported on stderr.
pub fn report_audit(outcome: &AppendOutcome) {
    if let AppendOutcome::NotRecorded(reason) = outcome {
        eprintln!("{}: audit record not written: {}", "warning".yellow().bold(), reason);
    }
}
