//! Actors, roles and the identity-provider boundary.
//!
//! Role strings are normalised exactly once, when an [`Identity`] is built by
//! a provider. Everything downstream works with the [`Role`] enum.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{AuraError, AuraResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Analyst,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Analyst => "analyst",
        }
    }

    /// Hierarchy check: admin > manager > analyst.
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    pub fn can_generate_term_sheet(&self) -> bool {
        self.at_least(Role::Manager)
    }

    pub fn can_decide_approvals(&self) -> bool {
        self.at_least(Role::Manager)
    }

    /// Fail with `PermissionDenied` unless this role reaches `required`.
    pub fn require(&self, required: Role, action: &str) -> AuraResult<()> {
        if self.at_least(required) {
            Ok(())
        } else {
            Err(AuraError::PermissionDenied {
                action: action.to_string(),
                required: required.to_string(),
                role: self.to_string(),
            })
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuraError;

    /// Case- and whitespace-insensitive: "Admin", " admin ", "ADMIN" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "analyst" => Ok(Self::Analyst),
            other => Err(AuraError::InvalidInput {
                field: "role".into(),
                reason: format!("Unknown role '{other}'"),
            }),
        }
    }
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub trait IdentityProvider {
    fn authenticate(&self, username: &str, password: &str) -> AuraResult<Identity>;

    fn lookup(&self, username: &str) -> Option<Identity>;
}

/// Account entry as supplied by configuration. `role` is free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(alias = "full_name")]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Identity provider over an injected, fixed account table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    accounts: HashMap<String, (String, Identity)>,
}

impl StaticIdentityProvider {
    /// Build the table, normalising every role. Unknown roles are rejected.
    pub fn new(accounts: Vec<UserAccount>) -> AuraResult<Self> {
        let mut table = HashMap::with_capacity(accounts.len());
        for account in accounts {
            let role: Role = account.role.parse().map_err(|_| AuraError::InvalidInput {
                field: format!("users.{}.role", account.username),
                reason: format!("Unknown role '{}'", account.role.trim()),
            })?;
            let identity = Identity {
                username: account.username.clone(),
                role,
                display_name: account.display_name,
                email: account.email,
            };
            table.insert(account.username, (account.password, identity));
        }
        Ok(Self { accounts: table })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn authenticate(&self, username: &str, password: &str) -> AuraResult<Identity> {
        match self.accounts.get(username) {
            Some((expected, identity)) if expected == password => Ok(identity.clone()),
            _ => Err(AuraError::AuthenticationFailed(username.to_string())),
        }
    }

    fn lookup(&self, username: &str) -> Option<Identity> {
        self.accounts.get(username).map(|(_, identity)| identity.clone())
    }
}
