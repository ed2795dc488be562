pub mod audit;
pub mod error;
pub mod identity;
pub mod types;

#[cfg(feature = "credit")]
pub mod credit;

#[cfg(feature = "credit")]
pub mod explain;

#[cfg(feature = "termsheet")]
pub mod termsheet;

#[cfg(feature = "workflow")]
pub mod workflow;

pub use error::{AuraError, ValidationErrors, ValidationIssue};
pub use types::*;

/// Standard result type for all aura operations
pub type AuraResult<T> = Result<T, AuraError>;
