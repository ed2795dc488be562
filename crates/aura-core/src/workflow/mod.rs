//! Origination workflow: the approval queue, upload bookkeeping, the desk
//! service that audits every completed step, and the portfolio view.

pub mod approvals;
pub mod desk;
pub mod portfolio;
pub mod uploads;

pub use approvals::{ApprovalQueue, ApprovalRequest, ApprovalStats, ApprovalStatus};
pub use desk::{Audited, OriginationDesk};
pub use portfolio::{portfolio_summary, DailyActivity, PortfolioSummary};
pub use uploads::{validate_upload, DocumentType, UploadRecord, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
