pub mod issue;
pub mod target;

pub use issue::{Issue, IssueType};
pub use target::AuditTarget;
