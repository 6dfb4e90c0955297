pub mod builtin;
pub mod pa11y;

pub use builtin::BuiltinAuditor;
pub use pa11y::Pa11yAuditor;

use crate::config::{AuditEngine, Settings};
use crate::error::ServiceError;
use crate::port::Auditor;
use std::sync::Arc;

/// Build the auditor selected by `settings.engine`.
pub fn auditor_from_settings(settings: &Settings) -> Result<Arc<dyn Auditor>, ServiceError> {
    let auditor: Arc<dyn Auditor> = match settings.engine {
        AuditEngine::Pa11y => Arc::new(Pa11yAuditor::from_settings(settings)),
        AuditEngine::Builtin => Arc::new(BuiltinAuditor::from_settings(settings)?),
    };
    Ok(auditor)
}
