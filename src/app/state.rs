use crate::adapter::auditor_from_settings;
use crate::config::Settings;
use crate::error::{AuditError, ServiceError};
use crate::port::Auditor;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Shared application state: the audit engine and the permits bounding how
/// many audits run at once.
#[derive(Clone)]
pub struct AppState {
    auditor: Arc<dyn Auditor>,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(auditor: Arc<dyn Auditor>, max_concurrent_audits: usize) -> Self {
        Self {
            auditor,
            permits: Arc::new(Semaphore::new(max_concurrent_audits)),
        }
    }

    /// Create `AppState` from configuration settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let auditor = auditor_from_settings(settings)?;
        Ok(Self::new(auditor, settings.max_concurrent_audits))
    }

    pub fn auditor(&self) -> &dyn Auditor {
        self.auditor.as_ref()
    }

    /// Wait for a free audit slot. Requests queue here instead of being
    /// rejected.
    pub async fn acquire_permit(&self) -> Result<SemaphorePermit<'_>, AuditError> {
        self.permits
            .acquire()
            .await
            .map_err(|e| AuditError::EngineUnavailable {
                engine: self.auditor.name(),
                source: std::io::Error::other(e),
            })
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
