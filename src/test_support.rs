//! Shared test support utilities
//!
//! Provides a `MockAuditor` implementing `Auditor` for use in unit and
//! integration tests.

use crate::domain::AuditTarget;
use crate::error::AuditError;
use crate::port::Auditor;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Failure = Box<dyn Fn(&AuditTarget) -> AuditError + Send + Sync>;

/// Mock auditor that records the targets it was asked to audit.
pub struct MockAuditor {
    result: serde_json::Value,
    failure: Option<Failure>,
    delay: Duration,
    audited: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAuditor {
    /// Succeeds with `result` for every target.
    pub fn returning(result: serde_json::Value) -> Self {
        Self {
            result,
            failure: None,
            delay: Duration::ZERO,
            audited: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fails every audit with the error built by `failure`.
    pub fn failing(failure: impl Fn(&AuditTarget) -> AuditError + Send + Sync + 'static) -> Self {
        Self {
            failure: Some(Box::new(failure)),
            ..Self::returning(serde_json::Value::Null)
        }
    }

    /// Sleep this long inside each audit.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// URLs audited so far, in call order.
    pub fn audited(&self) -> Vec<String> {
        self.audited.lock().unwrap().clone()
    }

    /// Highest number of audits observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Auditor for MockAuditor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn audit<'a>(
        &'a self,
        target: &'a AuditTarget,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, AuditError>> + Send + 'a>> {
        Box::pin(async move {
            self.audited.lock().unwrap().push(target.to_string());
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &self.failure {
                Some(failure) => Err(failure(target)),
                None => Ok(self.result.clone()),
            }
        })
    }
}
