use crate::domain::AuditTarget;
use crate::error::AuditError;
use std::future::Future;
use std::pin::Pin;

/// Audit engine behind the HTTP handler (pa11y CLI, builtin checker, ...).
///
/// This trait is dyn-compatible by using boxed futures instead of `impl Future`.
pub trait Auditor: Send + Sync {
    /// Short engine name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Audit `target` and return the engine's report unmodified.
    fn audit<'a>(
        &'a self,
        target: &'a AuditTarget,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, AuditError>> + Send + 'a>>;
}
