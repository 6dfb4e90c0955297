//! In-process engine: fetch the page and run static HTML checks.
//!
//! Covers a subset of what pa11y finds (no rendering, no scripts, no color
//! contrast), in exchange for needing neither Node nor Chromium.

pub mod fetch;
pub mod rules;

pub use fetch::{FetchedPage, PageFetcher};
pub use rules::{Rule, analyze, default_rules};

use crate::config::Settings;
use crate::domain::AuditTarget;
use crate::error::{AuditError, ServiceError};
use crate::port::Auditor;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::info;

const ENGINE: &str = "builtin";

pub struct BuiltinAuditor {
    fetcher: PageFetcher,
    rules: Vec<Box<dyn Rule>>,
}

impl BuiltinAuditor {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            rules: default_rules(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let fetcher = PageFetcher::new(&settings.user_agent, settings.audit_timeout)?;
        Ok(Self::new(fetcher))
    }

    async fn run(&self, target: &AuditTarget) -> Result<serde_json::Value, AuditError> {
        let start = Instant::now();
        info!(engine = ENGINE, target = %target, "Starting audit");

        let page = self.fetcher.fetch(target).await?;
        let issues = analyze(&page.body, &self.rules);

        info!(
            engine = ENGINE,
            url = %page.url,
            issues = issues.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Builtin audit finished"
        );

        serde_json::to_value(issues).map_err(|source| AuditError::MalformedOutput {
            engine: ENGINE,
            source,
        })
    }
}

impl Auditor for BuiltinAuditor {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn audit<'a>(
        &'a self,
        target: &'a AuditTarget,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, AuditError>> + Send + 'a>> {
        Box::pin(self.run(target))
    }
}
