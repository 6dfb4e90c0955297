//! pa11y CLI engine.
//!
//! Spawns `pa11y --reporter json` for each audit and forwards its JSON report
//! untouched. pa11y exits with 2 when it found issues, so both 0 and 2 count
//! as a completed audit.

use crate::config::Settings;
use crate::domain::AuditTarget;
use crate::domain::issue::truncate;
use crate::error::AuditError;
use crate::port::Auditor;
use std::future::Future;
use std::pin::Pin;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

const ENGINE: &str = "pa11y";

/// Exit codes that mean the audit ran to completion.
const ACCEPTED_EXIT_CODES: &[i32] = &[0, 2];

/// Cap on stderr carried in errors and logs.
const MAX_STDERR_LEN: usize = 2048;

pub struct Pa11yAuditor {
    program: String,
    leading_args: Vec<String>,
    standard: String,
    /// Passed to pa11y as its page timeout
    timeout: Duration,
    /// Extra time pa11y gets to report before the process is killed
    grace_period: Duration,
}

impl Pa11yAuditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            standard: "WCAG2AA".to_string(),
            timeout: Duration::from_secs(30),
            grace_period: Duration::from_secs(5),
        }
    }

    /// Build from settings. `pa11y_command` is validated non-empty.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut parts = settings.pa11y_command.iter().cloned();
        let program = parts.next().unwrap_or_else(|| ENGINE.to_string());
        Self::new(program)
            .with_args(parts)
            .with_standard(settings.pa11y_standard.clone())
            .with_timeout(settings.audit_timeout)
    }

    /// Arguments placed before pa11y's own flags (e.g. `npx pa11y`).
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_standard(mut self, standard: impl Into<String>) -> Self {
        self.standard = standard.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    fn command(&self, target: &AuditTarget) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("--reporter")
            .arg("json")
            .arg("--standard")
            .arg(&self.standard)
            .arg("--timeout")
            .arg(self.timeout.as_millis().to_string())
            .arg(target.url().as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down the browser pa11y starts.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    async fn run(&self, target: &AuditTarget) -> Result<serde_json::Value, AuditError> {
        let start = Instant::now();
        info!(engine = ENGINE, target = %target, "Starting audit");

        let child = self
            .command(target)
            .spawn()
            .map_err(|source| AuditError::EngineUnavailable {
                engine: ENGINE,
                source,
            })?;

        let pid = child.id();
        let deadline = self.timeout + self.grace_period;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(AuditError::EngineUnavailable {
                    engine: ENGINE,
                    source,
                });
            }
            Err(_) => {
                // The child itself is killed on drop; its descendants are not.
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                warn!(engine = ENGINE, target = %target, "Audit timed out, process killed");
                return Err(AuditError::Timeout {
                    target: target.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        debug!(
            engine = ENGINE,
            exit = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pa11y finished"
        );

        interpret_output(&output)
    }
}

impl Auditor for Pa11yAuditor {
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

/// SIGKILL the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(engine = ENGINE, pid, "Failed to kill process group: {e}"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

fn interpret_output(output: &Output) -> Result<serde_json::Value, AuditError> {
    let accepted = output
        .status
        .code()
        .is_some_and(|code| ACCEPTED_EXIT_CODES.contains(&code));

    if !accepted {
        return Err(AuditError::EngineFailed {
            engine: ENGINE,
            status: output.status.to_string(),
            stderr: truncate(String::from_utf8_lossy(&output.stderr).trim(), MAX_STDERR_LEN),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(serde_json::Value::Array(Vec::new()));
    }

    serde_json::from_str(stdout).map_err(|source| AuditError::MalformedOutput {
        engine: ENGINE,
        source,
    })
}
