use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ServiceError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STANDARD: &str = "WCAG2AA";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT: usize = 4;
const DEFAULT_USER_AGENT: &str = concat!("a11y-service/", env!("CARGO_PKG_VERSION"));

/// Standards understood by pa11y's HTML_CodeSniffer runner.
const KNOWN_STANDARDS: &[&str] = &["Section508", "WCAG2A", "WCAG2AA", "WCAG2AAA"];

/// Which engine answers audit requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEngine {
    /// External pa11y CLI (headless Chromium).
    Pa11y,
    /// Static HTML checks run in-process.
    Builtin,
}

impl FromStr for AuditEngine {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pa11y" => Ok(Self::Pa11y),
            "builtin" => Ok(Self::Builtin),
            other => Err(ServiceError::Config(format!(
                "Unknown audit engine: {other} (expected pa11y or builtin)"
            ))),
        }
    }
}

impl fmt::Display for AuditEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pa11y => f.write_str("pa11y"),
            Self::Builtin => f.write_str("builtin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listen port
    pub port: u16,
    pub engine: AuditEngine,
    /// Program followed by its leading arguments, e.g. `["npx", "pa11y"]`
    pub pa11y_command: Vec<String>,
    pub pa11y_standard: String,
    pub audit_timeout: Duration,
    pub max_concurrent_audits: usize,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            engine: AuditEngine::Pa11y,
            pa11y_command: vec!["pa11y".to_string()],
            pa11y_standard: DEFAULT_STANDARD.to_string(),
            audit_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrent_audits: DEFAULT_MAX_CONCURRENT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_port(self.port)?;
        if self.pa11y_command.is_empty() {
            return Err(ServiceError::Config("PA11Y_COMMAND cannot be empty".into()));
        }
        if !KNOWN_STANDARDS.contains(&self.pa11y_standard.as_str()) {
            return Err(ServiceError::Config(format!(
                "Unknown accessibility standard: {}",
                self.pa11y_standard
            )));
        }
        if self.audit_timeout.is_zero() {
            return Err(ServiceError::Config("Audit timeout cannot be 0".into()));
        }
        if self.max_concurrent_audits == 0 {
            return Err(ServiceError::Config(
                "Max concurrent audits cannot be 0".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ServiceError::Config("User agent cannot be empty".into()));
        }
        Ok(())
    }
}

/// Validates that the port is in valid range (1-65535).
fn validate_port(port: u16) -> Result<(), ServiceError> {
    if port == 0 {
        return Err(ServiceError::Config("Port cannot be 0".into()));
    }
    Ok(())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ServiceError::Config(format!("Invalid {name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

pub fn get_configuration() -> Result<Settings, ServiceError> {
    let port = parse_var("PORT", DEFAULT_PORT)?;
    let engine = match env::var("AUDIT_ENGINE") {
        Ok(raw) => raw.parse::<AuditEngine>()?,
        Err(_) => AuditEngine::Pa11y,
    };
    let pa11y_command = env::var("PA11Y_COMMAND")
        .unwrap_or_else(|_| "pa11y".to_string())
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let pa11y_standard =
        env::var("PA11Y_STANDARD").unwrap_or_else(|_| DEFAULT_STANDARD.to_string());
    let audit_timeout = Duration::from_secs(parse_var("AUDIT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
    let max_concurrent_audits = parse_var("AUDIT_MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT)?;
    let user_agent =
        env::var("AUDIT_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

    let settings = Settings {
        port,
        engine,
        pa11y_command,
        pa11y_standard,
        audit_timeout,
        max_concurrent_audits,
        user_agent,
    };

    // Validate settings before returning
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        "PORT",
        "AUDIT_ENGINE",
        "PA11Y_COMMAND",
        "PA11Y_STANDARD",
        "AUDIT_TIMEOUT_SECS",
        "AUDIT_MAX_CONCURRENT",
        "AUDIT_USER_AGENT",
    ];

    fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let kvs: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| {
                let value = vars.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(kvs, f)
    }

    #[test]
    fn test_defaults_when_env_unset() {
        let settings = with_env(&[], get_configuration).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.engine, AuditEngine::Pa11y);
        assert_eq!(settings.pa11y_command, vec!["pa11y".to_string()]);
        assert_eq!(settings.pa11y_standard, "WCAG2AA");
        assert_eq!(settings.audit_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_concurrent_audits, 4);
        assert!(settings.user_agent.starts_with("a11y-service/"));
    }

    #[test]
    fn test_port_from_env() {
        let settings = with_env(&[("PORT", "9123")], get_configuration).unwrap();
        assert_eq!(settings.port, 9123);
    }

    #[test]
    fn test_port_not_a_number_fails() {
        let err = with_env(&[("PORT", "eighty")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT"));
    }

    #[test]
    fn test_port_zero_fails() {
        let err = with_env(&[("PORT", "0")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Port cannot be 0"));
    }

    #[test]
    fn test_engine_builtin_case_insensitive() {
        let settings = with_env(&[("AUDIT_ENGINE", "Builtin")], get_configuration).unwrap();
        assert_eq!(settings.engine, AuditEngine::Builtin);
    }

    #[test]
    fn test_unknown_engine_fails() {
        let err = with_env(&[("AUDIT_ENGINE", "axe")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Unknown audit engine"));
    }

    #[test]
    fn test_pa11y_command_split_on_whitespace() {
        let settings =
            with_env(&[("PA11Y_COMMAND", "npx  pa11y")], get_configuration).unwrap();
        assert_eq!(settings.pa11y_command, vec!["npx", "pa11y"]);
    }

    #[test]
    fn test_blank_pa11y_command_fails() {
        let err = with_env(&[("PA11Y_COMMAND", "   ")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("PA11Y_COMMAND cannot be empty"));
    }

    #[test]
    fn test_unknown_standard_fails() {
        let err = with_env(&[("PA11Y_STANDARD", "WCAG3")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Unknown accessibility standard"));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let err = with_env(&[("AUDIT_TIMEOUT_SECS", "0")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Audit timeout cannot be 0"));
    }

    #[test]
    fn test_zero_concurrency_fails() {
        let err = with_env(&[("AUDIT_MAX_CONCURRENT", "0")], get_configuration).unwrap_err();
        assert!(err.to_string().contains("Max concurrent audits cannot be 0"));
    }

    #[test]
    fn test_settings_validate_success() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_settings_validate_empty_user_agent_fails() {
        let settings = Settings {
            user_agent: " ".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_engine_display_round_trips() {
        for engine in [AuditEngine::Pa11y, AuditEngine::Builtin] {
            assert_eq!(engine.to_string().parse::<AuditEngine>().unwrap(), engine);
        }
    }
}
