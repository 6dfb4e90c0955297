use std::time::Duration;
use thiserror::Error;

/// Default HTTP port for health checks
const DEFAULT_HTTP_PORT: u16 = 8000;

/// Error type for healthcheck failures
#[derive(Debug, Error)]
#[error("Healthcheck failed: {0}")]
pub struct HealthcheckError(String);

/// Perform a health check against `PORT` (default 8000)
pub async fn healthcheck() -> Result<(), HealthcheckError> {
    let port = port_from_env(std::env::var("PORT").ok().as_deref())?;
    healthcheck_with_port(port).await
}

fn port_from_env(value: Option<&str>) -> Result<u16, HealthcheckError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| HealthcheckError(format!("Invalid PORT={raw:?}: {e}"))),
        None => Ok(DEFAULT_HTTP_PORT),
    }
}

/// Perform a health check against a specific port
pub async fn healthcheck_with_port(port: u16) -> Result<(), HealthcheckError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .map_err(|e| HealthcheckError(format!("Failed to create HTTP client: {e}")))?;

    let url = format!("http://127.0.0.1:{port}/v1/health");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| HealthcheckError(format!("Request failed: {e}")))?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(HealthcheckError(format!(
            "Health endpoint returned status: {}",
            resp.status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_to_8000() {
        assert_eq!(port_from_env(None).unwrap(), 8000);
    }

    #[test]
    fn test_port_from_value() {
        assert_eq!(port_from_env(Some(" 9100 ")).unwrap(), 9100);
        assert!(port_from_env(Some("http")).is_err());
    }
}
