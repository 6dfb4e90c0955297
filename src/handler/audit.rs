use crate::app::state::AppState;
use crate::domain::AuditTarget;
use crate::error::AuditError;
use crate::handler::error::ApiError;
use crate::handler::params::AuditParams;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub result: serde_json::Value,
}

/// Handler for GET / and POST / (domain in form/JSON body or query string)
pub async fn audit_handler(
    State(state): State<AppState>,
    params: AuditParams,
) -> Result<Json<AuditResponse>, ApiError> {
    let raw = params.domain.ok_or(AuditError::MissingDomain)?;
    let target = AuditTarget::parse(&raw).inspect_err(|e| {
        warn!("Rejected audit request: {e}");
    })?;

    let engine = state.auditor().name();
    let _permit = state.acquire_permit().await?;

    let start = Instant::now();
    match state.auditor().audit(&target).await {
        Ok(result) => {
            info!(
                engine,
                target = %target,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Audit completed"
            );
            Ok(Json(AuditResponse { result }))
        }
        Err(e) => {
            error!(
                engine,
                target = %target,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Audit failed: {e}"
            );
            Err(e.into())
        }
    }
}
