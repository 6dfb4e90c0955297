use crate::error::ServiceError;
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bind `0.0.0.0:<port>` and serve `app` until `shutdown_token` is cancelled
/// or a shutdown signal arrives. In-flight requests are drained first.
pub async fn serve(
    app: Router,
    port: u16,
    shutdown_token: CancellationToken,
) -> Result<(), ServiceError> {
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| ServiceError::Bind {
            address: bind_addr.clone(),
            source: e,
        })?;
    info!("Audit server listening on {}", listener.local_addr()?);
    info!("  - GET  /v1/health  (health check)");
    info!("  - GET  /           (audit, domain in body or query)");
    info!("  - POST /           (audit, domain in body)");

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => signal_token.cancel(),
            () = signal_token.cancelled() => {}
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Duration;

    #[tokio::test]
    async fn test_serve_stops_when_token_cancelled() {
        // Port 0 lets the OS pick a free port.
        let app = Router::new().route("/", get(|| async { "ok" }));
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve(app, 0, token.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
        assert!(result.is_ok());
    }
}
