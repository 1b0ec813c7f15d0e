use std::time::Duration;

use anyhow::{Context, Result};
use clerk::mock::{router, MockState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    clerk::logging::init();

    let port = std::env::var("MOCK_LLM_PORT")
        .unwrap_or_else(|_| "8081".to_string())
        .parse::<u16>()
        .unwrap_or(8081);

    let fail_attempts = std::env::var("MOCK_LLM_FAIL_ATTEMPTS")
        .unwrap_or_else(|_| "0".to_string())
        .parse::<usize>()
        .unwrap_or(0);

    let delay_ms = std::env::var("MOCK_LLM_DELAY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, fail_attempts, ?delay_ms, "mock LLM server listening");
    tracing::info!("point clerk at it with CLERK_BASE_URL=http://localhost:{port}/v1beta");

    let mut state = MockState::new(fail_attempts);
    if let Some(ms) = delay_ms {
        state = state.with_delay(Duration::from_millis(ms));
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}
