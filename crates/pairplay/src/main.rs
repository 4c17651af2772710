//! `pairplay-server [ADDR]`
//!
//! Listens on `ADDR`, else `$PAIRPLAY_ADDR`, else `127.0.0.1:8888`, until
//! Ctrl-C. Log filtering follows `RUST_LOG` (default `info`).

use pairplay::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PAIRPLAY_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = PairplayServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
