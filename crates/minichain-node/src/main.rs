use anyhow::Result;
use clap::Parser;
use minichain_core::{pow::check_difficulty, Chain, SystemClock};
use minichain_node::{app, config::Args, AppState, SharedClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    check_difficulty(args.difficulty)?;

    let clock: SharedClock = Arc::new(SystemClock);
    let chain = Chain::with_clock(clock).with_policy(args.policy);
    let state = AppState::new(chain, args.difficulty, args.mine_timeout());

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "minichain-node listening on http://{addr} (difficulty {}, policy {})",
        args.difficulty, args.policy
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
