use anyhow::Context;

use campease_observability::ObservabilityConfig;
use campease_shell::{ShellConfig, ShellState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campease_observability::init_with(&ObservabilityConfig::from_env());

    let config = ShellConfig::from_env().context("failed to read shell configuration")?;
    let policy = config.load_policy().context("failed to load route policy")?;

    let app = build_app(ShellState::new(&config.jwt_secret, policy));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
