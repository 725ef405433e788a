use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::sql::{QueryExecutor, SqliteQueryExecutor, UnconfiguredExecutor};
use crate::infra::config::AppConfig;
use crate::tools::registry::{build_registry, ToolRegistry};

/// Registry for the configured query backend. Fails on an invalid table name.
pub fn registry_from_config(cfg: &AppConfig) -> anyhow::Result<ToolRegistry> {
    let table = &cfg.query.table;
    let executor: Arc<dyn QueryExecutor> = match &cfg.query.database_url {
        Some(url) => Arc::new(SqliteQueryExecutor::new(url.clone(), table.clone())?),
        None => {
            tracing::warn!("QUERY_DATABASE_URL not set, the query tool will fail until configured");
            crate::clients::sql::quote_relation(table)?;
            Arc::new(UnconfiguredExecutor)
        }
    };
    Ok(build_registry(executor)?)
}

pub async fn run_server() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env_and_toml()?;
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        table = %cfg.query.table,
        database = cfg.query.database_url.is_some(),
        "BOOT mcp-tool-gateway"
    );

    let registry = registry_from_config(&cfg)?;

    // Stdio mode: JSON-RPC over stdio only (no HTTP).
    if cfg.mode == "stdio" {
        return crate::api::rpc::stdio_loop(registry).await;
    }

    let app = crate::infra::http_app::build_app(registry);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
