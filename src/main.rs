use mcp_tool_gateway::infra;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    infra::logging::init();
    infra::boot::run_server().await
}
