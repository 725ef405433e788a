use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    mcp_tool_gateway::cli::run().await
}
