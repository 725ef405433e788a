use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::process::ExitCode;
use std::time::Duration;

use crate::core::mcp::{RpcResp, METHOD_CALL_TOOL, METHOD_LIST_TOOLS};
use crate::infra::config::AppConfig;

#[derive(Parser)]
#[command(name = "mcp-gateway-admin")]
#[command(about = "MCP Tool Gateway - Admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status and registered tools
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Invoke a tool through the JSON-RPC endpoint
    Call {
        /// Service URL
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        /// Tool name, e.g. `echo`
        #[arg(short, long)]
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Call { url, tool, args } => match call_tool(&url, &tool, &args).await {
            Ok(result) => {
                println!("{result}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Tool call failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::from_env_and_toml()?;
    config.validate()?;
    crate::infra::boot::registry_from_config(&config).map_err(|e| e.to_string())?;
    Ok(config)
}

async fn rpc(url: &str, method: &str, params: Value) -> Result<RpcResp, Box<dyn std::error::Error>> {
    let resp = reqwest::Client::new()
        .post(format!("{}/mcp/rpc", url))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params }))
        .timeout(Duration::from_secs(5))
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()).into());
    }
    Ok(resp.json::<RpcResp>().await?)
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    match rpc(url, METHOD_LIST_TOOLS, json!({})).await {
        Ok(RpcResp { result: Some(result), .. }) => {
            let names: Vec<&str> = result["tools"]
                .as_array()
                .map(|tools| tools.iter().filter_map(|t| t["name"].as_str()).collect())
                .unwrap_or_default();
            println!("🔧 Tools: ✅ {}", names.join(", "));
        }
        Ok(RpcResp { error: Some(e), .. }) => println!("🔧 Tools: ❌ {} ({})", e.message, e.code),
        Ok(_) => println!("🔧 Tools: ❌ empty response"),
        Err(e) => println!("🔧 Tools: ❌ {}", e),
    }

    println!("\n📋 Configuration:");
    println!("  Mode: {}", std::env::var("MODE").unwrap_or_else(|_| "server".into()));
    println!("  Port: {}", std::env::var("PORT").unwrap_or_else(|_| "8080".into()));
    println!("  Log Level: {}", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    match std::env::var("QUERY_DATABASE_URL") {
        Ok(_) => println!("  Query Database: configured"),
        Err(_) => println!("  Query Database: Not configured"),
    }

    Ok(())
}

async fn call_tool(url: &str, tool: &str, args: &str) -> Result<String, Box<dyn std::error::Error>> {
    let arguments: Value = serde_json::from_str(args).map_err(|e| format!("invalid --args JSON: {e}"))?;
    if !arguments.is_object() {
        return Err("--args must be a JSON object".into());
    }
    let resp = rpc(url, METHOD_CALL_TOOL, json!({ "name": tool, "arguments": arguments })).await?;
    match (resp.result, resp.error) {
        (Some(result), _) => Ok(serde_json::to_string_pretty(&result["outputs"])?),
        (None, Some(e)) => Err(format!("{} ({})", e.message, e.code).into()),
        (None, None) => Err("empty response".into()),
    }
}
