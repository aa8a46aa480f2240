//! Thin HTTP client for the metadfs gateway. No logic of its own — every
//! subcommand is a single call against the gateway's public surface.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "metadfs", about = "Client for the metadfs gateway")]
struct Cli {
    /// Gateway base URL.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    gateway: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update a file's metadata.
    Put {
        #[arg(long)]
        file_id: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        size: u64,
    },
    /// Fetch a file's metadata.
    Get {
        #[arg(long)]
        file_id: String,
    },
    /// Delete a file's metadata.
    Rm {
        #[arg(long)]
        file_id: String,
    },
    /// List files under a prefix across the cluster.
    Ls {
        #[arg(long, default_value = "/")]
        prefix: String,
    },
    /// Show the live node set.
    Nodes,
    /// Show per-node stats.
    Stats,
    /// Drop the gateway's cached entry for a file.
    Invalidate {
        #[arg(long)]
        file_id: String,
    },
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

async fn expect_json(response: reqwest::Response) -> Result<Value> {
    let response = response.error_for_status()?;
    response.json().await.context("undecodable response body")
}

/// 404 is an expected outcome for get/rm, rendered as a result rather
/// than a failure.
async fn json_or_not_found(response: reqwest::Response, file_id: &str) -> Result<Value> {
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(json!({"error": "not_found", "file_id": file_id}));
    }
    expect_json(response).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let gateway = cli.gateway.trim_end_matches('/').to_string();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let output = match cli.command {
        Command::Put {
            file_id,
            owner,
            size,
        } => {
            let response = client
                .post(format!("{gateway}/files"))
                .json(&json!({"file_id": file_id, "owner": owner, "size": size}))
                .send()
                .await?;
            expect_json(response).await?
        }
        Command::Get { file_id } => {
            let response = client
                .get(format!("{gateway}/files/{file_id}"))
                .send()
                .await?;
            json_or_not_found(response, &file_id).await?
        }
        Command::Rm { file_id } => {
            let response = client
                .delete(format!("{gateway}/files/{file_id}"))
                .send()
                .await?;
            json_or_not_found(response, &file_id).await?
        }
        Command::Ls { prefix } => {
            let response = client
                .get(format!("{gateway}/files"))
                .query(&[("prefix", prefix.as_str())])
                .send()
                .await?;
            expect_json(response).await?
        }
        Command::Nodes => {
            let response = client.get(format!("{gateway}/nodes")).send().await?;
            expect_json(response).await?
        }
        Command::Stats => {
            let response = client.get(format!("{gateway}/stats")).send().await?;
            expect_json(response).await?
        }
        Command::Invalidate { file_id } => {
            let response = client
                .post(format!("{gateway}/cache/invalidate/{file_id}"))
                .send()
                .await?;
            expect_json(response).await?
        }
    };

    print_json(&output);
    Ok(())
}
