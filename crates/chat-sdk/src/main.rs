//! Chat command-line client
//!
//! Run with:
//! ```bash
//! cargo run -p chat-sdk --bin chat-cli -- get /v1/me
//! ```
//!
//! Endpoints default to `CHAT_API_BASE_URL` / `CHAT_WS_URL` (a `.env` file is
//! honoured); the bearer token comes from `--token` or `CHAT_TOKEN`.

use anyhow::Context;
use chat_common::{try_init_tracing_with_config, TracingConfig};
use chat_sdk::{ApiError, ClientConfig, InMemoryTokenStore, Sdk, Session, AUTH_ERROR, NET_ERROR};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "chat-cli", about = "Chat API and WebSocket client", version)]
struct Cli {
    #[arg(long, env = "CHAT_API_BASE_URL")]
    api_base_url: Option<String>,

    #[arg(long, env = "CHAT_WS_URL")]
    ws_url: Option<String>,

    #[arg(long, env = "CHAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GET a path and print its data
    Get { path: String },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// PATCH a JSON body
    Patch {
        path: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// Print WebSocket notifications until Ctrl-C
    Watch {
        /// Additional event or action names to subscribe to
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Send one request over the WebSocket and print the matching response
    Send {
        action: String,
        #[arg(long, default_value = "{}")]
        data: String,
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::cli();
    if cli.verbose {
        tracing_config.level = tracing::Level::DEBUG;
    }
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_vars(|key| match key {
        "CHAT_API_BASE_URL" => cli.api_base_url.clone(),
        "CHAT_WS_URL" => cli.ws_url.clone(),
        _ => std::env::var(key).ok(),
    })
    .context("loading configuration")?;

    let tokens = match &cli.token {
        Some(token) => std::sync::Arc::new(InMemoryTokenStore::with_token(token.as_str())),
        None => InMemoryTokenStore::new_shared(),
    };
    let sdk = Sdk::new(config, tokens)?;

    match cli.command {
        Command::Get { path } => print_api(sdk.api().get(&path).await),
        Command::Post { path, data } => {
            let body = parse_json(&data)?;
            print_api(sdk.api().post(&path, &body).await)
        }
        Command::Put { path, data } => {
            let body = parse_json(&data)?;
            print_api(sdk.api().put(&path, &body).await)
        }
        Command::Patch { path, data } => {
            let body = parse_json(&data)?;
            print_api(sdk.api().patch(&path, &body).await)
        }
        Command::Watch { events } => watch(&sdk.session(), events).await,
        Command::Send {
            action,
            data,
            timeout_secs,
        } => {
            let body = parse_json(&data)?;
            let session = sdk.session();
            session.connect().await.context("connecting")?;

            let response = session
                .request(&action, &body, Duration::from_secs(timeout_secs))
                .await;
            session.close();

            println!("{}", serde_json::to_string_pretty(&response?)?);
            Ok(())
        }
    }
}

fn parse_json(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("--data is not valid JSON: {raw}"))
}

fn print_api(result: Result<Value, ApiError>) -> anyhow::Result<()> {
    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(e) => {
            if let Some(kind) = e.auth_error() {
                eprintln!("auth_error: {kind}");
            }
            Err(e.into())
        }
    }
}

/// Names every watch subscribes to, followed by `extra`
fn watch_names(extra: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = [NET_ERROR, AUTH_ERROR, "message"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for name in extra {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

async fn watch(session: &Session, events: Vec<String>) -> anyhow::Result<()> {
    for name in watch_names(events) {
        let label = name.clone();
        session.on(name, move |event| {
            println!("{label} {}", event.to_value());
        });
    }

    session.connect().await.context("connecting")?;
    tokio::signal::ctrl_c().await?;
    session.close();
    Ok(())
}
