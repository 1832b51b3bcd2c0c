//! sshdesk CLI
//!
//! Entry point for the `sshdesk` command-line client.

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use sshdesk::config::EffectiveConfig;
use sshdesk::{ApiClient, ClientError, Message, Response};
use std::path::PathBuf;
use std::process;

/// Usage or configuration problem
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "sshdesk")]
#[command(about = "Client for the sshdesk backend service", version)]
struct Cli {
    /// Service address (host:port)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Path to a TOML config file with a [client] table
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Attempts per request
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Connect timeout in milliseconds
    #[arg(long, global = true)]
    dial_timeout_ms: Option<u64>,

    /// Reply timeout in milliseconds, measured from the start of an attempt
    #[arg(long, global = true)]
    read_timeout_ms: Option<u64>,

    /// Send timeout in milliseconds
    #[arg(long, global = true)]
    write_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service answers
    Ping,

    /// List the service's SSH connections
    Connections,

    /// Send an arbitrary message and print the response
    Send {
        /// Message type
        #[arg(value_name = "TYPE")]
        kind: String,

        /// JSON payload
        #[arg(long)]
        data: Option<String>,
    },

    /// Show the effective client configuration
    Config,
}

impl Cli {
    /// CLI flags as the top configuration layer
    fn overrides(&self) -> Option<Value> {
        let mut client = Map::new();
        if let Some(addr) = &self.addr {
            client.insert("addr".to_string(), json!(addr));
        }
        if let Some(retries) = self.retries {
            client.insert("retries".to_string(), json!(retries));
        }
        if let Some(ms) = self.dial_timeout_ms {
            client.insert("dial_timeout_ms".to_string(), json!(ms));
        }
        if let Some(ms) = self.read_timeout_ms {
            client.insert("read_timeout_ms".to_string(), json!(ms));
        }
        if let Some(ms) = self.write_timeout_ms {
            client.insert("write_timeout_ms".to_string(), json!(ms));
        }

        if client.is_empty() {
            None
        } else {
            Some(json!({ "client": client }))
        }
    }
}

fn main() {
    sshdesk::logging::init_tracing("warn");

    let cli = Cli::parse();

    let effective = match EffectiveConfig::build(cli.config.as_deref(), cli.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(EXIT_USAGE);
        }
    };

    match &cli.command {
        Commands::Config => {
            print_json(&effective);
        }
        Commands::Ping => {
            let client = ApiClient::new(effective.client_config());
            handle_response(client.ping());
        }
        Commands::Connections => {
            let client = ApiClient::new(effective.client_config());
            match client.list_connections() {
                Ok(list) => print_json(&list),
                Err(e) => fail(e),
            }
        }
        Commands::Send { kind, data } => {
            let message = match build_message(kind, data.as_deref()) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Invalid --data: {}", e);
                    process::exit(EXIT_USAGE);
                }
            };
            let client = ApiClient::new(effective.client_config());
            handle_response(client.send(&message));
        }
    }
}

fn build_message(kind: &str, data: Option<&str>) -> Result<Message, String> {
    match data {
        Some(text) => {
            let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
            Message::with_data(kind, &value).map_err(|e| e.to_string())
        }
        None => Ok(Message::new(kind)),
    }
}

/// Print the response; a non-success response exits 1 after printing.
fn handle_response(result: Result<Response, ClientError>) {
    match result {
        Ok(response) => {
            print_json(&response);
            if !response.is_success() {
                fail(ClientError::Rejected {
                    code: response.code,
                    message: response.message.unwrap_or_default(),
                });
            }
        }
        Err(e) => fail(e),
    }
}

fn fail(error: ClientError) -> ! {
    eprintln!("Error: {}", error);
    process::exit(i32::from(error.exit_code()));
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
