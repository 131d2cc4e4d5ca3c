//! fcgi-cli
//!
//! Command-line interface for running scripts on a FastCGI application server.

use std::io::Write;
use std::process::ExitCode;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use fcgi_client::protocol::params::{MANAGEMENT_VARIABLES, SCRIPT_FILENAME};
use fcgi_client::{Client, ClientConfig, FcgiError, NameValuePair, Transport};
use tracing_subscriber::{fmt, EnvFilter};

/// fcgi-cli
#[derive(Parser, Debug)]
#[command(name = "fcgi-cli")]
#[command(about = "Talk to a FastCGI application server")]
#[command(version)]
struct Args {
    /// Server address (host:port, or a socket path with --transport unix)
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    server: String,

    /// Transport: tcp or unix
    #[arg(short, long, default_value = "tcp")]
    transport: Transport,

    /// Read timeout in milliseconds (0 = wait forever)
    #[arg(long, default_value = "0")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script and print its output
    Run {
        /// Path of the script on the application server
        script: String,

        /// Extra parameter as NAME=VALUE (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// File to send as the request body
        #[arg(long)]
        stdin: Option<std::path::PathBuf>,
    },

    /// Query management variables
    Values {
        /// Variable names (defaults to FCGI_MAX_CONNS, FCGI_MAX_REQS, FCGI_MPXS_CONNS)
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fcgi_client=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .address(&args.server)
        .transport(args.transport)
        .read_timeout_ms(args.timeout_ms)
        .build();

    match run(config, args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ClientConfig, command: Commands) -> fcgi_client::Result<ExitCode> {
    tracing::info!("fcgi-cli v{}", fcgi_client::VERSION);
    tracing::info!("Server: {} ({})", config.address, config.transport);

    match command {
        Commands::Run {
            script,
            params,
            stdin,
        } => {
            let mut pairs = vec![NameValuePair::new(SCRIPT_FILENAME, script)?];
            for (name, value) in params {
                pairs.push(NameValuePair::new(name, value)?);
            }

            let body = match stdin {
                Some(path) => Bytes::from(std::fs::read(path)?),
                None => Bytes::new(),
            };

            let exchange = fcgi_client::run_once(config, &pairs, body)?;
            if let Some(status) = exchange.app_status() {
                tracing::debug!("Application status: {}", status);
            }

            std::io::stdout().write_all(&exchange.stdout)?;
            std::io::stderr().write_all(&exchange.stderr)?;

            match exchange.into_stdout() {
                Ok(_) => Ok(ExitCode::SUCCESS),
                Err(FcgiError::ApplicationError(_)) => Ok(ExitCode::FAILURE),
                Err(e) => Err(e),
            }
        }
        Commands::Values { names } => {
            let names = if names.is_empty() {
                MANAGEMENT_VARIABLES.iter().map(|n| n.to_string()).collect()
            } else {
                names
            };

            let client = Client::connect(config)?;
            let values = client.get_values(&names);
            let values = FcgiError::combine(values, client.close())?;

            for pair in values {
                println!(
                    "{}={}",
                    String::from_utf8_lossy(pair.name()),
                    String::from_utf8_lossy(pair.value())
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parse a NAME=VALUE argument
fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}
