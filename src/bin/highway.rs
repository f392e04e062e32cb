//! Highway command-line entry point.
//!
//! Sends a single request through a [`Highway`] instance and prints the
//! resolved result to stdout. Logs go to stderr and are controlled with
//! `RUST_LOG` (e.g. `RUST_LOG=highway=debug`).
//!
//! ```text
//! highway get /penguins --base https://snowball.aq/api -q page=2 --resolver json
//! ```

use clap::Parser;
use highway::config::load_config_file;
use highway::{Body, Highway, HighwayConfig, HighwayError, HttpMethod, Request, Resolved, Resolver};
use log::{debug, error};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "highway", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Cli {
    /// HTTP method: get, post, put, patch or delete.
    #[arg(value_parser = parse_method)]
    method: HttpMethod,

    /// Request path, absolute or relative to --base.
    path: String,

    /// Base URL the path is merged onto.
    #[arg(long)]
    base: Option<String>,

    /// Settings file holding a "highway" object.
    #[arg(long)]
    config: Option<String>,

    /// Header as "name:value". Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Query parameter as "key=value". Repeatable.
    #[arg(short = 'q', long = "query", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Raw request body.
    #[arg(long, conflicts_with = "json")]
    data: Option<String>,

    /// JSON request body.
    #[arg(long, value_parser = parse_json)]
    json: Option<serde_json::Value>,

    /// Decode the body: text, json, blob, bytes, form or void.
    #[arg(long, value_parser = parse_resolver, conflicts_with = "soft")]
    resolver: Option<Resolver>,

    /// Print the response whatever its status.
    #[arg(long)]
    soft: bool,

    /// Fail on an empty response body.
    #[arg(long)]
    must: bool,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout: Option<u64>,
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    HttpMethod::from_str(s).ok_or_else(|| format!("unsupported method: {}", s))
}

fn parse_resolver(s: &str) -> Result<Resolver, String> {
    Resolver::from_str(s).ok_or_else(|| format!("unknown resolver: {}", s))
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got {:?}", s))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    debug!("Parsed arguments: {:?}", cli);

    tokio::select! {
        code = run(cli) => code,
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted");
            ExitCode::from(130)
        }
    }
}

async fn run(cli: Cli) -> ExitCode {
    match execute(cli).await {
        Ok(resolved) => {
            print_resolved(resolved);
            ExitCode::SUCCESS
        }
        Err(HighwayError::Api(api_error)) => {
            eprintln!("{} {}", api_error.status(), api_error.status_text());
            match api_error.text().await {
                Ok(text) if !text.is_empty() => eprintln!("{}", text),
                Ok(_) => {}
                Err(e) => error!("Failed to read error body: {}", e),
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<Resolved, HighwayError> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => HighwayConfig::default(),
    };
    if cli.base.is_some() {
        config.base = cli.base.clone();
    }

    let highway = Highway::new(config)?;

    let mut request = Request::new(cli.method, cli.path);
    request.headers = cli.headers;
    request.params = cli.params;
    if let Some(data) = cli.data {
        request = request.body(Body::Text(data));
    }
    if let Some(value) = cli.json {
        request = request.body(Body::Json(value));
    }
    if let Some(timeout) = cli.timeout {
        request = request.timeout(timeout);
    }
    if let Some(resolver) = cli.resolver {
        request = request.resolver(resolver);
    }
    if cli.soft {
        request = request.soft();
    }
    if cli.must {
        request = request.must();
    }

    highway.handle(request).await
}

fn print_resolved(resolved: Resolved) {
    match resolved {
        Resolved::Response(response) => {
            eprintln!("{} {} ({:?})", response.status_code, response.status_text, response.duration);
            println!("{}", String::from_utf8_lossy(&response.body));
        }
        Resolved::Text(text) => println!("{}", text),
        Resolved::Json(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", value),
        },
        Resolved::Blob(blob) => {
            let content_type = blob.content_type.as_deref().unwrap_or("unknown");
            println!("<{} bytes of {}>", blob.len(), content_type);
        }
        Resolved::Bytes(bytes) => println!("<{} bytes>", bytes.len()),
        Resolved::Form(pairs) => {
            for (key, value) in pairs {
                println!("{}={}", key, value);
            }
        }
        Resolved::Empty => {}
    }
}
