//! Purpose: `chart-drawings` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Stdout carries only JSON; diagnostics and logs go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Credentials come from the environment here, never from the library.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use chart_drawings::api::{
    ClientConfig, Credentials, DrawingsClient, Error, ErrorKind, ParsedDrawing, ParsedResponse,
    ToolKind, decode_json, filter_by_group, filter_by_symbol, filter_by_type, generate_client_id,
    generate_drawing_id, generate_link_key, get_summary, parse, to_exit_code,
};
use serde::Serialize;
use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chart-drawings",
    version,
    about = "Build, fetch and inspect chart drawing annotations",
    long_about = None,
    after_help = r#"EXAMPLES
  $ chart-drawings parse response.json --summary
  $ chart-drawings parse response.json --type LineToolTrendLine
  $ SESSION=... SIGNATURE=... chart-drawings fetch AbCdEf12 --symbol BINANCE:BTCUSDT
  $ SESSION=... SIGNATURE=... chart-drawings save AbCdEf12 bundle.json

ENVIRONMENT
  SESSION, SIGNATURE   session cookie values used to mint access tokens
  USER_ID              numeric user id for token issuance (default -1)
  RUST_LOG             log filter for stderr diagnostics (default warn)"#
)]
struct Cli {
    #[arg(long, help = "Storage API base URL")]
    base_url: Option<String>,
    #[arg(long, help = "Access token endpoint URL")]
    token_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a saved drawings response file and print drawings or a summary
    Parse {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        filters: Filters,
    },
    /// Fetch drawings for a layout and print them parsed
    Fetch {
        layout_id: String,
        #[arg(long)]
        chart_id: Option<String>,
        #[command(flatten)]
        filters: Filters,
    },
    /// Save a drawing bundle JSON file to a layout
    Save {
        layout_id: String,
        #[arg(value_hint = ValueHint::FilePath)]
        bundle_file: PathBuf,
        #[arg(long)]
        chart_id: Option<String>,
    },
    /// Print a fresh drawing id, link key and client id
    Ids,
}

#[derive(clap::Args)]
struct Filters {
    #[arg(long = "type", help = "Keep drawings of this tool type, e.g. LineToolTrendLine")]
    kind: Option<String>,
    #[arg(long, help = "Keep drawings on this symbol")]
    symbol: Option<String>,
    #[arg(long, help = "Keep drawings in this group id")]
    group: Option<String>,
    #[arg(long, help = "Print summary counts instead of drawings")]
    summary: bool,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(0);
            }
            _ => {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `chart-drawings --help` for usage."));
            }
        },
    };

    match cli.command {
        Command::Parse { file, filters } => {
            let raw: Value = read_json_file(&file)?;
            let parsed = parse(&raw)?;
            emit_json(render_parsed(&parsed, &filters)?);
        }
        Command::Fetch {
            layout_id,
            chart_id,
            filters,
        } => {
            let client = build_client(cli.base_url, cli.token_url)?;
            let parsed =
                client.get_parsed_drawings(&layout_id, chart_id.as_deref(), filters.symbol.as_deref())?;
            emit_json(render_parsed(&parsed, &filters)?);
        }
        Command::Save {
            layout_id,
            bundle_file,
            chart_id,
        } => {
            let bundle: Value = read_json_file(&bundle_file)?;
            let client = build_client(cli.base_url, cli.token_url)?;
            let response = client.save_drawings_value(&layout_id, bundle, chart_id.as_deref())?;
            emit_json(json!({"saved": layout_id, "response": response}));
        }
        Command::Ids => {
            emit_json(json!({
                "drawingId": generate_drawing_id()?,
                "linkKey": generate_link_key()?,
                "clientId": generate_client_id()?,
            }));
        }
    }
    Ok(0)
}

fn build_client(base_url: Option<String>, token_url: Option<String>) -> Result<DrawingsClient, Error> {
    let mut config = ClientConfig::new();
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(token_url) = token_url {
        config = config.with_token_url(token_url)?;
    }
    Ok(DrawingsClient::new(credentials_from_env()?).with_config(config))
}

fn credentials_from_env() -> Result<Credentials, Error> {
    let mut credentials = Credentials {
        session: std::env::var("SESSION").ok(),
        signature: std::env::var("SIGNATURE").ok(),
        id: None,
    };
    if let Ok(raw) = std::env::var("USER_ID") {
        let id = raw.trim().parse::<i64>().map_err(|err| {
            Error::new(ErrorKind::Validation)
                .with_message("USER_ID must be an integer")
                .with_source(err)
        })?;
        credentials = credentials.with_user_id(id);
    }
    Ok(credentials)
}

fn render_parsed(parsed: &ParsedResponse, filters: &Filters) -> Result<Value, Error> {
    let mut drawings: Vec<&ParsedDrawing> = parsed.drawings.iter().collect();
    if let Some(kind) = &filters.kind {
        drawings = filter_by_type(drawings, &ToolKind::from_tag(kind));
    }
    if let Some(symbol) = &filters.symbol {
        drawings = filter_by_symbol(drawings, symbol);
    }
    if let Some(group) = &filters.group {
        drawings = filter_by_group(drawings, group);
    }

    if filters.summary {
        return encode(&get_summary(drawings), "summary");
    }
    let mut out = Map::new();
    out.insert("drawings".to_string(), encode(&drawings, "drawings")?);
    out.insert("groups".to_string(), encode(&parsed.groups, "groups")?);
    Ok(Value::Object(out))
}

fn encode<T: Serialize>(value: &T, what: &str) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to encode {what}"))
            .with_source(err)
    })
}

fn read_json_file(path: &Path) -> Result<Value, Error> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to read {}", path.display()))
            .with_source(err)
    })?;
    decode_json(&text, &path.display().to_string())
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Validation => "invalid input".to_string(),
        ErrorKind::Auth => "authentication failed".to_string(),
        ErrorKind::Api => "api error".to_string(),
        ErrorKind::Request => "request failed".to_string(),
        ErrorKind::Parse => "invalid response".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(status) = err.status() {
        lines.push(format!("status: {status}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error: ").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}
