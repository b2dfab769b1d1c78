//! Row Actions Host Harness
//!
//! Binary entry point that plays the host: loads actions and a row, wires up
//! the attribute locations, and prints what the action cell would offer or emit.

use clap::Parser;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use row_actions::{ActionCell, MenuEntry};
use row_actions_common::config::{LoggingConfig, RowActionsConfig};
use row_actions_common::error::Error;
use row_actions_common::types::{ActionPayload, HostId, Row};
use row_actions_rules::{ActionConfig, HostAttributes, LayeredAttributeSource, MemoryStorage};

#[derive(Parser, Debug)]
#[command(name = "row-actions")]
#[command(about = "Evaluate table row actions against a row and RLS attributes", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "row-actions.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// JSON file with the action list
    #[arg(short, long)]
    actions: PathBuf,

    /// Row as inline JSON, or @path to a JSON file
    #[arg(short, long)]
    row: String,

    /// Treat the row as selected
    #[arg(long)]
    selected: bool,

    /// Chart identifier included in payloads
    #[arg(long)]
    chart_id: Option<String>,

    /// Row identifier
    #[arg(long, default_value = "0")]
    row_id: String,

    /// Name of the id column, passed through to the host
    #[arg(long)]
    id_column: Option<String>,

    /// Host globals as inline JSON or @path; the configured global key holds the attributes
    #[arg(long)]
    globals: Option<String>,

    /// Bearer token in the local storage scope
    #[arg(long, env = "ROW_ACTIONS_LOCAL_TOKEN")]
    local_token: Option<String>,

    /// Bearer token in the session storage scope
    #[arg(long, env = "ROW_ACTIONS_SESSION_TOKEN")]
    session_token: Option<String>,

    /// Simulate a click on the action with this key and print its payload
    #[arg(long)]
    click: Option<String>,
}

fn init_logging(logging: &LoggingConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the JSON result
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

/// Inline JSON, or the contents of a file when prefixed with `@`
fn read_json(arg: &str) -> anyhow::Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}

/// Malformed entries are skipped; only unreadable files or non-JSON text fail
fn read_actions(path: &Path) -> anyhow::Result<Vec<ActionConfig>> {
    let content = std::fs::read_to_string(path)?;
    Ok(ActionConfig::list_from_json(&content)?)
}

fn host_id(raw: &str) -> HostId {
    raw.parse::<i64>()
        .map_or_else(|_| HostId::from(raw), HostId::from)
}

fn storage_scope(key: &str, token: Option<&str>) -> Arc<MemoryStorage> {
    let scope = Arc::new(MemoryStorage::new());
    if let Some(token) = token {
        scope.set_item(key, token);
    }
    scope
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = RowActionsConfig::load(&args.config)?;
    init_logging(&config.logging, args.log_level.as_deref());

    info!("Row actions harness v{}", env!("CARGO_PKG_VERSION"));
    if !args.config.exists() {
        info!("Using default configuration");
    }

    let actions = read_actions(&args.actions)?;
    let row: Row = serde_json::from_value(read_json(&args.row)?)?;

    let host = match args.globals.as_deref() {
        Some(globals) => HostAttributes::from_globals(&read_json(globals)?, &config.attributes.global_key),
        None => HostAttributes::new(),
    };
    let storage_key = config.attributes.token_storage_key.clone();
    let source = LayeredAttributeSource::new(config.attributes)
        .with_host(host)
        .with_scope(storage_scope(&storage_key, args.local_token.as_deref()))
        .with_scope(storage_scope(&storage_key, args.session_token.as_deref()));

    let mut cell = ActionCell::new(host_id(&args.row_id), &actions, &row, &source)
        .selected(args.selected);
    if let Some(chart_id) = args.chart_id.as_deref() {
        cell = cell.with_chart_id(host_id(chart_id));
    }
    if let Some(id_column) = args.id_column.as_deref() {
        cell = cell.with_id_column(id_column);
    }

    let output = match args.click.as_deref() {
        Some(key) => {
            let mut emitted: Option<ActionPayload> = None;
            cell.click(key, &mut |payload: ActionPayload| emitted = Some(payload));
            let payload = emitted.ok_or_else(|| Error::ActionNotVisible(key.to_string()))?;
            serde_json::to_value(payload)?
        }
        None => {
            let visible = cell.visible_actions();
            info!(
                visible = visible.len(),
                configured = actions.len(),
                "evaluated row actions"
            );
            Value::Array(
                visible
                    .iter()
                    .enumerate()
                    .map(|(index, action)| {
                        json!({
                            "menu": MenuEntry::from_visible(index, action),
                            "matchingRlsConditions": action.matching_rls_conditions,
                        })
                    })
                    .collect(),
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
