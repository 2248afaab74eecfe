//! flippy CLI: edit feature switches from the command line.
//!
//! Subcommands:
//! - `check <file>`: load and validate a condition file, print its wire form
//! - `kinds [--nested]`: list selectable condition kinds
//! - `list [--all]`: list switches on the backend
//! - `create <name> [<file>]`: create a switch (always-off without a file)
//! - `set <name> <file>`: replace a switch's condition
//! - `delete <name>`: delete a switch
//!
//! Condition files are JSON (`.json`) or YAML (anything else) in wire form.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use flippy::{Condition, Registry, Scope, SwitchDirectory};
use flippy_http::{AdminConfig, HttpTransport};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flippy", version, about = "Edit feature switches")]
struct Cli {
    /// Backend config file (JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL. Overrides the config file.
    #[arg(long, global = true, env = "FLIPPY_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a condition file and print its wire form.
    Check {
        /// Condition file.
        file: PathBuf,
    },
    /// List selectable condition kinds.
    Kinds {
        /// Kinds selectable below the root.
        #[arg(long)]
        nested: bool,
    },
    /// List switches.
    List {
        /// Fetch every page instead of just the first.
        #[arg(long)]
        all: bool,
    },
    /// Create a switch.
    Create {
        /// Switch name.
        name: String,
        /// Condition file. Defaults to always-off.
        file: Option<PathBuf>,
    },
    /// Replace a switch's condition.
    Set {
        /// Switch name.
        name: String,
        /// Condition file.
        file: PathBuf,
    },
    /// Delete a switch.
    Delete {
        /// Switch name.
        name: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let registry = Registry::standard();
    match &cli.command {
        Command::Check { file } => cmd_check(registry, file),
        Command::Kinds { nested } => {
            cmd_kinds(registry, if *nested { Scope::Nested } else { Scope::Root });
            Ok(())
        }
        Command::List { all } => cmd_list(registry, &transport(cli)?, *all),
        Command::Create { name, file } => {
            cmd_create(registry, &transport(cli)?, name, file.as_deref())
        }
        Command::Set { name, file } => cmd_set(registry, &transport(cli)?, name, file),
        Command::Delete { name } => cmd_delete(registry, &transport(cli)?, name),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(registry: &Registry, path: &Path) -> Result<(), String> {
    let condition = validated(registry, path)?;
    println!("Condition valid ({})", condition.kind());
    println!("{}", pretty(&condition.to_wire()));
    Ok(())
}

fn cmd_kinds(registry: &Registry, scope: Scope) {
    let catalogue = registry.catalogue(scope);
    println!("{}:", catalogue.placeholder());
    for entry in catalogue.entries() {
        println!("  {:<12} {}", entry.kind.name(), entry.label);
    }
}

fn cmd_list(registry: &Registry, transport: &HttpTransport, all: bool) -> Result<(), String> {
    let mut directory = SwitchDirectory::new(registry);
    let fetched = if all {
        directory.fetch_all(transport)
    } else {
        directory.fetch_page(transport)
    };
    fetched.map_err(|e| format!("list failed: {e}"))?;

    for switch in directory.iter() {
        println!("{}\t{}", switch.name(), switch.clean_snapshot());
    }
    if !all && !directory.is_empty() {
        eprintln!("(first page only; pass --all for every switch)");
    }
    Ok(())
}

fn cmd_create(
    registry: &Registry,
    transport: &HttpTransport,
    name: &str,
    file: Option<&Path>,
) -> Result<(), String> {
    let condition = file.map(|path| load(registry, path)).transpose()?;
    let mut directory = SwitchDirectory::new(registry);
    let switch = directory
        .create(transport, name, condition)
        .map_err(|e| format!("create failed: {e}"))?;
    println!("Created {}", switch.name());
    Ok(())
}

fn cmd_set(
    registry: &Registry,
    transport: &HttpTransport,
    name: &str,
    path: &Path,
) -> Result<(), String> {
    let condition = validated(registry, path)?;
    let mut directory = SwitchDirectory::new(registry);
    directory
        .fetch_all(transport)
        .map_err(|e| format!("list failed: {e}"))?;
    directory
        .edit(name)
        .map_err(|e| e.to_string())?
        .replace_condition(condition);
    directory
        .update(transport, name)
        .map_err(|e| format!("update failed: {e}"))?;
    println!("Updated {name}");
    Ok(())
}

fn cmd_delete(registry: &Registry, transport: &HttpTransport, name: &str) -> Result<(), String> {
    let mut directory = SwitchDirectory::new(registry);
    directory
        .fetch_all(transport)
        .map_err(|e| format!("list failed: {e}"))?;
    directory
        .delete(transport, name)
        .map_err(|e| format!("delete failed: {e}"))?;
    println!("Deleted {name}");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Backend assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn admin_config(cli: &Cli) -> Result<AdminConfig, String> {
    if let Some(url) = &cli.url {
        return Ok(AdminConfig::from_url(url.clone()));
    }
    match &cli.config {
        Some(path) => AdminConfig::from_file(path).map_err(|e| e.to_string()),
        None => Ok(AdminConfig::default()),
    }
}

fn transport(cli: &Cli) -> Result<HttpTransport, String> {
    let transport = HttpTransport::new(&admin_config(cli)?).map_err(|e| e.to_string())?;
    debug!(base_url = transport.base_url(), "using switch backend");
    Ok(transport)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Condition loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_condition(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read \"{}\": {e}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

fn load(registry: &Registry, path: &Path) -> Result<Condition, String> {
    Ok(registry.load(&load_condition(path)?))
}

fn validated(registry: &Registry, path: &Path) -> Result<Condition, String> {
    let mut condition = load(registry, path)?;
    if condition.validate() {
        Ok(condition)
    } else {
        Err(format!(
            "condition invalid:\n{}",
            condition.error().unwrap_or_default()
        ))
    }
}

fn pretty(wire: &Value) -> String {
    serde_json::to_string_pretty(wire).unwrap_or_else(|_| wire.to_string())
}
