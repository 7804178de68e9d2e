use crate::mmcp::{self, ExportReport, ImportReport};
use crate::model::{AppConfig, LaunchDefinition, ProbeMode};
use crate::presets::{self, PRESETS};
use crate::probe::Prober;
use crate::registry::Registry;
use crate::storage::ConfigStore;
use crate::text_summary::{build_json_listing, build_text_summary};
use anyhow::{anyhow, bail, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

type Output = mpsc::UnboundedSender<OutputLine>;

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (Output, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

fn say(out: &Output, msg: impl Into<String>) {
    let _ = out.send(OutputLine::Stdout(msg.into()));
}

fn note(out: &Output, msg: impl Into<String>) {
    let _ = out.send(OutputLine::Stderr(msg.into()));
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "cxmcp",
    version,
    about = "Interactive MCP server control panel for the Codex CLI",
    disable_help_flag = true
)]
pub struct Cli {
    /// Codex configuration directory
    #[arg(long, env = "CODEX_HOME", global = true)]
    pub codex_home: Option<PathBuf>,

    /// File holding the active servers [default: <codex-home>/config.toml]
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// File holding the disabled servers [default: <codex-home>/cxmcp_backup.toml]
    #[arg(long, global = true)]
    pub backup_file: Option<PathBuf>,

    /// mmcp configuration file [default: ~/.mmcp.json]
    #[arg(long, global = true)]
    pub mmcp_file: Option<PathBuf>,

    /// How long a single server probe may take
    #[arg(long, default_value = "6s", global = true)]
    pub probe_timeout: humantime::Duration,

    /// When a probe counts as reachable
    #[arg(long, value_enum, default_value = "launch", global = true)]
    pub probe_mode: ProbeMode,

    /// Print help followed by the server list
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Merge the active servers into the mmcp configuration
    ExportToMmcp,
    /// Add servers from the mmcp configuration that are not configured yet
    ImportFromMmcp,
    /// Print the server list and exit
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Probe every server and include the result
        #[arg(long)]
        status: bool,
    },
    /// Add a new, enabled server
    Add(AddArgs),
    /// Move a server to the active table
    Enable { name: String },
    /// Move a server to the backup table
    Disable { name: String },
    /// Flip a server between enabled and disabled
    Toggle { name: String },
    /// List the built-in server presets
    Presets,
    /// Print the resolved configuration as JSON
    Config,
}

#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    /// Server name
    pub name: String,

    /// Use a built-in preset instead of a command (see `cxmcp presets`)
    #[arg(long, conflicts_with = "command")]
    pub preset: Option<String>,

    /// Environment variable for the server process (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Executable to launch
    #[arg(required_unless_present = "preset")]
    pub command: Option<String>,

    /// Arguments passed to the executable
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err("environment variable name must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build an `AppConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<AppConfig> {
    resolve_config(args, dirs::home_dir())
}

fn resolve_config(args: &Cli, home: Option<PathBuf>) -> Result<AppConfig> {
    let codex_home = match (&args.codex_home, &home) {
        (Some(dir), _) => dir.clone(),
        (None, Some(home)) => home.join(".codex"),
        (None, None) => bail!("cannot determine the home directory; pass --codex-home"),
    };
    let mmcp_path = args.mmcp_file.clone().unwrap_or_else(|| {
        home.as_ref()
            .unwrap_or(&codex_home)
            .join(".mmcp.json")
    });

    Ok(AppConfig {
        active_path: args
            .config_file
            .clone()
            .unwrap_or_else(|| codex_home.join("config.toml")),
        backup_path: args
            .backup_file
            .clone()
            .unwrap_or_else(|| codex_home.join("cxmcp_backup.toml")),
        mmcp_path,
        probe_timeout: Duration::from(args.probe_timeout),
        probe_mode: args.probe_mode,
        codex_home,
    })
}

/// Whether to print the listing instead of opening the menu.
fn listing_only(help: bool, ci: bool, stdout_is_tty: bool) -> bool {
    help || ci || !stdout_is_tty
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let registry = Registry::new(ConfigStore::from_config(&cfg));
    let prober = Prober::from_config(&cfg);
    tracing::debug!(
        active = %registry.store().active_path().display(),
        backup = %registry.store().backup_path().display(),
        "using config files"
    );

    if let Some(command) = args.command.clone() {
        return run_command(command, &cfg, &registry, &prober).await;
    }

    let ci = std::env::var("CI").is_ok_and(|v| v == "true");
    let tty = std::io::stdout().is_terminal();
    tracing::debug!(tty, ci, help = args.help, "terminal detection");

    if listing_only(args.help, ci, tty) {
        return run_listing(args.help, &registry).await;
    }

    #[cfg(feature = "tui")]
    {
        crate::orchestrator::run_session(&registry, &prober).await
    }
    #[cfg(not(feature = "tui"))]
    {
        // Fallback when built without TUI support.
        run_listing(false, &registry).await
    }
}

async fn run_listing(help: bool, registry: &Registry) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    if help {
        say(&out_tx, Cli::command().render_help().to_string());
    }
    say(&out_tx, "  cxmcp - Codex MCP Control Panel");
    for line in build_text_summary(&registry.list(), None).lines {
        say(&out_tx, line);
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_command(
    command: Command,
    cfg: &AppConfig,
    registry: &Registry,
    prober: &Prober,
) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let res = dispatch(command, cfg, registry, prober, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn dispatch(
    command: Command,
    cfg: &AppConfig,
    registry: &Registry,
    prober: &Prober,
    out: &Output,
) -> Result<()> {
    match command {
        Command::ExportToMmcp => {
            let report = mmcp::export_to_mmcp(registry, &cfg.mmcp_path)?;
            print_export(out, &report, cfg);
        }
        Command::ImportFromMmcp => {
            let report = mmcp::import_from_mmcp(registry, &cfg.mmcp_path)?;
            print_import(out, &report);
        }
        Command::List { json, status } => {
            let entries = registry.list();
            let results = if status {
                Some(prober.probe_all(&entries).await)
            } else {
                None
            };
            if json {
                say(out, build_json_listing(&entries, results.as_deref())?);
            } else {
                for line in build_text_summary(&entries, results.as_deref()).lines {
                    say(out, line);
                }
            }
        }
        Command::Add(add) => {
            let definition = add_definition(&add)?;
            let shown = definition.command_line();
            registry.add(&add.name, definition)?;
            say(out, format!("Added server '{}': {shown}", add.name));
        }
        Command::Enable { name } => {
            if registry.enable(&name)? {
                say(out, format!("Server '{name}' enabled"));
            } else {
                say(out, format!("Server '{name}' is already enabled"));
            }
        }
        Command::Disable { name } => {
            if registry.disable(&name)? {
                say(out, format!("Server '{name}' disabled"));
            } else {
                say(out, format!("Server '{name}' is already disabled"));
            }
        }
        Command::Toggle { name } => {
            let state = if registry.toggle(&name)? {
                "enabled"
            } else {
                "disabled"
            };
            say(out, format!("Server '{name}' {state}"));
        }
        Command::Presets => {
            for preset in PRESETS {
                say(
                    out,
                    format!(
                        "  {:<20} {} - {}",
                        preset.name, preset.display_name, preset.description
                    ),
                );
                say(
                    out,
                    format!("  {:<20} {}", "", preset.definition().command_line()),
                );
            }
        }
        Command::Config => {
            say(out, serde_json::to_string_pretty(cfg)?);
        }
    }
    Ok(())
}

fn add_definition(add: &AddArgs) -> Result<LaunchDefinition> {
    let base = match (&add.preset, &add.command) {
        (Some(name), _) => presets::find(name)
            .ok_or_else(|| anyhow!("unknown preset '{name}' (see `cxmcp presets`)"))?
            .definition(),
        (None, Some(command)) => LaunchDefinition::new(command.clone(), add.args.clone()),
        (None, None) => bail!("either a command or --preset is required"),
    };
    let env: BTreeMap<String, String> = add.env.iter().cloned().collect();
    Ok(base.with_env(env))
}

fn print_export(out: &Output, report: &ExportReport, cfg: &AppConfig) {
    if report.exported.is_empty() {
        note(out, "No MCP servers found in Codex configuration");
        note(
            out,
            format!(
                "Make sure you have MCP servers configured in {}",
                cfg.active_path.display()
            ),
        );
        return;
    }

    say(out, format!("Found {} MCP server(s):", report.exported.len()));
    for (name, command) in &report.exported {
        say(out, format!("  • {name} ({command})"));
    }
    for name in &report.added {
        say(out, format!("  ✓ Added: {name}"));
    }
    for name in &report.updated {
        say(out, format!("  ✓ Updated: {name}"));
    }
    say(out, "Export completed successfully!");
    say(out, format!("  • New servers: {}", report.added.len()));
    say(out, format!("  • Updated servers: {}", report.updated.len()));
    say(out, format!("  • Saved to: {}", cfg.mmcp_path.display()));
    say(out, "Next steps:");
    say(out, "  1. Install mmcp (if not installed): npm install -g mmcp");
    say(out, "  2. Add target CLI: mmcp agents add codex-cli");
    say(out, "  3. Apply settings: mmcp apply");
}

fn print_import(out: &Output, report: &ImportReport) {
    for name in &report.imported {
        say(out, format!("  ✓ Imported: {name}"));
    }
    for name in &report.skipped {
        say(out, format!("  • Skipped (already configured): {name}"));
    }
    for (name, reason) in &report.invalid {
        note(out, format!("  ✗ Invalid: {name} ({reason})"));
    }
    say(
        out,
        format!(
            "Import finished: {} imported, {} skipped, {} invalid",
            report.imported.len(),
            report.skipped.len(),
            report.invalid.len()
        ),
    );
}
