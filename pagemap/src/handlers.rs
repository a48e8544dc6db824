use crate::config::{Config, expand_path};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pagemap_core::export::{ExportFormat, export_layout, save_export};
use pagemap_core::{GraphInput, LayoutConfig, LayoutEngine, LayoutPolicy};
use pagemap_stream::status::ActivityEntry;
use pagemap_stream::{
    ActivityKind, ConnectionState, SessionCommand, SessionControl, SessionState, SessionStatus,
    StreamClient, StreamError,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Level;

/// Install the stderr log subscriber. `-v` steps from warn to info, debug and trace.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn config_path(matches: &ArgMatches) -> PathBuf {
    let raw = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(crate::config::DEFAULT_CONFIG_PATH);
    expand_path(raw)
}

/// Resolve the configuration from `--config`, then apply `--api-url` and `--token`.
pub fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = config_path(matches);
    let api_url = matches.get_one::<url::Url>("api-url").map(|u| u.as_str());
    let token = matches.get_one::<String>("token").map(String::as_str);
    Ok(Config::load(&path)?.with_overrides(api_url, token))
}

// Helper functions for the layout handler

/// Load a page graph from a JSON file with `nodes` and `edges`.
pub fn load_graph_from_file(path: &Path) -> Result<GraphInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file {}", path.display()))?;
    GraphInput::from_json(&content)
        .with_context(|| format!("Invalid page graph in {}", path.display()))
}

pub fn parse_export_format(raw: &str) -> Result<ExportFormat> {
    ExportFormat::from_str(raw).ok_or_else(|| anyhow!("Unknown output format '{}'", raw))
}

/// Lay out `graph` and render it in `format`.
pub fn render_layout(
    graph: &GraphInput,
    config: LayoutConfig,
    policy: LayoutPolicy,
    root: Option<&str>,
    format: ExportFormat,
) -> Result<String> {
    let engine = LayoutEngine::new(config);
    let result = engine.layout(&graph.nodes, &graph.edges, policy, root);
    export_layout(&result, &graph.nodes, format).context("Failed to serialize layout")
}

pub fn handle_layout(args: &ArgMatches, config: &Config) -> Result<()> {
    let input = args
        .get_one::<PathBuf>("input")
        .ok_or_else(|| anyhow!("--input is required"))?;
    let policy: LayoutPolicy = args
        .get_one::<String>("policy")
        .map(String::as_str)
        .unwrap_or("hierarchical")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let root = args.get_one::<String>("root").map(String::as_str);
    let format = parse_export_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;

    let mut layout_config = config.layout.clone();
    if let Some(seed) = args.get_one::<u64>("seed") {
        layout_config = layout_config.with_seed(*seed);
    }

    let graph = load_graph_from_file(input)?;
    let rendered = render_layout(&graph, layout_config, policy, root, format)?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_export(&rendered, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {} layout of {} pages saved to {}",
                "✓".green().bold(),
                policy,
                graph.nodes.len(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

// Helper functions for the watch handler

fn activity_line(entry: &ActivityEntry) -> String {
    let marker = match entry.kind {
        ActivityKind::Info => "→".blue(),
        ActivityKind::Success => "✓".green().bold(),
        ActivityKind::Warning => "⚠".yellow().bold(),
        ActivityKind::Error => "✗".red().bold(),
    };
    format!(
        "{} {} {}",
        entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
        marker,
        entry.message
    )
}

/// Entries of `activity` that come after `last_seen`. Everything is new when `last_seen` has
/// already been dropped from the capped log.
pub fn unseen_activity<'a>(
    activity: &'a [ActivityEntry],
    last_seen: Option<&ActivityEntry>,
) -> &'a [ActivityEntry] {
    match last_seen.and_then(|seen| activity.iter().rposition(|e| e == seen)) {
        Some(index) => &activity[index + 1..],
        None => activity,
    }
}

pub fn status_summary(status: &SessionStatus) -> String {
    let mut line = format!(
        "{} {:>5.1}% | pages {} | flows {} | elements {} | forms {}",
        status.state.as_str(),
        status.progress,
        status.pages_found,
        status.flows_found,
        status.elements_found,
        status.forms_found
    );
    if let Some(ref page) = status.current_page {
        line.push_str(&format!(" | {}", page));
    }
    line
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_watch(args: &ArgMatches, config: &Config) -> Result<()> {
    let session_id = args
        .get_one::<String>("SESSION_ID")
        .ok_or_else(|| anyhow!("a session id is required"))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.cyan} [{prefix}] {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Connecting to session {}", session_id));

    let last_seen: Arc<Mutex<Option<ActivityEntry>>> = Arc::new(Mutex::new(None));
    let status_spinner = spinner.clone();
    let status_callback = Arc::new(move |status: &SessionStatus| {
        if let Ok(mut last) = last_seen.lock() {
            for entry in unseen_activity(&status.activity, last.as_ref()) {
                status_spinner.println(activity_line(entry));
            }
            if let Some(entry) = status.activity.last() {
                *last = Some(entry.clone());
            }
        }
        status_spinner.set_message(status_summary(status));
    });

    let connection_spinner = spinner.clone();
    let connection_callback = Arc::new(move |state: ConnectionState| {
        connection_spinner.set_prefix(state.label());
    });

    let mut client = StreamClient::new(&config.api_url)?
        .with_retry_policy(config.retry.to_policy())
        .with_status_callback(status_callback)
        .with_connection_callback(connection_callback);
    if let Some(ref token) = config.token {
        client = client.with_token(token);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = client.run(session_id, shutdown_rx);
    tokio::pin!(run);

    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            spinner.println(format!("{} Closing stream", "→".yellow().bold()));
            let _ = shutdown_tx.send(true);
            run.await
        }
    };

    spinner.finish_and_clear();

    match result {
        Ok(status) => {
            print_divider();
            let headline = match status.state {
                SessionState::Completed => "✓ Discovery complete".green().bold(),
                SessionState::Failed => "✗ Discovery failed".red().bold(),
                SessionState::Cancelled => "⚠ Discovery cancelled".yellow().bold(),
                _ => "→ Stopped watching".blue().bold(),
            };
            println!("{}", headline);
            println!("  {}", status_summary(&status));
            if let Some(ref error) = status.last_error {
                println!("  {} {}", "Last error:".red(), error);
            }
            print_divider();
            Ok(())
        }
        Err(StreamError::ConnectionExhausted { attempts }) => Err(anyhow!(
            "Lost connection to session {} after {} attempts",
            session_id,
            attempts
        )),
        Err(e) => Err(e).context("Progress stream failed"),
    }
}

pub async fn handle_session_command(
    args: &ArgMatches,
    config: &Config,
    command: SessionCommand,
) -> Result<()> {
    let session_id = args
        .get_one::<String>("SESSION_ID")
        .ok_or_else(|| anyhow!("a session id is required"))?;

    let mut control = SessionControl::new(&config.api_url)?;
    if let Some(ref token) = config.token {
        control = control.with_token(token);
    }

    match control.send(session_id, command).await {
        Ok(()) => {
            println!(
                "{} {} requested for session {}",
                "✓".green().bold(),
                command.as_str(),
                session_id.bright_white()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "{} Could not {} session {}",
                "✗".red().bold(),
                command.as_str(),
                session_id.bright_white()
            );
            Err(e.into())
        }
    }
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<Config> {
    let config = Config::default();
    config.save(path)?;
    Ok(config)
}

pub fn handle_init(args: &ArgMatches, config_path: &Path) -> Result<()> {
    print_divider();
    println!("{}", "  PAGEMAP INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let target = args
        .get_one::<String>("PATH")
        .map(|raw| expand_path(raw))
        .unwrap_or_else(|| config_path.to_path_buf());
    let force = args.get_flag("force");

    println!(
        "{} Target: {}",
        "→".blue(),
        target.display().to_string().bright_white()
    );
    println!();

    if target.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A configuration file already exists and will be overwritten.");
        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    let config = write_default_config(&target)?;

    println!("{} Configuration written", "✓".green().bold());
    println!("  {} API: {}", "•".blue(), config.api_url);
    println!(
        "  {} Retry: {} attempts, {}ms base delay",
        "•".blue(),
        config.retry.max_attempts,
        config.retry.base_delay_ms
    );
    Ok(())
}
