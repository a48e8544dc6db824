use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use pagemap::handlers::{
    config_path, handle_init, handle_layout, handle_session_command, handle_watch, init_logging,
    load_config,
};
use pagemap_core::print_banner;
use pagemap_stream::SessionCommand;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_logging(chosen_command.get_count("verbose"), quiet);

    // layout output is often piped, keep stdout clean for it
    let show_banner = !quiet && !matches!(chosen_command.subcommand(), Some(("layout", _)));
    if show_banner {
        print_banner();
    }

    if let Err(e) = run(&chosen_command).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(chosen_command: &ArgMatches) -> anyhow::Result<()> {
    // init must work even when the existing config is unreadable
    if let Some(("init", primary_command)) = chosen_command.subcommand() {
        return handle_init(primary_command, &config_path(chosen_command));
    }

    let config = load_config(chosen_command)?;

    match chosen_command.subcommand() {
        None => Ok(()),
        Some(("layout", primary_command)) => handle_layout(primary_command, &config),
        Some(("watch", primary_command)) => handle_watch(primary_command, &config).await,
        Some(("session", primary_command)) => {
            let (action, secondary_command) = match primary_command.subcommand() {
                Some(("pause", args)) => (SessionCommand::Pause, args),
                Some(("resume", args)) => (SessionCommand::Resume, args),
                Some(("cancel", args)) => (SessionCommand::Cancel, args),
                _ => unreachable!("clap should ensure we don't get here"),
            };
            handle_session_command(secondary_command, &config, action).await
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
