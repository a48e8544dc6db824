use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};
use pagemap::config::DEFAULT_CONFIG_PATH;

fn session_id_arg() -> clap::Arg {
    arg!(<SESSION_ID>).help("Identifier of the discovery session")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("pagemap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pagemap")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .help("Path to the pagemap configuration file")
                .default_value(DEFAULT_CONFIG_PATH)
                .global(true),
        )
        .arg(
            arg!(--"api-url" <URL>)
                .required(false)
                .help("Base URL of the discovery API (overrides the config file)")
                .value_parser(clap::value_parser!(url::Url))
                .global(true),
        )
        .arg(
            arg!(--"token" <TOKEN>)
                .required(false)
                .help("API token (overrides the config file)")
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a default pagemap configuration file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the configuration (defaults to --config)"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing configuration without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("layout")
                .about("Computes 2D positions for a page graph")
                .arg(
                    arg!(-i --"input" <FILE>)
                        .required(true)
                        .help("JSON file with `nodes` and `edges`")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-p --"policy" <POLICY>)
                        .required(false)
                        .help("Layout policy")
                        .value_parser(["hierarchical", "force-directed", "radial"])
                        .default_value("hierarchical"),
                )
                .arg(
                    arg!(-r --"root" <NODE_ID>)
                        .required(false)
                        .help("Root node for the radial policy (defaults to the first node)"),
                )
                .arg(
                    arg!(--"seed" <SEED>)
                        .required(false)
                        .help("Seed for the force-directed jitter")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the layout to a file (default: print to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("watch")
                .about("Follows the live progress of a discovery session")
                .arg(session_id_arg()),
        )
        .subcommand(
            command!("session")
                .about("Controls a running discovery session")
                .subcommand_required(true)
                .subcommand(
                    command!("pause")
                        .about("Pauses the session")
                        .arg(session_id_arg()),
                )
                .subcommand(
                    command!("resume")
                        .about("Resumes a paused session")
                        .arg(session_id_arg()),
                )
                .subcommand(
                    command!("cancel")
                        .about("Cancels the session")
                        .arg(session_id_arg()),
                ),
        )
}
