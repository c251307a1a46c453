mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, ValueEnum};
use tracing_subscriber::EnvFilter;

use crimson_core::Controller;

use crate::cli::{Cli, ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.global.verbose);
    apply_file_defaults(&mut cli.global, &matches);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `[defaults]` from the config file fill in `--output` / `--color`
/// when neither the flag nor its env var was given.
fn apply_file_defaults(global: &mut GlobalOpts, matches: &ArgMatches) {
    // Global args are propagated down, so the innermost matches are authoritative.
    let mut leaf = matches;
    while let Some((_, sub)) = leaf.subcommand() {
        leaf = sub;
    }
    let defaulted = |id: &str| leaf.value_source(id) == Some(ValueSource::DefaultValue);
    let (output, color) = (defaulted("output"), defaulted("color"));
    if !output && !color {
        return;
    }

    let Ok(cfg) = config::load(global) else {
        return;
    };
    if output {
        if let Ok(format) = OutputFormat::from_str(&cfg.defaults.output, true) {
            global.output = format;
        }
    }
    if color {
        if let Ok(mode) = ColorMode::from_str(&cfg.defaults.color, true) {
            global.color = mode;
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never start a controller
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "crimson", &mut std::io::stdout());
            Ok(())
        }

        // Catalog browsing needs no controller
        Command::Servers(args) => {
            let cfg = config::load(&cli.global)?;
            let catalog = cfg.catalog()?;
            commands::servers::handle(&catalog, args, &cli.global)
        }

        cmd => {
            let cfg = config::load(&cli.global)?;
            let resolved = config::Resolved::from_config(&cfg, &cli.global)?;
            let advisor = resolved.build_advisor()?;
            let controller = Controller::synthetic(resolved.controller, resolved.catalog, advisor)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.shutdown().await;
            result
        }
    }
}
