// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, dispatch to `ui`.
// - Every flow returns the process exit code it wants.

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pinme::cli::{Cli, Commands};
use pinme::config::{default_config_dir, AppContext};
use pinme::history::HistoryStore;
use pinme::ui;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let code = match command {
        Commands::Upload { path } => {
            let ctx = AppContext::init()?;
            ui::run_upload(&ctx, path)?
        }
        Commands::Rm { target } => {
            let ctx = AppContext::init()?;
            ui::run_remove(&ctx, target)?
        }
        Commands::List { limit, clear } => {
            let history = HistoryStore::new(default_config_dir());
            if clear {
                ui::clear_history(&history)
            } else {
                ui::show_history(&history, limit)
            }
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Log to stderr when `--verbose` is given or `RUST_LOG` is set.
fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if verbose || has_rust_log {
        let filter = if verbose {
            EnvFilter::from_default_env().add_directive("pinme=debug".parse()?)
        } else {
            EnvFilter::from_default_env()
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}
