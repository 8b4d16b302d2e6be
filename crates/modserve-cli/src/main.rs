#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modserve")]
#[command(author, version, about = "Serve ES modules to the browser without bundling", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output and log lines
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Start the module server
    Serve {
        /// Config file (defaults to modserve.json in the working directory)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Route table entry, repeatable; replaces the config file's `paths`
        #[arg(long = "path", value_name = "PREFIX=ROOT", value_parser = commands::serve::parse_route)]
        paths: Vec<(String, PathBuf)>,

        /// Only handle requests under /<BASE_DIR>/
        #[arg(long)]
        base_dir: Option<String>,

        /// Host to bind to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port to listen on
        #[arg(long, short = 'p', default_value_t = 8000)]
        port: u16,
    },

    /// Print a file with its module specifiers rewritten
    Rewrite {
        /// JavaScript file to rewrite
        file: PathBuf,
    },

    /// Resolve one specifier as the rewriter would
    Resolve {
        /// Module specifier, e.g. `lit-element` or `./util`
        specifier: String,

        /// File the specifier is imported from
        #[arg(long)]
        from: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory; file arguments are anchored here lexically
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Serve {
            config,
            paths,
            base_dir,
            host,
            port,
        }) => {
            let action = commands::serve::ServeAction {
                cwd,
                config,
                paths,
                base_dir,
                host,
                port,
            };

            let rt = tokio::runtime::Runtime::new().map_err(|e| miette::miette!("{e}"))?;
            rt.block_on(commands::serve::run(action))
        }
        Some(Commands::Rewrite { file }) => commands::rewrite::run(&cwd, &file, cli.json),
        Some(Commands::Resolve { specifier, from }) => {
            commands::resolve::run(&cwd, &specifier, &from, cli.json)
        }
    }
}
