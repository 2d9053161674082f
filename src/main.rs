// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Coursegraph CLI - recursive course prerequisite graphs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coursegraph::commands::{self, build::OutputFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coursegraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "COURSEGRAPH_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the prerequisite graph for a course
    Build {
        /// Course code, e.g. "CMPT 225"
        #[arg(required = true, num_args = 1..)]
        course: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tree")]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,

        /// Read courses from a JSON catalog file instead of the catalog API
        #[arg(long, env = "COURSEGRAPH_CATALOG_FILE")]
        catalog_file: Option<std::path::PathBuf>,

        /// Deepest prerequisite level to expand
        #[arg(long)]
        max_depth: Option<usize>,

        /// Show branches that were pruned
        #[arg(long)]
        diagnostics: bool,

        /// Omit links to courses that were not found
        #[arg(long)]
        resolved_only: bool,
    },

    /// Show how text normalizes to a course id
    Parse {
        /// Text containing a course code
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Extract prerequisite course codes from a description
    Extract {
        /// Prerequisite description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Run the HTTP service
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Read courses from a JSON catalog file instead of the catalog API
        #[arg(long, env = "COURSEGRAPH_CATALOG_FILE")]
        catalog_file: Option<std::path::PathBuf>,
    },

    /// Show configuration
    Config {
        /// Dotted key, e.g. crawl.max_depth (omit to show everything)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = coursegraph::config::load(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins over flags and config
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color;

    // Execute command
    match cli.command {
        Commands::Build {
            course,
            format,
            output,
            catalog_file,
            max_depth,
            diagnostics,
            resolved_only,
        } => {
            let args = commands::build::BuildArgs {
                course: course.join(" "),
                format: if cli.json { OutputFormat::Json } else { format },
                output,
                catalog_file,
                max_depth,
                diagnostics,
                resolved_only,
                color,
            };
            commands::build::run(config, args).await
        }
        Commands::Parse { text } => {
            commands::parse::run(&text.join(" "), config.crawl.suffix_policy, cli.json, color)
        }
        Commands::Extract { text } => {
            commands::extract::run(&config, &text.join(" "), cli.json).await
        }
        Commands::Serve { bind, catalog_file } => {
            commands::serve::run(&config, bind, catalog_file).await
        }
        Commands::Config { key } => {
            commands::config::run(&config, key.as_deref())
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
