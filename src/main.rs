use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Build single-file host scripts from TypeScript projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project in the current directory
    New {
        /// Project name (prompted for when omitted)
        name: Option<String>,

        /// Author recorded in the header
        #[arg(long)]
        author: Option<String>,

        /// Short description
        #[arg(long)]
        description: Option<String>,

        /// License identifier appended to the description
        #[arg(long)]
        license: Option<String>,

        /// Accept defaults without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Bundle a project into dist/
    Build {
        /// Project name when run from a directory of projects
        project: Option<String>,
    },

    /// Rebuild a project whenever its sources change
    Watch {
        /// Project name when run from a directory of projects
        project: Option<String>,
    },

    /// Turn an existing script into a project
    Import {
        /// Script file, optionally carrying a header block
        file: PathBuf,
    },

    /// Download or refresh the host type definitions
    Types {
        /// Project name when run from a directory of projects
        project: Option<String>,

        /// Download even if the cached copy is fresh
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // RUST_LOG controls verbosity; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::New {
            name,
            author,
            description,
            license,
            yes,
        } => {
            commands::new::execute(commands::new::NewOptions {
                name,
                author,
                description,
                license,
                yes,
            })?;
        }
        Commands::Build { project } => {
            commands::build::execute(project)?;
        }
        Commands::Watch { project } => {
            commands::watch::execute(project)?;
        }
        Commands::Import { file } => {
            commands::import::execute(&file)?;
        }
        Commands::Types { project, force } => {
            commands::types::execute(project, force)?;
        }
    }

    Ok(())
}
