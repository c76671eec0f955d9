use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::tools::Surface;

pub mod auth;
pub mod serve;
pub mod tools;

#[derive(Subcommand)]
enum Command {
    /// Serve one tool surface over stdio
    Serve {
        #[arg(long, value_enum)]
        surface: Surface,

        /// Path to the OAuth client secret file
        #[arg(long, default_value = "client_secret.json")]
        credentials: String,
    },
    /// Perform the one-time OAuth consent flow and persist tokens
    Auth {
        #[arg(long, value_enum)]
        surface: Surface,

        /// Path to the OAuth client secret file
        #[arg(long, default_value = "client_secret.json")]
        credentials: String,
    },
    /// Print the JSON tool declarations for a surface
    Tools {
        #[arg(long, value_enum)]
        surface: Surface,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Some(Command::Serve {
            surface,
            credentials,
        }) => {
            serve::run(surface, &credentials).await?;
        }
        Some(Command::Auth {
            surface,
            credentials,
        }) => {
            auth::run(surface, &credentials).await?;
        }
        Some(Command::Tools { surface }) => {
            tools::run(surface)?;
        }
        None => {}
    }

    Ok(())
}
