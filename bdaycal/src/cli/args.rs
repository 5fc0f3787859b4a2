//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bdaycal - export contact birthdays as an ICS calendar
#[derive(Parser, Debug)]
#[command(name = "bdaycal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP export service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one export and write the calendar to a file
    Export {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password (falls back to $BDAYCAL_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
