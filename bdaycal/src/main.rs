//! Bdaycal - export a social account's contact birthdays as an ICS calendar.
//!
//! Architecture:
//! - `scrape` drives the pipeline: authenticate, fetch 12 monthly birthday
//!   windows, resolve dates and entity ids, hand records to the builder
//! - `server` is a thin HTTP wrapper that streams the calendar back as a
//!   file download
//! - `cli` offers the same pipeline as a one-shot export command
//!
//! Credentials are used transiently per request and never persisted.

mod auth;
mod cli;
mod error;
mod ics;
mod locale;
mod markup;
mod models;
mod scrape;
mod server;
mod session;
mod tokens;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    execute(cli).await
}
