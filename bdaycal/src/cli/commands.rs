//! CLI command execution.

use anyhow::{bail, Context, Result};

use crate::scrape;
use crate::server;

use super::args::{Cli, Commands};

/// Environment fallback so the password stays off the process list.
const PASSWORD_ENV_VAR: &str = "BDAYCAL_PASSWORD";

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { port } => server::start_server(port).await,
        Commands::Export {
            email,
            password,
            out,
        } => export(&email, password, out.as_deref()).await,
    }
}

async fn export(
    email: &str,
    password: Option<String>,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => match std::env::var(PASSWORD_ENV_VAR) {
            Ok(password) => password,
            Err(_) => bail!("no password given and {PASSWORD_ENV_VAR} is not set"),
        },
    };

    let ics = scrape::get_birthdays(email, &password)
        .await
        .context("calendar export failed")?;

    match out {
        Some(path) => {
            std::fs::write(path, &ics)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{ics}"),
    }

    Ok(())
}
