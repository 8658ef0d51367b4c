//! Login and logout commands.

use anyhow::{Context, Result};
use clap::Args;
use std::io::{BufRead, IsTerminal, Write};
use tplus_core::Credentials;
use tplus_fetch::FetchError;
use tplus_portal::PortalError;
use tracing::{info, warn};

use crate::app::App;
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args, Default)]
pub struct LoginArgs {
    /// Member id (usually the phone number). Prompted for if omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Read the password from the first line of stdin.
    #[arg(long)]
    pub password_stdin: bool,
}

/// Verifies credentials with the portal and stores them.
///
/// Any previously stored login is forgotten first, so a failed attempt
/// leaves the CLI logged out.
pub async fn run_login(args: &LoginArgs, app: &App, cli: &Cli) -> Result<()> {
    let credentials = read_credentials(args)?;

    forget_stored_login(app).await?;

    let fetcher = app.fetcher().await?;
    let timeout = app.settings().await.timeout();
    info!(account = %credentials.id(), "Verifying login");

    match tokio::time::timeout(timeout, fetcher.login(&credentials)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(PortalError::from(e).into()),
        Err(_) => return Err(PortalError::from(FetchError::Timeout(timeout)).into()),
    }

    app.keychain_credentials(None)
        .store(&credentials)
        .await
        .context("failed to store password in keychain")?;

    let store = app.settings_store();
    store.set_account_id(Some(credentials.id().to_string())).await;
    store.save().await?;

    match cli.format {
        OutputFormat::Text => println!("Logged in as {}", credentials.id()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "loggedIn": true, "accountId": credentials.id() })
        ),
    }
    Ok(())
}

/// Forgets the stored login and the cached report.
pub async fn run_logout(app: &App, cli: &Cli) -> Result<()> {
    let account = forget_stored_login(app).await?;

    if let Err(e) = app.usage_store().clear_cached().await {
        warn!(error = %e, "Failed to remove cached report");
    }

    match cli.format {
        OutputFormat::Text => match &account {
            Some(account) => println!("Logged out {account}"),
            None => println!("Not logged in"),
        },
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "loggedIn": false, "accountId": account })
        ),
    }
    Ok(())
}

/// Deletes the keychain entry and clears the account id. Returns the old id.
async fn forget_stored_login(app: &App) -> Result<Option<String>> {
    let store = app.settings_store();
    let Some(account) = store.account_id().await else {
        return Ok(None);
    };

    app.keychain_credentials(None).clear(&account).await?;
    store.set_account_id(None).await;
    store.save().await?;
    Ok(Some(account))
}

fn read_credentials(args: &LoginArgs) -> Result<Credentials> {
    let id = match &args.id {
        Some(id) => id.clone(),
        None => prompt_line("Member id: ")?,
    };

    let password = if args.password_stdin {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("no terminal for the password prompt; use --password-stdin");
        }
        rpassword::prompt_password("Password: ").context("failed to read password")?
    };

    Ok(Credentials::new(id.trim(), password).map_err(PortalError::from)?)
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
