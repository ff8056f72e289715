#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: Count unread INBOX messages on Outlook with an OAuth2 token
//!
//! Token acquisition is not part of this crate. Obtain an access token for
//! the `https://outlook.office.com/IMAP.AccessAsUser.All` scope with any
//! OAuth2 client (MSAL, the Azure CLI, ...) and paste it when prompted.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=mailprobe_imap=debug cargo run --package mailprobe-imap --example unseen_count
//! ```
//!
//! Pass a hostname as the first argument to target another server.

use std::io::{self, Write};

use anyhow::Context;
use mailprobe_imap::{AuthResult, Config, check_inbox};
use mailprobe_oauth::{Credential, Token};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailprobe_imap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = std::env::args()
        .nth(1)
        .map_or_else(Config::default, Config::new);

    let principal = prompt("Token principal (email address)")?;
    let mailbox = prompt("Mailbox to open (blank for the principal)")?;
    let access_token = prompt("Access token")?;

    let credential = Credential::new(principal, Token::bearer(access_token)).with_mailbox(mailbox);

    println!("\nConnecting to {}:{}...", config.host, config.port);
    let report = check_inbox(&config, &credential)
        .await
        .context("credential rejected before connecting")?;

    let unseen = report.unseen();
    match report.auth {
        AuthResult::Authenticated => match unseen {
            Some(n) => println!("✓ {} unread message(s) in INBOX", n),
            None => println!("✓ Authenticated, but the server sent no UNSEEN count"),
        },
        AuthResult::Rejected(text) => println!("✗ Authentication failed: {}", text),
        AuthResult::TransportError(e) => println!("✗ Connection error: {}", e),
    }

    Ok(())
}
