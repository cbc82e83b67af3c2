//! Login, logout, and session inspection.
//!
//! # Usage
//!
//! ```bash
//! pv-cli login -u clerk -p s3cret
//! pv-cli whoami
//! pv-cli menu
//! pv-cli logout
//! ```

use std::io::BufRead;

use secrecy::SecretString;

use super::{CliError, connect, restore};

/// Log in as `username` and persist the credential.
pub async fn login(username: &str, password: Option<String>) -> Result<(), CliError> {
    let password = match password.or_else(|| std::env::var("PV_PASSWORD").ok()) {
        Some(password) => password,
        None => read_password_line()?,
    };
    let password = SecretString::from(password);

    let session = connect()?;
    let identity = session.login(username, &password).await?;

    tracing::info!("Logged in as {} ({})", identity.username, identity.role_name);
    print_line(&format!(
        "Logged in as {} ({})",
        identity.full_name, identity.role_name
    ));
    Ok(())
}

/// Forget the stored credential.
pub fn logout() -> Result<(), CliError> {
    connect()?.logout();
    print_line("Logged out");
    Ok(())
}

/// Print the identity behind the stored credential.
pub async fn whoami() -> Result<(), CliError> {
    let session = restore().await?;
    let identity = session.identity().ok_or(CliError::NotLoggedIn)?;

    print_line(&format!("Username:   {}", identity.username));
    print_line(&format!("Name:       {}", identity.full_name));
    print_line(&format!("Email:      {}", identity.email));
    print_line(&format!("Role:       {}", identity.role_name));
    print_line(&format!("Department: {}", identity.department));
    Ok(())
}

/// Print the navigation menu for the logged-in role.
pub async fn menu() -> Result<(), CliError> {
    let session = restore().await?;
    if !session.is_authenticated() {
        return Err(CliError::NotLoggedIn);
    }

    let entries = session.menu();
    if entries.is_empty() {
        print_line("(no menu entries for this role)");
    }
    for entry in entries {
        print_line(&format!(
            "{:<24} {:<28} [{}]",
            entry.label,
            entry.path,
            entry.icon.name()
        ));
    }
    Ok(())
}

fn read_password_line() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
