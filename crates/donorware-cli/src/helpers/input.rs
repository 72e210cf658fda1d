//! Username and password prompting.

use dialoguer::{Input, Password};

use crate::constants::env_vars;
use crate::errors::CliError;

/// Read the password from DONORWARE_PASSWORD, or prompt when interactive.
pub fn prompt_password(interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = password_from_env() {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "No password provided and no TTY available",
            format!("Set {}.", env_vars::PASSWORD),
        )
        .into());
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Password for a new account, confirmed twice when prompted.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = password_from_env() {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            env_vars::PASSWORD
        ))
        .into());
    }
    Password::new()
        .with_prompt("Choose a password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Use `given`, or prompt for a username when interactive.
pub fn prompt_username(given: Option<&str>, interactive: bool) -> anyhow::Result<String> {
    if let Some(name) = given.map(str::trim).filter(|name| !name.is_empty()) {
        return Ok(name.to_string());
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No username provided. Pass --user or set {}.",
            env_vars::USER
        ))
        .into());
    }
    Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map(|name| name.trim().to_string())
        .map_err(|e| anyhow::anyhow!("Failed to read username: {}", e))
}

fn password_from_env() -> Option<String> {
    std::env::var(env_vars::PASSWORD)
        .ok()
        .filter(|value| !value.is_empty())
}
