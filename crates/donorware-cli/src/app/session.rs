//! Logging in with a username and password.

use tracing::warn;

use donorware_core::{DonorError, Library};

use crate::helpers::{prompt_password, prompt_username};

const MAX_ATTEMPTS: u32 = 3;

/// Resolve credentials and authenticate, returning the username.
///
/// Re-prompts for the password after a rejected attempt when a TTY is
/// available and the password did not come from the environment.
pub fn login(
    library: &Library,
    user: Option<&str>,
    interactive: bool,
) -> anyhow::Result<String> {
    let username = prompt_username(user, interactive)?;
    let from_env = std::env::var(crate::constants::env_vars::PASSWORD)
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    let max_attempts = if interactive && !from_env { MAX_ATTEMPTS } else { 1 };

    let mut attempt = 1;
    loop {
        let password = prompt_password(interactive)?;
        match library.authenticate(&username, &password) {
            Ok(_) => return Ok(username),
            Err(DonorError::Auth) if attempt < max_attempts => {
                warn!(attempt, "login rejected");
                eprintln!("Incorrect username or password. Try again.");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}
