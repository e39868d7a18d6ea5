use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, bail};
use log::{error, info};

use crate::model::credentials::{Credentials, CredentialsFile};

pub const USERNAME_ENV: &str = "UL_USERNAME";
pub const PASSWORD_ENV: &str = "UL_PASSWORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPrompt {
    Username,
    Password,
}

/// Where credentials may come from, besides the environment and a prompt.
#[derive(Debug, Default, Clone)]
pub struct CredentialSources<'a> {
    pub username: Option<String>,
    pub password: Option<String>,
    pub creds_file: Option<&'a Path>,
}

/// Fills each field from the flag, then the file, then the environment,
/// then the prompt. Blank values count as missing.
pub fn resolve_credentials<E, P>(
    sources: CredentialSources<'_>,
    env: E,
    mut prompt: P,
) -> anyhow::Result<Credentials>
where
    E: Fn(&str) -> Option<String>,
    P: FnMut(CredentialPrompt) -> io::Result<String>,
{
    let mut username = non_blank(sources.username);
    let mut password = non_blank(sources.password);

    if let Some(path) = sources.creds_file {
        if username.is_none() || password.is_none() {
            info!("Reading credentials from file: {}", path.display());
            match load_credentials_file(path) {
                Ok(file) => {
                    username = username.or(non_blank(file.username));
                    password = password.or(non_blank(file.password));
                    info!("Successfully read credentials from file");
                }
                Err(err) => error!("Failed to read credentials from file: {:#}", err),
            }
        }
    }

    let username = match username.or_else(|| non_blank(env(USERNAME_ENV))) {
        Some(username) => username,
        None => prompt(CredentialPrompt::Username).context("Failed to read username")?,
    };
    let password = match password.or_else(|| non_blank(env(PASSWORD_ENV))) {
        Some(password) => password,
        None => prompt(CredentialPrompt::Password).context("Failed to read password")?,
    };

    if username.is_empty() {
        bail!("A username is required");
    }
    if password.is_empty() {
        bail!("A password is required");
    }
    Ok(Credentials { username, password })
}

pub fn load_credentials_file(path: &Path) -> anyhow::Result<CredentialsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
