use serde::Deserialize;

/// Contents of a `--creds-file`; either field may be left out.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct CredentialsFile {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
