use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

pub const SERVER_URL_VAR: &str = "PARSE_SERVER_URL";
pub const APP_ID_VAR: &str = "PARSE_APP_ID";
pub const MASTER_KEY_VAR: &str = "PARSE_MASTER_KEY";
/// Overrides where the profile store lives.
pub const HOME_VAR: &str = "PARSE_ADMIN_HOME";

/// Connection settings for a client that isn't backed by a stored profile.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub app_id: String,
    pub master_key: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_url", &self.server_url)
            .field("app_id", &self.app_id)
            .field("master_key", &"<redacted>")
            .finish()
    }
}

impl ClientConfig {
    /// Reads `PARSE_SERVER_URL`, `PARSE_APP_ID` and `PARSE_MASTER_KEY`,
    /// loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; used by `from_env` and tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ParseError::Config(format!("{} is not set", name)))
        };
        Ok(ClientConfig {
            server_url: required(SERVER_URL_VAR)?,
            app_id: required(APP_ID_VAR)?,
            master_key: required(MASTER_KEY_VAR)?,
        })
    }
}

/// Directory holding local state: `$PARSE_ADMIN_HOME`, else `.parse-admin`
/// under the user's home directory.
pub fn admin_home() -> Result<PathBuf, ParseError> {
    resolve_admin_home(std::env::var_os(HOME_VAR), dirs::home_dir())
}

fn resolve_admin_home(
    override_dir: Option<OsString>,
    home_dir: Option<PathBuf>,
) -> Result<PathBuf, ParseError> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home_dir
        .map(|home| home.join(".parse-admin"))
        .ok_or_else(|| {
            ParseError::Config(format!(
                "Cannot locate a home directory; set {}",
                HOME_VAR
            ))
        })
}

/// Default path of the profile store.
pub fn default_store_path() -> Result<PathBuf, ParseError> {
    Ok(admin_home()?.join("store.json"))
}
