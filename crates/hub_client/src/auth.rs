//! Credential storage.
//!
//! Reads/writes ~/.config/iothub/credentials.json (0600 on Unix). The
//! `IOTHUB_CREDENTIALS` environment variable, holding the raw
//! `endpoint=hub=key=secret[=expiration]` string, takes precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use iothub_protocol::{Credentials, CredentialsError, DEFAULT_EXPIRATION};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CREDENTIALS_ENV: &str = "IOTHUB_CREDENTIALS";

/// On-disk form of [`Credentials`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsFile {
    /// Hub base URL (e.g., "https://iot.example.com")
    pub endpoint: String,
    pub hub: String,
    /// Public key, sent with every request
    pub key: String,
    /// Private key, used only for signing
    pub secret: String,
    /// Signed request lifetime in seconds
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,
}

fn default_expiration_secs() -> u64 {
    DEFAULT_EXPIRATION.as_secs()
}

impl CredentialsFile {
    pub fn into_credentials(self) -> Result<Credentials, CredentialsError> {
        if self.expiration_secs == 0 {
            return Err(CredentialsError::InvalidExpiration("0".into()));
        }
        Credentials::with_expiration(
            self.endpoint,
            self.hub,
            self.key,
            self.secret,
            Duration::from_secs(self.expiration_secs),
        )
    }
}

impl std::fmt::Debug for CredentialsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsFile")
            .field("endpoint", &self.endpoint)
            .field("hub", &self.hub)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

impl From<&Credentials> for CredentialsFile {
    fn from(creds: &Credentials) -> Self {
        Self {
            endpoint: creds.endpoint().to_string(),
            hub: creds.hub().to_string(),
            key: creds.key().to_string(),
            secret: creds.secret().to_string(),
            expiration_secs: creds.expiration_window().as_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialsFileError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credentials file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CredentialsError),
}

/// Returns the path to the credentials file.
pub fn credentials_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("iothub/credentials.json"))
}

/// Read and validate a credentials file.
pub fn load_credentials_from(path: &Path) -> Result<Credentials, CredentialsFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CredentialsFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CredentialsFile =
        serde_json::from_str(&contents).map_err(|source| CredentialsFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.into_credentials()?)
}

/// Credentials from `IOTHUB_CREDENTIALS`, if set.
pub fn credentials_from_env() -> Option<Result<Credentials, CredentialsError>> {
    let raw = std::env::var(CREDENTIALS_ENV).ok()?;
    Some(raw.parse())
}

/// Load credentials from the environment, then the default file.
/// Returns None if neither source yields valid credentials.
pub fn load_credentials() -> Option<Credentials> {
    match credentials_from_env() {
        Some(Ok(creds)) => return Some(creds),
        Some(Err(e)) => tracing::warn!(error = %e, "ignoring malformed {}", CREDENTIALS_ENV),
        None => {}
    }

    let path = credentials_file_path()?;
    match load_credentials_from(&path) {
        Ok(creds) => Some(creds),
        Err(CredentialsFileError::Io { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable credentials file");
            None
        }
    }
}

/// Save credentials to `path`.
/// Creates the parent directory if it doesn't exist.
/// Sets 0600 permissions on Unix.
pub fn save_credentials(creds: &Credentials, path: &Path) -> Result<(), CredentialsFileError> {
    let io_err = |source| CredentialsFileError::Io { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let contents = serde_json::to_string_pretty(&CredentialsFile::from(creds)).map_err(|source| {
        CredentialsFileError::Parse { path: path.to_path_buf(), source }
    })?;

    std::fs::write(path, &contents).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(io_err)?;
    }

    Ok(())
}

/// Save credentials to the default location.
pub fn save_default_credentials(creds: &Credentials) -> Result<PathBuf, CredentialsFileError> {
    let path = credentials_file_path().ok_or(CredentialsFileError::NoConfigDir)?;
    save_credentials(creds, &path)?;
    Ok(path)
}

/// Delete saved credentials. Missing file is not an error.
pub fn delete_credentials(path: &Path) -> Result<(), CredentialsFileError> {
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|source| CredentialsFileError::Io { path: path.to_path_buf(), source })?;
    }
    Ok(())
}
