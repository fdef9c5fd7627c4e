//! Configuration loading and management.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::bail;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Default ceiling on a single sync run, in seconds.
const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 300;

/// Application configuration.
///
/// Layered from defaults, `config.toml` in the platform config directory,
/// an optional explicit file, and `T2J_`-prefixed environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Toggl API token.
    pub toggl_api_token: String,

    /// Toggl API root. Only changed for tests and proxies.
    pub toggl_api_url: String,

    /// Restrict entries to projects of this Toggl client, when set.
    pub toggl_client_id: Option<i64>,

    /// JIRA host, scheme included (e.g. `https://tracker.example.com`).
    pub jira_host: String,

    /// JIRA basic-auth username.
    pub jira_username: String,

    /// JIRA basic-auth password.
    pub jira_password: String,

    /// Shared secret callers of the HTTP trigger must present.
    pub shared_secret: String,

    /// Webhook notified (best effort) when a sync run fails.
    pub error_webhook_url: Option<String>,

    /// Address the HTTP trigger binds to.
    pub bind_addr: SocketAddr,

    /// Ceiling on a single sync run, in seconds.
    pub sync_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("toggl_api_token", &"[REDACTED]")
            .field("toggl_api_url", &self.toggl_api_url)
            .field("toggl_client_id", &self.toggl_client_id)
            .field("jira_host", &self.jira_host)
            .field("jira_username", &self.jira_username)
            .field("jira_password", &"[REDACTED]")
            .field("shared_secret", &"[REDACTED]")
            .field("error_webhook_url", &self.error_webhook_url)
            .field("bind_addr", &self.bind_addr)
            .field("sync_timeout_secs", &self.sync_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toggl_api_token: String::new(),
            toggl_api_url: t2j_toggl::DEFAULT_BASE_URL.to_string(),
            toggl_client_id: None,
            jira_host: String::new(),
            jira_username: String::new(),
            jira_password: String::new(),
            shared_secret: String::new(),
            error_webhook_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8484)),
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (T2J_*)
        figment = figment.merge(Env::prefixed("T2J_"));

        figment.extract()
    }

    /// Checks the fields a sync run depends on.
    pub fn validate_sync(&self) -> anyhow::Result<()> {
        if self.toggl_api_token.trim().is_empty() {
            bail!("toggl_api_token is not configured");
        }
        if self.jira_host.trim().is_empty() {
            bail!("jira_host is not configured");
        }
        if self.jira_username.trim().is_empty() {
            bail!("jira_username is not configured");
        }
        Ok(())
    }

    /// Checks the additional fields the HTTP trigger depends on.
    pub fn validate_serve(&self) -> anyhow::Result<()> {
        self.validate_sync()?;
        if self.shared_secret.trim().is_empty() {
            bail!("shared_secret is not configured");
        }
        Ok(())
    }
}

/// Returns the platform-specific config directory for t2j.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("t2j"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn test_dirs_config_path_ends_with_t2j() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "t2j");
    }

    #[test]
    fn test_default_config_points_at_public_api() {
        let config = Config::default();
        assert_eq!(config.toggl_api_url, "https://www.toggl.com/api/v8/");
        assert_eq!(config.sync_timeout_secs, 300);
        assert_eq!(config.toggl_client_id, None);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut config_file = NamedTempFile::new().unwrap();
        writeln!(
            config_file,
            r#"
toggl_api_token = "1971800d4d82861d8f2c1651fea4d212"
toggl_client_id = 42
jira_host = "https://tracker.example.com"
jira_username = "bob"
jira_password = "hunter2"
shared_secret = "sekrit"
sync_timeout_secs = 120
"#
        )
        .unwrap();
        config_file.flush().unwrap();

        let config = Config::load_from(Some(config_file.path())).unwrap();
        assert_eq!(config.toggl_api_token, "1971800d4d82861d8f2c1651fea4d212");
        assert_eq!(config.toggl_client_id, Some(42));
        assert_eq!(config.jira_host, "https://tracker.example.com");
        assert_eq!(config.sync_timeout_secs, 120);
        // Untouched fields keep their defaults.
        assert_eq!(config.toggl_api_url, "https://www.toggl.com/api/v8/");
    }

    #[test]
    fn test_validate_sync_requires_credentials() {
        let config = Config::default();
        let err = config.validate_sync().unwrap_err();
        assert!(err.to_string().contains("toggl_api_token"));

        let config = Config {
            toggl_api_token: "token".to_string(),
            ..Config::default()
        };
        let err = config.validate_sync().unwrap_err();
        assert!(err.to_string().contains("jira_host"));
    }

    #[test]
    fn test_validate_serve_requires_shared_secret() {
        let config = Config {
            toggl_api_token: "token".to_string(),
            jira_host: "https://tracker.example.com".to_string(),
            jira_username: "bob".to_string(),
            ..Config::default()
        };
        assert!(config.validate_sync().is_ok());

        let err = config.validate_serve().unwrap_err();
        assert!(err.to_string().contains("shared_secret"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            toggl_api_token: "super-secret-token".to_string(),
            jira_password: "hunter2".to_string(),
            shared_secret: "sekrit".to_string(),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("sekrit"));
        assert!(debug.contains("[REDACTED]"));
    }
}
