use std::fmt;
use std::path::PathBuf;

pub const USERNAME_VARS: [&str; 2] = ["INSTAGRAM_USERNAME", "INSTA_USERNAME"];
pub const PASSWORD_VARS: [&str; 2] = ["INSTAGRAM_PASSWORD", "INSTA_PASSWORD"];
pub const PROGRAM_VAR: &str = "INSTALOADER_BIN";
pub const DOWNLOAD_DIR_VAR: &str = "INSTALOADER_DOWNLOAD_DIR";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

const DEFAULT_PROGRAM: &str = "instaloader";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Settings read once from the environment at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub download_root: PathBuf,
    pub instaloader_program: PathBuf,
    /// Prefill for the username field
    pub username: String,
    /// Prefill for the password field
    pub password: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let download_root = first_non_empty(&lookup, &[DOWNLOAD_DIR_VAR])
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .map(|dir| dir.join(DEFAULT_DOWNLOAD_DIR))
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR))
            });

        Self {
            download_root,
            instaloader_program: first_non_empty(&lookup, &[PROGRAM_VAR])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM)),
            username: first_non_empty(&lookup, &USERNAME_VARS).unwrap_or_default(),
            password: first_non_empty(&lookup, &PASSWORD_VARS).unwrap_or_default(),
            log_format: lookup(LOG_FORMAT_VAR)
                .map(|value| LogFormat::parse(&value))
                .unwrap_or(LogFormat::Pretty),
        }
    }

    pub fn ensure_download_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.download_root)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("download_root", &self.download_root)
            .field("instaloader_program", &self.instaloader_program)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// First alias with a non-empty value wins.
fn first_non_empty<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.username, "");
        assert_eq!(config.password, "");
        assert_eq!(config.instaloader_program, PathBuf::from("instaloader"));
        assert!(config.download_root.ends_with("downloads"));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_primary_alias_wins() {
        let config = config(&[
            ("INSTAGRAM_USERNAME", "primary"),
            ("INSTA_USERNAME", "secondary"),
            ("INSTA_PASSWORD", "pw"),
        ]);
        assert_eq!(config.username, "primary");
        assert_eq!(config.password, "pw");
    }

    #[test]
    fn test_empty_primary_falls_back() {
        let config = config(&[("INSTAGRAM_USERNAME", ""), ("INSTA_USERNAME", "secondary")]);
        assert_eq!(config.username, "secondary");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("INSTALOADER_BIN", "/opt/bin/instaloader"),
            ("INSTALOADER_DOWNLOAD_DIR", "/tmp/posts"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.instaloader_program, PathBuf::from("/opt/bin/instaloader"));
        assert_eq!(config.download_root, PathBuf::from("/tmp/posts"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = config(&[("INSTAGRAM_PASSWORD", "hunter2")]);
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_ensure_download_root_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("downloads");
        let config = config(&[("INSTALOADER_DOWNLOAD_DIR", root.to_str().unwrap())]);
        config.ensure_download_root().unwrap();
        assert!(root.is_dir());
    }
}
