//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};

/// Environment variable holding the notification topic address.
pub const TOPIC_ENV: &str = "DOCMARK_NOTIFICATION_TOPIC";

/// Paths to all docmark data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Filesystem object store (`data/objects/<bucket>/<key>`).
    pub objects: PathBuf,
    /// Result record database directory (`data/records/`).
    pub records: PathBuf,
    /// File-backed notification topics (`data/topics/`).
    pub topics: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            objects: root.join("objects"),
            records: root.join("records"),
            topics: root.join("topics"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.objects)?;
        std::fs::create_dir_all(&self.records)?;
        std::fs::create_dir_all(&self.topics)?;
        Ok(())
    }
}

/// Top-level worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Where completion events are published. Required before any record is processed.
    pub notification_topic: Option<String>,
    /// Accept `.html` / `.htm` uploads.
    pub allow_html: bool,
    /// Reject objects whose declared MIME type does not match their extension.
    pub strict_mime: bool,
}

impl WorkerConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::from_lookup(data_dir, |name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> std::io::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid PORT '{}', using 3004", raw);
                3004
            }),
            None => 3004,
        };

        let notification_topic = lookup(TOPIC_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let allow_html = lookup("DOCMARK_ALLOW_HTML")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let strict_mime = lookup("DOCMARK_STRICT_MIME")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            notification_topic,
            allow_html,
            strict_mime,
        })
    }

    /// The notification topic, or a configuration error if it is unset.
    pub fn require_topic(&self) -> Result<&str> {
        self.notification_topic.as_deref().ok_or_else(|| {
            Error::Configuration(format!("{} is not set", TOPIC_ENV))
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> (WorkerConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = WorkerConfig::from_lookup(dir.path(), |name| vars.get(name).cloned()).unwrap();
        (config, dir)
    }

    #[test]
    fn test_defaults() {
        let (config, dir) = config_with(&[]);
        assert_eq!(config.port, 3004);
        assert!(config.allow_html);
        assert!(!config.strict_mime);
        assert!(config.notification_topic.is_none());
        assert!(dir.path().join("objects").is_dir());
        assert!(dir.path().join("records").is_dir());
        assert!(dir.path().join("topics").is_dir());
    }

    #[test]
    fn test_missing_topic_is_configuration_error() {
        let (config, _dir) = config_with(&[(TOPIC_ENV, "   ")]);
        assert!(matches!(config.require_topic(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_overrides() {
        let (config, _dir) = config_with(&[
            (TOPIC_ENV, "conversions"),
            ("PORT", "8080"),
            ("DOCMARK_ALLOW_HTML", "false"),
            ("DOCMARK_STRICT_MIME", "yes"),
        ]);
        assert_eq!(config.require_topic().unwrap(), "conversions");
        assert_eq!(config.port, 8080);
        assert!(!config.allow_html);
        assert!(config.strict_mime);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let (config, _dir) = config_with(&[("PORT", "http")]);
        assert_eq!(config.port, 3004);
    }
}
