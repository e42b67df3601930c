//! Configuration loading and root folder resolution
//!
//! Resolution order for every file-backed value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BANTAY_ROOT_FOLDER";

/// Environment variable pointing at an explicit config file
pub const CONFIG_FILE_ENV: &str = "BANTAY_CONFIG";

/// Contents of `config.toml`
///
/// Every field is optional; a missing or unreadable file yields the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding `bantay.db` and the media store
    pub root_folder: Option<PathBuf>,
    /// Listen address for the HTTP API (e.g. "0.0.0.0:8080")
    pub bind_address: Option<String>,
    pub sms: SmsConfig,
    pub email: EmailConfig,
    pub classifier: ClassifierConfig,
}

/// SMS gateway endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub gateway_url: Option<String>,
    pub api_key: Option<String>,
    pub sender_name: Option<String>,
}

/// Transactional email API endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: Option<String>,
}

/// Emergency classification service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub url: Option<String>,
    /// Detector labels that count as an emergency
    pub emergency_labels: Vec<String>,
}

/// Labels treated as emergencies when none are configured
pub const DEFAULT_EMERGENCY_LABELS: &[&str] = &["fire", "smoke", "accident", "flood", "weapon", "fight"];

impl ClassifierConfig {
    pub fn effective_emergency_labels(&self) -> Vec<String> {
        if self.emergency_labels.is_empty() {
            DEFAULT_EMERGENCY_LABELS.iter().map(|s| s.to_string()).collect()
        } else {
            self.emergency_labels.iter().map(|s| s.to_lowercase()).collect()
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load from an explicit path, `BANTAY_CONFIG`, or the platform locations.
    ///
    /// Missing files are not an error; a file that exists but fails to parse is.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from))
            .or_else(find_config_file);

        match candidate {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Resolve the root folder following the priority order above
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var_os(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Database file inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("bantay.db")
}

/// Media store inside the root folder
pub fn media_root(root_folder: &Path) -> PathBuf {
    root_folder.join("media")
}

/// First existing config file among the platform locations
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bantay").join("config.toml"));
    let system_config = PathBuf::from("/etc/bantay/config.toml");

    user_config
        .into_iter()
        .chain(cfg!(unix).then_some(system_config))
        .find(|p| p.exists())
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("bantay"))
        .unwrap_or_else(|| PathBuf::from("./bantay_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_sections_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/bantay"
            bind_address = "0.0.0.0:8080"

            [sms]
            gateway_url = "https://sms.example.ph/send"
            api_key = "k"

            [classifier]
            emergency_labels = ["Fire", "Flood"]
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/bantay")));
        assert_eq!(config.sms.gateway_url.as_deref(), Some("https://sms.example.ph/send"));
        assert!(config.email.api_url.is_none());
        assert_eq!(config.classifier.effective_emergency_labels(), vec!["fire", "flood"]);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert!(config
            .classifier
            .effective_emergency_labels()
            .contains(&"fire".to_string()));
    }

    #[test]
    fn test_cli_arg_wins() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &toml);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_paths_inside_root() {
        let root = Path::new("/srv/bantay");
        assert_eq!(database_path(root), PathBuf::from("/srv/bantay/bantay.db"));
        assert_eq!(media_root(root), PathBuf::from("/srv/bantay/media"));
    }
}
