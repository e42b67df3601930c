//! Startup configuration for bantay-ir
//!
//! Priority for every value: command line → environment (`BANTAY_*`, via
//! clap's `env`) → TOML file → compiled default.

use bantay_common::config::{self, TomlConfig};
use bantay_common::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Listen address when none is configured
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "bantay-ir", version, about = "Bantay incident reporting service")]
pub struct Args {
    /// Folder holding bantay.db and the media store
    #[arg(long, env = "BANTAY_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Path to config.toml
    #[arg(long, env = "BANTAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:5780
    #[arg(long, env = "BANTAY_BIND")]
    pub bind: Option<String>,

    /// Emergency classifier endpoint
    #[arg(long, env = "BANTAY_CLASSIFIER_URL")]
    pub classifier_url: Option<String>,
}

/// Fully resolved startup configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub bind_address: String,
    pub classifier_url: Option<String>,
    pub emergency_labels: Vec<String>,
    /// Remaining file settings (SMS and email endpoints)
    pub toml: TomlConfig,
}

impl ServiceConfig {
    pub fn resolve(args: &Args) -> Result<Self> {
        let toml = TomlConfig::load(args.config.as_deref())?;
        Ok(Self::from_parts(args, toml))
    }

    /// Merge already-parsed sources
    pub fn from_parts(args: &Args, toml: TomlConfig) -> Self {
        let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml);

        let bind_address = args
            .bind
            .clone()
            .or_else(|| toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let classifier_url = args
            .classifier_url
            .clone()
            .or_else(|| toml.classifier.url.clone())
            .filter(|url| !url.trim().is_empty());

        let emergency_labels = toml.classifier.effective_emergency_labels();

        info!(
            root_folder = %root_folder.display(),
            bind_address = %bind_address,
            classifier = classifier_url.as_deref().unwrap_or("threshold only"),
            "Configuration resolved"
        );

        Self {
            database_path: config::database_path(&root_folder),
            media_root: config::media_root(&root_folder),
            root_folder,
            bind_address,
            classifier_url,
            emergency_labels,
            toml,
        }
    }
}
