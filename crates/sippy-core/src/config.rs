//! Engine configuration: the server-side defaults a UI seeds new report
//! requests with, loaded from a versioned YAML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::request::{AdvancedOptions, ExcludeFilter, GroupBy};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    /// The config file is not valid YAML for [`EngineConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The file declares a version this build does not understand.
    #[error("unsupported config version {found} (supported: {supported})")]
    Version { found: u32, supported: u32 },
}

/// Default verdict knobs and view filters. Every field except `version`
/// falls back to the built-in defaults, so a minimal file is just
/// `version: 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: u32,
    pub confidence: u32,
    pub pity_factor: u32,
    pub minimum_failure: u32,
    pub ignore_missing: bool,
    /// Comma-separated column dimensions, see [`GroupBy::parse`].
    pub group_by: String,
    pub exclude_platforms: Vec<String>,
    pub exclude_arches: Vec<String>,
    pub exclude_variants: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            version: SUPPORTED_CONFIG_VERSION,
            confidence: 95,
            pity_factor: 5,
            minimum_failure: 3,
            ignore_missing: false,
            group_by: "cloud,arch,network".to_string(),
            exclude_platforms: strings(&[
                "openstack", "alibaba", "ibmcloud", "libvirt", "ovirt", "unknown",
            ]),
            exclude_arches: strings(&["arm64", "heterogeneous", "ppc64le", "s390x"]),
            exclude_variants: strings(&[
                "hypershift",
                "osd",
                "microshift",
                "techpreview",
                "single-node",
                "assisted",
                "compact",
            ]),
        }
    }
}

impl EngineConfig {
    pub fn advanced_options(&self) -> AdvancedOptions {
        AdvancedOptions {
            confidence: self.confidence,
            pity_factor: self.pity_factor,
            minimum_failure: self.minimum_failure,
            ignore_missing: self.ignore_missing,
        }
    }

    pub fn group_by(&self) -> GroupBy {
        GroupBy::parse(&self.group_by)
    }

    pub fn exclude_filter(&self) -> ExcludeFilter {
        ExcludeFilter {
            platforms: self.exclude_platforms.clone(),
            arches: self.exclude_arches.clone(),
            variants: self.exclude_variants.clone(),
            ..ExcludeFilter::default()
        }
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: EngineConfig = serde_yaml::from_str(&raw)?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError::Version {
            found: cfg.version,
            supported: SUPPORTED_CONFIG_VERSION,
        });
    }
    Ok(cfg)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
