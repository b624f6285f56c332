//! Portfolio profiles — named strategy + configuration pairs loaded from disk.
//!
//! Profiles live in TOML (`[[profile]]` tables) or JSON (`{"profile": [...]}`).
//! Every field of a profile's `config` is optional and falls back to the
//! [`AssetConfig`] defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use levertest_core::config::{AssetConfig, LeverageConfig, ValidationError, WithdrawType};
use levertest_core::strategy::StrategyKind;

/// Errors loading or validating profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported profile file extension: {0}")]
    UnsupportedFormat(String),
    #[error("profile file defines no profiles")]
    Empty,
    #[error("duplicate profile id '{0}'")]
    DuplicateId(String),
    #[error("profile '{id}': {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },
}

fn default_color() -> String {
    "#8884d8".to_string()
}

/// One portfolio to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique key within a set; used for file names and batch results.
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub config: AssetConfig,
}

impl Profile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: default_color(),
            strategy,
            config: AssetConfig::default(),
        }
    }

    /// Deterministic hash of the strategy and configuration.
    ///
    /// Two profiles that would simulate identically share a hash regardless
    /// of their id, name or color.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(&(&self.strategy, &self.config)).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

/// An ordered collection of profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(rename = "profile", default)]
    pub profiles: Vec<Profile>,
}

impl ProfileSet {
    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Self::from_toml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check ids are unique and every config is within sane ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profiles.is_empty() {
            return Err(ConfigError::Empty);
        }
        let mut seen = HashSet::new();
        for p in &self.profiles {
            if !seen.insert(p.id.as_str()) {
                return Err(ConfigError::DuplicateId(p.id.clone()));
            }
            p.config.validate().map_err(|source| ConfigError::Invalid {
                id: p.id.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// The starter set written by `levertest init`: one unleveraged profile
    /// per strategy plus a leveraged Flexible 2 variant.
    pub fn sample() -> Self {
        const COLORS: [&str; 5] = ["#8884d8", "#82ca9d", "#ffc658", "#ff7300", "#d0ed57"];

        let mut profiles: Vec<Profile> = StrategyKind::ALL
            .iter()
            .zip(COLORS)
            .map(|(&kind, color)| Profile {
                color: color.to_string(),
                ..Profile::new(kind.tag().to_ascii_lowercase(), kind.label(), kind)
            })
            .collect();

        profiles.push(Profile {
            color: "#a4de6c".to_string(),
            config: AssetConfig {
                leverage: LeverageConfig {
                    enabled: true,
                    withdraw_type: WithdrawType::Percent,
                    withdraw_value: 2.0,
                    max_ltv: 60.0,
                    ..LeverageConfig::default()
                },
                ..AssetConfig::default()
            },
            ..Profile::new(
                "flexible_2_leveraged",
                "Flexible 2 + margin draws",
                StrategyKind::Flexible2,
            )
        });

        Self { profiles }
    }
}
