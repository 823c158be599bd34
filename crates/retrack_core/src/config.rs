//! Tracker configuration and label catalog.
//!
//! # Responsibility
//! - Hold the configured category/verb label sets and add-form defaults.
//! - Load and validate configuration from a JSON file.
//!
//! # Invariants
//! - `default_interval_days >= 1`.
//! - Labels are non-blank and unique per kind (case-insensitive).
//! - Catalog lookups return the canonical configured spelling.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_INTERVAL_DAYS: u32 = 30;
pub const DEFAULT_STORAGE_KEY: &str = "replacementItems";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Kitchen",
    "Bathroom",
    "Bedroom",
    "Living Room",
    "Garage",
    "Garden",
    "Car",
    "Health",
    "Pets",
    "Other",
];
const DEFAULT_VERBS: &[&str] = &["Replace", "Check", "Water", "Meeting", "Appointment"];

/// Which label set a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Category,
    Verb,
}

impl Display for LabelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Verb => write!(f, "verb"),
        }
    }
}

/// Configuration load/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    ZeroDefaultInterval,
    BlankStorageKey,
    BlankLabel(LabelKind),
    DuplicateLabel { kind: LabelKind, label: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::ZeroDefaultInterval => write!(f, "default_interval_days must be at least 1"),
            Self::BlankStorageKey => write!(f, "storage_key must not be blank"),
            Self::BlankLabel(kind) => write!(f, "{kind} labels must not be blank"),
            Self::DuplicateLabel { kind, label } => {
                write!(f, "duplicate {kind} label `{label}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Configured category and verb label sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub categories: Vec<String>,
    pub verbs: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            verbs: DEFAULT_VERBS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Catalog {
    pub fn labels(&self, kind: LabelKind) -> &[String] {
        match kind {
            LabelKind::Category => &self.categories,
            LabelKind::Verb => &self.verbs,
        }
    }

    /// Resolves user input to the canonical label, ignoring case.
    pub fn resolve(&self, kind: LabelKind, input: &str) -> Option<&str> {
        let needle = input.trim();
        self.labels(kind)
            .iter()
            .find(|label| label.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in [LabelKind::Category, LabelKind::Verb] {
            let labels = self.labels(kind);
            for (index, label) in labels.iter().enumerate() {
                if label.trim().is_empty() {
                    return Err(ConfigError::BlankLabel(kind));
                }
                if labels[..index]
                    .iter()
                    .any(|earlier| earlier.eq_ignore_ascii_case(label))
                {
                    return Err(ConfigError::DuplicateLabel {
                        kind,
                        label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Interval used when the add form leaves it unspecified.
    pub default_interval_days: u32,
    /// Key holding the serialized item collection.
    pub storage_key: String,
    pub catalog: Catalog,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_interval_days: DEFAULT_INTERVAL_DAYS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            catalog: Catalog::default(),
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config file; absent fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_interval_days == 0 {
            return Err(ConfigError::ZeroDefaultInterval);
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::BlankStorageKey);
        }
        self.catalog.validate()
    }
}
