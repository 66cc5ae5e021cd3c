//! Knowledge-base configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What to report for a node with no reachable attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Abort with `NoKnownAttack`
    #[default]
    Fail,
    /// Report the `trivial` sentinel with unbounded complexity
    Unbounded,
}

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownPolicy::Fail => write!(f, "fail"),
            UnknownPolicy::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Locations of the three tables plus query policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbConfig {
    /// Attack table (YAML)
    pub attacks: PathBuf,
    /// Assumption table (YAML)
    pub assumptions: PathBuf,
    /// Scheme table (YAML)
    pub schemes: PathBuf,
    #[serde(default)]
    pub unknown_policy: UnknownPolicy,
}

impl KbConfig {
    /// Create a configuration from a data directory
    ///
    /// Expects the following structure:
    /// ```text
    /// base_dir/
    ///   attacks.yml
    ///   assumptions.yml
    ///   schemes.yml
    /// ```
    pub fn from_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base = base_dir.into();
        Self {
            attacks: base.join("attacks.yml"),
            assumptions: base.join("assumptions.yml"),
            schemes: base.join("schemes.yml"),
            unknown_policy: UnknownPolicy::Fail,
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    /// Load configuration from a JSON file
    ///
    /// Relative table paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        if let Some(dir) = path.parent() {
            for table in [&mut config.attacks, &mut config.assumptions, &mut config.schemes] {
                if table.is_relative() {
                    *table = dir.join(&*table);
                }
            }
        }
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self::from_base_dir("./data")
    }
}
