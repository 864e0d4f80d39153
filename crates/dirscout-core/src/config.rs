//! Scan configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Delay inserted after each accepted file when no pacing is configured.
pub const DEFAULT_PACING: Duration = Duration::from_millis(10);

/// Configuration for a scan.
///
/// Symbolic links are never followed, so there is no knob for it.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Include hidden entries (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Delay after each accepted file. `Duration::ZERO` disables pacing.
    #[builder(default = "DEFAULT_PACING")]
    #[serde(default = "default_pacing")]
    pub pacing: Duration,

    /// Directory to scan when the root cannot be listed at all.
    ///
    /// When unset, the parent of the process temporary directory is used.
    #[builder(default)]
    #[serde(default)]
    pub fallback_root: Option<PathBuf>,

    /// Drop records whose path was already emitted in this session.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub dedupe_paths: bool,
}

fn default_true() -> bool {
    true
}

fn default_pacing() -> Duration {
    DEFAULT_PACING
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: true,
            max_depth: None,
            pacing: DEFAULT_PACING,
            fallback_root: None,
            dedupe_paths: true,
        }
    }

    /// Copy of this config pointed at a different root.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..self.clone()
        }
    }

    /// Disable the per-file pacing delay.
    pub fn without_pacing(mut self) -> Self {
        self.pacing = Duration::ZERO;
        self
    }

    /// Whether pacing delays are active.
    pub fn is_paced(&self) -> bool {
        !self.pacing.is_zero()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
