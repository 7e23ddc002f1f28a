//! Generation configuration with documented constants
//!
//! Everything tunable about anatomy generation lives here so the builder,
//! matchers and validators agree on the same limits.

use serde::Deserialize;
use std::path::Path;

use super::error::Result;

/// Configuration for anatomy generation and validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnatomyConfig {
    // === STRUCTURE TEMPLATES ===
    /// Largest count a single limb set or appendage may declare
    ///
    /// Guards against typos such as `count = 800` expanding into a skeleton
    /// nobody can bind. Counts outside 1..=max_limb_count are structure errors.
    pub max_limb_count: u32,

    // === PATTERNS ===
    /// Emit a configuration warning when a pattern resolves to zero slots
    ///
    /// Zero matches are legitimate for optional bindings, so this only ever
    /// produces warnings, never errors.
    pub warn_on_empty_match: bool,

    // === VALIDATION ===
    /// Report optional slots that stayed empty as Stage C warnings
    pub require_full_coverage: bool,

    /// Treat unknown body descriptor values as errors instead of warnings
    pub descriptor_strict: bool,
}

impl Default for AnatomyConfig {
    fn default() -> Self {
        Self {
            max_limb_count: 64,
            warn_on_empty_match: true,
            require_full_coverage: false,
            descriptor_strict: true,
        }
    }
}

impl AnatomyConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, filling unspecified fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_limb_count == 0 {
            return Err("max_limb_count must be at least 1".into());
        }
        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<AnatomyConfig> = OnceLock::new();

/// Get the global anatomy config (initializes with defaults if not set)
pub fn config() -> &'static AnatomyConfig {
    CONFIG.get_or_init(AnatomyConfig::default)
}

/// Set the global anatomy config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: AnatomyConfig) -> std::result::Result<(), AnatomyConfig> {
    CONFIG.set(config)
}
