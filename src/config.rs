// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration

use crate::error::{CsgError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default geometric tolerance in model units
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Tunables for one boolean invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsgConfig {
    /// Distance below which two points, or a point and a plane, coincide
    pub tolerance: f64,
    /// Probe rays fired per seed triangle before falling back to outside
    pub max_probe_attempts: u32,
    /// Magnitude of the random perturbation added to a retried probe ray
    pub probe_jitter: f64,
    /// Seed for the probe jitter generator
    pub rng_seed: u64,
    /// Run the seam simplifier on the assembled result
    pub simplify: bool,
    /// Seam edges shorter than this are collapsed by the simplifier
    pub simplify_tolerance: f64,
}

impl Default for CsgConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_probe_attempts: 10,
            probe_jitter: 0.1,
            rng_seed: 0x5eed_c5c6,
            simplify: true,
            simplify_tolerance: 1e-9,
        }
    }
}

impl CsgConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: CsgConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `csg.toml` from the working directory if present, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from("csg.toml").exists() {
            Self::from_file("csg.toml")?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CSG_TOLERANCE`, `CSG_SEED` and `CSG_SIMPLIFY`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("CSG_TOLERANCE") {
            self.tolerance = value
                .parse()
                .map_err(|_| CsgError::Config(format!("CSG_TOLERANCE is not a number: {value}")))?;
        }
        if let Ok(value) = std::env::var("CSG_SEED") {
            self.rng_seed = value
                .parse()
                .map_err(|_| CsgError::Config(format!("CSG_SEED is not an integer: {value}")))?;
        }
        if let Ok(value) = std::env::var("CSG_SIMPLIFY") {
            self.simplify = matches!(value.as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    /// Reject settings the kernel cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(CsgError::Config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_probe_attempts == 0 {
            return Err(CsgError::Config("max_probe_attempts must be at least 1".into()));
        }
        if self.probe_jitter < 0.0 {
            return Err(CsgError::Config("probe_jitter must not be negative".into()));
        }
        if self.simplify_tolerance < 0.0 {
            return Err(CsgError::Config("simplify_tolerance must not be negative".into()));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CsgError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        let config = CsgConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tolerance, 1e-10);
        assert_eq!(config.max_probe_attempts, 10);
    }

    #[test]
    fn test_from_file_partial() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "tolerance = 1e-8")?;
        writeln!(file, "simplify = false")?;

        let config = CsgConfig::from_file(file.path())?;
        assert_eq!(config.tolerance, 1e-8);
        assert!(!config.simplify);
        assert_eq!(config.max_probe_attempts, 10);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = CsgConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CsgError::Config(_))));

        let config = CsgConfig {
            max_probe_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() -> Result<()> {
        let config = CsgConfig {
            rng_seed: 42,
            ..Default::default()
        };
        let text = config.to_toml()?;
        let parsed: CsgConfig = toml::from_str(&text)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}
