//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - engine.toml (default configuration)
//! - engine.local.toml (git-ignored local overrides)
//! - Environment variables (`FATHOM_` prefix)
//!
//! The engine itself never calls [`EngineConfig::load`] on its own behalf —
//! every public entry point accepts an `EngineConfig` (or defaults it) so
//! embedders who never touch a filesystem still get deterministic defaults.
//!
//! ## Example
//!
//! ```toml
//! # engine.toml
//! [clustering]
//! different_depth_cost = 2.0
//! stride_cost = 1.0
//!
//! [annealing]
//! initial_temperature = 5000.0
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! FATHOM_CLUSTERING__STRIDE_COST=0
//! FATHOM_ANNEALING__COOLING_FRACTION=0.9
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default per-step costs for the tree-position distance metric (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Added once per unit of ancestor-depth difference between A and B.
    #[serde(default = "default_different_depth_cost")]
    pub different_depth_cost: f64,

    /// Added per paired ancestor step whose tag names differ.
    #[serde(default = "default_different_tag_cost")]
    pub different_tag_cost: f64,

    /// Added per paired ancestor step whose tag names match.
    #[serde(default = "default_same_tag_cost")]
    pub same_tag_cost: f64,

    /// Added per stride node found between A and B. Stride counting is
    /// skipped entirely when this is `0.0`.
    #[serde(default = "default_stride_cost")]
    pub stride_cost: f64,
}

fn default_different_depth_cost() -> f64 {
    2.0
}
fn default_different_tag_cost() -> f64 {
    2.0
}
fn default_same_tag_cost() -> f64 {
    1.0
}
fn default_stride_cost() -> f64 {
    1.0
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            different_depth_cost: default_different_depth_cost(),
            different_tag_cost: default_different_tag_cost(),
            same_tag_cost: default_same_tag_cost(),
            stride_cost: default_stride_cost(),
        }
    }
}

/// Default parameters for the simulated-annealing optimizer (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealingConfig {
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,

    #[serde(default = "default_cooling_steps")]
    pub cooling_steps: u32,

    #[serde(default = "default_cooling_fraction")]
    pub cooling_fraction: f64,

    #[serde(default = "default_steps_per_temp")]
    pub steps_per_temp: u32,

    #[serde(default = "default_boltzmann")]
    pub boltzmann: f64,
}

fn default_initial_temperature() -> f64 {
    5000.0
}
fn default_cooling_steps() -> u32 {
    5000
}
fn default_cooling_fraction() -> f64 {
    0.95
}
fn default_steps_per_temp() -> u32 {
    1000
}
fn default_boltzmann() -> f64 {
    1.380_648_527_9e-23
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        AnnealingConfig {
            initial_temperature: default_initial_temperature(),
            cooling_steps: default_cooling_steps(),
            cooling_fraction: default_cooling_fraction(),
            steps_per_temp: default_steps_per_temp(),
            boltzmann: default_boltzmann(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub annealing: AnnealingConfig,
}

impl EngineConfig {
    /// Load configuration from the default locations, merging in order:
    /// 1. `engine.toml` (base configuration)
    /// 2. `engine.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`FATHOM_` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(
            EngineConfig::default(),
        ))
        .merge(Toml::file("engine.toml"))
        .merge(Toml::file("engine.local.toml"))
        .merge(Env::prefixed("FATHOM_").split("__"))
        .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(
            EngineConfig::default(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FATHOM_").split("__"))
        .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.clustering.different_depth_cost, 2.0);
        assert_eq!(config.clustering.different_tag_cost, 2.0);
        assert_eq!(config.clustering.same_tag_cost, 1.0);
        assert_eq!(config.clustering.stride_cost, 1.0);
        assert_eq!(config.annealing.initial_temperature, 5000.0);
        assert_eq!(config.annealing.cooling_steps, 5000);
        assert_eq!(config.annealing.cooling_fraction, 0.95);
        assert_eq!(config.annealing.steps_per_temp, 1000);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[clustering]"));
        assert!(toml_str.contains("[annealing]"));
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
