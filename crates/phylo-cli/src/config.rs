//! Configuration management for Phylo CLI.

use anyhow::{Context, Result};
use phylo::prelude::PopulationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Phylo project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default = "default_population")]
    pub population: PopulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_generations")]
    pub generations: u64,
    #[serde(default = "default_fitness_goal", skip_serializing_if = "Option::is_none")]
    pub fitness_goal: Option<f64>,
}

// Default value functions
fn default_seed() -> u64 { 42 }
fn default_generations() -> u64 { 300 }
fn default_fitness_goal() -> Option<f64> { Some(3.99) }

/// XOR-shaped population with a two-node starting hidden layer.
fn default_population() -> PopulationConfig {
    let mut population = PopulationConfig::with_shape(2, 1);
    population.genome.initial_hidden_nodes = 2;
    population
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            population: default_population(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            generations: default_generations(),
            fitness_goal: default_fitness_goal(),
        }
    }
}

impl Config {
    /// Load config from phylo.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load and validate config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .population
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Find phylo.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join("phylo.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Get the Phylo data directory (.phylo/).
pub fn data_dir() -> Result<PathBuf> {
    let dir = std::env::current_dir()?.join(".phylo");
    Ok(dir)
}

/// Get the sessions directory.
pub fn sessions_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("sessions"))
}

/// Get the current session file path.
pub fn current_session_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("current.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phylo.toml");
        Config::default().save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.population, default_population());
        assert_eq!(loaded.run.seed, 42);
        assert_eq!(loaded.run.fitness_goal, Some(3.99));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phylo.toml");
        std::fs::write(
            &path,
            "[run]\nseed = 7\n\n[population]\npopulation_size = 60\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.run.seed, 7);
        assert_eq!(loaded.run.generations, 300);
        assert_eq!(loaded.population.population_size, 60);
        assert_eq!(loaded.population.stagnation_window, 15);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phylo.toml");
        std::fs::write(&path, "[population]\npopulation_size = 1\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
