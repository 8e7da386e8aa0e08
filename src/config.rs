//! Configuration module for the clustering pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! The only command-line override is `--debug`; `--config` picks the file.
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CAUCUS_` and use double underscores
//! to separate nested levels:
//! - `CAUCUS_CLUSTERING__K=4` sets `clustering.k`
//! - `CAUCUS_REDUCTION__ON_DEGENERATE=fail` sets `reduction.on_degenerate`
//! - `CAUCUS_REFRESH__CONCURRENT=wait` sets `refresh.concurrent`

use crate::analysis::{
    AnalysisOptions, DEFAULT_CLUSTER_COUNT, DEFAULT_SEED, DegeneratePolicy, FewerRowsPolicy,
    KMeansOptions, PcaOptions, SimilarityMode,
};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-project configuration directory.
pub const LOCAL_DIR: &str = ".caucus";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the result store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Workspace root directory (where .caucus is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Tag written into every persisted result
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Vote source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// K-means settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// 2-D projection settings
    #[serde(default)]
    pub reduction: ReductionConfig,

    /// Similarity scoring
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Refresh serialisation
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// JSON file with `legislators` and `votes`
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Number of clusters
    #[serde(default = "default_k")]
    pub k: usize,

    /// Seed for every random draw in the pipeline
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// K-means restarts; the lowest-inertia run wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,

    #[serde(default = "default_kmeans_iterations")]
    pub max_iterations: usize,

    /// Behaviour when there are fewer legislators than clusters
    #[serde(default)]
    pub when_fewer_rows: FewerRowsPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReductionConfig {
    /// Behaviour when two informative components do not exist
    #[serde(default)]
    pub on_degenerate: DegeneratePolicy,

    /// Power-iteration cap per component
    #[serde(default = "default_pca_iterations")]
    pub max_iterations: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub similarity: SimilarityMode,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentRefresh {
    /// Fail fast while another refresh holds the gate
    #[default]
    Reject,
    /// Block until the running refresh finishes
    Wait,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct RefreshConfig {
    #[serde(default)]
    pub concurrent: ConcurrentRefresh,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".caucus/store")
}
fn default_source_path() -> PathBuf {
    PathBuf::from(".caucus/votes.json")
}
fn default_false() -> bool {
    false
}
fn default_model_version() -> String {
    "v1.0".to_string()
}
fn default_k() -> usize {
    DEFAULT_CLUSTER_COUNT
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}
fn default_n_init() -> usize {
    10
}
fn default_kmeans_iterations() -> usize {
    300
}
fn default_pca_iterations() -> usize {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            store_path: default_store_path(),
            workspace_root: None,
            debug: false,
            model_version: default_model_version(),
            source: SourceConfig::default(),
            clustering: ClusteringConfig::default(),
            reduction: ReductionConfig::default(),
            analysis: AnalysisConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            seed: default_seed(),
            n_init: default_n_init(),
            max_iterations: default_kmeans_iterations(),
            when_fewer_rows: FewerRowsPolicy::default(),
        }
    }
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            on_degenerate: DegeneratePolicy::default(),
            max_iterations: default_pca_iterations(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .caucus directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(LOCAL_DIR).join("settings.toml"));

        Self::figment(config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    ///
    /// Relative paths resolve against the workspace owning the file: the
    /// parent of a `.caucus` directory, otherwise the file's own directory.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Self::figment(path.to_path_buf())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_of(path);
                }
                settings
            })
    }

    fn workspace_of(config_path: &std::path::Path) -> Option<PathBuf> {
        let dir = config_path.parent()?;
        let root = if dir.file_name().is_some_and(|name| name == LOCAL_DIR) {
            dir.parent()?
        } else {
            dir
        };
        Some(root.to_path_buf())
    }

    fn figment(config_path: PathBuf) -> Figment {
        Self::figment_with_prefix(config_path, "CAUCUS_")
    }

    fn figment_with_prefix(config_path: PathBuf, prefix: &str) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays in field names
            .merge(Env::prefixed(prefix).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for .caucus directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(LOCAL_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .caucus is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(LOCAL_DIR);
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Check whether a settings file exists for this workspace.
    pub fn check_init() -> Result<(), String> {
        if Self::find_workspace_config().is_some_and(|path| path.exists()) {
            return Ok(());
        }
        Err("No .caucus/settings.toml found. Run 'caucus init' to create one".to_string())
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve_path(&self, path: &std::path::Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.clustering.k == 0 {
            return Err("clustering.k must be at least 1".to_string());
        }
        if self.clustering.n_init == 0 {
            return Err("clustering.n_init must be at least 1".to_string());
        }
        if self.clustering.max_iterations == 0 || self.reduction.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if self.model_version.trim().is_empty() {
            return Err("model_version must not be empty".to_string());
        }
        Ok(())
    }

    /// Numeric options derived from these settings.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            pca: PcaOptions {
                max_iterations: self.reduction.max_iterations,
                seed: self.clustering.seed,
                on_degenerate: self.reduction.on_degenerate,
                ..PcaOptions::default()
            },
            kmeans: KMeansOptions {
                k: self.clustering.k,
                seed: self.clustering.seed,
                n_init: self.clustering.n_init,
                max_iterations: self.clustering.max_iterations,
                when_fewer_rows: self.clustering.when_fewer_rows,
                ..KMeansOptions::default()
            },
            similarity: self.analysis.similarity,
        }
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(LOCAL_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Caucus Configuration File

# Version of the configuration schema
version = 1

# Directory of the result store (relative to workspace root)
store_path = ".caucus/store"

# Global debug mode
debug = false

# Tag written into every stored result
model_version = "v1.0"

[source]
# JSON file with "legislators" and "votes" arrays
path = ".caucus/votes.json"

[clustering]
# Number of clusters
k = 5

# Seed for k-means++, restarts and the projection start vectors.
# Identical input with the same seed always gives identical output.
seed = 42

# K-means restarts, the lowest-inertia run wins
n_init = 10
max_iterations = 300

# When there are fewer legislators than clusters:
# "shrink" runs with k = number of legislators, "fail" aborts the refresh
when_fewer_rows = "shrink"

[reduction]
# When the votes cannot support two informative axes:
# "zero_pad" fills the missing axis with 0.0, "fail" aborts the refresh
on_degenerate = "zero_pad"
max_iterations = 500

[analysis]
# "centroid": 1 / (1 + distance to the cluster centroid)
# "placeholder": seeded draw in [0.7, 0.95), for legacy consumers
similarity = "centroid"

[refresh]
# "reject" fails a refresh while another one runs, "wait" queues it
concurrent = "reject"

[logging]
# Default filter, RUST_LOG takes precedence
level = "info"
"#;

        std::fs::write(&config_path, template)?;

        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
        }

        Ok(config_path)
    }
}
