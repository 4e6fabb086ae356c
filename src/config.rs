//! Runtime configuration, loaded from JSON. Every field has a default.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{BoilError, BoilResult};
use crate::optimize::gifsicle::GifsicleOpts;
use crate::sequence::processor::ComposeOpts;

/// Default delivery ceiling: 24 MiB, under the common 25 MB upload limit.
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 24 * 1024 * 1024;

/// Post-optimizer settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Run the external optimizer when it is installed.
    pub enabled: bool,
    /// Tool parameters.
    #[serde(flatten)]
    pub gifsicle: GifsicleOpts,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gifsicle: GifsicleOpts::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoilConfig {
    /// Animated template containing the chroma-key region.
    pub template_path: PathBuf,
    /// Pre-made animation sent by the pet command.
    pub pet_path: PathBuf,
    /// Artifact cache directory.
    pub cache_dir: PathBuf,
    /// Root for per-invocation scratch directories.
    pub temp_dir: PathBuf,
    /// Artifacts larger than this are rejected instead of delivered.
    pub max_artifact_bytes: u64,
    /// Compositing tunables.
    pub compose: ComposeOpts,
    /// Post-optimizer settings.
    pub optimizer: OptimizerConfig,
}

impl Default for BoilConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("data/template_boiling.gif"),
            pet_path: PathBuf::from("data/boiler_pet.gif"),
            cache_dir: PathBuf::from("cache"),
            temp_dir: PathBuf::from("temp"),
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            compose: ComposeOpts::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl BoilConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_path(path: &Path) -> BoilResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the pipeline cannot honor.
    pub fn validate(&self) -> BoilResult<()> {
        if self.max_artifact_bytes == 0 {
            return Err(BoilError::validation("max_artifact_bytes must be non-zero"));
        }
        self.compose.validate()?;
        if self.optimizer.enabled {
            self.optimizer.gifsicle.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
