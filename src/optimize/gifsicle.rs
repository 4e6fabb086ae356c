use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;

use crate::foundation::error::{BoilError, BoilResult};
use crate::optimize::PostOptimizer;

/// Tunables passed to `gifsicle`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GifsicleOpts {
    /// Program name or path, resolved against `PATH`.
    pub program: String,
    /// `--optimize` level (1..=3).
    pub optimize_level: u8,
    /// `--lossy` strength (0..=200, higher is smaller and lossier).
    pub lossy: u32,
    /// `--colors` palette size.
    pub colors: u16,
}

impl Default for GifsicleOpts {
    fn default() -> Self {
        Self {
            program: "gifsicle".to_string(),
            optimize_level: 3,
            lossy: 30,
            colors: 60,
        }
    }
}

impl GifsicleOpts {
    /// Reject values `gifsicle` would refuse.
    pub fn validate(&self) -> BoilResult<()> {
        if self.program.trim().is_empty() {
            return Err(BoilError::validation("optimizer program must be non-empty"));
        }
        if !(1..=3).contains(&self.optimize_level) {
            return Err(BoilError::validation("optimize_level must be in 1..=3"));
        }
        if self.lossy > 200 {
            return Err(BoilError::validation("lossy must be in 0..=200"));
        }
        if !(2..=256).contains(&self.colors) {
            return Err(BoilError::validation("optimizer colors must be in 2..=256"));
        }
        Ok(())
    }
}

/// Runs the system `gifsicle` over a temporary copy of the artifact, in place.
#[derive(Clone, Debug)]
pub struct Gifsicle {
    program: PathBuf,
    opts: GifsicleOpts,
}

impl Gifsicle {
    /// Use an explicit executable path without probing `PATH`.
    pub fn with_program(program: impl Into<PathBuf>, opts: GifsicleOpts) -> Self {
        Self {
            program: program.into(),
            opts,
        }
    }

    /// Resolve `opts.program` on `PATH`. Returns `None` (and logs) when it is not installed.
    pub fn detect(opts: GifsicleOpts) -> Option<Self> {
        match which::which(&opts.program) {
            Ok(program) => {
                tracing::debug!(program = %program.display(), "post-optimizer found");
                Some(Self { program, opts })
            }
            Err(e) => {
                tracing::info!(
                    program = %opts.program,
                    error = %e,
                    "post-optimizer not found on PATH, skipping optimization"
                );
                None
            }
        }
    }

    /// Resolved executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for optimizing `path` in place.
    pub fn args(&self, path: &Path) -> Vec<OsString> {
        vec![
            format!("--optimize={}", self.opts.optimize_level).into(),
            format!("--lossy={}", self.opts.lossy).into(),
            "--colors".into(),
            self.opts.colors.to_string().into(),
            path.as_os_str().to_owned(),
            "-o".into(),
            path.as_os_str().to_owned(),
        ]
    }
}

impl PostOptimizer for Gifsicle {
    fn name(&self) -> &str {
        "gifsicle"
    }

    fn optimize(&self, artifact: &[u8]) -> BoilResult<Vec<u8>> {
        let mut file = tempfile::Builder::new()
            .prefix("boilgif-opt-")
            .suffix(".gif")
            .tempfile()
            .context("create optimizer scratch file")?;
        file.write_all(artifact)
            .and_then(|()| file.flush())
            .context("write optimizer scratch file")?;

        let output = Command::new(&self.program)
            .args(self.args(file.path()))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                BoilError::optimizer(format!(
                    "failed to spawn '{}': {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BoilError::optimizer(format!(
                "{} exited with status {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let out = std::fs::read(file.path()).context("read optimized artifact")?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/gifsicle.rs"]
mod tests;
