use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

/// Load a probe configuration from a TOML file and validate it.
///
/// Missing keys fall back to their serde defaults, so a partial file is a
/// complete configuration.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ProbeConfig> {
    let path = path.as_ref();

    let raw = fs::read_to_string(path)
        .map_err(|e| ProbeError::Config(format!("cannot read {}: {e}", path.display())))?;
    let cfg: ProbeConfig = toml::from_str(&raw)
        .map_err(|e| ProbeError::Config(format!("bad TOML in {}: {e}", path.display())))?;
    cfg.validate()?;

    debug!(path = %path.display(), concurrency = cfg.concurrency, "configuration loaded");
    Ok(cfg)
}
