//! Runtime configuration for the registry binaries.
//!
//! Resolution order: explicit `--data-dir` flag, then `MAPREG_DATA_DIR`, then
//! `./mapping-data`. `RegistryConfig::resolve` is pure so callers (and tests)
//! can pass the environment value in instead of mutating the process env.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "MAPREG_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "MAPREG_LOG";
const DEFAULT_DATA_DIR: &str = "mapping-data";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryConfig {
    pub data_dir: PathBuf,
}

impl RegistryConfig {
    /// Pick the data directory from an explicit flag or an env value.
    ///
    /// Empty or whitespace-only env values are ignored so an exported-but-unset
    /// variable does not point the store at the current directory.
    pub fn resolve(flag: Option<PathBuf>, env_value: Option<String>) -> Self {
        let data_dir = flag
            .or_else(|| {
                env_value
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self { data_dir }
    }

    /// `resolve` against the live process environment, anchoring relative
    /// paths at the current directory.
    pub fn from_env(flag: Option<PathBuf>) -> Result<Self> {
        let resolved = Self::resolve(flag, env::var(DATA_DIR_ENV).ok());
        let cwd = env::current_dir().context("unable to read current directory")?;
        Ok(resolved.anchored_at(&cwd))
    }

    fn anchored_at(self, base: &Path) -> Self {
        if self.data_dir.is_absolute() {
            self
        } else {
            Self {
                data_dir: base.join(self.data_dir),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_env() {
        let config = RegistryConfig::resolve(
            Some(PathBuf::from("/from/flag")),
            Some("/from/env".to_string()),
        );
        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
    }

    #[test]
    fn env_used_when_flag_absent() {
        let config = RegistryConfig::resolve(None, Some(" /from/env ".to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn blank_env_falls_back_to_default() {
        let config = RegistryConfig::resolve(None, Some("   ".to_string()));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        let config = RegistryConfig::resolve(None, None);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn relative_dirs_are_anchored() {
        let config = RegistryConfig::resolve(None, None).anchored_at(Path::new("/srv"));
        assert_eq!(config.data_dir, PathBuf::from("/srv/mapping-data"));
        let config = RegistryConfig::resolve(Some(PathBuf::from("/abs")), None)
            .anchored_at(Path::new("/srv"));
        assert_eq!(config.data_dir, PathBuf::from("/abs"));
    }
}
