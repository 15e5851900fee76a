use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::{ensure, Context as _};
use rust_embed::RustEmbed;
use serde::Deserialize;

/// Process-wide grading configuration: constructed once at startup,
/// read-only afterwards. Every field has a default, so the tool works
/// with no config file at all.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradeConfig {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,

    pub program: String,
    pub sanitize_program: String,
    pub valgrind: String,
    pub nm: String,
    pub build: Vec<String>,
    /// Object-file stems whose symbol tables are checked for mutable globals.
    pub objects: Vec<String>,
    pub success_marker: String,
    pub log_dir: PathBuf,
    /// Scales every timeout budget, e.g. 2.0 on slow hardware.
    pub timeout_multiplier: f64,
    /// Scales every default iteration count (rounded up).
    pub iters_multiplier: f64,
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            source_config_file: None,
            program: "./channel".to_owned(),
            sanitize_program: "./channel_sanitize".to_owned(),
            valgrind: "valgrind".to_owned(),
            nm: "nm".to_owned(),
            build: vec!["make".to_owned(), "clean".to_owned(), "all".to_owned()],
            objects: vec!["channel".to_owned(), "linked_list".to_owned()],
            success_marker: "ALL TESTS PASSED".to_owned(),
            log_dir: PathBuf::from("."),
            timeout_multiplier: 1.0,
            iters_multiplier: 1.0,
        }
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl GradeConfig {
    pub const FILENAME: &str = "autograde.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    pub fn load_or_default(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Some(filepath) => Self::from_toml_file(filepath),
            None => {
                log::info!("No {} found in ancestor dirs, using defaults", Self::FILENAME);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.timeout_multiplier > 0.0,
            "timeout_multiplier must be positive (got {})",
            self.timeout_multiplier
        );
        ensure!(
            self.iters_multiplier > 0.0,
            "iters_multiplier must be positive (got {})",
            self.iters_multiplier
        );
        ensure!(!self.build.is_empty(), "build command must not be empty");
        Ok(())
    }

    pub fn scale_timeout(&self, base: Duration) -> Duration {
        base.mul_f64(self.timeout_multiplier)
    }

    pub fn scale_iters(&self, base: u64) -> u64 {
        (base as f64 * self.iters_multiplier).ceil() as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable_and_match_defaults() {
        let toml = GradeConfig::example_toml();
        let cfg = GradeConfig::from_toml(&toml).unwrap();
        assert_eq!(cfg, GradeConfig::default());
    }

    #[test]
    fn scale_iters_uses_ceiling() {
        let cfg = GradeConfig {
            iters_multiplier: 1.5,
            ..Default::default()
        };
        assert_eq!(cfg.scale_iters(5), 8);
        assert_eq!(cfg.scale_iters(1), 2);
    }

    #[test]
    fn scale_timeout_multiplies() {
        let cfg = GradeConfig {
            timeout_multiplier: 2.5,
            ..Default::default()
        };
        assert_eq!(
            cfg.scale_timeout(Duration::from_secs(4)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn rejects_nonpositive_multipliers() {
        let cfg = GradeConfig {
            timeout_multiplier: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_build_command() {
        let cfg = GradeConfig {
            build: vec![],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
