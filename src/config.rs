use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Year substituted when a birth field carries no four-digit run. Changing it
/// shifts every derived age, so it is surfaced in the config file.
pub const DEFAULT_FALLBACK_BIRTH_YEAR: i32 = 2000;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_fallback_birth_year")]
    pub fallback_birth_year: i32,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_fallback_birth_year() -> i32 {
    DEFAULT_FALLBACK_BIRTH_YEAR
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_birth_year: default_fallback_birth_year(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.output.dir, "output");
        assert_eq!(config.pipeline.fallback_birth_year, 2000);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[output]\ndir = \"features\"").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output.dir, "features");
        assert_eq!(config.pipeline.fallback_birth_year, 2000);
    }
}
