//! Pipeline configuration loaded from YAML.
//!
//! The configuration file is shared with the other pipeline stages, so only
//! the sections this stage reads are modelled and unknown keys are ignored.
//! Relative directories are resolved against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use trackbuild_core::DEFAULT_SCORE_CUT;

/// Default location of the pipeline configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "pipeline_config.yaml";

/// Errors raised while loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read pipeline config at `{path}`: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid YAML for this stage.
    #[error("failed to parse pipeline config at `{path}`: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
}

/// Sections of the pipeline configuration read by the track-building stage.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use trackbuild_cli::config::PipelineConfig;
///
/// let yaml = "
/// gnn_configs:
///   output_dir: scored
/// track_building_configs:
///   output_dir: tracks
/// ";
/// let config = PipelineConfig::from_yaml_str(yaml, Path::new("inline.yaml"))?;
/// assert_eq!(config.track_building_configs.score_cut, 0.8);
/// assert!(!config.common_configs.clear_directories);
/// # Ok::<(), trackbuild_cli::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Settings shared by every stage.
    #[serde(default)]
    pub common_configs: CommonConfigs,
    /// Settings of the scoring stage; its output is this stage's input.
    pub gnn_configs: GnnConfigs,
    /// Settings of the track-building stage.
    pub track_building_configs: TrackBuildingConfigs,
}

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CommonConfigs {
    /// Empty each stage's output directory before writing to it.
    #[serde(default)]
    pub clear_directories: bool,
}

/// Settings of the scoring stage.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GnnConfigs {
    /// Directory holding the scored graphs, split into `train`, `val` and
    /// `test` subdirectories.
    pub output_dir: PathBuf,
}

/// Settings of the track-building stage.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackBuildingConfigs {
    /// Edges scoring strictly above this value join their hits.
    #[serde(default = "default_score_cut")]
    pub score_cut: f32,
    /// Directory receiving the labelled graphs.
    pub output_dir: PathBuf,
}

const fn default_score_cut() -> f32 {
    DEFAULT_SCORE_CUT
}

impl PipelineConfig {
    /// Reads and parses the configuration at `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid for this stage.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents, path)
    }

    /// Parses configuration text; `origin` is only used in error messages.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the text is not valid for this
    /// stage.
    pub fn from_yaml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &str = "
common_configs:
  experiment_name: quickstart
  clear_directories: true
gnn_configs:
  output_dir: datasets/quickstart_gnn_processed
  hidden: 128
track_building_configs:
  score_cut: 0.5
  output_dir: datasets/quickstart_track_building_processed
";

    #[rstest]
    fn parses_full_configuration_and_ignores_other_keys() {
        let config = PipelineConfig::from_yaml_str(FULL, Path::new("full.yaml"))
            .expect("config must parse");
        assert!(config.common_configs.clear_directories);
        assert_eq!(
            config.gnn_configs.output_dir,
            PathBuf::from("datasets/quickstart_gnn_processed")
        );
        assert_eq!(config.track_building_configs.score_cut, 0.5);
        assert_eq!(
            config.track_building_configs.output_dir,
            PathBuf::from("datasets/quickstart_track_building_processed")
        );
    }

    #[rstest]
    #[case::missing_gnn_section("track_building_configs:\n  output_dir: out\n")]
    #[case::missing_output_dir("gnn_configs:\n  output_dir: in\ntrack_building_configs:\n  score_cut: 0.5\n")]
    #[case::non_numeric_cut(
        "gnn_configs:\n  output_dir: in\ntrack_building_configs:\n  score_cut: high\n  output_dir: out\n"
    )]
    fn rejects_incomplete_configuration(#[case] yaml: &str) {
        let err = PipelineConfig::from_yaml_str(yaml, Path::new("broken.yaml"))
            .expect_err("config must be rejected");
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == Path::new("broken.yaml")));
    }

    #[rstest]
    fn load_reports_missing_file() {
        let err = PipelineConfig::load(Path::new("/definitely/not/here.yaml"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
