//! Small helpers shared across CLI tests.
//!
//! The CLI tests lay out a pipeline directory (config, scored splits, output)
//! in a temporary directory. These helpers keep the cases concise.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

use super::commands::{StrategyArg, run_pipeline};
use super::{CliError, ExecutionSummary, RunCommand};
use crate::store::SPLITS;

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Temporary pipeline layout with empty `train`, `val`, and `test` splits.
pub(super) struct Pipeline {
    pub(super) dir: TempDir,
}

impl Pipeline {
    pub(super) fn new(clear_directories: bool, score_cut: f32) -> io::Result<Self> {
        let dir = temp_dir();
        for split in SPLITS {
            fs::create_dir_all(dir.path().join("scored").join(split))?;
        }
        let config = format!(
            "common_configs:\n  clear_directories: {clear_directories}\n\
             gnn_configs:\n  output_dir: {}\n\
             track_building_configs:\n  score_cut: {score_cut}\n  output_dir: {}\n",
            dir.path().join("scored").display(),
            dir.path().join("tracks").display(),
        );
        fs::write(dir.path().join("pipeline_config.yaml"), config)?;
        Ok(Self { dir })
    }

    pub(super) fn config_path(&self) -> PathBuf {
        self.dir.path().join("pipeline_config.yaml")
    }

    pub(super) fn output_dir(&self) -> PathBuf {
        self.dir.path().join("tracks")
    }

    pub(super) fn scored_dir(&self) -> PathBuf {
        self.dir.path().join("scored")
    }

    /// Writes a scored graph into `split` under the file name `event`.
    pub(super) fn add_graph(
        &self,
        split: &str,
        event: &str,
        num_nodes: i64,
        edges: &[(i64, i64)],
        scores: &[f32],
    ) -> io::Result<PathBuf> {
        let path = self.scored_dir().join(split).join(event);
        let graph = graph_json(&format!("{split}/{event}"), num_nodes, edges, scores);
        fs::write(&path, graph.to_string())?;
        Ok(path)
    }

    /// Writes a scored graph into `split` under `file`, with an explicit
    /// `event_file`.
    pub(super) fn add_event(
        &self,
        split: &str,
        file: &str,
        event_file: &str,
    ) -> io::Result<PathBuf> {
        let path = self.scored_dir().join(split).join(file);
        fs::write(&path, graph_json(event_file, 2, &[(0, 1)], &[0.9]).to_string())?;
        Ok(path)
    }

    pub(super) fn run_command(&self) -> RunCommand {
        RunCommand {
            config: self.config_path(),
            score_cut: None,
            strategy: StrategyArg::Sequential,
            fail_fast: false,
        }
    }
}

pub(super) fn graph_json(
    event_file: &str,
    num_nodes: i64,
    edges: &[(i64, i64)],
    scores: &[f32],
) -> Value {
    let sources: Vec<i64> = edges.iter().map(|&(source, _)| source).collect();
    let targets: Vec<i64> = edges.iter().map(|&(_, target)| target).collect();
    json!({
        "event_file": event_file,
        "num_nodes": num_nodes,
        "edge_index": [sources, targets],
        "scores": scores,
        "hit_id": (0..num_nodes.clamp(0, 64)).collect::<Vec<_>>(),
    })
}

pub(super) fn read_labels(path: &Path) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    let written: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(serde_json::from_value(written["labels"].clone())?)
}

pub(super) fn run_pipeline_expecting_error(cmd: RunCommand, panic_msg: &str) -> CliError {
    match run_pipeline(cmd) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

pub(super) fn identifiers(summary: &ExecutionSummary) -> Vec<&str> {
    summary
        .graphs
        .iter()
        .map(|graph| graph.identifier.as_str())
        .collect()
}
