//! Graph storage: enumerating scored graphs, clearing output directories, and
//! writing labelled graphs.
//!
//! Graphs are stored as one JSON object per file. Fields this stage does not
//! understand are carried through to the output untouched, so a labelled file
//! is the scored file plus a `labels` array.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};
use trackbuild_core::{LabelError, ScoredGraph, TrackLabels};

/// Dataset splits read from the scored-graph directory, in load order.
pub const SPLITS: [&str; 3] = ["train", "val", "test"];

/// Errors raised while reading or writing graph files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("filesystem operation on `{path}` failed: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: std::io::Error,
    },
    /// A graph file did not contain a valid graph record.
    #[error("failed to decode graph `{path}`: {source}")]
    Decode {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A labelled graph could not be encoded.
    #[error("failed to encode graph `{path}`: {source}")]
    Encode {
        /// Destination path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A graph identifier does not yield a usable file name.
    #[error("graph identifier `{identifier}` does not name a file")]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
    },
    /// Another graph in the same run already wrote this artefact.
    #[error("graph `{identifier}` would overwrite `{path}` written earlier in this run")]
    NameCollision {
        /// Identifier of the graph that was not written.
        identifier: String,
        /// Artefact path already taken.
        path: PathBuf,
    },
}

impl StoreError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "STORE_IO",
            Self::Decode { .. } => "STORE_DECODE",
            Self::Encode { .. } => "STORE_ENCODE",
            Self::InvalidIdentifier { .. } => "STORE_INVALID_IDENTIFIER",
            Self::NameCollision { .. } => "STORE_NAME_COLLISION",
        }
    }

    /// Reports whether the failure is confined to one graph's record.
    ///
    /// Filesystem failures concern the whole output directory and are not.
    #[must_use]
    pub const fn is_per_graph(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

/// On-disk representation of a scored (and possibly labelled) graph.
///
/// # Examples
/// ```
/// use trackbuild_cli::store::GraphRecord;
///
/// let record: GraphRecord = serde_json::from_str(
///     r#"{"event_file": "train/event0001", "num_nodes": 3,
///         "edge_index": [[0, 1], [1, 2]], "scores": [0.9, 0.1],
///         "pt": [1.5, 2.0, 0.7]}"#,
/// )?;
/// let graph = record.to_scored_graph()?;
/// assert_eq!(graph.node_count(), 3);
/// assert!(record.extra.contains_key("pt"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Source event path; names the output artefact.
    pub event_file: String,
    /// Number of hits in the graph.
    pub num_nodes: i64,
    /// Edge endpoints as two rows: sources then targets.
    pub edge_index: [Vec<i64>; 2],
    /// One score per edge.
    pub scores: Vec<f32>,
    /// Track-candidate label per hit, present once labelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<u64>>,
    /// Every other field of the stored object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphRecord {
    /// Converts the record into the core graph model.
    ///
    /// # Errors
    /// Returns the [`LabelError`] raised by
    /// [`ScoredGraph::from_signed_parts`].
    pub fn to_scored_graph(&self) -> Result<ScoredGraph, LabelError> {
        let [sources, targets] = &self.edge_index;
        ScoredGraph::from_signed_parts(
            self.event_file.as_str(),
            self.num_nodes,
            sources,
            targets,
            self.scores.clone(),
        )
    }

    /// Stores `labels` on the record, replacing any earlier labels.
    pub fn set_labels(&mut self, labels: &TrackLabels) {
        self.labels = Some(labels.labels().iter().map(|id| id.get()).collect());
    }
}

/// A graph record together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    /// File the record was read from.
    pub path: PathBuf,
    /// Decoded record.
    pub record: GraphRecord,
}

/// Lists the graph files under each split of `input_dir`, split by split in
/// [`SPLITS`] order and by file name within a split.
///
/// # Errors
/// Returns [`StoreError::Io`] when a split directory is missing or unreadable.
pub fn list_graph_files(input_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for split in SPLITS {
        let split_dir = input_dir.join(split);
        let mut split_files = Vec::new();
        for entry in fs::read_dir(&split_dir).map_err(io_error(&split_dir))? {
            let entry = entry.map_err(io_error(&split_dir))?;
            let file_type = entry.file_type().map_err(io_error(&entry.path()))?;
            if file_type.is_file() {
                split_files.push(entry.path());
            }
        }
        split_files.sort();
        debug!(split, files = split_files.len(), "enumerated split");
        files.extend(split_files);
    }
    Ok(files)
}

/// Reads one graph record.
///
/// # Errors
/// Returns [`StoreError::Io`] when the file cannot be opened and
/// [`StoreError::Decode`] when it is not a graph record.
pub fn read_graph(path: &Path) -> Result<GraphRecord, StoreError> {
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every graph under the splits of `input_dir`.
///
/// # Errors
/// Returns the first error raised by [`list_graph_files`] or [`read_graph`].
#[instrument(name = "store.load_graphs", err, fields(input_dir = %input_dir.display()))]
pub fn load_graphs(input_dir: &Path) -> Result<Vec<LoadedGraph>, StoreError> {
    let graphs = list_graph_files(input_dir)?
        .into_iter()
        .map(|path| {
            let record = read_graph(&path)?;
            Ok(LoadedGraph { path, record })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    info!(graphs = graphs.len(), "loaded scored graphs");
    Ok(graphs)
}

/// Removes every file and subdirectory inside `dir`, keeping `dir` itself.
///
/// A missing directory is left missing.
///
/// # Errors
/// Returns [`StoreError::Io`] when an entry cannot be removed.
#[instrument(name = "store.clear_directory", err, fields(dir = %dir.display()))]
pub fn clear_directory(dir: &Path) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut removed = 0usize;
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        let outcome = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        outcome.map_err(io_error(&path))?;
        removed += 1;
    }
    info!(removed, "cleared output directory");
    Ok(())
}

/// Derives the artefact file name for a graph from its identifier: the last
/// path component of the event file.
///
/// # Errors
/// Returns [`StoreError::InvalidIdentifier`] when the identifier has no final
/// component (for example an empty string or `..`).
///
/// # Examples
/// ```
/// use trackbuild_cli::store::artifact_name;
///
/// assert_eq!(artifact_name("data/train/event000001000")?, "event000001000");
/// assert!(artifact_name("").is_err());
/// # Ok::<(), trackbuild_cli::store::StoreError>(())
/// ```
pub fn artifact_name(identifier: &str) -> Result<String, StoreError> {
    Path::new(identifier)
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| StoreError::InvalidIdentifier {
            identifier: identifier.to_owned(),
        })
}

/// Writes `record` into `output_dir`, creating the directory when needed, and
/// returns the written path.
///
/// # Errors
/// Returns [`StoreError::InvalidIdentifier`] when the record's event file does
/// not name a file, [`StoreError::Io`] on filesystem failures, and
/// [`StoreError::Encode`] when serialisation fails.
pub fn write_graph(output_dir: &Path, record: &GraphRecord) -> Result<PathBuf, StoreError> {
    let name = artifact_name(&record.event_file)?;
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    let path = output_dir.join(name);
    let file = File::create(&path).map_err(io_error(&path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, record).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    writer.flush().map_err(io_error(&path))?;
    debug!(path = %path.display(), "wrote labelled graph");
    Ok(path)
}

/// Writes labelled graphs into one output directory, refusing to write two
/// graphs to the same artefact within a run.
///
/// Files left by earlier runs are overwritten.
#[derive(Debug)]
pub struct GraphWriter {
    output_dir: PathBuf,
    written: HashSet<String>,
}

impl GraphWriter {
    /// Creates a writer for `output_dir`. Nothing is touched until the first
    /// write.
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            written: HashSet::new(),
        }
    }

    /// Writes `record` and returns the written path.
    ///
    /// # Errors
    /// Returns [`StoreError::NameCollision`] when an earlier record of this
    /// writer used the same artefact name, and otherwise the errors of
    /// [`write_graph`].
    pub fn write(&mut self, record: &GraphRecord) -> Result<PathBuf, StoreError> {
        let name = artifact_name(&record.event_file)?;
        if self.written.contains(&name) {
            return Err(StoreError::NameCollision {
                identifier: record.event_file.clone(),
                path: self.output_dir.join(name),
            });
        }
        let path = write_graph(&self.output_dir, record)?;
        self.written.insert(name);
        Ok(path)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
