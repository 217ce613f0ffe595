//! Corpus model: named, index-aligned slices of per-instance data plus
//! cross-slice linkers.
//!
//! A [`Corpus`] is an ordered mapping from slice name to [`CorpusSlice`]
//! (insertion order preserved), a shared instance count, and a list of
//! [`Linker`]s. The shared count is the minimum length observed across
//! all contributing slices and linkers: when a newly added sequence
//! disagrees with the established size, the size shrinks to the smaller
//! value and the discrepancy is logged as a warning, never an error.
//! Upstream parser output may be partial per slice, and the visualization
//! degrades to the common-denominator instance count rather than refusing
//! to render anything.

mod assemble;

pub use assemble::{RawEntry, assemble};

use indexmap::IndexMap;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::formats::{FormatError, Instance, VisualizationType};

/// Corpus assembly failures. Any of these aborts the whole assembly;
/// no partial corpus is produced.
#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("{field:?} entry is required for data entries")]
    #[diagnostic(code(parseboard::corpus::invalid_entry))]
    InvalidEntry { field: &'static str },

    #[error("unknown entry type {entry_type:?}")]
    #[diagnostic(
        code(parseboard::corpus::unknown_entry_type),
        help("Entries are of type \"data\" or \"linker\".")
    )]
    UnknownEntryType { entry_type: String },

    #[error("{what} must be {expected}")]
    #[diagnostic(code(parseboard::corpus::wrong_shape))]
    WrongShape {
        what: &'static str,
        expected: &'static str,
    },

    #[error("label alternative descriptor is missing {field:?}")]
    #[diagnostic(code(parseboard::corpus::alternative_missing_field))]
    AlternativeMissingField { field: &'static str },

    #[error("linker entry is missing {field:?}")]
    #[diagnostic(code(parseboard::corpus::linker_missing_field))]
    LinkerMissingField { field: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),
}

/// One alternative label for a node, already converted through the format
/// named by its descriptor. The descriptor's remaining fields ride along
/// untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelAlternative {
    pub label: Instance,
    #[serde(rename = "format")]
    pub visualization_type: VisualizationType,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Per-instance label alternatives: node name to its alternatives.
pub type InstanceAlternatives = FxHashMap<String, Vec<LabelAlternative>>;

/// One named column of parallel, per-instance visualization data.
///
/// Auxiliary sequences are index-aligned with `instances`; each entry may
/// itself be absent for a given instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorpusSlice {
    pub name: String,
    pub visualization_type: VisualizationType,
    pub instances: Vec<Instance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_alternatives: Option<Vec<Option<InstanceAlternatives>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<Option<Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouseover_texts: Option<Vec<FxHashMap<String, String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_trees: Option<Vec<Option<Value>>>,
}

impl CorpusSlice {
    pub fn new(
        name: impl Into<String>,
        visualization_type: VisualizationType,
        instances: Vec<Instance>,
    ) -> Self {
        Self {
            name: name.into(),
            visualization_type,
            instances,
            label_alternatives: None,
            highlights: None,
            mouseover_texts: None,
            dependency_trees: None,
        }
    }
}

/// A cross-slice relation carrying per-instance pairwise scores between
/// labeled elements of two slices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Linker {
    pub name1: String,
    pub name2: String,
    /// One score mapping per instance: origin label to destination label
    /// to score.
    pub scores: Vec<FxHashMap<String, FxHashMap<String, f64>>>,
}

/// A validated, size-aligned set of parallel slices plus linkers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub(crate) slices: IndexMap<String, CorpusSlice>,
    /// Shared instance count; `None` until the first slice or linker
    /// establishes it.
    pub size: Option<usize>,
    pub linkers: Vec<Linker>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slices in insertion order.
    pub fn slices(&self) -> impl Iterator<Item = &CorpusSlice> {
        self.slices.values()
    }

    pub fn slice(&self, name: &str) -> Option<&CorpusSlice> {
        self.slices.get(name)
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// The shared instance count; 0 for an empty corpus.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.size.unwrap_or(0)
    }

    pub fn add_slice(&mut self, slice: CorpusSlice) {
        self.slices.insert(slice.name.clone(), slice);
    }

    pub fn add_linker(&mut self, linker: Linker) {
        self.linkers.push(linker);
    }

    /// Reconcile the shared size against a newly observed sequence length.
    ///
    /// The first observation establishes the size; later observations that
    /// disagree shrink it to the smaller value (never grow) and log the
    /// discrepancy as a warning.
    pub fn reconcile_size(&mut self, source: &str, observed: usize) {
        match self.size {
            None => {
                info!(source, size = observed, "established corpus size");
                self.size = Some(observed);
            }
            Some(size) if observed != size => {
                warn!(
                    source,
                    observed,
                    expected = size,
                    "instance count does not match previously seen data"
                );
                if observed < size {
                    self.size = Some(observed);
                }
            }
            Some(_) => {}
        }
    }
}
