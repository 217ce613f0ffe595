//! Client payload shapes and the emitter they travel through.
//!
//! The transport collaborator (a WebSocket layer, a test harness) owns the
//! receiving end of a [`RenderEmitter`] channel; the core only ever emits
//! plain structured data. Event names mirror the client protocol
//! (`set_table`, `set_graph`, `set_linker`, ...).

mod dispatch;

pub use dispatch::render_instance;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::formats::VisualizationType;
use crate::graph::AddressedGraph;
use crate::layout::Layout;

/// Rendering/emission failures. These are caught at the dispatch top
/// level and reported to the client as a single [`ClientEvent::ServerError`].
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("client transport is disconnected")]
    #[diagnostic(code(parseboard::render::transport_unavailable))]
    TransportUnavailable,

    #[error("instance index {index} is out of range for corpus of size {corpus_size}")]
    #[diagnostic(code(parseboard::render::index_out_of_range))]
    IndexOutOfRange { index: usize, corpus_size: usize },

    #[error("slice {slice:?} has no instance at index {index}")]
    #[diagnostic(code(parseboard::render::missing_instance))]
    MissingInstance { slice: String, index: usize },

    #[error("slice {slice:?} holds {found} data but is typed {declared}")]
    #[diagnostic(code(parseboard::render::shape_mismatch))]
    ShapeMismatch {
        slice: String,
        declared: VisualizationType,
        found: &'static str,
    },

    #[error("linker {name1:?}--{name2:?} has no scores at index {index}")]
    #[diagnostic(code(parseboard::render::missing_linker_scores))]
    MissingLinkerScores {
        name1: String,
        name2: String,
        index: usize,
    },
}

/// Header describing one slice of the layout grid; sent on connect so the
/// client can set up its canvases before any instance data arrives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceHeader {
    pub name: String,
    pub visualization_type: VisualizationType,
}

/// The layout grid reduced to its headers, row by row.
#[must_use]
pub fn layout_headers(layout: &Layout) -> Vec<Vec<SliceHeader>> {
    layout
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|slice| SliceHeader {
                    name: slice.name.clone(),
                    visualization_type: slice.visualization_type,
                })
                .collect()
        })
        .collect()
}

/// Table-shaped render payload; `String`-typed slices are sent as
/// single-column tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub canvas_name: String,
    pub table: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_alternatives_by_node_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_tree: Option<Value>,
}

/// Graph-shaped render payload; trees are graphs without re-entrant edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub canvas_name: String,
    pub graph: AddressedGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_alternatives_by_node_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouseover_texts: Option<FxHashMap<String, String>>,
}

/// Per-instance linker scores between two slices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkerPayload {
    pub name1: String,
    pub name2: String,
    pub scores: FxHashMap<String, FxHashMap<String, f64>>,
}

/// Everything the core ever sends to one client session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SetLayout(Vec<Vec<SliceHeader>>),
    SetCorpusLength(usize),
    SetShowNodeNames { show_node_names: bool },
    SetTable(TablePayload),
    SetGraph(GraphPayload),
    SetLinker(LinkerPayload),
    RouteToLayout(String),
    ServerError,
}

/// Sending half of the client event channel.
///
/// Cheap to clone; each clone addresses the same session. A send failure
/// means the transport hung up, which the dispatch treats as terminal for
/// the current operation.
#[derive(Clone, Debug)]
pub struct RenderEmitter {
    sender: flume::Sender<ClientEvent>,
}

impl RenderEmitter {
    pub fn new(sender: flume::Sender<ClientEvent>) -> Self {
        Self { sender }
    }

    /// Unbounded emitter/receiver pair for tests and in-process transports.
    pub fn channel() -> (Self, flume::Receiver<ClientEvent>) {
        let (sender, receiver) = flume::unbounded();
        (Self::new(sender), receiver)
    }

    pub fn emit(&self, event: ClientEvent) -> Result<(), RenderError> {
        self.sender
            .send(event)
            .map_err(|_| RenderError::TransportUnavailable)
    }
}
