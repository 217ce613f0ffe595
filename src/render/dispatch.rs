//! Instance rendering dispatch.
//!
//! Projects one instance (by index) of a layout into the exact payload
//! shapes the client visualizer needs: one table or graph payload per
//! slice in row-major layout order, then one payload per linker.
//!
//! Failure policy: any error during the projection is caught here, logged,
//! and reported to the client as a single `server_error` event. Payloads
//! already emitted are not retracted; the client tolerates a partial
//! render with a trailing failure notice.

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{error, info};

use crate::corpus::{CorpusSlice, InstanceAlternatives, Linker};
use crate::formats::{Instance, VisualizationType};
use crate::layout::Layout;

use super::{ClientEvent, GraphPayload, LinkerPayload, RenderEmitter, RenderError, TablePayload};

/// Render instance `index` of `layout` to the client behind `emitter`.
///
/// An empty corpus emits nothing; that is an informational condition, not
/// an error.
pub fn render_instance(layout: &Layout, index: usize, emitter: &RenderEmitter) {
    if layout.corpus_size == 0 {
        info!("no instances in corpus, nothing to render");
        return;
    }
    if let Err(err) = render_slices_and_linkers(layout, index, emitter) {
        error!(index, error = %err, "instance rendering failed");
        if emitter.emit(ClientEvent::ServerError).is_err() {
            error!("client transport gone while reporting render failure");
        }
    }
}

fn render_slices_and_linkers(
    layout: &Layout,
    index: usize,
    emitter: &RenderEmitter,
) -> Result<(), RenderError> {
    if index >= layout.corpus_size {
        return Err(RenderError::IndexOutOfRange {
            index,
            corpus_size: layout.corpus_size,
        });
    }

    for slice in layout.slices() {
        emitter.emit(slice_payload(slice, index)?)?;
    }
    for linker in &layout.linkers {
        emitter.emit(ClientEvent::SetLinker(linker_payload(layout, linker, index)?))?;
    }
    Ok(())
}

fn slice_payload(slice: &CorpusSlice, index: usize) -> Result<ClientEvent, RenderError> {
    let instance = slice
        .instances
        .get(index)
        .ok_or_else(|| RenderError::MissingInstance {
            slice: slice.name.clone(),
            index,
        })?;

    let label_alternatives = alternatives_at(slice, index);
    let highlights = slice
        .highlights
        .as_ref()
        .and_then(|entries| entries.get(index))
        .and_then(Option::as_ref)
        .cloned();
    let mouseover_texts = slice
        .mouseover_texts
        .as_ref()
        .and_then(|entries| entries.get(index))
        .cloned();
    let dependency_tree = slice
        .dependency_trees
        .as_ref()
        .and_then(|entries| entries.get(index))
        .and_then(Option::as_ref)
        .cloned();

    match slice.visualization_type {
        VisualizationType::String => {
            let tokens = instance
                .as_tokens()
                .ok_or_else(|| shape_mismatch(slice, instance))?;
            Ok(ClientEvent::SetTable(TablePayload {
                canvas_name: slice.name.clone(),
                table: tokens.iter().map(|token| vec![token.clone()]).collect(),
                label_alternatives_by_node_name: label_alternatives
                    .map(|alts| rewrite_index_keys(serialize_alternatives(alts))),
                highlights: highlights.map(rewrite_index_keys),
                dependency_tree,
            }))
        }
        VisualizationType::Table => {
            let Instance::Table(rows) = instance else {
                return Err(shape_mismatch(slice, instance));
            };
            Ok(ClientEvent::SetTable(TablePayload {
                canvas_name: slice.name.clone(),
                table: rows.clone(),
                label_alternatives_by_node_name: label_alternatives
                    .map(|alts| rewrite_index_keys(serialize_alternatives(alts))),
                highlights: highlights.map(rewrite_index_keys),
                dependency_tree,
            }))
        }
        VisualizationType::Tree => {
            let graph = instance
                .as_graph()
                .ok_or_else(|| shape_mismatch(slice, instance))?;
            Ok(ClientEvent::SetGraph(GraphPayload {
                canvas_name: slice.name.clone(),
                graph: graph.clone(),
                label_alternatives_by_node_name: label_alternatives.map(serialize_alternatives),
                highlights,
                mouseover_texts: None,
            }))
        }
        VisualizationType::Graph => {
            let graph = instance
                .as_graph()
                .ok_or_else(|| shape_mismatch(slice, instance))?;
            Ok(ClientEvent::SetGraph(GraphPayload {
                canvas_name: slice.name.clone(),
                graph: graph.clone(),
                label_alternatives_by_node_name: label_alternatives.map(serialize_alternatives),
                highlights,
                mouseover_texts,
            }))
        }
    }
}

fn linker_payload(
    layout: &Layout,
    linker: &Linker,
    index: usize,
) -> Result<LinkerPayload, RenderError> {
    let mut scores = linker
        .scores
        .get(index)
        .ok_or_else(|| RenderError::MissingLinkerScores {
            name1: linker.name1.clone(),
            name2: linker.name2.clone(),
            index,
        })?
        .clone();

    if layout.visualization_type_for(&linker.name1) == Some(VisualizationType::String) {
        scores = scores
            .into_iter()
            .map(|(origin, destinations)| (rewrite_key(&origin), destinations))
            .collect();
    }
    if layout.visualization_type_for(&linker.name2) == Some(VisualizationType::String) {
        scores = scores
            .into_iter()
            .map(|(origin, destinations)| {
                let rewritten: FxHashMap<String, f64> = destinations
                    .into_iter()
                    .map(|(destination, score)| (rewrite_key(&destination), score))
                    .collect();
                (origin, rewritten)
            })
            .collect();
    }

    Ok(LinkerPayload {
        name1: linker.name1.clone(),
        name2: linker.name2.clone(),
        scores,
    })
}

fn alternatives_at<'a>(slice: &'a CorpusSlice, index: usize) -> Option<&'a InstanceAlternatives> {
    slice
        .label_alternatives
        .as_ref()
        .and_then(|entries| entries.get(index))
        .and_then(Option::as_ref)
}

fn serialize_alternatives(alternatives: &InstanceAlternatives) -> Value {
    // InstanceAlternatives holds only serde-friendly data, so this cannot
    // fail; fall back to an empty object to keep the dispatch total.
    serde_json::to_value(alternatives).unwrap_or_else(|_| Value::Object(Default::default()))
}

fn shape_mismatch(slice: &CorpusSlice, instance: &Instance) -> RenderError {
    RenderError::ShapeMismatch {
        slice: slice.name.clone(),
        declared: slice.visualization_type,
        found: match instance {
            Instance::Tokens(_) => "token",
            Instance::Table(_) => "table",
            Instance::Graph(_) => "graph",
        },
    }
}

/// Rewrite a bare integer key into the `(row, column)` cell-name form the
/// table canvas addresses, with the row fixed at 0. Keys that are already
/// cell names (or otherwise non-numeric) pass through unchanged.
fn rewrite_key(key: &str) -> String {
    match key.parse::<usize>() {
        Ok(column) => format!("(0, {column})"),
        Err(_) => key.to_string(),
    }
}

/// Apply [`rewrite_key`] to every top-level key of a JSON object.
fn rewrite_index_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (rewrite_key(&key), inner))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_become_cell_names() {
        assert_eq!(rewrite_key("3"), "(0, 3)");
        assert_eq!(rewrite_key("(0, 3)"), "(0, 3)");
        assert_eq!(rewrite_key("node_7"), "node_7");
    }

    #[test]
    fn only_object_values_are_rewritten() {
        let rewritten = rewrite_index_keys(serde_json::json!({"0": "red", "2": ["blue"]}));
        assert_eq!(
            rewritten,
            serde_json::json!({"(0, 0)": "red", "(0, 2)": ["blue"]})
        );
        let passthrough = rewrite_index_keys(serde_json::json!(["red"]));
        assert_eq!(passthrough, serde_json::json!(["red"]));
    }
}
