//! Corpus assembly from raw parse entries.
//!
//! The ingestion collaborator supplies an ordered sequence of entries,
//! each typed `data` (a named slice) or `linker`. Entries are processed
//! in order, mutating an accumulating [`Corpus`]; any failure aborts the
//! whole assembly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::formats::{Format, Instance, VisualizationType};
use crate::lexicon::Lexicon;

use super::{Corpus, CorpusError, CorpusSlice, InstanceAlternatives, LabelAlternative, Linker};

fn default_entry_type() -> String {
    "data".to_string()
}

/// One raw entry of the ingestion payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub instances: Option<Vec<Value>>,
    #[serde(default)]
    pub label_alternatives: Option<Value>,
    #[serde(default)]
    pub highlights: Option<Value>,
    #[serde(default)]
    pub dependency_trees: Option<Value>,
    // Linker fields.
    #[serde(default)]
    pub name1: Option<String>,
    #[serde(default)]
    pub name2: Option<String>,
    #[serde(default)]
    pub scores: Option<Vec<FxHashMap<String, FxHashMap<String, f64>>>>,
}

impl Default for RawEntry {
    fn default() -> Self {
        Self {
            entry_type: default_entry_type(),
            name: None,
            format: None,
            instances: None,
            label_alternatives: None,
            highlights: None,
            dependency_trees: None,
            name1: None,
            name2: None,
            scores: None,
        }
    }
}

/// Assemble a [`Corpus`] from raw entries.
///
/// For `data` entries: validates name and instances, resolves the format
/// reader (default `string`), converts instances, reconciles the corpus
/// size, processes label alternatives and highlights, and computes
/// mouseover texts for graph-shaped slices when a lexicon is supplied.
/// For `linker` entries: appends the linker and reconciles the size
/// against its score count.
///
/// # Errors
///
/// Any [`CorpusError`]; nothing partial survives a failure.
pub fn assemble(entries: &[RawEntry], lexicon: Option<&Lexicon>) -> Result<Corpus, CorpusError> {
    let mut corpus = Corpus::new();
    for entry in entries {
        match entry.entry_type.as_str() {
            "data" => assemble_data(&mut corpus, entry, lexicon)?,
            "linker" => assemble_linker(&mut corpus, entry)?,
            other => {
                return Err(CorpusError::UnknownEntryType {
                    entry_type: other.to_string(),
                });
            }
        }
    }
    Ok(corpus)
}

fn assemble_data(
    corpus: &mut Corpus,
    entry: &RawEntry,
    lexicon: Option<&Lexicon>,
) -> Result<(), CorpusError> {
    let name = entry
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(CorpusError::InvalidEntry { field: "name" })?;
    let raw_instances = entry
        .instances
        .as_deref()
        .filter(|i| !i.is_empty())
        .ok_or(CorpusError::InvalidEntry { field: "instances" })?;

    corpus.reconcile_size(name, raw_instances.len());

    let format = Format::parse(entry.format.as_deref().unwrap_or("string"))?;
    let instances = format.convert_instances(raw_instances)?;

    let label_alternatives = read_label_alternatives(entry)?;
    if let Some(alternatives) = &label_alternatives {
        corpus.reconcile_size(name, alternatives.len());
    }

    let highlights = read_optional_list(entry.highlights.as_ref(), "highlights")?;
    if let Some(highlights) = &highlights {
        corpus.reconcile_size(name, highlights.len());
    }

    let dependency_trees = read_optional_list(entry.dependency_trees.as_ref(), "dependency_trees")?;
    if let Some(dependency_trees) = &dependency_trees {
        corpus.reconcile_size(name, dependency_trees.len());
    }

    let mouseover_texts = match (format.visualization_type(), lexicon) {
        (VisualizationType::Graph, Some(lexicon)) => {
            Some(collect_mouseover_texts(&instances, lexicon))
        }
        _ => None,
    };

    corpus.add_slice(CorpusSlice {
        name: name.to_string(),
        visualization_type: format.visualization_type(),
        instances,
        label_alternatives,
        highlights,
        mouseover_texts,
        dependency_trees,
    });
    Ok(())
}

fn assemble_linker(corpus: &mut Corpus, entry: &RawEntry) -> Result<(), CorpusError> {
    let name1 = entry
        .name1
        .clone()
        .ok_or(CorpusError::LinkerMissingField { field: "name1" })?;
    let name2 = entry
        .name2
        .clone()
        .ok_or(CorpusError::LinkerMissingField { field: "name2" })?;
    let scores = entry
        .scores
        .clone()
        .ok_or(CorpusError::LinkerMissingField { field: "scores" })?;

    let source = format!("{name1}--{name2}");
    corpus.reconcile_size(&source, scores.len());
    corpus.add_linker(Linker {
        name1,
        name2,
        scores,
    });
    Ok(())
}

/// Process the `label_alternatives` entry, converting each alternative's
/// label through the reader named by its own `format` field and replacing
/// the format with the resulting visualization type.
fn read_label_alternatives(
    entry: &RawEntry,
) -> Result<Option<Vec<Option<InstanceAlternatives>>>, CorpusError> {
    let Some(raw) = &entry.label_alternatives else {
        return Ok(None);
    };
    let instances = raw.as_array().ok_or(CorpusError::WrongShape {
        what: "label_alternatives",
        expected: "a list",
    })?;

    let mut converted = Vec::with_capacity(instances.len());
    for instance in instances {
        if instance.is_null() {
            converted.push(None);
            continue;
        }
        let by_node = instance.as_object().ok_or(CorpusError::WrongShape {
            what: "label alternatives for an instance",
            expected: "a mapping from node name to alternatives",
        })?;

        let mut instance_alternatives = InstanceAlternatives::default();
        for (node_name, node_alternatives) in by_node {
            let descriptors = node_alternatives.as_array().ok_or(CorpusError::WrongShape {
                what: "label alternatives for a node",
                expected: "a list of descriptors",
            })?;
            let mut alternatives = Vec::with_capacity(descriptors.len());
            for descriptor in descriptors {
                alternatives.push(convert_alternative(descriptor)?);
            }
            instance_alternatives.insert(node_name.clone(), alternatives);
        }
        converted.push(Some(instance_alternatives));
    }
    Ok(Some(converted))
}

fn convert_alternative(descriptor: &Value) -> Result<LabelAlternative, CorpusError> {
    let fields = descriptor.as_object().ok_or(CorpusError::WrongShape {
        what: "a label alternative descriptor",
        expected: "a mapping",
    })?;
    let format_name = fields
        .get("format")
        .and_then(Value::as_str)
        .ok_or(CorpusError::AlternativeMissingField { field: "format" })?;
    let raw_label = fields
        .get("label")
        .ok_or(CorpusError::AlternativeMissingField { field: "label" })?;

    let format = Format::parse(format_name)?;
    let label = format.convert_single_instance(raw_label)?;
    let extra: serde_json::Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != "format" && key.as_str() != "label")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(LabelAlternative {
        label,
        visualization_type: format.visualization_type(),
        extra,
    })
}

fn read_optional_list(
    raw: Option<&Value>,
    what: &'static str,
) -> Result<Option<Vec<Option<Value>>>, CorpusError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let items = raw.as_array().ok_or(CorpusError::WrongShape {
        what,
        expected: "a list",
    })?;
    Ok(Some(
        items
            .iter()
            .map(|item| if item.is_null() { None } else { Some(item.clone()) })
            .collect(),
    ))
}

/// Definitions for every graph node whose label the lexicon knows,
/// collected per instance with a pre-order fold.
fn collect_mouseover_texts(
    instances: &[Instance],
    lexicon: &Lexicon,
) -> Vec<FxHashMap<String, String>> {
    instances
        .iter()
        .map(|instance| match instance.as_graph() {
            Some(graph) => graph.fold_top_down(FxHashMap::default(), |mut acc, node| {
                if let Some(definition) = lexicon.get(&node.label) {
                    acc.insert(node.name.clone(), definition.to_string());
                }
                acc
            }),
            None => FxHashMap::default(),
        })
        .collect()
}
