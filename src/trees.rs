//! Dependency-annotated sentences and addressed tree materialization.
//!
//! A [`DepSentence`] is a flat, head-pointer-based annotation: an ordered
//! sequence of word entries, each with a 1-based `head` pointer (0 meaning
//! "no head") and an edge `label`. [`from_sentence`] converts it into a
//! nested [`AddressedGraph`] suitable for rendering: every node is named by
//! its dot-separated path of child indices from the root, the root's path
//! being empty.
//!
//! The textual serialization ([`parse_conll`]) is a tab-separated
//! one-word-per-line block format with `#key:value` attribute header lines
//! and blank-line sentence boundaries.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{AddressedGraph, GraphNode};

/// Edge label marking the root entry of an annotated sentence.
pub const ROOT_EDGE_LABEL: &str = "ROOT";

/// Placeholder in a node fragment that is substituted by the word's
/// lexical label.
pub const LEX_PLACEHOLDER: &str = "--LEX--";

/// Separator between child indices in a node address.
pub const ADDRESS_SEPARATOR: char = '.';

/// One word entry of a dependency-annotated sentence.
///
/// Only `fragment`, `lexlabel`, `head` and `label` drive tree building;
/// the remaining columns of the serialization are carried for
/// completeness and default to empty when a structured input omits them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepEntry {
    pub token: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(default)]
    pub pos_tag: String,
    #[serde(default)]
    pub ner_tag: String,
    /// Node payload; may contain [`LEX_PLACEHOLDER`].
    pub fragment: String,
    #[serde(default)]
    pub lexlabel: String,
    #[serde(default)]
    pub typ: String,
    /// 1-based position of this word's head; 0 means no head.
    pub head: u32,
    /// Edge label connecting this word to its head.
    pub label: String,
    #[serde(default)]
    pub aligned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl DepEntry {
    /// The node label after lexical-label substitution.
    #[must_use]
    pub fn resolved_label(&self) -> String {
        self.fragment.replace(LEX_PLACEHOLDER, &self.lexlabel)
    }
}

/// An ordered sequence of word entries plus sentence-level attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DepSentence {
    pub entries: Vec<DepEntry>,
    #[serde(default)]
    pub attributes: FxHashMap<String, String>,
}

impl DepSentence {
    pub fn new(entries: Vec<DepEntry>) -> Self {
        Self {
            entries,
            attributes: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tree materialization failures.
#[derive(Debug, Error, Diagnostic)]
pub enum TreeError {
    /// No entry with `label == "ROOT"` and `head == 0`. Downstream
    /// rendering assumes a single root, so this aborts the conversion.
    #[error("no root entry found in sentence of {sentence_len} words")]
    #[diagnostic(
        code(parseboard::trees::no_root),
        help("Exactly one entry must carry the ROOT edge label with head 0.")
    )]
    NoRootFound { sentence_len: usize },

    /// More than one entry qualifies as root.
    #[error("ambiguous root: entries {positions:?} all carry the ROOT label with head 0")]
    #[diagnostic(
        code(parseboard::trees::ambiguous_root),
        help("The annotation is malformed; a sentence has a single root.")
    )]
    AmbiguousRoot { positions: Vec<usize> },
}

/// Textual serialization failures.
#[derive(Debug, Error, Diagnostic)]
pub enum ConllError {
    #[error("line {line}: expected 12 or 13 tab-separated fields, found {found}")]
    #[diagnostic(code(parseboard::trees::conll_fields))]
    BadFieldCount { line: usize, found: usize },

    #[error("line {line}: head column is not an integer: {value:?}")]
    #[diagnostic(code(parseboard::trees::conll_head))]
    BadHead { line: usize, value: String },

    #[error("line {line}: malformed attribute header (expected #key:value)")]
    #[diagnostic(code(parseboard::trees::conll_attribute))]
    BadAttribute { line: usize },
}

/// Materialize an addressed tree from a dependency-annotated sentence.
///
/// The unique entry with the ROOT label and head 0 becomes the root with
/// the empty address; recursively, the k-th child (0-based, in entry order)
/// of a node at address `a` gets address `k` when `a` is empty, else
/// `a.k`. Addresses are unique within one tree, and address order equals
/// document order.
///
/// # Errors
///
/// [`TreeError::NoRootFound`] when no entry qualifies as root,
/// [`TreeError::AmbiguousRoot`] when more than one does.
///
/// # Examples
///
/// ```rust
/// use parseboard::trees::{from_sentence, DepSentence};
///
/// // Two words in the textual serialization: word 2 is the root,
/// // word 1 its child.
/// let text = "1\tboy\t_\t_\t_\t_\tboy\t_\t_\t2\tARG0\tTrue\n\
///             2\twant\t_\t_\t_\t_\twant-01\t_\t_\t0\tROOT\tTrue\n";
/// let sentence = parseboard::trees::parse_conll(text).unwrap().remove(0);
/// let tree = from_sentence(&sentence).unwrap();
/// assert_eq!(tree.root.name, "");
/// assert_eq!(tree.root.children[0].name, "0");
/// ```
pub fn from_sentence(sentence: &DepSentence) -> Result<AddressedGraph, TreeError> {
    let roots: Vec<usize> = sentence
        .entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.label == ROOT_EDGE_LABEL && e.head == 0)
        .map(|(i, _)| i)
        .collect();

    match roots.as_slice() {
        [] => Err(TreeError::NoRootFound {
            sentence_len: sentence.len(),
        }),
        [root_idx] => Ok(AddressedGraph::new(build_node(
            sentence, *root_idx, "", None,
        ))),
        many => Err(TreeError::AmbiguousRoot {
            positions: many.iter().map(|i| i + 1).collect(),
        }),
    }
}

fn build_node(
    sentence: &DepSentence,
    idx: usize,
    address: &str,
    incoming_edge: Option<&str>,
) -> GraphNode {
    let entry = &sentence.entries[idx];
    let mut node = GraphNode {
        name: address.to_string(),
        label: entry.resolved_label(),
        incoming_edge: incoming_edge.map(str::to_string),
        children: Vec::new(),
    };

    let entry_id = (idx + 1) as u32;
    let mut next_child = 0usize;
    for (child_idx, child) in sentence.entries.iter().enumerate() {
        if child.head != entry_id {
            continue;
        }
        let child_address = if address.is_empty() {
            next_child.to_string()
        } else {
            format!("{address}{ADDRESS_SEPARATOR}{next_child}")
        };
        next_child += 1;
        node.children
            .push(build_node(sentence, child_idx, &child_address, Some(&child.label)));
    }
    node
}

/// Parse the textual block serialization into sentences.
///
/// Each block: optional `#key:value` attribute lines, then one
/// tab-separated line per word (id, token, replacement, lemma, pos, ner,
/// fragment, lexlabel, type, head, edge label, aligned, optional token
/// range). Blank lines terminate a sentence.
pub fn parse_conll(text: &str) -> Result<Vec<DepSentence>, ConllError> {
    let mut sentences = Vec::new();
    let mut entries: Vec<DepEntry> = Vec::new();
    let mut attributes: FxHashMap<String, String> = FxHashMap::default();
    let mut in_header = true;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim_end_matches('\n');
        if line.trim().is_empty() {
            if !entries.is_empty() {
                sentences.push(DepSentence {
                    entries: std::mem::take(&mut entries),
                    attributes: std::mem::take(&mut attributes),
                });
            }
            in_header = true;
            continue;
        }

        if in_header && line.starts_with('#') {
            let (key, val) = line[1..]
                .split_once(':')
                .ok_or(ConllError::BadAttribute { line: line_no + 1 })?;
            attributes.insert(key.to_string(), val.to_string());
            continue;
        }
        in_header = false;

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 12 && fields.len() != 13 {
            return Err(ConllError::BadFieldCount {
                line: line_no + 1,
                found: fields.len(),
            });
        }
        let head: u32 = fields[9].parse().map_err(|_| ConllError::BadHead {
            line: line_no + 1,
            value: fields[9].to_string(),
        })?;
        entries.push(DepEntry {
            token: fields[1].to_string(),
            replacement: fields[2].to_string(),
            lemma: fields[3].to_string(),
            pos_tag: fields[4].to_string(),
            ner_tag: fields[5].to_string(),
            fragment: fields[6].to_string(),
            lexlabel: fields[7].to_string(),
            typ: fields[8].to_string(),
            head,
            label: fields[10].to_string(),
            aligned: matches!(fields[11], "True" | "true" | "1"),
            range: fields.get(12).map(|r| r.to_string()),
        });
    }

    if !entries.is_empty() {
        sentences.push(DepSentence {
            entries,
            attributes,
        });
    }
    Ok(sentences)
}
