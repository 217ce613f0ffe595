//! Raw instance formats and their conversion to canonical shapes.
//!
//! Upstream parsers hand the corpus assembler heterogeneous per-instance
//! data: plain strings, token lists, tables, dependency-annotated
//! sentences, already-addressed graphs. Each recognized [`Format`]
//! converts its raw [`serde_json::Value`] instances into one of the four
//! canonical [`Instance`] shapes and reports the [`VisualizationType`]
//! the converted data renders as.
//!
//! Dispatch is a closed enum with exhaustive matches; there is no open
//! reader registry.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::graph::AddressedGraph;
use crate::trees::{self, ConllError, DepEntry, DepSentence, TreeError};

/// How a slice's instances are drawn. Determines both the shape of the
/// instance data and which render payload applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    String,
    Table,
    Tree,
    Graph,
}

impl std::fmt::Display for VisualizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Table => write!(f, "table"),
            Self::Tree => write!(f, "tree"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// One converted, validated instance of a corpus slice.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Instance {
    /// Token sequence, drawn as a single-column table.
    Tokens(Vec<String>),
    /// 2-D table of cells.
    Table(Vec<Vec<String>>),
    /// Addressed tree or graph.
    Graph(AddressedGraph),
}

impl Instance {
    /// Tokens of a string-shaped instance, if that is what this is.
    #[must_use]
    pub fn as_tokens(&self) -> Option<&[String]> {
        match self {
            Instance::Tokens(tokens) => Some(tokens),
            _ => None,
        }
    }

    /// The addressed graph of a tree/graph-shaped instance, if any.
    #[must_use]
    pub fn as_graph(&self) -> Option<&AddressedGraph> {
        match self {
            Instance::Graph(graph) => Some(graph),
            _ => None,
        }
    }
}

/// Conversion failures. Any of these aborts the enclosing corpus assembly.
#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    #[error("unknown format identifier {name:?}")]
    #[diagnostic(
        code(parseboard::formats::unknown),
        help("Recognized formats: string, token, tokenized_string, string_table, amtree, amtree_string, graph, graph_string.")
    )]
    UnknownFormat { name: String },

    #[error("malformed {format} instance at index {index}: expected {expected}")]
    #[diagnostic(code(parseboard::formats::malformed_instance))]
    MalformedInstance {
        format: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Conll(#[from] ConllError),
}

/// Recognized raw-instance formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Raw is already a token list.
    String,
    /// Raw is a single token, wrapped into a one-token list.
    Token,
    /// Raw is an unsplit string, split on whitespace.
    TokenizedString,
    /// Raw is a 2-D table of strings.
    StringTable,
    /// Raw is a structured dependency annotation, built into an addressed tree.
    AmTree,
    /// Raw is the textual serialization of a dependency annotation.
    AmTreeString,
    /// Raw is an already-addressed graph.
    Graph,
    /// Raw is the textual (JSON) form of an addressed graph.
    GraphString,
}

impl Format {
    /// Resolve a format identifier string.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownFormat`] for unrecognized identifiers.
    pub fn parse(name: &str) -> Result<Self, FormatError> {
        match name {
            "string" => Ok(Self::String),
            "token" => Ok(Self::Token),
            "tokenized_string" => Ok(Self::TokenizedString),
            "string_table" => Ok(Self::StringTable),
            "amtree" => Ok(Self::AmTree),
            "amtree_string" => Ok(Self::AmTreeString),
            "graph" => Ok(Self::Graph),
            "graph_string" => Ok(Self::GraphString),
            other => Err(FormatError::UnknownFormat {
                name: other.to_string(),
            }),
        }
    }

    /// Identifier string for this format.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Token => "token",
            Self::TokenizedString => "tokenized_string",
            Self::StringTable => "string_table",
            Self::AmTree => "amtree",
            Self::AmTreeString => "amtree_string",
            Self::Graph => "graph",
            Self::GraphString => "graph_string",
        }
    }

    /// Visualization type of instances converted through this format.
    #[must_use]
    pub fn visualization_type(&self) -> VisualizationType {
        match self {
            Self::String | Self::Token | Self::TokenizedString => VisualizationType::String,
            Self::StringTable => VisualizationType::Table,
            Self::AmTree | Self::AmTreeString => VisualizationType::Tree,
            Self::Graph | Self::GraphString => VisualizationType::Graph,
        }
    }

    /// Convert a whole instance sequence.
    pub fn convert_instances(&self, raw: &[Value]) -> Result<Vec<Instance>, FormatError> {
        raw.iter()
            .enumerate()
            .map(|(index, value)| self.convert_one(value, index))
            .collect()
    }

    /// Convert one instance; used directly when processing label
    /// alternatives, where each descriptor names its own format.
    pub fn convert_single_instance(&self, raw: &Value) -> Result<Instance, FormatError> {
        self.convert_one(raw, 0)
    }

    fn convert_one(&self, raw: &Value, index: usize) -> Result<Instance, FormatError> {
        match self {
            Self::String => Ok(Instance::Tokens(expect_string_list(
                raw,
                self.name(),
                index,
            )?)),
            Self::Token => {
                let token = expect_string(raw, self.name(), index)?;
                Ok(Instance::Tokens(vec![token.to_string()]))
            }
            Self::TokenizedString => {
                let text = expect_string(raw, self.name(), index)?;
                Ok(Instance::Tokens(
                    text.split_whitespace().map(str::to_string).collect(),
                ))
            }
            Self::StringTable => {
                let rows = raw.as_array().ok_or(FormatError::MalformedInstance {
                    format: self.name(),
                    index,
                    expected: "a 2-D table of strings",
                })?;
                let table = rows
                    .iter()
                    .map(|row| expect_string_list(row, self.name(), index))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Instance::Table(table))
            }
            Self::AmTree => {
                let sentence = decode_sentence(raw, index)?;
                Ok(Instance::Graph(trees::from_sentence(&sentence)?))
            }
            Self::AmTreeString => {
                let text = expect_string(raw, self.name(), index)?;
                let mut sentences = trees::parse_conll(text)?;
                if sentences.is_empty() {
                    return Err(FormatError::MalformedInstance {
                        format: self.name(),
                        index,
                        expected: "at least one annotated sentence",
                    });
                }
                Ok(Instance::Graph(trees::from_sentence(&sentences.remove(0))?))
            }
            Self::Graph => Ok(Instance::Graph(decode_graph(raw, self.name(), index)?)),
            Self::GraphString => {
                let text = expect_string(raw, self.name(), index)?;
                let value: Value =
                    serde_json::from_str(text).map_err(|_| FormatError::MalformedInstance {
                        format: self.name(),
                        index,
                        expected: "a JSON-encoded addressed graph",
                    })?;
                Ok(Instance::Graph(decode_graph(&value, self.name(), index)?))
            }
        }
    }
}

fn expect_string<'a>(
    raw: &'a Value,
    format: &'static str,
    index: usize,
) -> Result<&'a str, FormatError> {
    raw.as_str().ok_or(FormatError::MalformedInstance {
        format,
        index,
        expected: "a string",
    })
}

fn expect_string_list(
    raw: &Value,
    format: &'static str,
    index: usize,
) -> Result<Vec<String>, FormatError> {
    let items = raw.as_array().ok_or(FormatError::MalformedInstance {
        format,
        index,
        expected: "a list of strings",
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(FormatError::MalformedInstance {
                    format,
                    index,
                    expected: "a list of strings",
                })
        })
        .collect()
}

fn decode_sentence(raw: &Value, index: usize) -> Result<DepSentence, FormatError> {
    // Accept either a bare entry list or the full sentence object.
    if raw.is_array() {
        let entries: Vec<DepEntry> =
            serde_json::from_value(raw.clone()).map_err(|_| FormatError::MalformedInstance {
                format: "amtree",
                index,
                expected: "a list of word entries",
            })?;
        return Ok(DepSentence::new(entries));
    }
    serde_json::from_value(raw.clone()).map_err(|_| FormatError::MalformedInstance {
        format: "amtree",
        index,
        expected: "a dependency-annotated sentence",
    })
}

fn decode_graph(
    raw: &Value,
    format: &'static str,
    index: usize,
) -> Result<AddressedGraph, FormatError> {
    serde_json::from_value(raw.clone()).map_err(|_| FormatError::MalformedInstance {
        format,
        index,
        expected: "an addressed graph object",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            Format::parse("pixel_cloud"),
            Err(FormatError::UnknownFormat { name }) if name == "pixel_cloud"
        ));
    }

    #[test]
    fn string_format_passes_token_lists_through() {
        let converted = Format::String
            .convert_instances(&[json!(["a", "b"]), json!(["c"])])
            .unwrap();
        assert_eq!(converted[0], Instance::Tokens(vec!["a".into(), "b".into()]));
        assert_eq!(converted[1], Instance::Tokens(vec!["c".into()]));
    }

    #[test]
    fn token_format_wraps_single_tokens() {
        let converted = Format::Token.convert_single_instance(&json!("boy")).unwrap();
        assert_eq!(converted, Instance::Tokens(vec!["boy".into()]));
    }

    #[test]
    fn tokenized_string_splits_on_whitespace() {
        let converted = Format::TokenizedString
            .convert_single_instance(&json!("the  little\tboy"))
            .unwrap();
        assert_eq!(
            converted,
            Instance::Tokens(vec!["the".into(), "little".into(), "boy".into()])
        );
    }

    #[test]
    fn string_table_rejects_non_2d_rows() {
        let err = Format::StringTable
            .convert_instances(&[json!([["a", "b"], "not-a-row"])])
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::MalformedInstance {
                format: "string_table",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn amtree_builds_an_addressed_tree() {
        let raw = json!([
            {"token": "boy", "fragment": "boy", "head": 2, "label": "ARG0"},
            {"token": "want", "fragment": "want-01", "head": 0, "label": "ROOT"},
        ]);
        let converted = Format::AmTree.convert_single_instance(&raw).unwrap();
        let graph = converted.as_graph().unwrap();
        assert_eq!(graph.root.name, "");
        assert_eq!(graph.root.children[0].name, "0");
    }

    #[test]
    fn amtree_string_parses_textual_form_first() {
        let text = "1\tboy\t_\t_\t_\t_\tboy\t_\t_\t2\tARG0\tTrue\n\
                    2\twant\t_\t_\t_\t_\twant-01\t_\t_\t0\tROOT\tTrue\n";
        let converted = Format::AmTreeString
            .convert_single_instance(&json!(text))
            .unwrap();
        assert_eq!(converted.as_graph().unwrap().root.label, "want-01");
    }

    #[test]
    fn graph_format_decodes_wire_shape() {
        let raw = json!({
            "node_name": "n0",
            "node_label": "want-01",
            "child_nodes": [
                {"node_name": "n1", "node_label": "boy", "incoming_edge": "ARG0"}
            ]
        });
        let converted = Format::Graph.convert_single_instance(&raw).unwrap();
        let graph = converted.as_graph().unwrap();
        assert_eq!(graph.root.children[0].name, "n1");
        assert_eq!(
            Format::Graph.visualization_type(),
            VisualizationType::Graph
        );
    }

    #[test]
    fn graph_string_parses_embedded_json() {
        let text = r#"{"node_name": "n0", "node_label": "go-02"}"#;
        let converted = Format::GraphString
            .convert_single_instance(&json!(text))
            .unwrap();
        assert_eq!(converted.as_graph().unwrap().root.label, "go-02");
    }
}
