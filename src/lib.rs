//! # Parseboard: Addressable Visualization Model for Linguistic Annotations
//!
//! Parseboard turns heterogeneous parser output (token sequences, tables,
//! dependency-annotated sentences, semantic graphs) into a uniform,
//! addressable visualization model, and serves derived (search-filtered)
//! views of that model while keeping provenance between a base result and
//! its derivations.
//!
//! ## Core Concepts
//!
//! - **Corpus**: named, index-aligned slices of per-instance data plus
//!   cross-slice linkers, reconciled to a shared instance count
//! - **Addressed trees/graphs**: node structures where every node is
//!   identified by a positional path from the root
//! - **Layout**: the 2-D arrangement of slices a client renders
//! - **Derivation store**: SQLite-backed persistence with lineage between
//!   a parse result and the searches filtered from it, plus
//!   timestamp-based expiration
//! - **Rendering dispatch**: projects one instance of a layout into the
//!   exact payload shapes a client visualizer consumes
//!
//! ## Quick Start
//!
//! ### Assembling a corpus and rendering an instance
//!
//! ```
//! use parseboard::corpus::{RawEntry, assemble};
//! use parseboard::layout::Layout;
//! use parseboard::render::{ClientEvent, RenderEmitter, render_instance};
//! use serde_json::json;
//!
//! let entry = RawEntry {
//!     name: Some("tokens".into()),
//!     instances: Some(vec![json!(["a", "b"]), json!(["c"])]),
//!     ..RawEntry::default()
//! };
//! let corpus = assemble(&[entry], None).unwrap();
//! assert_eq!(corpus.instance_count(), 2);
//!
//! let layout = Layout::from_corpus(corpus);
//! let (emitter, events) = RenderEmitter::channel();
//! render_instance(&layout, 0, &emitter);
//!
//! match events.recv().unwrap() {
//!     ClientEvent::SetTable(payload) => {
//!         assert_eq!(payload.table, vec![vec!["a".to_string()], vec!["b".to_string()]]);
//!     }
//!     other => panic!("expected a table payload, got {other:?}"),
//! }
//! ```
//!
//! ### Materializing an addressed tree
//!
//! ```
//! use parseboard::trees::{from_sentence, parse_conll};
//!
//! let text = "1\tboy\t_\t_\t_\t_\tboy\t_\t_\t2\tARG0\tTrue\n\
//!             2\twant\t_\t_\t_\t_\twant-01\t_\t_\t0\tROOT\tTrue\n";
//! let sentence = parse_conll(text).unwrap().remove(0);
//! let tree = from_sentence(&sentence).unwrap();
//! assert_eq!(tree.root.name, "");
//! assert_eq!(tree.root.children[0].name, "0");
//! ```
//!
//! ## Module Guide
//!
//! - [`formats`] - Raw instance formats and canonical instance shapes
//! - [`trees`] - Dependency annotations and addressed tree building
//! - [`graph`] - Addressed graph structure and pure traversal
//! - [`corpus`] - Corpus model and assembly from raw entries
//! - [`layout`] - 2-D slice arrangement
//! - [`store`] - Layout derivation store (lineage, expiration)
//! - [`render`] - Client payloads and instance rendering dispatch
//! - [`service`] - Request-level orchestration the transport calls into
//! - [`search`] - Search collaborator boundary
//! - [`ingest`] - Parse submission validation
//! - [`lexicon`] - Term-definition lookup

pub mod corpus;
pub mod formats;
pub mod graph;
pub mod ingest;
pub mod layout;
pub mod lexicon;
pub mod render;
pub mod search;
pub mod service;
pub mod store;
pub mod trees;
pub mod utils;
