//! 2-D arrangement of corpus slices for display.
//!
//! A [`Layout`] is what gets rendered, persisted, and searched over: an
//! ordered grid of rows of [`CorpusSlice`]s plus the shared corpus size
//! and the linker list. Layouts own their slices; deriving a new layout
//! from a stored one is a deep value copy, so two independently evolving
//! layouts never share mutable state.

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, CorpusSlice, Linker};
use crate::formats::VisualizationType;

/// Slices per row in the default arrangement.
const SLICES_PER_ROW: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Grid of slices, rendered row-major.
    pub rows: Vec<Vec<CorpusSlice>>,
    /// Shared instance count across all slices and linkers.
    pub corpus_size: usize,
    pub linkers: Vec<Linker>,
}

impl Layout {
    /// Arrange an assembled corpus into the default grid: slices packed
    /// into rows of at most two, in insertion order.
    #[must_use]
    pub fn from_corpus(corpus: Corpus) -> Self {
        let corpus_size = corpus.instance_count();
        let Corpus {
            slices, linkers, ..
        } = corpus;

        let mut rows: Vec<Vec<CorpusSlice>> = Vec::new();
        for (_, slice) in slices {
            match rows.last_mut() {
                Some(row) if row.len() < SLICES_PER_ROW => row.push(slice),
                _ => rows.push(vec![slice]),
            }
        }
        Self {
            rows,
            corpus_size,
            linkers,
        }
    }

    /// All slices in row-major render order.
    pub fn slices(&self) -> impl Iterator<Item = &CorpusSlice> {
        self.rows.iter().flatten()
    }

    /// Visualization type of a slice by name, if the layout contains it.
    /// Linker payload rewriting branches on this.
    #[must_use]
    pub fn visualization_type_for(&self, slice_name: &str) -> Option<VisualizationType> {
        self.slices()
            .find(|slice| slice.name == slice_name)
            .map(|slice| slice.visualization_type)
    }
}
