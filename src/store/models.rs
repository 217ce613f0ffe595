//! Persistence models for stored layouts.
//!
//! Explicit serde-friendly shapes decoupled from the in-memory types, so
//! the store code stays lean and declarative and the serialized format
//! can evolve independently of [`Layout`]. This module performs no I/O;
//! it is pure data transformation and (de)serialization glue.

use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusSlice, Linker};
use crate::layout::Layout;
use crate::search::SearchFilter;

/// Persisted shape of a [`Layout`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedLayout {
    pub corpus_size: usize,
    #[serde(default)]
    pub rows: Vec<Vec<CorpusSlice>>,
    #[serde(default)]
    pub linkers: Vec<Linker>,
}

/// Persisted shape of a search filter list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistedSearchFilters(pub Vec<SearchFilter>);

impl From<&Layout> for PersistedLayout {
    fn from(layout: &Layout) -> Self {
        PersistedLayout {
            corpus_size: layout.corpus_size,
            rows: layout.rows.clone(),
            linkers: layout.linkers.clone(),
        }
    }
}

impl From<PersistedLayout> for Layout {
    fn from(persisted: PersistedLayout) -> Self {
        Layout {
            rows: persisted.rows,
            corpus_size: persisted.corpus_size,
            linkers: persisted.linkers,
        }
    }
}

impl From<&[SearchFilter]> for PersistedSearchFilters {
    fn from(filters: &[SearchFilter]) -> Self {
        PersistedSearchFilters(filters.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;

    #[test]
    fn layout_roundtrips_through_persisted_shape() {
        let layout = Layout::from_corpus(Corpus::new());
        let persisted = PersistedLayout::from(&layout);
        let json = serde_json::to_string(&persisted).unwrap();
        let back: PersistedLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(Layout::from(back), layout);
    }
}
