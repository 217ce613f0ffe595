#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;

use parseboard::corpus::{RawEntry, assemble};
use parseboard::layout::Layout;
use parseboard::search::{SearchEngine, SearchError, SearchFilter};
use parseboard::store::{LayoutStore, StoreConfig};

/// A `data` entry with string-format token instances.
pub fn string_entry(name: &str, instances: &[&[&str]]) -> RawEntry {
    RawEntry {
        name: Some(name.to_string()),
        instances: Some(instances.iter().map(|tokens| json!(tokens)).collect()),
        ..RawEntry::default()
    }
}

/// A single-slice layout with the given token instances.
pub fn string_layout(name: &str, instances: &[&[&str]]) -> Layout {
    let corpus = assemble(&[string_entry(name, instances)], None).expect("assemble fixture");
    Layout::from_corpus(corpus)
}

/// An in-memory store with the given config's policies.
pub async fn memory_store(config: StoreConfig) -> LayoutStore {
    let config = StoreConfig {
        database_url: "sqlite::memory:".to_string(),
        ..config
    };
    LayoutStore::connect(config).await.expect("connect store")
}

pub fn filter_for(slice_name: &str) -> SearchFilter {
    SearchFilter {
        slice_name: slice_name.to_string(),
        outer_layer_id: "tokens".to_string(),
        inner_layer_ids: vec!["content".to_string()],
        inner_layer_inputs: vec![json!("a")],
        color: "orange".to_string(),
    }
}

/// Search collaborator stub: returns the input layout unchanged.
pub struct IdentitySearch;

#[async_trait]
impl SearchEngine for IdentitySearch {
    async fn apply(
        &self,
        layout: &Layout,
        _filters: &[SearchFilter],
    ) -> Result<Layout, SearchError> {
        Ok(layout.clone())
    }
}

/// Search collaborator stub: keeps only the first instance's worth of
/// corpus size, standing in for a real filtering pass.
pub struct TruncatingSearch;

#[async_trait]
impl SearchEngine for TruncatingSearch {
    async fn apply(
        &self,
        layout: &Layout,
        _filters: &[SearchFilter],
    ) -> Result<Layout, SearchError> {
        let mut filtered = layout.clone();
        filtered.corpus_size = filtered.corpus_size.min(1);
        Ok(filtered)
    }
}
