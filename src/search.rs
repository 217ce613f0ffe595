//! Search collaborator boundary.
//!
//! The matching algorithm that decides which instances and tokens satisfy
//! a filter lives outside this crate. Its whole contract here is
//! [`SearchEngine::apply`]: take a layout and a filter list, return a new
//! layout. The service layer persists the result with lineage to the base
//! (see [`crate::store`]).

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::layout::Layout;

/// One search filter, as configured by the client. Pure value, no identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub slice_name: String,
    pub outer_layer_id: String,
    pub inner_layer_ids: Vec<String>,
    pub inner_layer_inputs: Vec<Value>,
    pub color: String,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("search failed: {message}")]
    #[diagnostic(code(parseboard::search::failed))]
    Failed { message: String },
}

/// The external search/filter collaborator.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Apply `filters` to `layout`, producing a new layout. The input
    /// layout is never mutated.
    async fn apply(&self, layout: &Layout, filters: &[SearchFilter])
    -> Result<Layout, SearchError>;
}
