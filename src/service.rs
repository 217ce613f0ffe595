//! Request-level orchestration.
//!
//! These functions are what the transport layer calls into, one logical
//! operation per inbound client event: connect, instance request, search,
//! clear-search, parse ingestion. Each operates on an explicitly
//! constructed [`AppContext`] — the standard layout, the lexicon, and the
//! store are built once at startup and passed in; nothing here mutates
//! process-wide state.
//!
//! Per-session ordering is the transport's concern; every operation here
//! works on its own deep copy of a layout, so cross-session operations
//! need no ordering at all.

use miette::Diagnostic;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::corpus::{self, CorpusError};
use crate::ingest::{self, IngestError, ParseSubmission};
use crate::layout::Layout;
use crate::lexicon::Lexicon;
use crate::render::{ClientEvent, RenderEmitter, layout_headers, render_instance};
use crate::search::{SearchEngine, SearchError, SearchFilter};
use crate::store::{LayoutStore, StoreError, StoredLayoutRecord};

#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchError),
}

/// Everything a request handler needs, constructed once at startup.
pub struct AppContext {
    /// Served when a session carries no (or no resolvable) layout id.
    pub standard_layout: Layout,
    /// Term-definition lookup for graph mouseover texts.
    pub lexicon: Option<Lexicon>,
    pub store: LayoutStore,
}

impl AppContext {
    pub fn new(standard_layout: Layout, lexicon: Option<Lexicon>, store: LayoutStore) -> Self {
        Self {
            standard_layout,
            lexicon,
            store,
        }
    }
}

/// Outcome of a clear-search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClearSearch {
    /// The session had no resolvable layout; the client routes to the
    /// standard view.
    NoLayout,
    /// The current layout is not derived from anything; nothing to clear.
    NoBase,
    /// Route back to the base layout.
    Base { id: String, corpus_size: usize },
}

/// Validate a parse submission, assemble its corpus, and store the
/// resulting layout as a new lineage root. Returns the stored id.
pub async fn ingest_parse(
    ctx: &AppContext,
    submission: &ParseSubmission,
) -> Result<String, ServiceError> {
    let (bytes, correlation_id) = ingest::validate_submission(submission)?;
    let entries = ingest::decode_entries(&bytes)?;
    let assembled = corpus::assemble(&entries, ctx.lexicon.as_ref())?;
    let layout = Layout::from_corpus(assembled);
    let id = ctx.store.create_root(&layout).await?;
    info!(correlation_id, layout_id = %id, "parse ingested");
    Ok(id)
}

/// Serve a freshly connected session: the layout grid headers, the corpus
/// length, the node-name visibility flag, then instance 0.
///
/// Failures are caught here, logged, and reported to the client as one
/// `server_error` event; payloads already sent stand.
pub async fn handle_connect(ctx: &AppContext, layout_id: Option<&str>, emitter: &RenderEmitter) {
    let layout = match resolve_layout(ctx, layout_id).await {
        Ok(layout) => layout,
        Err(err) => {
            error!(error = %err, "connect failed before rendering");
            if emitter.emit(ClientEvent::ServerError).is_err() {
                error!("client transport gone while reporting connect failure");
            }
            return;
        }
    };

    let header_events = [
        ClientEvent::SetLayout(layout_headers(&layout)),
        ClientEvent::SetCorpusLength(layout.corpus_size),
        ClientEvent::SetShowNodeNames {
            show_node_names: false,
        },
    ];
    for event in header_events {
        if emitter.emit(event).is_err() {
            error!("client transport gone during connect");
            return;
        }
    }
    render_instance(&layout, 0, emitter);
}

/// Serve one instance of the session's current layout.
pub async fn handle_instance_request(
    ctx: &AppContext,
    layout_id: Option<&str>,
    index: usize,
    emitter: &RenderEmitter,
) {
    match resolve_layout(ctx, layout_id).await {
        Ok(layout) => render_instance(&layout, index, emitter),
        Err(err) => {
            error!(error = %err, index, "instance request failed before rendering");
            if emitter.emit(ClientEvent::ServerError).is_err() {
                error!("client transport gone while reporting request failure");
            }
        }
    }
}

/// Apply search filters to the session's base layout and persist the
/// result with lineage. Returns the new record's id so the client can
/// navigate to it.
///
/// The base is always the original parse result: a session sitting on a
/// derived layout searches that layout's base, not the filtered view.
pub async fn handle_search(
    ctx: &AppContext,
    engine: &dyn SearchEngine,
    layout_id: Option<&str>,
    filters: &[SearchFilter],
) -> Result<String, ServiceError> {
    let current = fetch_record(ctx, layout_id).await?;

    let (base_layout, current_for_derive) = match &current {
        None => (ctx.standard_layout.clone(), None),
        Some(record) => match &record.based_on {
            None => (record.layout()?, Some(record)),
            Some(parent_id) => match ctx.store.fetch(parent_id).await? {
                Some(parent) => (parent.layout()?, Some(record)),
                None => {
                    warn!(
                        id = %record.id,
                        parent_id = %parent_id,
                        "base layout vanished, searching the standard layout"
                    );
                    (ctx.standard_layout.clone(), None)
                }
            },
        },
    };

    let searched = engine.apply(&base_layout, filters).await?;
    let id = ctx.store.derive(current_for_derive, &searched, filters).await?;
    Ok(id)
}

/// Resolve the base layout the session's current layout derives from.
pub async fn handle_clear_search(
    ctx: &AppContext,
    layout_id: Option<&str>,
) -> Result<ClearSearch, ServiceError> {
    let Some(record) = fetch_record(ctx, layout_id).await? else {
        info!("no layout found for session on clearing search");
        return Ok(ClearSearch::NoLayout);
    };
    let Some(parent_id) = &record.based_on else {
        info!(id = %record.id, "layout has no base, nothing to clear");
        return Ok(ClearSearch::NoBase);
    };
    match ctx.store.fetch(parent_id).await? {
        Some(parent) => {
            let corpus_size = parent.layout()?.corpus_size;
            Ok(ClearSearch::Base {
                id: parent.id,
                corpus_size,
            })
        }
        None => {
            warn!(id = %record.id, parent_id = %parent_id, "base layout vanished");
            Ok(ClearSearch::NoLayout)
        }
    }
}

/// Look up (and touch) the session's stored record, treating an absent or
/// empty id as "no record".
async fn fetch_record(
    ctx: &AppContext,
    layout_id: Option<&str>,
) -> Result<Option<StoredLayoutRecord>, ServiceError> {
    match layout_id.filter(|id| !id.is_empty()) {
        Some(id) => Ok(ctx.store.fetch(id).await?),
        None => {
            info!("no layout id provided");
            Ok(None)
        }
    }
}

/// The session's current layout, falling back to the standard layout when
/// the id resolves to nothing or the stored bytes do not deserialize.
async fn resolve_layout(ctx: &AppContext, layout_id: Option<&str>) -> Result<Layout, ServiceError> {
    if let Some(record) = fetch_record(ctx, layout_id).await? {
        match record.layout() {
            Ok(layout) => return Ok(layout),
            Err(err) => {
                warn!(id = %record.id, error = %err, "stored layout failed to deserialize");
            }
        }
    }
    info!("using standard layout");
    Ok(ctx.standard_layout.clone())
}
