//! End-to-end session walkthrough: ingest a small parse, connect a
//! client, run a search, clear it again.
//!
//! ```bash
//! cargo run --example demo_session
//! ```

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use parseboard::ingest::ParseSubmission;
use parseboard::layout::Layout;
use parseboard::lexicon::Lexicon;
use parseboard::render::RenderEmitter;
use parseboard::search::{SearchEngine, SearchError, SearchFilter};
use parseboard::service::{
    AppContext, handle_clear_search, handle_connect, handle_search, ingest_parse,
};
use parseboard::store::{LayoutStore, StoreConfig};

/// Stand-in for the real search collaborator: passes the layout through.
struct PassthroughSearch;

#[async_trait]
impl SearchEngine for PassthroughSearch {
    async fn apply(
        &self,
        layout: &Layout,
        filters: &[SearchFilter],
    ) -> Result<Layout, SearchError> {
        info!(filters = filters.len(), "applying search filters");
        Ok(layout.clone())
    }
}

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,parseboard=debug"))
        .expect("valid default filter");
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let store = LayoutStore::connect(StoreConfig::new(Some("sqlite::memory:".into())))
        .await
        .map_err(|e| miette::miette!("{e}"))?;
    let lexicon = Lexicon::from_entries([("want-01", "want: to desire or wish for")]);
    let ctx = AppContext::new(Layout::default(), Some(lexicon), store);

    // A two-slice parse: a token sequence and the matching AM tree.
    let entries = json!([
        {
            "name": "sentence",
            "instances": [["the", "boy", "wants", "to", "go"]]
        },
        {
            "name": "amtree",
            "format": "amtree",
            "instances": [[
                {"token": "boy", "fragment": "boy", "head": 2, "label": "ARG0"},
                {"token": "wants", "fragment": "want-01", "head": 0, "label": "ROOT"},
                {"token": "go", "fragment": "go-02", "head": 2, "label": "ARG1"}
            ]]
        }
    ]);
    let submission = ParseSubmission {
        parse_data: Some(BASE64.encode(entries.to_string())),
        id: Some("demo".into()),
    };
    let root_id = ingest_parse(&ctx, &submission)
        .await
        .map_err(|e| miette::miette!("{e}"))?;
    info!(%root_id, "parse stored");

    // Connect a client session and drain what it would receive.
    let (emitter, events) = RenderEmitter::channel();
    handle_connect(&ctx, Some(&root_id), &emitter).await;
    for event in events.drain() {
        println!("-> {}", serde_json::to_string(&event).unwrap());
    }

    // Search, then route back to the base.
    let filters = vec![SearchFilter {
        slice_name: "sentence".into(),
        outer_layer_id: "tokens".into(),
        inner_layer_ids: vec!["content".into()],
        inner_layer_inputs: vec![json!("boy")],
        color: "orange".into(),
    }];
    let derived_id = handle_search(&ctx, &PassthroughSearch, Some(&root_id), &filters)
        .await
        .map_err(|e| miette::miette!("{e}"))?;
    info!(%derived_id, "search result stored");

    let outcome = handle_clear_search(&ctx, Some(&derived_id))
        .await
        .map_err(|e| miette::miette!("{e}"))?;
    info!(?outcome, "cleared search");

    Ok(())
}
