use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::Context;
use tracing::{info, warn};

use crate::flow::{FetchError, FlowDirection, FlowSource, LookupPoll, PendingLookup, spawn_lookup};
use crate::graph::{GraphStore, NodeDetails, Revisions, apply_wallet_flows};
use crate::layout::{LayoutConfig, LayoutEngine};

mod export;
mod graph;
mod highlight;
mod render_utils;
mod ui;

use self::export::ExportState;
use self::graph::interaction::{Gesture, ViewTransform};
pub use self::render_utils::Theme;

const NOTICE_SECONDS: f64 = 4.0;

pub struct AppSettings {
    pub fetch_timeout: Duration,
    pub export_dir: PathBuf,
    pub initial_addresses: Vec<String>,
    pub theme: Theme,
}

pub struct WalletTraceApp {
    model: Box<ViewModel>,
}

struct ViewModel {
    source: Arc<dyn FlowSource>,
    fetch_timeout: Duration,
    store: GraphStore,
    layout: LayoutEngine,
    layout_revision: Option<u64>,
    transform: ViewTransform,
    gesture: Gesture,
    theme: Theme,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    details_cache: Option<DetailsCache>,
    address_input: String,
    flow_tab: FlowDirection,
    lookups: Vec<PendingLookup>,
    failed_lookups: Vec<FailedLookup>,
    export: ExportState,
    notice: Option<Notice>,
}

struct SearchMatchCache {
    query: String,
    topology_revision: u64,
    matches: Arc<HashSet<usize>>,
}

/// Details of the selected node as of `revisions`. Every slice feeds the
/// derivation: selection picks the address, records the rows, topology the
/// entity name.
struct DetailsCache {
    revisions: Revisions,
    details: Arc<NodeDetails>,
}

struct HighlightState {
    selected_index: Option<usize>,
    related_nodes: HashSet<usize>,
    related_edges: HashSet<usize>,
}

struct FailedLookup {
    address: String,
    error: FetchError,
}

struct Notice {
    text: String,
    is_error: bool,
    expires_at: f64,
}

impl WalletTraceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, source: Arc<dyn FlowSource>, settings: AppSettings) -> Self {
        settings.theme.apply(&cc.egui_ctx);

        let mut model = Box::new(ViewModel::new(
            source,
            settings.fetch_timeout,
            settings.export_dir,
            settings.theme,
        ));
        for address in &settings.initial_addresses {
            model.start_lookup(address);
        }

        Self { model }
    }
}

impl eframe::App for WalletTraceApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.poll_lookups();
        self.model.collect_screenshot(ctx);
        self.model.show(ctx);

        if !self.model.lookups.is_empty() || self.model.export.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl ViewModel {
    fn new(source: Arc<dyn FlowSource>, fetch_timeout: Duration, export_dir: PathBuf, theme: Theme) -> Self {
        Self {
            source,
            fetch_timeout,
            store: GraphStore::new(),
            layout: LayoutEngine::new(LayoutConfig::default()),
            layout_revision: None,
            transform: ViewTransform::default(),
            gesture: Gesture::Idle,
            theme,
            search: String::new(),
            search_match_cache: None,
            details_cache: None,
            address_input: String::new(),
            flow_tab: FlowDirection::Inflow,
            lookups: Vec::new(),
            failed_lookups: Vec::new(),
            export: ExportState::new(export_dir),
            notice: None,
        }
    }

    /// Selects `address` right away and fetches its flows in the background.
    /// Nodes appear once both directions have arrived.
    fn start_lookup(&mut self, address: &str) {
        let address = address.trim();
        if address.is_empty() {
            return;
        }

        self.set_selected(Some(address.to_owned()));
        if self.lookups.iter().any(|lookup| lookup.address == address) {
            return;
        }

        self.failed_lookups.retain(|failed| failed.address != address);
        self.lookups.push(spawn_lookup(
            Arc::clone(&self.source),
            address.to_owned(),
            self.fetch_timeout,
        ));
    }

    fn poll_lookups(&mut self) {
        if self.lookups.is_empty() {
            return;
        }

        let mut pending = Vec::with_capacity(self.lookups.len());
        for lookup in std::mem::take(&mut self.lookups) {
            match lookup.poll() {
                LookupPoll::Pending => pending.push(lookup),
                LookupPoll::Done(Ok(flows)) => {
                    let address = flows.address.clone();
                    let inflows = flows.inflows.len();
                    let outflows = flows.outflows.len();
                    let changes = apply_wallet_flows(&mut self.store, flows);
                    let state = self.store.state();
                    info!(
                        %address,
                        inflows,
                        outflows,
                        new_topology = changes.topology,
                        nodes = state.node_count(),
                        edges = state.edge_count(),
                        "wallet lookup completed"
                    );
                }
                LookupPoll::Done(Err(error)) => {
                    warn!(address = %lookup.address, %error, "wallet lookup failed");
                    self.failed_lookups.push(FailedLookup {
                        address: lookup.address.clone(),
                        error,
                    });
                }
            }
        }
        self.lookups = pending;
    }

    fn retry_lookup(&mut self, index: usize) {
        if index >= self.failed_lookups.len() {
            return;
        }
        let failed = self.failed_lookups.remove(index);
        self.start_lookup(&failed.address);
    }

    fn dismiss_failed_lookup(&mut self, index: usize) {
        if index < self.failed_lookups.len() {
            self.failed_lookups.remove(index);
        }
    }

    /// Empties the graph. Lookups still in flight are abandoned so they cannot
    /// repopulate it.
    fn clear_graph(&mut self) {
        let abandoned = self.lookups.len();
        self.lookups.clear();
        self.failed_lookups.clear();
        self.store.clear();
        self.layout.stop();
        self.gesture = Gesture::Idle;
        info!(abandoned, "graph cleared");
    }

    fn set_selected(&mut self, selected: Option<String>) {
        if self.store.state().selected_node() == selected.as_deref() {
            return;
        }
        self.store.set_selected_node(selected);
    }

    fn set_theme(&mut self, ctx: &Context, theme: Theme) {
        self.theme = theme;
        theme.apply(ctx);
    }

    fn notify(&mut self, ctx: &Context, text: impl Into<String>, is_error: bool) {
        let now = ctx.input(|input| input.time);
        self.notice = Some(Notice {
            text: text.into(),
            is_error,
            expires_at: now + NOTICE_SECONDS,
        });
        ctx.request_repaint_after(Duration::from_secs_f64(NOTICE_SECONDS));
    }
}
