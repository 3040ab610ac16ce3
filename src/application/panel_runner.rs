// Panel runner - Drives pageload refreshes and publishes render requests
use crate::application::pageload_panel::{self, PanelServices, PanelState};
use crate::application::search_client::SearchClient;
use crate::domain::dashboard::Dashboard;
use crate::domain::page_stats::PageStats;
use crate::infrastructure::index_pattern::candidate_indices;
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tokio::task::{AbortHandle, JoinHandle};

/// What happens when a refresh arrives while another is still running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Every refresh runs to completion; whichever response lands last is kept
    #[default]
    LastResponseWins,
    /// A new refresh aborts the one in flight
    Supersede,
}

pub struct PanelRunner {
    dashboard: Arc<Dashboard>,
    client: Arc<dyn SearchClient>,
    policy: OverlapPolicy,
    state: RwLock<PanelState>,
    render_tx: watch::Sender<Option<PageStats>>,
    in_flight: Mutex<Option<AbortHandle>>,
    /// Refreshes currently waiting on the search backend
    fetching: AtomicUsize,
}

/// Counts one running fetch; released on completion or abort
struct FetchGuard<'a>(&'a AtomicUsize);

impl<'a> FetchGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PanelRunner {
    pub fn new(
        dashboard: Dashboard,
        client: Arc<dyn SearchClient>,
        policy: OverlapPolicy,
    ) -> anyhow::Result<Self> {
        let config = dashboard
            .pageload_panel()
            .cloned()
            .context("Dashboard has no pageload panel")?;
        let (render_tx, _) = watch::channel(None);

        Ok(Self {
            dashboard: Arc::new(dashboard),
            client,
            policy,
            state: RwLock::new(pageload_panel::initialize(config)),
            render_tx,
            in_flight: Mutex::new(None),
            fetching: AtomicUsize::new(0),
        })
    }

    /// Receives the stats of every render request
    pub fn subscribe(&self) -> watch::Receiver<Option<PageStats>> {
        self.render_tx.subscribe()
    }

    /// Current panel state; `loading` is set while any refresh awaits the backend
    pub async fn snapshot(&self) -> PanelState {
        let mut state = self.state.read().await.clone();
        state.loading = self.fetching.load(Ordering::SeqCst) > 0;
        state
    }

    /// Handle one refresh signal in a background task
    pub fn refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = in_flight.take() {
            if self.policy == OverlapPolicy::Supersede && !previous.is_finished() {
                tracing::debug!("Aborting superseded pageload refresh");
                previous.abort();
            }
        }

        let runner = Arc::clone(self);
        let handle = tokio::spawn(async move { runner.run_refresh().await });
        *in_flight = Some(handle.abort_handle());
        handle
    }

    async fn run_refresh(&self) {
        let services = self.resolve_services().await;

        let snapshot = self.state.read().await.clone();

        let fetching = (!services.indices.is_empty()).then(|| FetchGuard::enter(&self.fetching));
        let (next, render) = pageload_panel::on_refresh(snapshot, &services).await;
        drop(fetching);
        *self.state.write().await = next;

        if let Some(render) = render {
            tracing::info!("Pageload panel ready to render {} rows", render.stats.rows.len());
            self.render_tx.send_replace(Some(render.stats));
        }
    }

    async fn resolve_services(&self) -> PanelServices {
        let candidates = candidate_indices(
            &self.dashboard.index,
            self.dashboard.time_filter(),
            Utc::now(),
        );
        let indices = match self.client.existing_indices(&candidates).await {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!("Failed to resolve indices: {:#}", e);
                Vec::new()
            }
        };
        tracing::debug!("Resolved {} of {} candidate indices", indices.len(), candidates.len());

        PanelServices {
            indices,
            queries: Arc::new(self.dashboard.services.query.clone()),
            filters: Arc::new(self.dashboard.services.filter.clone()),
            client: self.client.clone(),
        }
    }
}
