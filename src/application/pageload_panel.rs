// Pageload panel - Per-page response time statistics
use crate::application::query_service::{FilterService, QueryService};
use crate::application::search_client::SearchClient;
use crate::domain::dashboard::{PageloadPanelConfig, QueryEntry};
use crate::domain::minigraph::{EVENT_GRAPH, MiniGraph, MiniGraphOverlay, RESPONSE_TIME_GRAPH};
use crate::domain::page_stats::{PageRow, PageStats};
use crate::domain::search::{
    BackendFilter, BackendQuery, SearchRequest, SearchResponse, StatisticalFacet,
};
use serde::Serialize;
use std::sync::Arc;

/// Numeric field the statistical facets run over
pub const STATS_FIELD: &str = "response_time";
/// Name of the facet covering every selected query
pub const GLOBAL_FACET: &str = "stats";

/// A configured page with its two mini graphs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelPage {
    pub path: String,
    pub query_id: u32,
    pub event_graph: Vec<MiniGraph>,
    pub response_time_graph: Vec<MiniGraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelState {
    pub config: PageloadPanelConfig,
    pub initialized: bool,
    pub loading: bool,
    pub pages: Vec<PanelPage>,
    /// Query ids resolved on the last refresh
    pub query_ids: Vec<u32>,
    /// Pretty printed body of the last request
    pub inspector: Option<String>,
    pub stats: Option<PageStats>,
}

/// Asks the host to redraw with fresh rows
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub stats: PageStats,
}

/// Collaborators the panel needs for one refresh
#[derive(Clone)]
pub struct PanelServices {
    /// Searchable indices resolved by the host
    pub indices: Vec<String>,
    pub queries: Arc<dyn QueryService>,
    pub filters: Arc<dyn FilterService>,
    pub client: Arc<dyn SearchClient>,
}

/// Set up the panel: derive the mini graphs of every configured page
pub fn initialize(config: PageloadPanelConfig) -> PanelState {
    let pages = config
        .pages
        .iter()
        .map(|page| {
            let overlay = MiniGraphOverlay::for_query(page.query_id);
            PanelPage {
                path: page.path.clone(),
                query_id: page.query_id,
                event_graph: vec![overlay.apply(&EVENT_GRAPH)],
                response_time_graph: vec![overlay.apply(&RESPONSE_TIME_GRAPH)],
            }
        })
        .collect();

    tracing::debug!("Initialized pageload panel with {} pages", config.pages.len());

    PanelState {
        config,
        initialized: true,
        loading: false,
        pages,
        query_ids: Vec::new(),
        inspector: None,
        stats: None,
    }
}

/// Facet name for a single query
pub fn facet_name(query: &QueryEntry) -> String {
    format!("{}_{}", GLOBAL_FACET, query.label())
}

/// Build the composite request: one facet over all queries, one per query
pub fn build_request(
    queries: &[QueryEntry],
    query_service: &dyn QueryService,
    filter: &BackendFilter,
) -> SearchRequest {
    let scoped = |query: BackendQuery| {
        BackendFilter::Query(Box::new(BackendQuery::filtered(query, filter.clone())))
    };

    let all = BackendQuery::any_of(queries.iter().map(|q| query_service.to_backend(q)).collect());
    let mut facets = vec![StatisticalFacet {
        name: GLOBAL_FACET.to_string(),
        field: STATS_FIELD.to_string(),
        facet_filter: scoped(all),
    }];

    for query in queries {
        facets.push(StatisticalFacet {
            name: facet_name(query),
            field: STATS_FIELD.to_string(),
            facet_filter: scoped(BackendQuery::any_of(vec![query_service.to_backend(query)])),
        });
    }

    SearchRequest { facets, size: 0 }
}

/// Handle a refresh signal.
///
/// Without a resolved index this is a no-op. A failed search leaves the
/// previous rows in place and requests no render.
pub async fn on_refresh(
    mut state: PanelState,
    services: &PanelServices,
) -> (PanelState, Option<RenderRequest>) {
    if !state.initialized {
        tracing::warn!("Refresh received before the pageload panel was initialized");
        return (state, None);
    }
    if services.indices.is_empty() {
        tracing::debug!("No indices resolved, skipping pageload refresh");
        return (state, None);
    }

    state.loading = true;
    let query_ids = services.queries.ids_by_mode(&state.config.queries);
    let queries = services.queries.query_objs(&query_ids);
    let filter = services.filters.bool_filter(&services.filters.ids());
    let request = build_request(&queries, services.queries.as_ref(), &filter);

    state.query_ids = query_ids;
    state.inspector = serde_json::to_string_pretty(&request.to_body()).ok();

    tracing::info!(
        "Requesting pageload stats for {} queries across {} indices",
        queries.len(),
        services.indices.len()
    );

    let result = services.client.search(&services.indices, &request).await;
    state.loading = false;

    match result {
        Ok(response) => {
            let stats = to_page_stats(&state, &queries, &response);
            state.stats = Some(stats.clone());
            (state, Some(RenderRequest { stats }))
        }
        Err(e) => {
            tracing::warn!("Pageload search failed: {:#}", e);
            (state, None)
        }
    }
}

fn to_page_stats(state: &PanelState, queries: &[QueryEntry], response: &SearchResponse) -> PageStats {
    let mode = state.config.mode;
    let value = response.facets.get(GLOBAL_FACET).and_then(|f| f.get(mode));
    let rows = queries
        .iter()
        .map(|query| {
            let value = response.facets.get(&facet_name(query)).and_then(|f| f.get(mode));
            if value.is_none() {
                tracing::debug!("No '{}' in response", facet_name(query));
            }
            PageRow::new(query, value)
        })
        .collect();

    PageStats { value, rows }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::dashboard_builder::build_dashboard;
    use crate::domain::dashboard::{Dashboard, QueryMode, QuerySelection};
    use crate::domain::params::DashboardParams;
    use crate::domain::search::FacetStats;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory search backend answering every facet with the same stats
    #[derive(Default)]
    pub(crate) struct FakeSearchClient {
        pub requests: Mutex<Vec<(Vec<String>, SearchRequest)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl SearchClient for FakeSearchClient {
        async fn existing_indices(&self, candidates: &[String]) -> anyhow::Result<Vec<String>> {
            Ok(candidates.to_vec())
        }

        async fn search(&self, indices: &[String], request: &SearchRequest) -> anyhow::Result<SearchResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((indices.to_vec(), request.clone()));
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            let facets = request
                .facets
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let stats = FacetStats {
                        count: Some(10.0),
                        mean: Some(i as f64),
                        ..Default::default()
                    };
                    (f.name.clone(), stats)
                })
                .collect();
            Ok(SearchResponse { facets })
        }
    }

    pub(crate) fn services(dashboard: &Dashboard, indices: Vec<String>, client: Arc<FakeSearchClient>) -> PanelServices {
        PanelServices {
            indices,
            queries: Arc::new(dashboard.services.query.clone()),
            filters: Arc::new(dashboard.services.filter.clone()),
            client,
        }
    }

    fn dashboard_state() -> (Dashboard, PanelState) {
        let dashboard = build_dashboard(&DashboardParams::default());
        let state = initialize(dashboard.pageload_panel().unwrap().clone());
        (dashboard, state)
    }

    #[test]
    fn test_initialize_builds_graphs_per_page() {
        let (_, state) = dashboard_state();

        assert!(state.initialized);
        assert!(!state.loading);
        assert_eq!(state.pages.len(), 5);
        for page in &state.pages {
            assert_eq!(page.event_graph.len(), 1);
            assert_eq!(page.event_graph[0].queries, QuerySelection::selected(vec![page.query_id]));
            assert_eq!(page.response_time_graph[0].queries.ids, vec![page.query_id]);
            assert_eq!(page.response_time_graph[0].value_field.as_deref(), Some(STATS_FIELD));
        }
    }

    #[test]
    fn test_request_has_one_facet_per_query_plus_global() {
        let dashboard = build_dashboard(&DashboardParams::default());
        let queries = dashboard.services.query.query_objs(&[1, 2, 3]);
        let filter = dashboard.services.filter.bool_filter(&dashboard.services.filter.ids());

        let request = build_request(&queries, &dashboard.services.query, &filter);

        assert_eq!(request.facets.len(), 4);
        assert_eq!(request.size, 0);
        assert_eq!(request.facets[0].name, GLOBAL_FACET);
        assert_eq!(request.facets[2].name, "stats_request.raw:\"/my/\"");
        assert!(request.facets.iter().all(|f| f.field == STATS_FIELD));

        match &request.facets[0].facet_filter {
            BackendFilter::Query(query) => match query.as_ref() {
                BackendQuery::Filtered { query, filter: f } => {
                    assert_eq!(f, &filter);
                    match query.as_ref() {
                        BackendQuery::Bool { should } => assert_eq!(should.len(), 3),
                        other => panic!("unexpected query {:?}", other),
                    }
                }
                other => panic!("unexpected query {:?}", other),
            },
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_without_indices_is_noop() {
        let (dashboard, mut state) = dashboard_state();
        state.stats = Some(PageStats {
            value: Some(1.0),
            rows: vec![],
        });
        let client = Arc::new(FakeSearchClient::default());

        let (next, render) = on_refresh(state.clone(), &services(&dashboard, vec![], client.clone())).await;

        assert!(render.is_none());
        assert_eq!(next, state);
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_builds_rows() {
        let (dashboard, state) = dashboard_state();
        let client = Arc::new(FakeSearchClient::default());
        let indices = vec!["logstash-2024.01.01".to_string()];

        let (next, render) = on_refresh(state, &services(&dashboard, indices.clone(), client.clone())).await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, indices);
        assert_eq!(requests[0].1.facets.len(), 7);

        let stats = render.unwrap().stats;
        assert_eq!(stats.value, Some(0.0));
        assert_eq!(stats.rows.len(), 6);
        assert_eq!(stats.rows[0].label, "all pages");
        assert_eq!(stats.rows[0].value, Some(1.0));
        assert_eq!(stats.rows[1].label, "request.raw:\"/\"");
        assert_eq!(stats.rows[1].sort_label, "request.raw:\"/\"");

        assert_eq!(next.stats, Some(stats));
        assert_eq!(next.query_ids, vec![0, 1, 2, 3, 4, 5]);
        assert!(!next.loading);
        assert!(next.inspector.unwrap().contains("\"facets\""));
    }

    #[tokio::test]
    async fn test_refresh_uses_selected_mode_and_count() {
        let (dashboard, mut state) = dashboard_state();
        state.config.queries = QuerySelection {
            mode: QueryMode::Selected,
            ids: vec![2, 4],
        };
        state.config.mode = crate::domain::search::StatMode::Count;
        let client = Arc::new(FakeSearchClient::default());

        let (_, render) = on_refresh(state, &services(&dashboard, vec!["web".to_string()], client.clone())).await;

        let stats = render.unwrap().stats;
        assert_eq!(stats.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 4]);
        assert!(stats.rows.iter().all(|r| r.value == Some(10.0)));
        assert_eq!(client.requests.lock().unwrap()[0].1.facets.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_rows() {
        let (dashboard, mut state) = dashboard_state();
        let previous = PageStats {
            value: Some(3.0),
            rows: vec![],
        };
        state.stats = Some(previous.clone());
        let client = Arc::new(FakeSearchClient {
            fail: true,
            ..Default::default()
        });

        let (next, render) = on_refresh(state, &services(&dashboard, vec!["web".to_string()], client)).await;

        assert!(render.is_none());
        assert_eq!(next.stats, Some(previous));
        assert!(!next.loading);
    }

    #[test]
    fn test_missing_facet_gives_empty_value() {
        let (dashboard, state) = dashboard_state();
        let queries = dashboard.services.query.query_objs(&[0, 1]);

        let stats = to_page_stats(&state, &queries, &SearchResponse::default());

        assert_eq!(stats.value, None);
        assert_eq!(stats.rows.len(), 2);
        assert!(stats.rows.iter().all(|r| r.value.is_none()));
    }
}
