// Dashboard builder - Assembles the page analysis dashboard from parameters
use crate::domain::dashboard::{
    Dashboard, FilterEntry, FilterKind, FilterList, Grid, HistogramPanel, IndexSettings, Loader,
    Mandate, PageEntry, PageloadPanelConfig, Panel, Pulldown, QueryEntry, QueryList,
    QuerySelection, Row, Services,
};
use crate::domain::params::DashboardParams;
use crate::domain::search::StatMode;
use crate::domain::time_span::DEFAULT_TIME_SPAN;
use std::collections::BTreeMap;

pub const DASHBOARD_TITLE: &str = "Development Dash";
pub const DEFAULT_PATTERN: &str = "[logstash-]YYYY.MM.DD";
pub const DEFAULT_INTERVAL: &str = "day";
pub const DEFAULT_TIME_FIELD: &str = "@timestamp";
/// Placeholder index used until a time filter resolves real indices
pub const UNRESOLVED_INDEX: &str = "ADD_A_TIME_FILTER";

const BUILTIN_PAGES: [&str; 5] = [
    "/",
    "/my/",
    "/login/index.php",
    "/mod/quiz/processattempt.php",
    "/mod/forum/discuss.php\"*\"",
];

/// Build the dashboard description for a parameter bag.
///
/// Missing parameters fall back to defaults, so this never fails.
pub fn build_dashboard(params: &DashboardParams) -> Dashboard {
    if params.split.is_some() || params.query.is_some() {
        tracing::debug!("'split' and 'query' parameters are accepted but not used");
    }

    let pages = resolve_pages(params);
    let time_field = params
        .timefield
        .clone()
        .unwrap_or_else(|| DEFAULT_TIME_FIELD.to_string());
    let (index, failover) = index_settings(params);

    Dashboard {
        title: DASHBOARD_TITLE.to_string(),
        rows: vec![
            aggregate_row(&time_field),
            page_stats_row(pages.clone()),
            row("table", Vec::new()),
        ],
        services: Services {
            query: query_list(&pages),
            filter: filter_list(params, time_field),
        },
        index,
        failover,
        loader: Loader {
            save_gist: false,
            save_elasticsearch: false,
            save_local: false,
            save_temp: true,
            save_temp_ttl_enable: true,
            save_temp_ttl: "30d".to_string(),
        },
        pulldowns: vec![
            Pulldown {
                kind: "query".to_string(),
                enable: false,
            },
            Pulldown {
                kind: "filtering".to_string(),
                enable: false,
            },
        ],
        editable: false,
    }
}

/// Built-in pages followed by the `pages` parameter, numbered from 1
fn resolve_pages(params: &DashboardParams) -> Vec<PageEntry> {
    BUILTIN_PAGES
        .iter()
        .map(|path| path.to_string())
        .chain(params.extra_pages())
        .zip(1..)
        .map(|(path, query_id)| PageEntry { path, query_id })
        .collect()
}

pub fn page_query(path: &str) -> String {
    format!("request.raw:\"{}\"", path)
}

fn query_list(pages: &[PageEntry]) -> QueryList {
    let mut list = BTreeMap::new();
    let mut all_pages = Vec::with_capacity(pages.len());

    for page in pages {
        let query = page_query(&page.path);
        all_pages.push(query.clone());
        list.insert(page.query_id, QueryEntry::lucene(page.query_id, query));
    }

    let mut all = QueryEntry::lucene(0, all_pages.join(" OR "));
    all.alias = Some("all pages".to_string());
    list.insert(0, all);

    let ids = list.keys().copied().collect();
    QueryList { list, ids }
}

fn index_settings(params: &DashboardParams) -> (IndexSettings, Option<bool>) {
    match &params.index {
        Some(index) => (
            IndexSettings {
                default: index.clone(),
                pattern: None,
                interval: "none".to_string(),
            },
            None,
        ),
        None => (
            IndexSettings {
                default: UNRESOLVED_INDEX.to_string(),
                pattern: Some(
                    params
                        .pattern
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
                ),
                interval: params
                    .interval
                    .clone()
                    .unwrap_or_else(|| DEFAULT_INTERVAL.to_string()),
            },
            Some(false),
        ),
    }
}

fn filter_list(params: &DashboardParams, time_field: String) -> FilterList {
    let from = params.from.as_deref().unwrap_or(DEFAULT_TIME_SPAN);
    let filters = [
        FilterEntry {
            id: 0,
            kind: FilterKind::Time {
                field: time_field,
                from: format!("now-{}", from),
                to: "now".to_string(),
            },
            mandate: None,
            active: true,
        },
        terms_filter(1, "_type", Some("apache-access".to_string())),
        terms_filter(2, "institution", params.institution.clone()),
        terms_filter(3, "host", params.environment.clone()),
    ];

    let list: BTreeMap<u32, FilterEntry> = filters.into_iter().map(|f| (f.id, f)).collect();
    let ids = list.keys().copied().collect();
    FilterList { list, ids }
}

/// A must-match terms filter, active only when a value is supplied
fn terms_filter(id: u32, field: &str, value: Option<String>) -> FilterEntry {
    FilterEntry {
        id,
        active: value.is_some(),
        kind: FilterKind::Terms {
            field: field.to_string(),
            value,
        },
        mandate: Some(Mandate::Must),
    }
}

fn row(title: &str, panels: Vec<Panel>) -> Row {
    Row {
        title: title.to_string(),
        collapsable: false,
        editable: false,
        height: "150px".to_string(),
        panels,
    }
}

fn aggregate_row(time_field: &str) -> Row {
    let events = HistogramPanel {
        span: 6,
        title: "Events For All Pages".to_string(),
        editable: false,
        movable: Some(false),
        time_field: time_field.to_string(),
        value_field: None,
        scale: None,
        mode: None,
        grid: Grid {
            max: None,
            min: 0.0,
        },
        auto_int: true,
        bars: false,
        stack: false,
        lines: true,
        fill: 1,
        legend: true,
        queries: QuerySelection::selected(vec![0]),
    };
    let response_time = HistogramPanel {
        title: "Response Time (seconds)".to_string(),
        movable: None,
        value_field: Some("response_time".to_string()),
        scale: Some("0.000001".to_string()),
        mode: Some(StatMode::Mean),
        ..events.clone()
    };

    row(
        "Aggregate Stats",
        vec![Panel::Histogram(events), Panel::Histogram(response_time)],
    )
}

fn page_stats_row(pages: Vec<PageEntry>) -> Row {
    let panel = PageloadPanelConfig {
        title: "stats by page".to_string(),
        pages,
        ..Default::default()
    };
    row("Page Stats", vec![Panel::Pageload(panel)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::QueryMode;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> DashboardParams {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    fn filter(dashboard: &Dashboard, id: u32) -> &FilterEntry {
        &dashboard.services.filter.list[&id]
    }

    #[test]
    fn test_defaults() {
        let dashboard = build_dashboard(&DashboardParams::default());

        assert_eq!(dashboard.title, DASHBOARD_TITLE);
        assert_eq!(dashboard.services.query.ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(dashboard.pageload_panel().unwrap().pages.len(), 5);
        assert_eq!(
            dashboard.index,
            IndexSettings {
                default: UNRESOLVED_INDEX.to_string(),
                pattern: Some("[logstash-]YYYY.MM.DD".to_string()),
                interval: "day".to_string(),
            }
        );
        assert_eq!(dashboard.failover, Some(false));

        let time = dashboard.time_filter().unwrap();
        assert_eq!(time.from, "now-4h");
        assert_eq!(time.to, "now");
        assert_eq!(time.field, "@timestamp");
    }

    #[test]
    fn test_deterministic() {
        let p = params(&[("pages", "/x"), ("institution", "uni"), ("from", "1d")]);
        assert_eq!(build_dashboard(&p), build_dashboard(&p));
        assert_eq!(
            serde_json::to_string(&build_dashboard(&p)).unwrap(),
            serde_json::to_string(&build_dashboard(&p)).unwrap()
        );
    }

    #[test]
    fn test_extra_pages_are_numbered_after_builtins() {
        let dashboard = build_dashboard(&params(&[("pages", "/a,/b")]));
        let pages = &dashboard.pageload_panel().unwrap().pages;

        assert_eq!(pages.len(), 7);
        assert_eq!(dashboard.services.query.list.len(), 8);
        assert_eq!(pages[5], PageEntry { path: "/a".to_string(), query_id: 6 });
        assert_eq!(pages[6], PageEntry { path: "/b".to_string(), query_id: 7 });
        assert_eq!(dashboard.services.query.list[&6].query, "request.raw:\"/a\"");
    }

    #[test]
    fn test_query_zero_is_or_of_page_queries() {
        let dashboard = build_dashboard(&params(&[("pages", "/a")]));
        let list = &dashboard.services.query.list;

        let others: Vec<&str> = list
            .values()
            .filter(|q| q.id != 0)
            .map(|q| q.query.as_str())
            .collect();
        assert_eq!(list[&0].query, others.join(" OR "));
        assert_eq!(list[&0].alias.as_deref(), Some("all pages"));
        assert!(list[&0].query.starts_with("request.raw:\"/\" OR request.raw:\"/my/\""));
    }

    #[test]
    fn test_page_query_ids_match_positions() {
        let dashboard = build_dashboard(&DashboardParams::default());
        for (i, page) in dashboard.pageload_panel().unwrap().pages.iter().enumerate() {
            assert_eq!(page.query_id as usize, i + 1);
            assert_eq!(
                dashboard.services.query.list[&page.query_id].query,
                page_query(&page.path)
            );
        }
    }

    #[test]
    fn test_explicit_index_disables_rotation() {
        let dashboard = build_dashboard(&params(&[("index", "web"), ("interval", "week")]));

        assert_eq!(dashboard.index.default, "web");
        assert_eq!(dashboard.index.interval, "none");
        assert!(dashboard.index.pattern.is_none());
        assert!(dashboard.failover.is_none());
    }

    #[test]
    fn test_interval_and_pattern_params() {
        let dashboard = build_dashboard(&params(&[("interval", "week"), ("pattern", "[web-]YYYY.ww")]));

        assert_eq!(dashboard.index.interval, "week");
        assert_eq!(dashboard.index.pattern.as_deref(), Some("[web-]YYYY.ww"));
    }

    #[test]
    fn test_filter_activity_follows_params() {
        let dashboard = build_dashboard(&DashboardParams::default());
        assert_eq!(dashboard.services.filter.ids, vec![0, 1, 2, 3]);
        assert!(filter(&dashboard, 0).active);
        assert!(filter(&dashboard, 1).active);
        assert!(!filter(&dashboard, 2).active);
        assert!(!filter(&dashboard, 3).active);

        let dashboard = build_dashboard(&params(&[("institution", "uni"), ("environment", "prod-web")]));
        assert!(filter(&dashboard, 2).active);
        assert!(filter(&dashboard, 3).active);
        assert_eq!(
            filter(&dashboard, 3).kind,
            FilterKind::Terms {
                field: "host".to_string(),
                value: Some("prod-web".to_string()),
            }
        );
        assert_eq!(filter(&dashboard, 3).mandate, Some(Mandate::Must));
    }

    #[test]
    fn test_time_filter_params() {
        let dashboard = build_dashboard(&params(&[("from", "15m"), ("timefield", "ts")]));
        let time = dashboard.time_filter().unwrap();
        assert_eq!(time.from, "now-15m");
        assert_eq!(time.field, "ts");

        match &dashboard.rows[0].panels[1] {
            Panel::Histogram(panel) => assert_eq!(panel.time_field, "ts"),
            other => panic!("unexpected panel {:?}", other),
        }
    }

    #[test]
    fn test_layout() {
        let dashboard = build_dashboard(&DashboardParams::default());
        let titles: Vec<&str> = dashboard.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Aggregate Stats", "Page Stats", "table"]);

        for panel in &dashboard.rows[0].panels {
            match panel {
                Panel::Histogram(h) => assert_eq!(h.queries, QuerySelection::selected(vec![0])),
                other => panic!("unexpected panel {:?}", other),
            }
        }

        let pageload = dashboard.pageload_panel().unwrap();
        assert_eq!(pageload.queries.mode, QueryMode::All);
        assert_eq!(pageload.span, 12);
        assert!(dashboard.rows[2].panels.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(build_dashboard(&DashboardParams::default())).unwrap();

        assert_eq!(value["services"]["query"]["list"]["0"]["alias"], "all pages");
        assert_eq!(value["services"]["query"]["list"]["1"]["type"], "lucene");
        assert_eq!(value["services"]["filter"]["list"]["0"]["type"], "time");
        assert_eq!(value["rows"][0]["panels"][0]["type"], "histogram");
        assert_eq!(value["rows"][0]["panels"][0]["grid"], json!({"max": null, "min": 0.0}));
        assert_eq!(value["rows"][1]["panels"][0]["type"], "pageload");
        assert_eq!(value["loader"]["save_temp_ttl"], "30d");
        assert_eq!(value["pulldowns"][1], json!({"type": "filtering", "enable": false}));
        assert_eq!(value["editable"], false);
    }
}
