// Dashboard description domain model
use super::search::StatMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declarative dashboard description, as consumed by the dashboard loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub rows: Vec<Row>,
    pub services: Services,
    pub index: IndexSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<bool>,
    pub loader: Loader,
    pub pulldowns: Vec<Pulldown>,
    pub editable: bool,
}

impl Dashboard {
    /// The first pageload panel in the layout, if any
    pub fn pageload_panel(&self) -> Option<&PageloadPanelConfig> {
        self.rows
            .iter()
            .flat_map(|row| row.panels.iter())
            .find_map(|panel| match panel {
                Panel::Pageload(config) => Some(config),
                _ => None,
            })
    }

    /// The first active time filter, if any
    pub fn time_filter(&self) -> Option<TimeRange<'_>> {
        self.services
            .filter
            .list
            .values()
            .filter(|f| f.active)
            .find_map(|f| match &f.kind {
                FilterKind::Time { field, from, to } => Some(TimeRange { field, from, to }),
                _ => None,
            })
    }
}

/// Borrowed view of a time filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange<'a> {
    pub field: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub interval: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub title: String,
    pub collapsable: bool,
    pub editable: bool,
    pub height: String,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Panel {
    Histogram(HistogramPanel),
    Pageload(PageloadPanelConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPanel {
    pub span: u32,
    pub title: String,
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movable: Option<bool>,
    pub time_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<StatMode>,
    pub grid: Grid,
    pub auto_int: bool,
    pub bars: bool,
    pub stack: bool,
    pub lines: bool,
    pub fill: u32,
    pub legend: bool,
    pub queries: QuerySelection,
}

/// Y axis bounds; a missing max means auto scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub max: Option<f64>,
    pub min: f64,
}

/// Configuration of the pageload panel.
///
/// Missing keys fall back to the panel defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageloadPanelConfig {
    pub title: String,
    pub span: u32,
    pub editable: bool,
    pub group: Vec<String>,
    pub pages: Vec<PageEntry>,
    pub style: serde_json::Map<String, serde_json::Value>,
    pub status: String,
    pub queries: QuerySelection,
    pub terms: String,
    /// Statistic shown for the global and per-page facets
    pub mode: StatMode,
}

impl Default for PageloadPanelConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            span: 12,
            editable: false,
            group: vec!["default".to_string()],
            pages: Vec::new(),
            style: serde_json::Map::new(),
            status: "stable".to_string(),
            queries: QuerySelection::default(),
            terms: "term2".to_string(),
            mode: StatMode::Mean,
        }
    }
}

/// One monitored URL path and the query that matches it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub path: String,
    pub query_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    All,
    Pinned,
    Unpinned,
    Selected,
}

/// Which queries a panel draws from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuerySelection {
    pub mode: QueryMode,
    #[serde(default)]
    pub ids: Vec<u32>,
}

impl QuerySelection {
    pub fn selected(ids: Vec<u32>) -> Self {
        Self {
            mode: QueryMode::Selected,
            ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Services {
    pub query: QueryList,
    pub filter: FilterList,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryList {
    pub list: BTreeMap<u32, QueryEntry>,
    pub ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntry {
    pub id: u32,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pin: bool,
}

impl QueryEntry {
    pub fn lucene(id: u32, query: String) -> Self {
        Self {
            id,
            query,
            alias: None,
            kind: "lucene".to_string(),
            pin: false,
        }
    }

    /// Display label: the alias when set, the raw query otherwise
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterList {
    pub list: BTreeMap<u32, FilterEntry>,
    pub ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub id: u32,
    #[serde(flatten)]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandate: Option<Mandate>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterKind {
    Time {
        field: String,
        from: String,
        to: String,
    },
    Terms {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

/// How a filter combines with the other active filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mandate {
    Must,
    MustNot,
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loader {
    pub save_gist: bool,
    pub save_elasticsearch: bool,
    pub save_local: bool,
    pub save_temp: bool,
    pub save_temp_ttl_enable: bool,
    pub save_temp_ttl: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulldown {
    #[serde(rename = "type")]
    pub kind: String,
    pub enable: bool,
}
