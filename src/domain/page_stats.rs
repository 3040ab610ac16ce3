// Per-page statistics shown by the pageload panel
use super::dashboard::QueryEntry;
use serde::Serialize;

/// One display row per query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub id: u32,
    pub query: String,
    pub label: String,
    /// Lowercased label, used as the sort key
    pub sort_label: String,
    pub value: Option<f64>,
}

impl PageRow {
    pub fn new(query: &QueryEntry, value: Option<f64>) -> Self {
        let label = query.label().to_string();
        Self {
            id: query.id,
            query: query.query.clone(),
            sort_label: label.to_lowercase(),
            label,
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageStats {
    /// Statistic over the union of all selected queries
    pub value: Option<f64>,
    pub rows: Vec<PageRow>,
}
