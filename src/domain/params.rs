// Dashboard parameter bag, as supplied through URL query parameters
use serde::Deserialize;

/// Optional user-supplied parameters for the scripted dashboard.
///
/// None of these are required. Values are taken verbatim; only presence is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardParams {
    /// Index to search. When set, time based index rotation is disabled.
    pub index: Option<String>,
    /// Timestamped index pattern, ignored when `index` is set.
    pub pattern: Option<String>,
    /// Index rotation interval (hour, day, week, month, year).
    pub interval: Option<String>,
    /// Comma separated list of extra pages to analyze.
    pub pages: Option<String>,
    pub split: Option<String>,
    pub query: Option<String>,
    /// Lookback window, eg 15m, 1h, 2d.
    pub from: Option<String>,
    /// Field holding the event time.
    pub timefield: Option<String>,
    /// Adds a filter on the institution field.
    pub institution: Option<String>,
    /// Adds a filter on the host field.
    pub environment: Option<String>,
}

impl DashboardParams {
    /// Extra pages from the `pages` parameter, in the order given
    pub fn extra_pages(&self) -> Vec<String> {
        match &self.pages {
            Some(pages) => pages.split(',').map(str::to_string).collect(),
            None => Vec::new(),
        }
    }
}
