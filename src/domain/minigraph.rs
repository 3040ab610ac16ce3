// Mini time series graphs drawn next to each page row
use super::dashboard::{Grid, QueryMode, QuerySelection};
use super::search::StatMode;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiniGraph {
    pub span: u32,
    pub height: u32,
    pub width: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub time_field: String,
    pub queries: QuerySelection,
    pub mode: StatMode,
    pub value_field: Option<String>,
    pub grid: Grid,
}

/// Event count over time
pub static EVENT_GRAPH: LazyLock<MiniGraph> = LazyLock::new(|| MiniGraph {
    mode: StatMode::Count,
    value_field: None,
    grid: Grid {
        max: None,
        min: 0.0,
    },
    ..base_graph()
});

/// Mean response time over time
pub static RESPONSE_TIME_GRAPH: LazyLock<MiniGraph> = LazyLock::new(|| MiniGraph {
    mode: StatMode::Mean,
    value_field: Some("response_time".to_string()),
    grid: Grid {
        max: Some(5_000_000.0),
        min: 0.0,
    },
    ..base_graph()
});

fn base_graph() -> MiniGraph {
    MiniGraph {
        span: 2,
        height: 50,
        width: 200,
        kind: "minigraph",
        time_field: "@timestamp".to_string(),
        queries: QuerySelection {
            mode: QueryMode::All,
            ids: vec![0],
        },
        mode: StatMode::Count,
        value_field: None,
        grid: Grid {
            max: None,
            min: 0.0,
        },
    }
}

/// Page specific overrides laid over a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiniGraphOverlay {
    pub queries: Option<QuerySelection>,
}

impl MiniGraphOverlay {
    /// Overlay scoping a graph to a single query
    pub fn for_query(query_id: u32) -> Self {
        Self {
            queries: Some(QuerySelection::selected(vec![query_id])),
        }
    }

    pub fn apply(&self, template: &MiniGraph) -> MiniGraph {
        let mut graph = template.clone();
        if let Some(queries) = &self.queries {
            graph.queries = queries.clone();
        }
        graph
    }
}
