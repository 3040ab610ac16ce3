// Search backend request/response model (statistical facets)
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Statistic exposed by a statistical facet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMode {
    Count,
    Total,
    Min,
    Max,
    #[default]
    Mean,
    SumOfSquares,
    Variance,
    StdDeviation,
}

/// A backend query object
#[derive(Debug, Clone, PartialEq)]
pub enum BackendQuery {
    QueryString(String),
    Bool { should: Vec<BackendQuery> },
    Filtered {
        query: Box<BackendQuery>,
        filter: BackendFilter,
    },
}

impl BackendQuery {
    /// Boolean composition matching any of `queries`
    pub fn any_of(queries: Vec<BackendQuery>) -> Self {
        BackendQuery::Bool { should: queries }
    }

    pub fn filtered(query: BackendQuery, filter: BackendFilter) -> Self {
        BackendQuery::Filtered {
            query: Box::new(query),
            filter,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            BackendQuery::QueryString(query) => json!({"query_string": {"query": query}}),
            BackendQuery::Bool { should } => json!({
                "bool": {"should": should.iter().map(BackendQuery::to_json).collect::<Vec<_>>()}
            }),
            BackendQuery::Filtered { query, filter } => json!({
                "filtered": {"query": query.to_json(), "filter": filter.to_json()}
            }),
        }
    }
}

/// A backend filter object
#[derive(Debug, Clone, PartialEq)]
pub enum BackendFilter {
    MatchAll,
    Range {
        field: String,
        from: String,
        to: String,
    },
    Terms {
        field: String,
        values: Vec<String>,
    },
    Query(Box<BackendQuery>),
    Bool {
        must: Vec<BackendFilter>,
        must_not: Vec<BackendFilter>,
        should: Vec<BackendFilter>,
    },
}

impl BackendFilter {
    pub fn to_json(&self) -> Value {
        match self {
            BackendFilter::MatchAll => json!({"match_all": {}}),
            BackendFilter::Range { field, from, to } => {
                let mut range = Map::new();
                range.insert(field.clone(), json!({"from": from, "to": to}));
                json!({ "range": range })
            }
            BackendFilter::Terms { field, values } => {
                let mut terms = Map::new();
                terms.insert(field.clone(), json!(values));
                json!({ "terms": terms })
            }
            BackendFilter::Query(query) => json!({"fquery": {"query": query.to_json()}}),
            BackendFilter::Bool {
                must,
                must_not,
                should,
            } => {
                if must.is_empty() && must_not.is_empty() && should.is_empty() {
                    return json!({"match_all": {}});
                }
                let mut clauses = Map::new();
                for (key, filters) in [("must", must), ("must_not", must_not), ("should", should)] {
                    if !filters.is_empty() {
                        clauses.insert(
                            key.to_string(),
                            Value::Array(filters.iter().map(BackendFilter::to_json).collect()),
                        );
                    }
                }
                json!({ "bool": clauses })
            }
        }
    }
}

/// A named statistical facet over a numeric field
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalFacet {
    pub name: String,
    pub field: String,
    pub facet_filter: BackendFilter,
}

/// A composite facet-only search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub facets: Vec<StatisticalFacet>,
    pub size: u32,
}

impl SearchRequest {
    /// Request body in the backend's JSON form
    pub fn to_body(&self) -> Value {
        let mut facets = Map::new();
        for facet in &self.facets {
            facets.insert(
                facet.name.clone(),
                json!({
                    "statistical": {"field": facet.field},
                    "facet_filter": facet.facet_filter.to_json(),
                }),
            );
        }
        json!({ "facets": facets, "size": self.size })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub facets: HashMap<String, FacetStats>,
}

/// Result of one statistical facet
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FacetStats {
    pub count: Option<f64>,
    pub total: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub sum_of_squares: Option<f64>,
    pub variance: Option<f64>,
    pub std_deviation: Option<f64>,
}

impl FacetStats {
    pub fn get(&self, mode: StatMode) -> Option<f64> {
        match mode {
            StatMode::Count => self.count,
            StatMode::Total => self.total,
            StatMode::Min => self.min,
            StatMode::Max => self.max,
            StatMode::Mean => self.mean,
            StatMode::SumOfSquares => self.sum_of_squares,
            StatMode::Variance => self.variance,
            StatMode::StdDeviation => self.std_deviation,
        }
    }
}
