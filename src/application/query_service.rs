// Query and filter services - Resolve dashboard queries/filters into backend objects
use crate::domain::dashboard::{
    FilterEntry, FilterKind, FilterList, Mandate, QueryEntry, QueryList, QueryMode, QuerySelection,
};
use crate::domain::search::{BackendFilter, BackendQuery};

pub trait QueryService: Send + Sync {
    /// Query ids a panel's selection resolves to, in dashboard order
    fn ids_by_mode(&self, selection: &QuerySelection) -> Vec<u32>;

    fn query_objs(&self, ids: &[u32]) -> Vec<QueryEntry>;

    fn to_backend(&self, query: &QueryEntry) -> BackendQuery {
        if query.query.is_empty() {
            BackendQuery::QueryString("*".to_string())
        } else {
            BackendQuery::QueryString(query.query.clone())
        }
    }
}

pub trait FilterService: Send + Sync {
    fn ids(&self) -> Vec<u32>;

    /// Combine the active filters among `ids` into one bool filter
    fn bool_filter(&self, ids: &[u32]) -> BackendFilter;
}

impl QueryService for QueryList {
    fn ids_by_mode(&self, selection: &QuerySelection) -> Vec<u32> {
        match selection.mode {
            QueryMode::All => self.ids.clone(),
            QueryMode::Pinned => self.ids_where(|q| q.pin),
            QueryMode::Unpinned => self.ids_where(|q| !q.pin),
            QueryMode::Selected => selection
                .ids
                .iter()
                .copied()
                .filter(|id| self.list.contains_key(id))
                .collect(),
        }
    }

    fn query_objs(&self, ids: &[u32]) -> Vec<QueryEntry> {
        ids.iter().filter_map(|id| self.list.get(id)).cloned().collect()
    }
}

impl QueryList {
    fn ids_where(&self, pred: impl Fn(&QueryEntry) -> bool) -> Vec<u32> {
        self.ids
            .iter()
            .copied()
            .filter(|id| self.list.get(id).is_some_and(&pred))
            .collect()
    }
}

impl FilterService for FilterList {
    fn ids(&self) -> Vec<u32> {
        self.ids.clone()
    }

    fn bool_filter(&self, ids: &[u32]) -> BackendFilter {
        let mut must = Vec::new();
        let mut must_not = Vec::new();
        let mut should = Vec::new();

        for filter in ids.iter().filter_map(|id| self.list.get(id)) {
            if !filter.active {
                continue;
            }
            let Some(backend) = to_backend_filter(filter) else {
                tracing::warn!("Skipping filter {} without a value", filter.id);
                continue;
            };
            match filter.mandate.unwrap_or(Mandate::Must) {
                Mandate::Must => must.push(backend),
                Mandate::MustNot => must_not.push(backend),
                Mandate::Either => should.push(backend),
            }
        }

        if must.is_empty() && must_not.is_empty() && should.is_empty() {
            return BackendFilter::MatchAll;
        }
        BackendFilter::Bool {
            must,
            must_not,
            should,
        }
    }
}

fn to_backend_filter(filter: &FilterEntry) -> Option<BackendFilter> {
    match &filter.kind {
        FilterKind::Time { field, from, to } => Some(BackendFilter::Range {
            field: field.clone(),
            from: from.clone(),
            to: to.clone(),
        }),
        FilterKind::Terms { field, value } => value.as_ref().map(|value| BackendFilter::Terms {
            field: field.clone(),
            values: vec![value.clone()],
        }),
    }
}
