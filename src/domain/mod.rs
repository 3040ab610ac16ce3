// Domain layer - Dashboard description, search model and panel data
pub mod dashboard;
pub mod minigraph;
pub mod page_stats;
pub mod params;
pub mod search;
pub mod time_span;
