// Application layer - Dashboard assembly and the pageload panel
pub mod dashboard_builder;
pub mod pageload_panel;
pub mod panel_runner;
pub mod query_service;
pub mod search_client;
