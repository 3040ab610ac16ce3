// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod elasticsearch;
pub mod index_pattern;
